//! Live playlist engines: sliding-window, event, and DVR, sharing a common
//! rendering path over [`crate::manifest`] (spec §4.6).

pub mod dvr;
pub mod event;
pub mod sliding;

use crate::manifest::model::{MediaPlaylist, Segment};
use crate::segmenter::LiveSegment;

pub use dvr::DVRPlaylist;
pub use event::EventPlaylist;
pub use sliding::SlidingWindowPlaylist;

/// Converts an emitted [`LiveSegment`] into a manifest [`Segment`], folding
/// in a discontinuity flag deferred from a prior `add_segment` call (spec
/// §4.6: a discontinuity is recorded against the *next* segment added,
/// since the boundary is only known once the following segment's
/// timestamp contradicts continuity with the last one).
pub(crate) fn to_manifest_segment(live: &LiveSegment, discontinuity: bool) -> Segment {
    let mut segment = Segment::new(live.duration, live.filename.clone());
    segment.discontinuity = discontinuity;
    segment.program_date_time = live.program_date_time.map(|dt| dt.to_rfc3339());
    segment
}

/// Shared bookkeeping used by all three playlist engines: the rendered
/// playlist, a per-segment source timestamp (needed by the DVR engine's
/// time-based eviction, not carried by [`Segment`] itself), a running
/// "longest segment ever seen" floor for `TARGETDURATION` (HLS requires it
/// never decrease across reloads), and a pending-discontinuity flag.
pub(crate) struct PlaylistCore {
    pub playlist: MediaPlaylist,
    pub timestamps: Vec<f64>,
    pub max_duration_seen: f64,
    pub pending_discontinuity: bool,
}

impl PlaylistCore {
    pub fn new(target_duration: f64) -> Self {
        let mut playlist = MediaPlaylist::new();
        playlist.target_duration = target_duration.ceil() as u32;
        Self { playlist, timestamps: Vec::new(), max_duration_seen: target_duration, pending_discontinuity: false }
    }

    pub fn push_segment(&mut self, live: &LiveSegment) {
        let discontinuity = self.pending_discontinuity;
        self.pending_discontinuity = false;
        let segment = to_manifest_segment(live, discontinuity);
        self.max_duration_seen = self.max_duration_seen.max(live.duration);
        self.playlist.target_duration = self.playlist.target_duration.max(self.max_duration_seen.ceil() as u32);
        self.playlist.segments.push(segment);
        self.timestamps.push(live.timestamp);
    }

    /// Pops the oldest retained segment, advancing `media_sequence` and, if
    /// the evicted segment opened a discontinuity, `discontinuity_sequence`.
    pub fn evict_front(&mut self) -> Segment {
        let evicted = self.playlist.segments.remove(0);
        if !self.timestamps.is_empty() {
            self.timestamps.remove(0);
        }
        self.playlist.media_sequence += 1;
        if evicted.discontinuity {
            self.playlist.discontinuity_sequence += 1;
        }
        tracing::debug!(uri = %evicted.uri, media_sequence = self.playlist.media_sequence, "segment evicted from window");
        evicted
    }

    pub fn mark_discontinuity(&mut self) {
        self.pending_discontinuity = true;
    }
}
