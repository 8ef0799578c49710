//! Tracks partial segments, completed segments, and retention for one
//! LL-HLS rendition, and renders full/delta playlists over the shared
//! manifest model and generator (spec §4.7).

use crate::config::LLHLSConfig;
use crate::error::LLHLSError;
use crate::manifest::generator::generate_media;
use crate::manifest::model::{ByteRange, MediaPlaylist, Part, PartInf, Segment, ServerControl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// A partial segment as tracked in-flight by the manager (spec §3,
/// distinct from the rendered [`crate::manifest::model::Part`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLPartialSegment {
    pub msn: u32,
    pub part_index: u16,
    pub duration: f64,
    pub is_independent: bool,
    pub is_gap: bool,
    pub byte_range: Option<ByteRange>,
    pub uri: String,
}

/// Header flags applied on `update_metadata`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LivePlaylistMetadata {
    pub independent_segments: bool,
}

struct SegmentRecord {
    msn: u32,
    completed: bool,
    partials: Vec<LLPartialSegment>,
    uri: Option<String>,
    duration: Option<f64>,
    has_discontinuity: bool,
    program_date_time: Option<DateTime<Utc>>,
}

impl SegmentRecord {
    fn pending(msn: u32) -> Self {
        Self { msn, completed: false, partials: Vec::new(), uri: None, duration: None, has_discontinuity: false, program_date_time: None }
    }
}

struct ManagerState {
    config: LLHLSConfig,
    segments: Vec<SegmentRecord>,
    independent_segments: bool,
    ended: bool,
}

impl ManagerState {
    fn current_mut(&mut self) -> &mut SegmentRecord {
        self.segments.last_mut().expect("manager always has a pending segment record")
    }

    fn trim_retained_partials(&mut self) {
        let retained = self.config.retained_partial_segments as usize;
        let completed_indices: Vec<usize> =
            self.segments.iter().enumerate().filter(|(_, s)| s.completed).map(|(i, _)| i).collect();
        if completed_indices.len() > retained {
            for &i in &completed_indices[..completed_indices.len() - retained] {
                self.segments[i].partials.clear();
            }
        }
    }

    fn render(&self, delta: bool) -> String {
        let mut playlist = MediaPlaylist::new();
        playlist.target_duration = self.config.segment_target.ceil() as u32;
        playlist.independent_segments = self.independent_segments;
        playlist.part_inf = Some(PartInf { part_target: self.config.part_target });
        playlist.server_control = Some(ServerControl {
            can_block_reload: self.config.can_block_reload,
            can_skip_until: if self.config.can_skip { Some(self.config.segment_target * 6.0) } else { None },
            hold_back: None,
            part_hold_back: Some(self.config.part_target * 3.0),
            can_skip_dateranges: false,
        });

        let completed: Vec<&SegmentRecord> = self.segments.iter().filter(|s| s.completed).collect();
        if let Some(first) = completed.first() {
            playlist.media_sequence = first.msn;
        }

        let mut skip_count = 0u32;
        let mut start = 0usize;
        if delta {
            if !self.config.can_skip || completed.len() < 2 {
                return String::new();
            }
            let skip_until = self.config.segment_target * 6.0;
            let mut covered = 0.0;
            let mut cut = None;
            for (i, record) in completed.iter().enumerate().rev() {
                covered += record.duration.unwrap_or(0.0);
                if covered >= skip_until {
                    cut = Some(i);
                    break;
                }
            }
            match cut {
                Some(i) => {
                    start = i;
                    skip_count = start as u32;
                }
                None => return String::new(),
            }
        }

        if skip_count > 0 {
            playlist.media_sequence = completed[start].msn;
        }

        for record in &completed[start..] {
            let mut segment = Segment::new(record.duration.unwrap_or(0.0), record.uri.clone().unwrap_or_default());
            segment.discontinuity = record.has_discontinuity;
            segment.program_date_time = record.program_date_time.map(|dt| dt.to_rfc3339());
            playlist.segments.push(segment);
            playlist.parts_by_segment.push(render_parts(&record.partials));
        }

        if let Some(building) = self.segments.last().filter(|s| !s.completed) {
            playlist.parts_by_segment.push(render_parts(&building.partials));
        }

        if !self.ended {
            if let Some(building) = self.segments.last().filter(|s| !s.completed) {
                let next_index = building.partials.len() as u16;
                playlist.preload_hint = Some(crate::manifest::model::PreloadHint {
                    hint_type: "PART".to_string(),
                    uri: format!("part_{}_{}.m4s", building.msn, next_index),
                    byte_range_start: None,
                    byte_range_length: None,
                });
            }
        } else {
            playlist.has_endlist = true;
        }

        if delta && skip_count > 0 {
            let mut out = String::new();
            let header_end_marker = "#EXT-X-PART-INF";
            let rendered = generate_media(&playlist);
            for line in rendered.lines() {
                out.push_str(line);
                out.push('\n');
                if line.starts_with(header_end_marker) {
                    out.push_str(&format!("#EXT-X-SKIP:SKIPPED-SEGMENTS={skip_count}\n"));
                }
            }
            out
        } else {
            generate_media(&playlist)
        }
    }

    fn reaches(&self, msn: u32, part_index: Option<u16>) -> bool {
        match part_index {
            None => self.segments.iter().any(|s| s.msn == msn && s.completed),
            Some(idx) => self.segments.iter().any(|s| s.msn == msn && s.partials.len() > idx as usize),
        }
    }
}

fn render_parts(partials: &[LLPartialSegment]) -> Vec<Part> {
    partials
        .iter()
        .map(|p| Part { duration: p.duration, uri: p.uri.clone(), is_independent: p.is_independent, is_gap: p.is_gap, byte_range: p.byte_range })
        .collect()
}

/// Actor-style handle; cloning shares the same underlying LL-HLS state.
#[derive(Clone)]
pub struct LLHLSManager {
    state: Arc<Mutex<ManagerState>>,
    notify: Arc<Notify>,
}

impl LLHLSManager {
    pub fn new(config: LLHLSConfig) -> Self {
        let state = ManagerState { config, segments: vec![SegmentRecord::pending(0)], independent_segments: false, ended: false };
        Self { state: Arc::new(Mutex::new(state)), notify: Arc::new(Notify::new()) }
    }

    pub async fn add_partial(
        &self,
        duration: f64,
        is_independent: bool,
        is_gap: bool,
        byte_range: Option<ByteRange>,
    ) -> Result<LLPartialSegment, LLHLSError> {
        let mut state = self.state.lock().await;
        if state.ended {
            return Err(LLHLSError::StreamAlreadyEnded);
        }
        let max = state.config.max_partials_per_segment;
        let current = state.current_mut();
        if current.partials.is_empty() && !is_independent {
            return Err(LLHLSError::InvalidPartial { reason: "first partial of a segment must be independent".to_string() });
        }
        if current.partials.len() >= max as usize {
            return Err(LLHLSError::TooManyPartials { max });
        }
        let partial = LLPartialSegment {
            msn: current.msn,
            part_index: current.partials.len() as u16,
            duration,
            is_independent,
            is_gap,
            byte_range,
            uri: format!("part_{}_{}.m4s", current.msn, current.partials.len()),
        };
        current.partials.push(partial.clone());
        tracing::debug!(msn = partial.msn, part_index = partial.part_index, "partial segment added");
        drop(state);
        self.notify.notify_waiters();
        Ok(partial)
    }

    pub async fn complete_segment(
        &self,
        duration: f64,
        uri: impl Into<String>,
        program_date_time: Option<DateTime<Utc>>,
        has_discontinuity: bool,
    ) -> Result<(), LLHLSError> {
        let mut state = self.state.lock().await;
        if state.ended {
            return Err(LLHLSError::StreamAlreadyEnded);
        }
        let next_msn = {
            let current = state.current_mut();
            current.completed = true;
            current.uri = Some(uri.into());
            current.duration = Some(duration);
            current.program_date_time = program_date_time;
            current.has_discontinuity = has_discontinuity;
            current.msn + 1
        };
        state.segments.push(SegmentRecord::pending(next_msn));
        state.trim_retained_partials();
        tracing::info!(msn = next_msn - 1, "segment completed");
        drop(state);
        self.notify.notify_waiters();
        Ok(())
    }

    pub async fn update_metadata(&self, metadata: LivePlaylistMetadata) {
        let mut state = self.state.lock().await;
        state.independent_segments = metadata.independent_segments;
        drop(state);
        self.notify.notify_waiters();
    }

    pub async fn end_stream(&self) {
        let mut state = self.state.lock().await;
        state.ended = true;
        drop(state);
        tracing::info!("stream ended");
        self.notify.notify_waiters();
    }

    pub async fn render_full_playlist(&self) -> String {
        self.state.lock().await.render(false)
    }

    /// `None` when no skip is possible (insufficient completed segments or
    /// `can_skip=false`).
    pub async fn render_delta_playlist(&self) -> Option<String> {
        let state = self.state.lock().await;
        if !state.config.can_skip {
            return None;
        }
        let rendered = state.render(true);
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    pub(crate) async fn reaches(&self, msn: u32, part_index: Option<u16>) -> bool {
        self.state.lock().await.reaches(msn, part_index)
    }

    pub(crate) async fn has_ended(&self) -> bool {
        self.state.lock().await.ended
    }

    pub(crate) fn notify_handle(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Creates a [`crate::llhls::blocking::BlockingPlaylistHandler`]
    /// observing this manager; it is auto-notified on every mutation. The
    /// returned handler is itself the detachable token — dropping it stops
    /// observing.
    pub fn attach_blocking_handler(&self) -> crate::llhls::blocking::BlockingPlaylistHandler {
        crate::llhls::blocking::BlockingPlaylistHandler::new(self.clone())
    }
}
