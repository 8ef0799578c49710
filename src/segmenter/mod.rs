//! Live segmentation pipeline: encoded frames → timed segments, emitted
//! asynchronously with keyframe alignment and ring-buffer retention
//! (spec §4.5).

pub mod incremental;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The media kind of an [`EncodedFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    Video,
    Audio,
}

/// A single encoded access unit ingested by a segmenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFrame {
    /// Seconds, monotonically non-decreasing within a track.
    pub timestamp: f64,
    pub duration: f64,
    pub data: Vec<u8>,
    pub is_keyframe: bool,
    pub kind: FrameKind,
}

impl EncodedFrame {
    pub fn video(timestamp: f64, duration: f64, data: Vec<u8>, is_keyframe: bool) -> Self {
        Self { timestamp, duration, data, is_keyframe, kind: FrameKind::Video }
    }

    pub fn audio(timestamp: f64, duration: f64, data: Vec<u8>) -> Self {
        Self { timestamp, duration, data, is_keyframe: true, kind: FrameKind::Audio }
    }
}

/// A segment emitted by a segmenter. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSegment {
    pub index: u32,
    pub data: Vec<u8>,
    pub duration: f64,
    pub timestamp: f64,
    pub is_independent: bool,
    pub program_date_time: Option<DateTime<Utc>>,
    pub filename: String,
    pub frame_count: u32,
    pub codecs: Vec<String>,
}

/// Paired output from a [`incremental::VideoSegmenter`] tracking an
/// interleaved audio sub-stream.
#[derive(Debug, Clone)]
pub struct SegmentOutput {
    pub video_segment: LiveSegment,
    pub audio_segment: Option<LiveSegment>,
}

/// A configurable hook substituting a segment's byte payload — e.g. calling
/// [`crate::cmaf::writer`] to build an fMP4 media segment from the raw
/// frame bytes. If absent, `segment.data` is the raw concatenation of
/// frame bytes.
pub type SegmentTransform = Arc<dyn Fn(LiveSegment, &[EncodedFrame]) -> LiveSegment + Send + Sync>;
