//! Typed configuration for the segmenter, playlist engines, and LL-HLS
//! manager, plus a small set of environment-variable overrides for the
//! knobs an embedding service is likely to want to tune without a
//! recompile.

use serde::{Deserialize, Serialize};

fn default_max_duration_multiplier() -> f64 {
    1.5
}

/// Configuration for [`crate::segmenter::IncrementalSegmenter`] and its
/// `Audio`/`Video` specializations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub target_duration: f64,
    pub max_duration: f64,
    /// `None` means unbounded retention in the ring buffer.
    pub ring_buffer_size: Option<u32>,
    pub keyframe_aligned: bool,
    pub start_index: u32,
    pub track_program_date_time: bool,
    /// printf-style pattern with a single `%d` placeholder, e.g. `"segment_%d.m4s"`.
    pub naming_pattern: String,
}

impl SegmenterConfig {
    pub fn new(target_duration: f64, naming_pattern: impl Into<String>) -> Self {
        Self {
            target_duration,
            max_duration: target_duration * default_max_duration_multiplier(),
            ring_buffer_size: None,
            keyframe_aligned: false,
            start_index: 0,
            track_program_date_time: false,
            naming_pattern: naming_pattern.into(),
        }
    }

    pub fn with_keyframe_aligned(mut self, keyframe_aligned: bool) -> Self {
        self.keyframe_aligned = keyframe_aligned;
        self
    }

    pub fn with_ring_buffer_size(mut self, size: u32) -> Self {
        self.ring_buffer_size = Some(size);
        self
    }

    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_max_duration(mut self, max_duration: f64) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_program_date_time(mut self, track: bool) -> Self {
        self.track_program_date_time = track;
        self
    }

    pub fn format_filename(&self, index: u32) -> String {
        format_naming_pattern(&self.naming_pattern, index)
    }
}

/// Replaces the first `%d` occurrence in `pattern` with `index`. Literal
/// `%%` escapes a percent sign.
pub(crate) fn format_naming_pattern(pattern: &str, index: u32) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();
    let mut substituted = false;
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('d') if !substituted => {
                    chars.next();
                    out.push_str(&index.to_string());
                    substituted = true;
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Configuration for [`crate::playlist::sliding::SlidingWindowPlaylist`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlidingWindowConfig {
    pub window_size: u32,
    pub target_duration: f64,
    pub init_segment_uri: Option<String>,
}

/// Configuration for [`crate::playlist::dvr::DVRPlaylist`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DvrConfig {
    pub dvr_window_duration: f64,
    pub target_duration: f64,
}

/// Configuration for [`crate::llhls::manager::LLHLSManager`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LLHLSConfig {
    pub part_target: f64,
    pub max_partials_per_segment: u16,
    pub segment_target: f64,
    pub retained_partial_segments: u16,
    pub can_block_reload: bool,
    pub can_skip: bool,
}

impl LLHLSConfig {
    /// `part_target=0.2s`, `segment_target=1.0s`, `retained=3`.
    pub fn ultra_low_latency() -> Self {
        Self {
            part_target: 0.2,
            max_partials_per_segment: 6,
            segment_target: 1.0,
            retained_partial_segments: 3,
            can_block_reload: true,
            can_skip: true,
        }
    }

    /// `part_target=0.33334s`, `segment_target=2.0s`, `retained=3`.
    pub fn low_latency() -> Self {
        Self {
            part_target: 0.33334,
            max_partials_per_segment: 7,
            segment_target: 2.0,
            retained_partial_segments: 3,
            can_block_reload: true,
            can_skip: true,
        }
    }

    /// `part_target=0.5s`, `segment_target=4.0s`, `retained=2`.
    pub fn balanced() -> Self {
        Self {
            part_target: 0.5,
            max_partials_per_segment: 8,
            segment_target: 4.0,
            retained_partial_segments: 2,
            can_block_reload: true,
            can_skip: true,
        }
    }
}

impl Default for LLHLSConfig {
    fn default() -> Self {
        Self::low_latency()
    }
}

/// Environment-variable overrides for the handful of knobs an embedding
/// service commonly wants to flip without a recompile, mirroring the
/// dev/prod override pattern the teacher's process configuration used.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub start_index: Option<u32>,
    pub ring_buffer_size: Option<u32>,
}

impl EnvOverrides {
    /// Reads `HLSKIT_START_INDEX` and `HLSKIT_RING_BUFFER_SIZE` from the
    /// process environment. Unset or unparsable variables are left `None`
    /// rather than erroring — these are optional tuning knobs, not required
    /// configuration.
    pub fn from_env() -> Self {
        Self {
            start_index: std::env::var("HLSKIT_START_INDEX")
                .ok()
                .and_then(|v| v.parse().ok()),
            ring_buffer_size: std::env::var("HLSKIT_RING_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn apply(&self, config: &mut SegmenterConfig) {
        if let Some(start_index) = self.start_index {
            config.start_index = start_index;
        }
        if let Some(ring_buffer_size) = self.ring_buffer_size {
            config.ring_buffer_size = Some(ring_buffer_size);
        }
    }
}
