//! Non-mutating rule checks over a parsed manifest (spec §4.4). Findings
//! are reported, never raised as an `Err` — a playlist with validation
//! errors is still a playlist.

use super::model::{MasterPlaylist, MediaPlaylist};
use crate::error::Severity;
use crate::metrics;
use serde::{Deserialize, Serialize};

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// The full set of findings from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, field: impl Into<String>, message: impl Into<String>) {
        let severity_name = match severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        metrics::record_validation_error(severity_name);
        self.results.push(ValidationResult { severity, field: field.into(), message: message.into() });
    }
}

/// Validates a media playlist: target-duration vs. max segment duration,
/// version consistency, required tag presence, LL-HLS part-target/segment-target
/// arithmetic.
pub fn validate_media(playlist: &MediaPlaylist) -> ValidationReport {
    let mut report = ValidationReport::default();

    if playlist.target_duration == 0 && !playlist.segments.is_empty() {
        report.push(Severity::Error, "target_duration", "EXT-X-TARGETDURATION is required once segments are present");
    }

    let max_segment_duration = playlist.segments.iter().map(|s| s.duration).fold(0.0_f64, f64::max);
    if max_segment_duration.ceil() as u32 > playlist.target_duration {
        report.push(
            Severity::Error,
            "target_duration",
            format!(
                "target_duration {} is less than the ceiling of the longest segment's duration ({})",
                playlist.target_duration,
                max_segment_duration.ceil()
            ),
        );
    }

    let uses_byte_range = playlist.segments.iter().any(|s| s.byte_range.is_some());
    if uses_byte_range && playlist.version < 4 {
        report.push(Severity::Error, "version", "EXT-X-BYTERANGE requires EXT-X-VERSION >= 4");
    }

    let uses_map = playlist.map.is_some() || playlist.segments.iter().any(|s| s.map.is_some());
    if uses_map && playlist.version < 7 {
        report.push(Severity::Warning, "version", "EXT-X-MAP in a media playlist is commonly paired with EXT-X-VERSION >= 7");
    }

    if let Some(part_inf) = &playlist.part_inf {
        let has_parts = playlist.parts_by_segment.iter().any(|parts| !parts.is_empty());
        if has_parts {
            let max_partials = playlist.parts_by_segment.iter().map(|p| p.len()).max().unwrap_or(0) as f64;
            let segment_target = playlist.target_duration as f64;
            if part_inf.part_target * max_partials < segment_target {
                report.push(
                    Severity::Error,
                    "part_inf",
                    format!(
                        "PART-TARGET ({}) * max observed partials per segment ({}) is less than segment_target ({})",
                        part_inf.part_target, max_partials, segment_target
                    ),
                );
            }
        }
        for (i, parts) in playlist.parts_by_segment.iter().enumerate() {
            if parts.is_empty() {
                continue;
            }
            if let Some(first) = parts.first() {
                if !first.is_independent {
                    report.push(
                        Severity::Error,
                        "parts",
                        format!("segment index {i}: first partial of a segment must be independent"),
                    );
                }
            }
        }
    }

    for (i, parts) in playlist.parts_by_segment.iter().enumerate() {
        if let Some(segment) = playlist.segments.get(i) {
            if !parts.is_empty() {
                let sum: f64 = parts.iter().map(|p| p.duration).sum();
                if (sum - segment.duration).abs() > 0.001 {
                    report.push(
                        Severity::Warning,
                        "parts",
                        format!(
                            "segment index {i}: sum of partial durations ({sum:.3}) differs from segment duration ({:.3}) by more than 0.001s",
                            segment.duration
                        ),
                    );
                }
            }
        }
    }

    report
}

/// Validates a master playlist: every variant's `AUDIO`/`SUBTITLES`/
/// `CLOSED-CAPTIONS` group id must resolve to a declared rendition group.
pub fn validate_master(playlist: &MasterPlaylist) -> ValidationReport {
    let mut report = ValidationReport::default();

    if playlist.variants.is_empty() && playlist.iframe_variants.is_empty() {
        report.push(Severity::Warning, "variants", "master playlist declares no variant streams");
    }

    for variant in &playlist.variants {
        if let Some(group) = &variant.audio_group {
            if !group_declared(playlist, group, super::model::MediaType::Audio) {
                report.push(
                    Severity::Error,
                    "audio",
                    format!("variant references AUDIO group {group:?} with no matching EXT-X-MEDIA rendition"),
                );
            }
        }
        if let Some(group) = &variant.subtitles_group {
            if !group_declared(playlist, group, super::model::MediaType::Subtitles) {
                report.push(
                    Severity::Error,
                    "subtitles",
                    format!("variant references SUBTITLES group {group:?} with no matching EXT-X-MEDIA rendition"),
                );
            }
        }
        if let Some(group) = &variant.closed_captions_group {
            if !group_declared(playlist, group, super::model::MediaType::ClosedCaptions) {
                report.push(
                    Severity::Error,
                    "closed_captions",
                    format!("variant references CLOSED-CAPTIONS group {group:?} with no matching EXT-X-MEDIA rendition"),
                );
            }
        }
    }

    report
}

fn group_declared(playlist: &MasterPlaylist, group_id: &str, media_type: super::model::MediaType) -> bool {
    playlist.renditions.iter().any(|r| r.media_type == media_type && r.group_id == group_id)
}
