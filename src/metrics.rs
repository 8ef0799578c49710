//! Thin wrappers over the `metrics` crate. Every call here is a no-op
//! unless the embedding process installs a recorder (e.g.
//! `metrics-exporter-prometheus`), so the core never has to special-case
//! "no metrics backend installed".

use metrics::{counter, histogram};

pub fn record_segment_emitted(kind: &'static str, duration_seconds: f64) {
    counter!("hlskit_segments_emitted_total", "kind" => kind).increment(1);
    histogram!("hlskit_segment_duration_seconds", "kind" => kind).record(duration_seconds);
}

pub fn record_partial_created(is_independent: bool) {
    counter!("hlskit_partials_created_total", "independent" => is_independent.to_string())
        .increment(1);
}

pub fn record_playlist_render(engine: &'static str) {
    counter!("hlskit_playlist_renders_total", "engine" => engine).increment(1);
}

pub fn record_validation_error(severity: &'static str) {
    counter!("hlskit_validation_findings_total", "severity" => severity).increment(1);
}

pub fn record_blocking_await(outcome: &'static str) {
    counter!("hlskit_blocking_awaits_total", "outcome" => outcome).increment(1);
}
