//! A time-windowed DVR playlist: on every `add_segment`, segments whose
//! `timestamp + duration` falls before `(latest t_end) - dvr_window_duration`
//! are evicted from the front, advancing the media sequence number.

use super::PlaylistCore;
use crate::config::DvrConfig;
use crate::manifest::generator::generate_media;
use crate::manifest::validator::{validate_media, ValidationReport};
use crate::segmenter::LiveSegment;
use std::sync::Arc;
use tokio::sync::Mutex;

struct State {
    core: PlaylistCore,
    window_duration: f64,
}

#[derive(Clone)]
pub struct DVRPlaylist {
    state: Arc<Mutex<State>>,
}

impl DVRPlaylist {
    pub fn new(config: DvrConfig) -> Self {
        let mut core = PlaylistCore::new(config.target_duration);
        core.playlist.independent_segments = true;
        Self { state: Arc::new(Mutex::new(State { core, window_duration: config.dvr_window_duration })) }
    }

    pub async fn add_segment(&self, live: &LiveSegment) {
        let mut state = self.state.lock().await;
        state.core.push_segment(live);

        let latest_t_end = live.timestamp + live.duration;
        let cutoff = latest_t_end - state.window_duration;
        while state.core.playlist.segments.len() > 1 {
            let front_t_end = state.core.timestamps[0] + state.core.playlist.segments[0].duration;
            if front_t_end < cutoff {
                state.core.evict_front();
            } else {
                break;
            }
        }
    }

    pub async fn mark_discontinuity(&self) {
        self.state.lock().await.core.mark_discontinuity();
    }

    pub async fn render(&self) -> String {
        generate_media(&self.state.lock().await.core.playlist)
    }

    /// Returns the playlist beginning with the first retained segment whose
    /// `timestamp >= live_edge + offset_seconds`. `offset_seconds` is
    /// expected to be negative (seconds behind the live edge); `None` if no
    /// retained segment satisfies it.
    pub async fn render_from_offset(&self, offset_seconds: f64) -> Option<String> {
        let state = self.state.lock().await;
        let live_edge = state
            .core
            .timestamps
            .last()
            .copied()
            .unwrap_or(0.0)
            + state.core.playlist.segments.last().map(|s| s.duration).unwrap_or(0.0);
        let threshold = live_edge + offset_seconds;
        let start = state.core.timestamps.iter().position(|&t| t >= threshold)?;

        let mut trimmed = state.core.playlist.clone();
        trimmed.segments = trimmed.segments.split_off(start);
        trimmed.media_sequence += start as u32;
        Some(generate_media(&trimmed))
    }

    pub async fn validate(&self) -> ValidationReport {
        validate_media(&self.state.lock().await.core.playlist)
    }

    pub async fn retained_duration(&self) -> f64 {
        self.state.lock().await.core.playlist.segments.iter().map(|s| s.duration).sum()
    }

    pub async fn segment_count(&self) -> usize {
        self.state.lock().await.core.playlist.segments.len()
    }

    pub async fn media_sequence(&self) -> u32 {
        self.state.lock().await.core.playlist.media_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(index: u32, timestamp: f64, duration: f64) -> LiveSegment {
        LiveSegment {
            index,
            data: vec![0],
            duration,
            timestamp,
            is_independent: true,
            program_date_time: None,
            filename: format!("seg_{index}.m4s"),
            frame_count: 1,
            codecs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn evicts_segments_older_than_window_from_front() {
        let playlist = DVRPlaylist::new(DvrConfig { dvr_window_duration: 20.0, target_duration: 6.0 });
        for i in 0..6 {
            playlist.add_segment(&seg(i, i as f64 * 6.0, 6.0)).await;
        }
        // latest t_end = 30 + 6 = 36, cutoff = 16: segments ending before 16 evicted (seg0 ends 6, seg1 ends 12, seg2 ends 18 stays)
        assert_eq!(playlist.segment_count().await, 4);
        assert_eq!(playlist.media_sequence().await, 2);
    }

    #[tokio::test]
    async fn render_from_offset_trims_to_requested_point() {
        let playlist = DVRPlaylist::new(DvrConfig { dvr_window_duration: 60.0, target_duration: 6.0 });
        for i in 0..5 {
            playlist.add_segment(&seg(i, i as f64 * 6.0, 6.0)).await;
        }
        let rendered = playlist.render_from_offset(-12.0).await.unwrap();
        assert!(rendered.contains("seg_3.m4s"));
        assert!(!rendered.contains("seg_0.m4s"));
    }
}
