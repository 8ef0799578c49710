//! A fixed-size sliding-window live playlist: the oldest segment is evicted
//! and the media sequence number advances each time the window overflows.

use super::PlaylistCore;
use crate::config::SlidingWindowConfig;
use crate::manifest::generator::generate_media;
use crate::manifest::model::Map;
use crate::manifest::validator::{validate_media, ValidationReport};
use crate::segmenter::LiveSegment;
use std::sync::Arc;
use tokio::sync::Mutex;

struct State {
    core: PlaylistCore,
    window_size: u32,
}

/// Actor-style handle; cloning shares the same underlying playlist state.
#[derive(Clone)]
pub struct SlidingWindowPlaylist {
    state: Arc<Mutex<State>>,
}

impl SlidingWindowPlaylist {
    pub fn new(config: SlidingWindowConfig) -> Self {
        let mut core = PlaylistCore::new(config.target_duration);
        core.playlist.independent_segments = true;
        if let Some(uri) = config.init_segment_uri {
            core.playlist.map = Some(Map { uri, byte_range: None });
        }
        Self { state: Arc::new(Mutex::new(State { core, window_size: config.window_size })) }
    }

    pub async fn add_segment(&self, live: &LiveSegment) {
        let mut state = self.state.lock().await;
        state.core.push_segment(live);
        while state.core.playlist.segments.len() as u32 > state.window_size {
            state.core.evict_front();
        }
    }

    pub async fn mark_discontinuity(&self) {
        self.state.lock().await.core.mark_discontinuity();
    }

    pub async fn render(&self) -> String {
        generate_media(&self.state.lock().await.core.playlist)
    }

    pub async fn validate(&self) -> ValidationReport {
        validate_media(&self.state.lock().await.core.playlist)
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
    use crate::segmenter::{FrameKind, LiveSegment};

    fn seg(index: u32, duration: f64) -> LiveSegment {
        LiveSegment {
            index,
            data: vec![0],
            duration,
            timestamp: index as f64 * duration,
            is_independent: true,
            program_date_time: None,
            filename: format!("seg_{index}.m4s"),
            frame_count: 1,
            codecs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn evicts_oldest_segment_past_window_size() {
        let playlist = SlidingWindowPlaylist::new(SlidingWindowConfig {
            window_size: 3,
            target_duration: 6.0,
            init_segment_uri: None,
        });
        for i in 0..5 {
            playlist.add_segment(&seg(i, 6.0)).await;
        }
        assert_eq!(playlist.segment_count().await, 3);
        assert_eq!(playlist.media_sequence().await, 2);
        let rendered = playlist.render().await;
        assert!(rendered.contains("seg_4.m4s"));
        assert!(!rendered.contains("seg_0.m4s"));
        let _ = FrameKind::Video;
    }

    #[tokio::test]
    async fn discontinuity_attaches_to_next_added_segment() {
        let playlist = SlidingWindowPlaylist::new(SlidingWindowConfig {
            window_size: 5,
            target_duration: 6.0,
            init_segment_uri: None,
        });
        playlist.add_segment(&seg(0, 6.0)).await;
        playlist.mark_discontinuity().await;
        playlist.add_segment(&seg(1, 6.0)).await;
        let rendered = playlist.render().await;
        let lines: Vec<&str> = rendered.lines().collect();
        let seg1_pos = lines.iter().position(|l| l.contains("seg_1.m4s")).unwrap();
        assert!(lines[..seg1_pos].iter().rev().take(3).any(|l| *l == "#EXT-X-DISCONTINUITY"));
    }
}
