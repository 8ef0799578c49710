//! An append-only "event" playlist: every segment added stays in the
//! manifest forever (media sequence never advances) until `end_stream()`
//! appends `EXT-X-ENDLIST`. The declared `EXT-X-PLAYLIST-TYPE:EVENT` does
//! not change on end — a finished event playlist is still type EVENT, just
//! closed.

use super::PlaylistCore;
use crate::manifest::generator::generate_media;
use crate::manifest::model::PlaylistType;
use crate::manifest::validator::{validate_media, ValidationReport};
use crate::segmenter::LiveSegment;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct EventPlaylist {
    state: Arc<Mutex<PlaylistCore>>,
}

impl EventPlaylist {
    pub fn new(target_duration: f64) -> Self {
        let mut core = PlaylistCore::new(target_duration);
        core.playlist.playlist_type = Some(PlaylistType::Event);
        core.playlist.independent_segments = true;
        Self { state: Arc::new(Mutex::new(core)) }
    }

    pub async fn add_segment(&self, live: &LiveSegment) {
        self.state.lock().await.push_segment(live);
    }

    pub async fn mark_discontinuity(&self) {
        self.state.lock().await.mark_discontinuity();
    }

    /// Appends `EXT-X-ENDLIST` and returns the final rendered playlist text.
    pub async fn end_stream(&self) -> String {
        let mut state = self.state.lock().await;
        state.playlist.has_endlist = true;
        generate_media(&state.playlist)
    }

    pub async fn render(&self) -> String {
        generate_media(&self.state.lock().await.playlist)
    }

    pub async fn validate(&self) -> ValidationReport {
        validate_media(&self.state.lock().await.playlist)
    }

    pub async fn segment_count(&self) -> usize {
        self.state.lock().await.playlist.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(index: u32) -> LiveSegment {
        LiveSegment {
            index,
            data: vec![0],
            duration: 6.0,
            timestamp: index as f64 * 6.0,
            is_independent: true,
            program_date_time: None,
            filename: format!("seg_{index}.m4s"),
            frame_count: 1,
            codecs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn never_evicts_and_ends_with_endlist_still_event_type() {
        let playlist = EventPlaylist::new(6.0);
        for i in 0..5 {
            playlist.add_segment(&seg(i)).await;
        }
        assert_eq!(playlist.segment_count().await, 5);
        let rendered_live = playlist.render().await;
        assert!(rendered_live.contains("EXT-X-PLAYLIST-TYPE:EVENT"));
        assert!(!rendered_live.contains("EXT-X-ENDLIST"));

        let rendered_closed = playlist.end_stream().await;
        assert!(rendered_closed.contains("EXT-X-PLAYLIST-TYPE:EVENT"));
        assert!(rendered_closed.contains("EXT-X-ENDLIST"));
        assert_eq!(playlist.segment_count().await, 5);
    }
}
