//! End-to-end playlist scenarios: build a live segment stream through one
//! of the playlist engines, render it, parse it back, and check the
//! resulting typed model.

use chrono::Utc;
use hlskit::config::{DvrConfig, SlidingWindowConfig};
use hlskit::manifest::model::{Playlist, PlaylistType};
use hlskit::manifest::parser::parse;
use hlskit::playlist::{DVRPlaylist, EventPlaylist, SlidingWindowPlaylist};
use hlskit::segmenter::LiveSegment;

fn segment(index: u32, duration: f64) -> LiveSegment {
    LiveSegment {
        index,
        data: vec![0u8; 4],
        duration,
        timestamp: index as f64 * duration,
        is_independent: true,
        program_date_time: Some(Utc::now()),
        filename: format!("segment_{index}.m4s"),
        frame_count: 1,
        codecs: vec!["avc1.64001f".to_string()],
    }
}

fn as_media(playlist: Playlist) -> hlskit::manifest::model::MediaPlaylist {
    match playlist {
        Playlist::Media(media) => media,
        Playlist::Master(_) => panic!("expected a media playlist"),
    }
}

#[tokio::test]
async fn sliding_window_keeps_the_three_most_recent_segments() {
    let playlist = SlidingWindowPlaylist::new(SlidingWindowConfig {
        window_size: 3,
        target_duration: 6.006,
        init_segment_uri: None,
    });
    for i in 0..5 {
        playlist.add_segment(&segment(i, 6.006)).await;
    }

    let rendered = playlist.render().await;
    let parsed = as_media(parse(&rendered).unwrap());

    assert_eq!(parsed.segments.len(), 3);
    assert_eq!(parsed.media_sequence, 2);
    assert_eq!(parsed.target_duration, 7);
    assert_eq!(parsed.segments[0].uri, "segment_2.m4s");
    assert!(!parsed.has_endlist);
}

#[tokio::test]
async fn event_playlist_stays_event_typed_after_ending() {
    let playlist = EventPlaylist::new(6.0);
    for i in 0..5 {
        playlist.add_segment(&segment(i, 6.0)).await;
    }
    let rendered = playlist.end_stream().await;
    let parsed = as_media(parse(&rendered).unwrap());

    assert_eq!(parsed.playlist_type, Some(PlaylistType::Event));
    assert!(parsed.has_endlist);
    assert_eq!(parsed.segments.len(), 5);
}

#[tokio::test]
async fn discontinuity_marks_only_the_segment_it_was_inserted_before() {
    let playlist = SlidingWindowPlaylist::new(SlidingWindowConfig {
        window_size: 10,
        target_duration: 6.0,
        init_segment_uri: None,
    });
    playlist.add_segment(&segment(0, 6.0)).await;
    playlist.add_segment(&segment(1, 6.0)).await;
    playlist.mark_discontinuity().await;
    playlist.add_segment(&segment(2, 6.0)).await;

    let rendered = playlist.render().await;
    let parsed = as_media(parse(&rendered).unwrap());

    assert!(!parsed.segments[0].discontinuity);
    assert!(!parsed.segments[1].discontinuity);
    assert!(parsed.segments[2].discontinuity);
}

#[tokio::test]
async fn dvr_playlist_evicts_segments_older_than_the_window_and_supports_seek() {
    let playlist = DVRPlaylist::new(DvrConfig { dvr_window_duration: 12.0, target_duration: 6.0 });
    for i in 0..6 {
        playlist.add_segment(&segment(i, 6.0)).await;
    }
    // Window is 12s = 2 segments; the newest add should have trimmed
    // everything older than (latest_end - 12.0).
    assert!(playlist.segment_count().await <= 3);

    let trimmed = playlist.render_from_offset(-6.0).await;
    assert!(trimmed.is_some());
}
