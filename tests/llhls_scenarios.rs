//! LL-HLS blocking playlist reload scenarios, driven through the public
//! manager/handler pair the way an embedding HTTP server would.

use futures_util::future::join_all;
use hlskit::config::LLHLSConfig;
use hlskit::error::LLHLSError;
use hlskit::llhls::{LLHLSManager, PlaylistRequest};
use std::time::Duration;

#[tokio::test]
async fn concurrent_waiters_resolve_once_the_requested_partial_lands() {
    let manager = LLHLSManager::new(LLHLSConfig::low_latency());
    let handler = manager.attach_blocking_handler();

    let waiters = (0..3).map(|_| {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler.await_playlist(PlaylistRequest { msn: 0, part_index: Some(2) }, Duration::from_secs(2)).await
        })
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handler.pending_request_count(), 3);

    manager.add_partial(0.33334, true, false, None).await.unwrap();
    manager.add_partial(0.33334, false, false, None).await.unwrap();
    manager.add_partial(0.33334, false, false, None).await.unwrap();

    let results = join_all(waiters).await;
    for result in results {
        let rendered = result.unwrap().unwrap();
        assert!(rendered.contains("#EXT-X-PART:"));
    }
    assert_eq!(handler.pending_request_count(), 0);
}

#[tokio::test]
async fn a_request_for_an_unreachable_sequence_times_out() {
    let manager = LLHLSManager::new(LLHLSConfig::low_latency());
    let handler = manager.attach_blocking_handler();

    let err = handler
        .await_playlist(PlaylistRequest { msn: 999, part_index: None }, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert_eq!(err, LLHLSError::RequestTimeout);
}

#[tokio::test]
async fn delta_playlist_skips_segments_older_than_the_skip_window() {
    let manager = LLHLSManager::new(LLHLSConfig::low_latency());
    for i in 0..8u32 {
        manager.add_partial(0.33334, true, false, None).await.unwrap();
        manager.complete_segment(2.0, format!("seg_{i}.m4s"), None, false).await.unwrap();
    }

    let full = manager.render_full_playlist().await;
    let delta = manager.render_delta_playlist().await.expect("enough completed segments to skip some");

    assert!(full.contains("seg_0.m4s"));
    assert!(delta.contains("#EXT-X-SKIP:SKIPPED-SEGMENTS="));
    assert!(!delta.contains("seg_0.m4s"));
}
