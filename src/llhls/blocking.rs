//! Suspends a caller until an [`LLHLSManager`]'s state reaches a requested
//! media sequence number (and, optionally, partial index), then returns the
//! rendered playlist (spec §4.8).

use super::manager::LLHLSManager;
use crate::error::LLHLSError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A blocking playlist request: `(msn, part_index)`. `part_index = None`
/// means "wait for the whole segment", not just one of its partials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub msn: u32,
    pub part_index: Option<u16>,
}

/// Observes one [`LLHLSManager`], woken on every mutation via
/// [`LLHLSManager::attach_blocking_handler`]. Cloning shares the same
/// pending-request counter.
#[derive(Clone)]
pub struct BlockingPlaylistHandler {
    manager: LLHLSManager,
    pending: Arc<AtomicUsize>,
}

impl BlockingPlaylistHandler {
    pub fn new(manager: LLHLSManager) -> Self {
        Self { manager, pending: Arc::new(AtomicUsize::new(0)) }
    }

    /// Suspends until the manager's state reaches `request`, or `timeout`
    /// elapses, or the manager ends while this request is still pending.
    pub async fn await_playlist(&self, request: PlaylistRequest, timeout: Duration) -> Result<String, LLHLSError> {
        if self.manager.reaches(request.msn, request.part_index).await {
            return Ok(self.manager.render_full_playlist().await);
        }
        if self.manager.has_ended().await {
            return Err(LLHLSError::StreamAlreadyEnded);
        }

        self.pending.fetch_add(1, Ordering::SeqCst);
        let notify = self.manager.notify_handle();
        let deadline = tokio::time::Instant::now() + timeout;

        let outcome = loop {
            // Register as a waiter (and capture any wakeup already pending)
            // before re-checking state, so a mutation racing in between the
            // check and the wait can never be missed.
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.manager.reaches(request.msn, request.part_index).await {
                break Ok(self.manager.render_full_playlist().await);
            }
            if self.manager.has_ended().await {
                break Err(LLHLSError::StreamAlreadyEnded);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break Err(LLHLSError::RequestTimeout);
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                break Err(LLHLSError::RequestTimeout);
            }
        };

        self.pending.fetch_sub(1, Ordering::SeqCst);
        if let Err(ref err) = outcome {
            tracing::warn!(msn = request.msn, part_index = ?request.part_index, ?err, "blocking playlist request did not resolve");
        }
        outcome
    }

    pub fn pending_request_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLHLSConfig;

    #[tokio::test]
    async fn completes_once_requested_partial_appears() {
        let manager = LLHLSManager::new(LLHLSConfig::low_latency());
        let handler = BlockingPlaylistHandler::new(manager.clone());

        let waiter = tokio::spawn({
            let handler = handler.clone();
            async move { handler.await_playlist(PlaylistRequest { msn: 0, part_index: Some(2) }, Duration::from_secs(2)).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handler.pending_request_count(), 1);

        manager.add_partial(0.33, true, false, None).await.unwrap();
        manager.add_partial(0.33, false, false, None).await.unwrap();
        manager.add_partial(0.33, false, false, None).await.unwrap();

        let rendered = waiter.await.unwrap().unwrap();
        assert!(rendered.contains("#EXT-X-PART:"));
        assert_eq!(handler.pending_request_count(), 0);
    }

    #[tokio::test]
    async fn times_out_on_an_empty_manager() {
        let manager = LLHLSManager::new(LLHLSConfig::low_latency());
        let handler = BlockingPlaylistHandler::new(manager);
        let err = handler.await_playlist(PlaylistRequest { msn: 999, part_index: None }, Duration::from_millis(200)).await.unwrap_err();
        assert_eq!(err, LLHLSError::RequestTimeout);
    }

    #[tokio::test]
    async fn fails_with_stream_already_ended_while_pending() {
        let manager = LLHLSManager::new(LLHLSConfig::low_latency());
        let handler = BlockingPlaylistHandler::new(manager.clone());

        let waiter = tokio::spawn({
            let handler = handler.clone();
            async move { handler.await_playlist(PlaylistRequest { msn: 5, part_index: None }, Duration::from_secs(2)).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.end_stream().await;
        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err, LLHLSError::StreamAlreadyEnded);
    }
}
