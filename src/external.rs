//! Trait contracts HLSKit consumes but never implements itself: pushing
//! rendered playlists and segments somewhere real, and (optionally)
//! transcoding. HLSKit never opens a socket or touches a filesystem path —
//! an embedding service supplies these (spec §6).

use crate::error::{PushError, TranscodingError};
use crate::llhls::LLPartialSegment;
use crate::segmenter::LiveSegment;
use async_trait::async_trait;

/// Connection lifecycle state of a [`SegmentPusher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Cumulative counters a pusher exposes for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PushStats {
    pub success_count: u64,
    pub failure_count: u64,
    pub total_bytes_pushed: u64,
}

/// Delivers rendered playlists and media to wherever they actually live —
/// object storage, a CDN origin, a local directory. Core code calls this
/// trait; it never performs I/O directly.
#[async_trait]
pub trait SegmentPusher: Send + Sync {
    async fn connect(&self) -> Result<(), PushError>;
    async fn disconnect(&self) -> Result<(), PushError>;
    async fn push_segment(&self, segment: &LiveSegment, filename: &str) -> Result<(), PushError>;
    async fn push_partial(&self, partial: &LLPartialSegment, filename: &str) -> Result<(), PushError>;
    async fn push_playlist(&self, text: &str, filename: &str) -> Result<(), PushError>;
    async fn push_init_segment(&self, bytes: &[u8], filename: &str) -> Result<(), PushError>;
    fn connection_state(&self) -> ConnectionState;
    fn stats(&self) -> PushStats;
}

/// Transcodes sample data between codecs. Platform-specific implementations
/// (hardware encoders, a vendored library) live outside this crate; builds
/// without one fall back to [`NoTranscoder`].
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &[u8], target_codec: &str) -> Result<Vec<u8>, TranscodingError>;
}

/// A `SegmentPusher` that never connects; every call returns
/// [`PushError::NotConnected`]. Useful as a default for builds that
/// validate and render manifests without an attached transport.
pub struct NoSegmentPusher;

#[async_trait]
impl SegmentPusher for NoSegmentPusher {
    async fn connect(&self) -> Result<(), PushError> {
        Err(PushError::NotConnected)
    }

    async fn disconnect(&self) -> Result<(), PushError> {
        Ok(())
    }

    async fn push_segment(&self, _segment: &LiveSegment, _filename: &str) -> Result<(), PushError> {
        Err(PushError::NotConnected)
    }

    async fn push_partial(&self, _partial: &LLPartialSegment, _filename: &str) -> Result<(), PushError> {
        Err(PushError::NotConnected)
    }

    async fn push_playlist(&self, _text: &str, _filename: &str) -> Result<(), PushError> {
        Err(PushError::NotConnected)
    }

    async fn push_init_segment(&self, _bytes: &[u8], _filename: &str) -> Result<(), PushError> {
        Err(PushError::NotConnected)
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    fn stats(&self) -> PushStats {
        PushStats::default()
    }
}

/// A `Transcoder` available in builds with no platform-specific codec
/// support wired in; always reports unavailable.
pub struct NoTranscoder;

#[async_trait]
impl Transcoder for NoTranscoder {
    async fn transcode(&self, _input: &[u8], _target_codec: &str) -> Result<Vec<u8>, TranscodingError> {
        Err(TranscodingError::TranscoderNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_segment_pusher_always_reports_not_connected() {
        let pusher = NoSegmentPusher;
        assert_eq!(pusher.connect().await, Err(PushError::NotConnected));
        assert_eq!(pusher.connection_state(), ConnectionState::Disconnected);
        assert_eq!(pusher.stats(), PushStats::default());
    }

    #[tokio::test]
    async fn no_transcoder_always_unavailable() {
        let transcoder = NoTranscoder;
        let err = transcoder.transcode(&[1, 2, 3], "hevc").await.unwrap_err();
        assert_eq!(err, TranscodingError::TranscoderNotAvailable);
    }
}
