//! HLSKit: a library for producing, parsing, validating, and pushing HTTP
//! Live Streaming manifests and media segments, with first-class support
//! for live streaming, Low-Latency HLS, fragmented MP4 (CMAF), and
//! interstitials.
//!
//! HLSKit never opens a socket or touches a filesystem path itself — see
//! [`external`] for the trait contracts an embedding service implements to
//! push segments and playlists somewhere real.

pub mod binary;
pub mod cmaf;
pub mod config;
pub mod error;
pub mod external;
pub mod interstitial;
pub mod llhls;
pub mod manifest;
pub mod metrics;
pub mod playlist;
pub mod segmenter;
pub mod tag;
pub mod webvtt;

pub use error::HlsKitError;
