//! Low-Latency HLS: partial-segment tracking, retention, and blocking
//! playlist reload (spec §4.7, §4.8).

pub mod blocking;
pub mod manager;

pub use blocking::{BlockingPlaylistHandler, PlaylistRequest};
pub use manager::{LLHLSManager, LLPartialSegment, LivePlaylistMetadata};
