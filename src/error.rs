//! Crate-wide error taxonomy.
//!
//! Each subsystem gets its own narrow error enum so a caller only
//! handling, say, CMAF parsing isn't forced to match on LL-HLS variants.
//! [`HlsKitError`] wraps all of them for call sites that want one type.

use thiserror::Error;

/// Errors raised while lexing or parsing HLS tag lines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserError {
    #[error("line {line}: missing #EXTM3U header")]
    MissingExtM3U { line: usize },
    #[error("line {line}: duplicate tag {tag}")]
    DuplicateTag { line: usize, tag: String },
    #[error("line {line}: malformed attribute in {tag}: {reason}")]
    MalformedAttribute {
        line: usize,
        tag: String,
        reason: String,
    },
    #[error("line {line}: URI with no preceding EXTINF/EXT-X-STREAM-INF")]
    OrphanUri { line: usize },
    #[error("line {line}: value out of range in {tag}: {reason}")]
    OutOfRange {
        line: usize,
        tag: String,
        reason: String,
    },
    #[error("line {line}: unknown enum value for {tag}: {value}")]
    UnknownEnum {
        line: usize,
        tag: String,
        value: String,
    },
}

impl ParserError {
    pub fn line(&self) -> usize {
        match self {
            ParserError::MissingExtM3U { line }
            | ParserError::DuplicateTag { line, .. }
            | ParserError::MalformedAttribute { line, .. }
            | ParserError::OrphanUri { line }
            | ParserError::OutOfRange { line, .. }
            | ParserError::UnknownEnum { line, .. } => *line,
        }
    }
}

/// Severity of a single [`crate::manifest::validator::ValidationReport`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Errors raised by the live segmentation pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SegmentationError {
    #[error("frame timestamp {got} is before the last ingested timestamp {last}")]
    OutOfOrderTimestamp { last: f64, got: f64 },
    #[error("frame carries no sample data")]
    EmptyFrame,
    #[error("first frame ingested by a keyframe-aligned video segmenter must be a keyframe")]
    KeyframeExpected,
    #[error("ingest called after finish()")]
    Finished,
}

/// Errors raised while building or reading CMAF/fMP4 boxes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CmafError {
    #[error("box {fourcc} truncated: expected {expected} bytes, found {found}")]
    TruncatedBox {
        fourcc: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid box size {size} for box {fourcc}")]
    InvalidSize { fourcc: String, size: u64 },
    #[error("required box {fourcc} missing from {context}")]
    UnknownRequiredBox { fourcc: String, context: String },
}

/// Errors raised by the LL-HLS manager and blocking handler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LLHLSError {
    #[error("blocking playlist request timed out")]
    RequestTimeout,
    #[error("stream already ended")]
    StreamAlreadyEnded,
    #[error("invalid partial segment: {reason}")]
    InvalidPartial { reason: String },
    #[error("segment already has {max} partials (max_partials_per_segment)")]
    TooManyPartials { max: u16 },
    #[error("await_playlist cancelled")]
    AwaitCancelled,
}

/// Errors raised by an external [`crate::external::SegmentPusher`] implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PushError {
    #[error("pusher is not connected")]
    NotConnected,
    #[error("connection failed: {underlying}")]
    ConnectionFailed { underlying: String },
    #[error("invalid pusher configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

/// Errors raised by an external [`crate::external::Transcoder`] implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscodingError {
    #[error("no transcoder is available in this build")]
    TranscoderNotAvailable,
    #[error("encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

/// Crate-wide error, aggregating every subsystem's error family.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HlsKitError {
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
    #[error(transparent)]
    Cmaf(#[from] CmafError),
    #[error(transparent)]
    LLHLS(#[from] LLHLSError),
    #[error(transparent)]
    Push(#[from] PushError),
    #[error(transparent)]
    Transcoding(#[from] TranscodingError),
}
