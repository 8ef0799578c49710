//! Line-oriented HLS tag lexer/formatter (spec §4.3). [`parser`] turns a
//! stream of lines into typed [`Tag`] events; [`writer`] turns them back
//! into canonical text.

pub mod parser;
pub mod writer;

use serde::{Deserialize, Serialize};

/// Value of a single `KEY=value` attribute, as specified by spec §4.3's
/// attribute grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    QuotedString(String),
    Decimal(f64),
    HexInt(u64),
    Enum(String),
    Resolution(u32, u32),
}

impl AttrValue {
    pub fn as_quoted_string(&self) -> Option<&str> {
        match self {
            AttrValue::QuotedString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            AttrValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_hex(&self) -> Option<u64> {
        match self {
            AttrValue::HexInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttrValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_resolution(&self) -> Option<(u32, u32)> {
        match self {
            AttrValue::Resolution(w, h) => Some((*w, *h)),
            _ => None,
        }
    }
}

/// An ordered attribute list, preserving the order attributes were parsed
/// or should be written in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(pub Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }
}

/// A single parsed tag line, minus the leading `#` and trailing newline.
///
/// `line` is non-KEY=VALUE tags' tag_kind discriminator paired with a
/// generic [`Attributes`] bag — downstream ([`crate::manifest::parser`])
/// interprets the bag per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagEvent {
    /// `#EXTM3U` header.
    ExtM3u,
    /// A recognized `#EXT-X-*`/`#EXTINF` tag with its attribute bag.
    Tag { kind: TagKind, attributes: Attributes },
    /// A line that is a URI (not starting with `#`).
    Uri(String),
    /// A comment or vendor extension tag this parser doesn't need to
    /// interpret; retained so the generator can round-trip it if desired.
    Unknown(String),
}

/// The tag names spec §4.3 requires support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Version,
    TargetDuration,
    MediaSequence,
    DiscontinuitySequence,
    PlaylistType,
    Extinf,
    ByteRange,
    Discontinuity,
    Key,
    Map,
    ProgramDateTime,
    Gap,
    EndList,
    IndependentSegments,
    StreamInf,
    IFrameStreamInf,
    Media,
    SessionData,
    SessionKey,
    ContentSteering,
    DateRange,
    ServerControl,
    PartInf,
    Part,
    PreloadHint,
    RenditionReport,
    Skip,
}

impl TagKind {
    pub fn tag_name(self) -> &'static str {
        match self {
            TagKind::Version => "EXT-X-VERSION",
            TagKind::TargetDuration => "EXT-X-TARGETDURATION",
            TagKind::MediaSequence => "EXT-X-MEDIA-SEQUENCE",
            TagKind::DiscontinuitySequence => "EXT-X-DISCONTINUITY-SEQUENCE",
            TagKind::PlaylistType => "EXT-X-PLAYLIST-TYPE",
            TagKind::Extinf => "EXTINF",
            TagKind::ByteRange => "EXT-X-BYTERANGE",
            TagKind::Discontinuity => "EXT-X-DISCONTINUITY",
            TagKind::Key => "EXT-X-KEY",
            TagKind::Map => "EXT-X-MAP",
            TagKind::ProgramDateTime => "EXT-X-PROGRAM-DATE-TIME",
            TagKind::Gap => "EXT-X-GAP",
            TagKind::EndList => "EXT-X-ENDLIST",
            TagKind::IndependentSegments => "EXT-X-INDEPENDENT-SEGMENTS",
            TagKind::StreamInf => "EXT-X-STREAM-INF",
            TagKind::IFrameStreamInf => "EXT-X-I-FRAME-STREAM-INF",
            TagKind::Media => "EXT-X-MEDIA",
            TagKind::SessionData => "EXT-X-SESSION-DATA",
            TagKind::SessionKey => "EXT-X-SESSION-KEY",
            TagKind::ContentSteering => "EXT-X-CONTENT-STEERING",
            TagKind::DateRange => "EXT-X-DATERANGE",
            TagKind::ServerControl => "EXT-X-SERVER-CONTROL",
            TagKind::PartInf => "EXT-X-PART-INF",
            TagKind::Part => "EXT-X-PART",
            TagKind::PreloadHint => "EXT-X-PRELOAD-HINT",
            TagKind::RenditionReport => "EXT-X-RENDITION-REPORT",
            TagKind::Skip => "EXT-X-SKIP",
        }
    }

    /// Tags whose value is a comma-separated `KEY=value` attribute list
    /// rather than a bare positional value.
    pub fn is_attribute_list(self) -> bool {
        !matches!(
            self,
            TagKind::Version
                | TagKind::TargetDuration
                | TagKind::MediaSequence
                | TagKind::DiscontinuitySequence
                | TagKind::PlaylistType
                | TagKind::Extinf
                | TagKind::ByteRange
                | TagKind::ProgramDateTime
        )
    }

    fn from_tag_name(name: &str) -> Option<Self> {
        Some(match name {
            "EXT-X-VERSION" => TagKind::Version,
            "EXT-X-TARGETDURATION" => TagKind::TargetDuration,
            "EXT-X-MEDIA-SEQUENCE" => TagKind::MediaSequence,
            "EXT-X-DISCONTINUITY-SEQUENCE" => TagKind::DiscontinuitySequence,
            "EXT-X-PLAYLIST-TYPE" => TagKind::PlaylistType,
            "EXTINF" => TagKind::Extinf,
            "EXT-X-BYTERANGE" => TagKind::ByteRange,
            "EXT-X-DISCONTINUITY" => TagKind::Discontinuity,
            "EXT-X-KEY" => TagKind::Key,
            "EXT-X-MAP" => TagKind::Map,
            "EXT-X-PROGRAM-DATE-TIME" => TagKind::ProgramDateTime,
            "EXT-X-GAP" => TagKind::Gap,
            "EXT-X-ENDLIST" => TagKind::EndList,
            "EXT-X-INDEPENDENT-SEGMENTS" => TagKind::IndependentSegments,
            "EXT-X-STREAM-INF" => TagKind::StreamInf,
            "EXT-X-I-FRAME-STREAM-INF" => TagKind::IFrameStreamInf,
            "EXT-X-MEDIA" => TagKind::Media,
            "EXT-X-SESSION-DATA" => TagKind::SessionData,
            "EXT-X-SESSION-KEY" => TagKind::SessionKey,
            "EXT-X-CONTENT-STEERING" => TagKind::ContentSteering,
            "EXT-X-DATERANGE" => TagKind::DateRange,
            "EXT-X-SERVER-CONTROL" => TagKind::ServerControl,
            "EXT-X-PART-INF" => TagKind::PartInf,
            "EXT-X-PART" => TagKind::Part,
            "EXT-X-PRELOAD-HINT" => TagKind::PreloadHint,
            "EXT-X-RENDITION-REPORT" => TagKind::RenditionReport,
            "EXT-X-SKIP" => TagKind::Skip,
            _ => return None,
        })
    }

    /// Tags that carry no value at all (no colon, no attributes).
    fn is_bare(name: &str) -> bool {
        matches!(
            name,
            "EXTM3U" | "EXT-X-DISCONTINUITY" | "EXT-X-GAP" | "EXT-X-ENDLIST" | "EXT-X-INDEPENDENT-SEGMENTS"
        )
    }
}
