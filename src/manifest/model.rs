//! Typed manifest entities (spec §3): the in-memory representation a
//! parser builds and a generator renders back to text.

use serde::{Deserialize, Serialize};

/// A byte range (`EXT-X-BYTERANGE`, or the `BYTERANGE` attribute on a
/// `EXT-X-MAP`/`EXT-X-PART`/`EXT-X-PRELOAD-HINT`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ByteRange {
    pub length: u64,
    pub offset: Option<u64>,
}

/// `EXT-X-MAP`: the initialization segment for a media playlist's segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub uri: String,
    pub byte_range: Option<ByteRange>,
}

/// `EXT-X-KEY` / `EXT-X-SESSION-KEY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub method: String,
    pub uri: Option<String>,
    pub iv: Option<String>,
    pub keyformat: Option<String>,
    pub keyformatversions: Option<String>,
}

/// `EXT-X-DATERANGE`: a time-bounded metadata event in the media timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub id: String,
    pub class: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub duration: Option<f64>,
    pub planned_duration: Option<f64>,
    pub scte35_cmd: Option<String>,
    pub scte35_out: Option<String>,
    pub scte35_in: Option<String>,
    pub end_on_next: bool,
    /// `X-<CLIENT-ATTRIBUTE>` entries not covered by the named fields above.
    pub custom_attributes: Vec<(String, String)>,
}

/// A manifest-level segment entry (spec §3, "Segment (manifest)").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub duration: f64,
    pub uri: String,
    pub discontinuity: bool,
    pub byte_range: Option<ByteRange>,
    pub map: Option<Map>,
    pub program_date_time: Option<String>,
    pub key: Option<Key>,
    pub is_gap: bool,
    pub date_range: Option<DateRange>,
}

impl Segment {
    pub fn new(duration: f64, uri: impl Into<String>) -> Self {
        Self {
            duration,
            uri: uri.into(),
            discontinuity: false,
            byte_range: None,
            map: None,
            program_date_time: None,
            key: None,
            is_gap: false,
            date_range: None,
        }
    }
}

/// `EXT-X-PLAYLIST-TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistType {
    Vod,
    Event,
}

impl PlaylistType {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaylistType::Vod => "VOD",
            PlaylistType::Event => "EVENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VOD" => Some(PlaylistType::Vod),
            "EVENT" => Some(PlaylistType::Event),
            _ => None,
        }
    }
}

/// `EXT-X-SERVER-CONTROL` (LL-HLS).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerControl {
    pub can_block_reload: bool,
    pub can_skip_until: Option<f64>,
    pub hold_back: Option<f64>,
    pub part_hold_back: Option<f64>,
    pub can_skip_dateranges: bool,
}

/// `EXT-X-PART-INF` (LL-HLS).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartInf {
    pub part_target: f64,
}

/// `EXT-X-PART` (LL-HLS partial segment as it appears in a rendered
/// playlist — distinct from [`crate::llhls`]'s in-flight `LLPartialSegment`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub duration: f64,
    pub uri: String,
    pub is_independent: bool,
    pub is_gap: bool,
    pub byte_range: Option<ByteRange>,
}

/// `EXT-X-PRELOAD-HINT` (LL-HLS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadHint {
    pub hint_type: String,
    pub uri: String,
    pub byte_range_start: Option<u64>,
    pub byte_range_length: Option<u64>,
}

/// `EXT-X-RENDITION-REPORT` (LL-HLS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionReport {
    pub uri: String,
    pub last_msn: Option<u32>,
    pub last_part: Option<u16>,
}

/// A media playlist (spec §3, "MediaPlaylist").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaylist {
    pub version: u32,
    pub target_duration: u32,
    pub playlist_type: Option<PlaylistType>,
    pub media_sequence: u32,
    pub discontinuity_sequence: u32,
    pub segments: Vec<Segment>,
    pub date_ranges: Vec<DateRange>,
    pub has_endlist: bool,
    pub independent_segments: bool,
    pub map: Option<Map>,
    pub server_control: Option<ServerControl>,
    pub part_inf: Option<PartInf>,
    /// Partial segments (LL-HLS) grouped by owning segment, in the same
    /// order as `segments`/the currently-building segment. Empty for a
    /// playlist with no LL-HLS content.
    pub parts_by_segment: Vec<Vec<Part>>,
    pub preload_hint: Option<PreloadHint>,
    pub rendition_reports: Vec<RenditionReport>,
}

impl MediaPlaylist {
    pub fn new() -> Self {
        Self {
            version: 3,
            target_duration: 0,
            playlist_type: None,
            media_sequence: 0,
            discontinuity_sequence: 0,
            segments: Vec::new(),
            date_ranges: Vec::new(),
            has_endlist: false,
            independent_segments: false,
            map: None,
            server_control: None,
            part_inf: None,
            parts_by_segment: Vec::new(),
            preload_hint: None,
            rendition_reports: Vec::new(),
        }
    }
}

impl Default for MediaPlaylist {
    fn default() -> Self {
        Self::new()
    }
}

/// A CLOSED-CAPTIONS `INSTREAM-ID` value (spec §6): `CC1..CC4` (CEA-608)
/// or `SERVICE1..SERVICE63` (CEA-708).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InStreamId {
    Cc(u8),
    Service(u8),
}

impl InStreamId {
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(n) = s.strip_prefix("CC") {
            let n: u8 = n.parse().ok()?;
            if (1..=4).contains(&n) {
                return Some(InStreamId::Cc(n));
            }
            return None;
        }
        if let Some(n) = s.strip_prefix("SERVICE") {
            let n: u8 = n.parse().ok()?;
            if (1..=63).contains(&n) {
                return Some(InStreamId::Service(n));
            }
            return None;
        }
        None
    }

    pub fn format(self) -> String {
        match self {
            InStreamId::Cc(n) => format!("CC{n}"),
            InStreamId::Service(n) => format!("SERVICE{n}"),
        }
    }
}

/// `EXT-X-MEDIA`'s `TYPE` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Audio,
    Video,
    Subtitles,
    ClosedCaptions,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Audio => "AUDIO",
            MediaType::Video => "VIDEO",
            MediaType::Subtitles => "SUBTITLES",
            MediaType::ClosedCaptions => "CLOSED-CAPTIONS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AUDIO" => Some(MediaType::Audio),
            "VIDEO" => Some(MediaType::Video),
            "SUBTITLES" => Some(MediaType::Subtitles),
            "CLOSED-CAPTIONS" => Some(MediaType::ClosedCaptions),
            _ => None,
        }
    }
}

/// `EXT-X-MEDIA`: an alternative audio/video/subtitle/closed-caption
/// rendition linked to one or more variants by group id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub media_type: MediaType,
    pub group_id: String,
    pub name: String,
    pub language: Option<String>,
    pub assoc_language: Option<String>,
    pub is_default: bool,
    pub autoselect: bool,
    pub forced: bool,
    pub uri: Option<String>,
    pub instream_id: Option<InStreamId>,
    pub characteristics: Option<String>,
    pub channels: Option<String>,
}

/// A variant stream (`EXT-X-STREAM-INF` + its URI line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub resolution: Option<(u32, u32)>,
    pub codecs: Option<String>,
    pub frame_rate: Option<f64>,
    pub video_range: Option<String>,
    pub supplemental_codecs: Option<String>,
    pub uri: String,
    pub audio_group: Option<String>,
    pub video_group: Option<String>,
    pub subtitles_group: Option<String>,
    pub closed_captions_group: Option<String>,
}

/// An I-frame variant stream (`EXT-X-I-FRAME-STREAM-INF`, URI inline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IFrameVariant {
    pub bandwidth: u64,
    pub resolution: Option<(u32, u32)>,
    pub codecs: Option<String>,
    pub uri: String,
    pub video_group: Option<String>,
}

/// `EXT-X-SESSION-DATA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub data_id: String,
    pub value: Option<String>,
    pub uri: Option<String>,
    pub language: Option<String>,
}

/// `EXT-X-CONTENT-STEERING`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSteering {
    pub server_uri: String,
    pub pathway_id: Option<String>,
}

/// A master (multivariant) playlist (spec §3, "MasterPlaylist").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterPlaylist {
    pub version: u32,
    pub variants: Vec<Variant>,
    pub iframe_variants: Vec<IFrameVariant>,
    pub renditions: Vec<Rendition>,
    pub session_data: Vec<SessionData>,
    pub session_keys: Vec<Key>,
    pub content_steering: Option<ContentSteering>,
    pub independent_segments: bool,
}

impl MasterPlaylist {
    pub fn new() -> Self {
        Self {
            version: 3,
            variants: Vec::new(),
            iframe_variants: Vec::new(),
            renditions: Vec::new(),
            session_data: Vec::new(),
            session_keys: Vec::new(),
            content_steering: None,
            independent_segments: false,
        }
    }
}

impl Default for MasterPlaylist {
    fn default() -> Self {
        Self::new()
    }
}

/// Either parsed playlist kind, returned by [`crate::manifest::parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Media(MediaPlaylist),
    Master(MasterPlaylist),
}
