//! Single-pass manifest parser: text → [`Playlist`] (spec §4.4).
//!
//! Reads the header, then dispatches to a media- or master-playlist
//! subparser based on the first content-bearing tag encountered
//! (`EXTINF`/`EXT-X-TARGETDURATION` ⇒ media, `EXT-X-STREAM-INF` ⇒ master).

use super::model::*;
use crate::error::ParserError;
use crate::tag::parser::parse_line;
use crate::tag::{AttrValue, Attributes, TagEvent, TagKind};

/// Parses a full M3U8 document into either a [`MediaPlaylist`] or a
/// [`MasterPlaylist`].
pub fn parse(text: &str) -> Result<Playlist, ParserError> {
    let mut events: Vec<(usize, TagEvent)> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if let Some(event) = parse_line(line, line_no)? {
            events.push((line_no, event));
        }
    }

    let Some((first_line, first_event)) = events.first() else {
        return Err(ParserError::MissingExtM3U { line: 1 });
    };
    if !matches!(first_event, TagEvent::ExtM3u) {
        return Err(ParserError::MissingExtM3U { line: *first_line });
    }

    let kind = detect_kind(&events)?;
    match kind {
        PlaylistKind::Media => Ok(Playlist::Media(parse_media(&events)?)),
        PlaylistKind::Master => Ok(Playlist::Master(parse_master(&events)?)),
    }
}

enum PlaylistKind {
    Media,
    Master,
}

fn detect_kind(events: &[(usize, TagEvent)]) -> Result<PlaylistKind, ParserError> {
    for (_, event) in events {
        if let TagEvent::Tag { kind, .. } = event {
            match kind {
                TagKind::Extinf | TagKind::TargetDuration => return Ok(PlaylistKind::Media),
                TagKind::StreamInf => return Ok(PlaylistKind::Master),
                _ => {}
            }
        }
    }
    // No decisive tag: default to an empty media playlist.
    Ok(PlaylistKind::Media)
}

fn decimal(attrs: &Attributes, key: &str) -> Option<f64> {
    attrs.get(key).and_then(AttrValue::as_decimal)
}

fn string_attr(attrs: &Attributes, key: &str) -> Option<String> {
    attrs.get(key).map(|v| match v {
        AttrValue::QuotedString(s) => s.clone(),
        AttrValue::Enum(s) => s.clone(),
        other => super::super::tag::writer::format_attr_value(other),
    })
}

fn bool_attr(attrs: &Attributes, key: &str) -> bool {
    string_attr(attrs, key).map(|v| v == "YES").unwrap_or(false)
}

fn parse_byte_range_attr(attrs: &Attributes, key: &str) -> Option<ByteRange> {
    let raw = string_attr(attrs, key)?;
    parse_byte_range_str(&raw)
}

fn parse_byte_range_str(raw: &str) -> Option<ByteRange> {
    match raw.split_once('@') {
        Some((len, off)) => Some(ByteRange { length: len.parse().ok()?, offset: off.parse().ok() }),
        None => Some(ByteRange { length: raw.parse().ok()?, offset: None }),
    }
}

fn parse_key(attrs: &Attributes) -> Key {
    Key {
        method: string_attr(attrs, "METHOD").unwrap_or_else(|| "NONE".to_string()),
        uri: string_attr(attrs, "URI"),
        iv: string_attr(attrs, "IV"),
        keyformat: string_attr(attrs, "KEYFORMAT"),
        keyformatversions: string_attr(attrs, "KEYFORMATVERSIONS"),
    }
}

fn parse_map(attrs: &Attributes) -> Map {
    Map {
        uri: string_attr(attrs, "URI").unwrap_or_default(),
        byte_range: parse_byte_range_attr(attrs, "BYTERANGE"),
    }
}

fn parse_daterange(attrs: &Attributes, line: usize) -> Result<DateRange, ParserError> {
    let id = string_attr(attrs, "ID").ok_or_else(|| ParserError::MalformedAttribute {
        line,
        tag: "EXT-X-DATERANGE".to_string(),
        reason: "missing required ID attribute".to_string(),
    })?;
    let start_date = string_attr(attrs, "START-DATE").ok_or_else(|| ParserError::MalformedAttribute {
        line,
        tag: "EXT-X-DATERANGE".to_string(),
        reason: "missing required START-DATE attribute".to_string(),
    })?;
    let known = [
        "ID", "CLASS", "START-DATE", "END-DATE", "DURATION", "PLANNED-DURATION", "SCTE35-CMD", "SCTE35-OUT",
        "SCTE35-IN", "END-ON-NEXT",
    ];
    let custom_attributes = attrs
        .0
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), super::super::tag::writer::format_attr_value(v)))
        .collect();
    Ok(DateRange {
        id,
        class: string_attr(attrs, "CLASS"),
        start_date,
        end_date: string_attr(attrs, "END-DATE"),
        duration: decimal(attrs, "DURATION"),
        planned_duration: decimal(attrs, "PLANNED-DURATION"),
        scte35_cmd: string_attr(attrs, "SCTE35-CMD"),
        scte35_out: string_attr(attrs, "SCTE35-OUT"),
        scte35_in: string_attr(attrs, "SCTE35-IN"),
        end_on_next: bool_attr(attrs, "END-ON-NEXT"),
        custom_attributes,
    })
}

#[derive(Default)]
struct PendingSegmentState {
    key: Option<Key>,
    map: Option<Map>,
    byte_range: Option<ByteRange>,
    discontinuity: bool,
    program_date_time: Option<String>,
    gap: bool,
    date_range: Option<DateRange>,
}

fn parse_media(events: &[(usize, TagEvent)]) -> Result<MediaPlaylist, ParserError> {
    let mut playlist = MediaPlaylist::new();
    let mut pending = PendingSegmentState::default();
    let mut target_duration_seen = false;
    let mut media_sequence_seen = false;
    let mut pending_parts: Vec<Part> = Vec::new();
    let mut seen_extinf = false;

    for (line, event) in events {
        let line = *line;
        match event {
            TagEvent::ExtM3u | TagEvent::Unknown(_) => {}
            TagEvent::Uri(uri) => {
                if !seen_extinf {
                    return Err(ParserError::OrphanUri { line });
                }
                let mut segment = Segment::new(0.0, uri.clone());
                // last EXTINF duration/title was pushed onto the placeholder; pull it back out.
                if let Some(last) = playlist.segments.last_mut() {
                    if last.uri.is_empty() {
                        segment.duration = last.duration;
                        playlist.segments.pop();
                    }
                }
                segment.discontinuity = pending.discontinuity;
                segment.byte_range = pending.byte_range.take();
                segment.map = pending.map.clone();
                segment.program_date_time = pending.program_date_time.take();
                segment.key = pending.key.clone();
                segment.is_gap = pending.gap;
                segment.date_range = pending.date_range.take();
                pending.discontinuity = false;
                pending.gap = false;
                playlist.segments.push(segment);
                playlist.parts_by_segment.push(std::mem::take(&mut pending_parts));
                seen_extinf = false;
            }
            TagEvent::Tag { kind, attributes } => match kind {
                TagKind::Version => {
                    playlist.version = decimal(attributes, "value").unwrap_or(3.0) as u32;
                }
                TagKind::TargetDuration => {
                    if target_duration_seen {
                        return Err(ParserError::DuplicateTag { line, tag: "EXT-X-TARGETDURATION".to_string() });
                    }
                    target_duration_seen = true;
                    playlist.target_duration = decimal(attributes, "value").unwrap_or(0.0) as u32;
                }
                TagKind::MediaSequence => {
                    if media_sequence_seen {
                        return Err(ParserError::DuplicateTag { line, tag: "EXT-X-MEDIA-SEQUENCE".to_string() });
                    }
                    media_sequence_seen = true;
                    playlist.media_sequence = decimal(attributes, "value").unwrap_or(0.0) as u32;
                }
                TagKind::DiscontinuitySequence => {
                    playlist.discontinuity_sequence = decimal(attributes, "value").unwrap_or(0.0) as u32;
                }
                TagKind::PlaylistType => {
                    let v = string_attr(attributes, "value").unwrap_or_default();
                    playlist.playlist_type = Some(PlaylistType::parse(&v).ok_or_else(|| ParserError::UnknownEnum {
                        line,
                        tag: "EXT-X-PLAYLIST-TYPE".to_string(),
                        value: v.clone(),
                    })?);
                }
                TagKind::Extinf => {
                    let duration = decimal(attributes, "value").unwrap_or(0.0);
                    // Placeholder segment; filled in / popped when the URI line arrives.
                    playlist.segments.push(Segment::new(duration, String::new()));
                    seen_extinf = true;
                }
                TagKind::ByteRange => {
                    let len = decimal(attributes, "value").unwrap_or(0.0) as u64;
                    let offset = decimal(attributes, "offset").map(|v| v as u64);
                    pending.byte_range = Some(ByteRange { length: len, offset });
                }
                TagKind::Discontinuity => pending.discontinuity = true,
                TagKind::Key => pending.key = Some(parse_key(attributes)),
                TagKind::Map => pending.map = Some(parse_map(attributes)),
                TagKind::ProgramDateTime => pending.program_date_time = string_attr(attributes, "value"),
                TagKind::Gap => pending.gap = true,
                TagKind::EndList => playlist.has_endlist = true,
                TagKind::IndependentSegments => playlist.independent_segments = true,
                TagKind::DateRange => {
                    let dr = parse_daterange(attributes, line)?;
                    playlist.date_ranges.push(dr.clone());
                    pending.date_range = Some(dr);
                }
                TagKind::ServerControl => {
                    playlist.server_control = Some(ServerControl {
                        can_block_reload: bool_attr(attributes, "CAN-BLOCK-RELOAD"),
                        can_skip_until: decimal(attributes, "CAN-SKIP-UNTIL"),
                        hold_back: decimal(attributes, "HOLD-BACK"),
                        part_hold_back: decimal(attributes, "PART-HOLD-BACK"),
                        can_skip_dateranges: bool_attr(attributes, "CAN-SKIP-DATERANGES"),
                    });
                }
                TagKind::PartInf => {
                    playlist.part_inf = Some(PartInf { part_target: decimal(attributes, "PART-TARGET").unwrap_or(0.0) });
                }
                TagKind::Part => {
                    pending_parts.push(Part {
                        duration: decimal(attributes, "DURATION").unwrap_or(0.0),
                        uri: string_attr(attributes, "URI").unwrap_or_default(),
                        is_independent: bool_attr(attributes, "INDEPENDENT"),
                        is_gap: bool_attr(attributes, "GAP"),
                        byte_range: parse_byte_range_attr(attributes, "BYTERANGE"),
                    });
                }
                TagKind::PreloadHint => {
                    playlist.preload_hint = Some(PreloadHint {
                        hint_type: string_attr(attributes, "TYPE").unwrap_or_default(),
                        uri: string_attr(attributes, "URI").unwrap_or_default(),
                        byte_range_start: decimal(attributes, "BYTERANGE-START").map(|v| v as u64),
                        byte_range_length: decimal(attributes, "BYTERANGE-LENGTH").map(|v| v as u64),
                    });
                }
                TagKind::RenditionReport => {
                    playlist.rendition_reports.push(RenditionReport {
                        uri: string_attr(attributes, "URI").unwrap_or_default(),
                        last_msn: decimal(attributes, "LAST-MSN").map(|v| v as u32),
                        last_part: decimal(attributes, "LAST-PART").map(|v| v as u16),
                    });
                }
                TagKind::Skip => {
                    // EXT-X-SKIP is a delta-update artifact of the *rendered* playlist;
                    // a parsed-back model has no skipped segments to represent, so this
                    // tag only round-trips through generator-side delta rendering
                    // (see crate::llhls::manager::render_delta_playlist).
                }
                TagKind::StreamInf
                | TagKind::IFrameStreamInf
                | TagKind::Media
                | TagKind::SessionData
                | TagKind::SessionKey
                | TagKind::ContentSteering => {
                    // master-only tags found while parsing a media playlist are ignored;
                    // detect_kind should have routed this document to parse_master.
                }
            },
        }
    }

    // Stray EXTINF with no following URI: drop the unattached placeholder.
    if seen_extinf {
        if let Some(last) = playlist.segments.last() {
            if last.uri.is_empty() {
                playlist.segments.pop();
            }
        }
    }
    if !pending_parts.is_empty() {
        playlist.parts_by_segment.push(pending_parts);
    }

    Ok(playlist)
}

fn parse_master(events: &[(usize, TagEvent)]) -> Result<MasterPlaylist, ParserError> {
    let mut playlist = MasterPlaylist::new();
    let mut pending_stream_inf: Option<Attributes> = None;

    for (line, event) in events {
        let line = *line;
        match event {
            TagEvent::ExtM3u | TagEvent::Unknown(_) => {}
            TagEvent::Uri(uri) => {
                let Some(attrs) = pending_stream_inf.take() else {
                    return Err(ParserError::OrphanUri { line });
                };
                playlist.variants.push(Variant {
                    bandwidth: decimal(&attrs, "BANDWIDTH").unwrap_or(0.0) as u64,
                    average_bandwidth: decimal(&attrs, "AVERAGE-BANDWIDTH").map(|v| v as u64),
                    resolution: attrs.get("RESOLUTION").and_then(AttrValue::as_resolution),
                    codecs: string_attr(&attrs, "CODECS"),
                    frame_rate: decimal(&attrs, "FRAME-RATE"),
                    video_range: string_attr(&attrs, "VIDEO-RANGE"),
                    supplemental_codecs: string_attr(&attrs, "SUPPLEMENTAL-CODECS"),
                    uri: uri.clone(),
                    audio_group: string_attr(&attrs, "AUDIO"),
                    video_group: string_attr(&attrs, "VIDEO"),
                    subtitles_group: string_attr(&attrs, "SUBTITLES"),
                    closed_captions_group: string_attr(&attrs, "CLOSED-CAPTIONS"),
                });
            }
            TagEvent::Tag { kind, attributes } => match kind {
                TagKind::Version => playlist.version = decimal(attributes, "value").unwrap_or(3.0) as u32,
                TagKind::IndependentSegments => playlist.independent_segments = true,
                TagKind::StreamInf => pending_stream_inf = Some(attributes.clone()),
                TagKind::IFrameStreamInf => {
                    playlist.iframe_variants.push(IFrameVariant {
                        bandwidth: decimal(attributes, "BANDWIDTH").unwrap_or(0.0) as u64,
                        resolution: attributes.get("RESOLUTION").and_then(AttrValue::as_resolution),
                        codecs: string_attr(attributes, "CODECS"),
                        uri: string_attr(attributes, "URI").unwrap_or_default(),
                        video_group: string_attr(attributes, "VIDEO"),
                    });
                }
                TagKind::Media => {
                    let media_type = string_attr(attributes, "TYPE").unwrap_or_default();
                    let media_type = MediaType::parse(&media_type).ok_or_else(|| ParserError::UnknownEnum {
                        line,
                        tag: "EXT-X-MEDIA".to_string(),
                        value: media_type.clone(),
                    })?;
                    let instream_id = string_attr(attributes, "INSTREAM-ID").and_then(|v| InStreamId::parse(&v));
                    playlist.renditions.push(Rendition {
                        media_type,
                        group_id: string_attr(attributes, "GROUP-ID").unwrap_or_default(),
                        name: string_attr(attributes, "NAME").unwrap_or_default(),
                        language: string_attr(attributes, "LANGUAGE"),
                        assoc_language: string_attr(attributes, "ASSOC-LANGUAGE"),
                        is_default: bool_attr(attributes, "DEFAULT"),
                        autoselect: bool_attr(attributes, "AUTOSELECT"),
                        forced: bool_attr(attributes, "FORCED"),
                        uri: string_attr(attributes, "URI"),
                        instream_id,
                        characteristics: string_attr(attributes, "CHARACTERISTICS"),
                        channels: string_attr(attributes, "CHANNELS"),
                    });
                }
                TagKind::SessionData => {
                    playlist.session_data.push(SessionData {
                        data_id: string_attr(attributes, "DATA-ID").unwrap_or_default(),
                        value: string_attr(attributes, "VALUE"),
                        uri: string_attr(attributes, "URI"),
                        language: string_attr(attributes, "LANGUAGE"),
                    });
                }
                TagKind::SessionKey => playlist.session_keys.push(parse_key(attributes)),
                TagKind::ContentSteering => {
                    playlist.content_steering = Some(ContentSteering {
                        server_uri: string_attr(attributes, "SERVER-URI").unwrap_or_default(),
                        pathway_id: string_attr(attributes, "PATHWAY-ID"),
                    });
                }
                _ => {
                    // media-playlist-only tags found while parsing a master playlist are ignored.
                }
            },
        }
    }

    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_extm3u_header_is_an_error() {
        let err = parse("#EXT-X-VERSION:3\n").unwrap_err();
        assert!(matches!(err, ParserError::MissingExtM3U { line: 1 }));
    }

    #[test]
    fn parses_a_simple_media_playlist() {
        let text = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:7\n#EXT-X-MEDIA-SEQUENCE:0\n#EXTINF:6.006,\nsegment_0.m4s\n#EXTINF:6.006,\nsegment_1.m4s\n#EXT-X-ENDLIST\n";
        let playlist = parse(text).unwrap();
        match playlist {
            Playlist::Media(m) => {
                assert_eq!(m.target_duration, 7);
                assert_eq!(m.segments.len(), 2);
                assert_eq!(m.segments[0].uri, "segment_0.m4s");
                assert!(m.has_endlist);
            }
            _ => panic!("expected a media playlist"),
        }
    }

    #[test]
    fn orphan_uri_is_an_error() {
        let text = "#EXTM3U\n#EXT-X-TARGETDURATION:7\nsegment_0.m4s\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParserError::OrphanUri { .. }));
    }

    #[test]
    fn pending_tags_attach_to_the_next_segment() {
        let text = "#EXTM3U\n#EXT-X-TARGETDURATION:7\n#EXT-X-DISCONTINUITY\n#EXT-X-PROGRAM-DATE-TIME:2024-01-01T00:00:00.000Z\n#EXTINF:6.0,\nsegment_0.m4s\n#EXTINF:6.0,\nsegment_1.m4s\n";
        let playlist = parse(text).unwrap();
        match playlist {
            Playlist::Media(m) => {
                assert!(m.segments[0].discontinuity);
                assert_eq!(m.segments[0].program_date_time.as_deref(), Some("2024-01-01T00:00:00.000Z"));
                assert!(!m.segments[1].discontinuity);
            }
            _ => panic!("expected a media playlist"),
        }
    }

    #[test]
    fn parses_a_master_playlist() {
        let text = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=1920x1080\nhigh.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=640000\nlow.m3u8\n";
        let playlist = parse(text).unwrap();
        match playlist {
            Playlist::Master(m) => {
                assert_eq!(m.variants.len(), 2);
                assert_eq!(m.variants[0].bandwidth, 1_280_000);
                assert_eq!(m.variants[0].resolution, Some((1920, 1080)));
                assert_eq!(m.variants[1].uri, "low.m3u8");
            }
            _ => panic!("expected a master playlist"),
        }
    }

    #[test]
    fn duplicate_target_duration_is_an_error() {
        let text = "#EXTM3U\n#EXT-X-TARGETDURATION:7\n#EXT-X-TARGETDURATION:8\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParserError::DuplicateTag { .. }));
    }
}
