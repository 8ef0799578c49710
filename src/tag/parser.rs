//! Tag lexer: turns one playlist line into a [`TagEvent`].

use super::{AttrValue, Attributes, TagEvent, TagKind};
use crate::error::ParserError;

/// Parses a single line (CRLF already stripped by the caller) into a
/// [`TagEvent`]. Blank lines yield `None`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<TagEvent>, ParserError> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return Ok(None);
    }

    if !line.starts_with('#') {
        return Ok(Some(TagEvent::Uri(line.to_string())));
    }

    let body = &line[1..];
    if body == "EXTM3U" {
        return Ok(Some(TagEvent::ExtM3u));
    }

    let (name, rest) = match body.split_once(':') {
        Some((name, rest)) => (name, Some(rest)),
        None => (body, None),
    };

    if TagKind::is_bare(name) {
        let kind = match name {
            "EXT-X-DISCONTINUITY" => TagKind::Discontinuity,
            "EXT-X-GAP" => TagKind::Gap,
            "EXT-X-ENDLIST" => TagKind::EndList,
            "EXT-X-INDEPENDENT-SEGMENTS" => TagKind::IndependentSegments,
            _ => unreachable!("is_bare matched an unhandled bare tag"),
        };
        return Ok(Some(TagEvent::Tag { kind, attributes: Attributes::new() }));
    }

    let Some(kind) = TagKind::from_tag_name(name) else {
        return Ok(Some(TagEvent::Unknown(line.to_string())));
    };

    let value = rest.unwrap_or("");

    let attributes = if kind.is_attribute_list() {
        parse_attribute_list(value, name, line_no)?
    } else {
        parse_positional_value(kind, value, line_no)?
    };

    Ok(Some(TagEvent::Tag { kind, attributes }))
}

/// Parses positional (non `KEY=value`) tag bodies into a generic
/// [`Attributes`] bag under a synthetic `"value"` (and, for `EXTINF`,
/// `"title"`; for `EXT-X-BYTERANGE`, `"offset"`) key so downstream code has
/// one consistent access pattern.
fn parse_positional_value(kind: TagKind, value: &str, line_no: usize) -> Result<Attributes, ParserError> {
    let mut attrs = Attributes::new();
    let tag_name = kind.tag_name();
    match kind {
        TagKind::Version | TagKind::TargetDuration | TagKind::MediaSequence | TagKind::DiscontinuitySequence => {
            let n: f64 = value.trim().parse().map_err(|_| ParserError::MalformedAttribute {
                line: line_no,
                tag: tag_name.to_string(),
                reason: format!("expected an integer, found {value:?}"),
            })?;
            attrs.push("value", AttrValue::Decimal(n));
        }
        TagKind::PlaylistType => {
            let v = value.trim();
            if v != "VOD" && v != "EVENT" {
                return Err(ParserError::UnknownEnum { line: line_no, tag: tag_name.to_string(), value: v.to_string() });
            }
            attrs.push("value", AttrValue::Enum(v.to_string()));
        }
        TagKind::Extinf => {
            let mut parts = value.splitn(2, ',');
            let duration_str = parts.next().unwrap_or("").trim();
            let duration: f64 = duration_str.parse().map_err(|_| ParserError::MalformedAttribute {
                line: line_no,
                tag: tag_name.to_string(),
                reason: format!("expected a decimal duration, found {duration_str:?}"),
            })?;
            attrs.push("value", AttrValue::Decimal(duration));
            if let Some(title) = parts.next() {
                if !title.is_empty() {
                    attrs.push("title", AttrValue::QuotedString(title.to_string()));
                }
            }
        }
        TagKind::ByteRange => {
            let v = value.trim();
            let (len_str, offset_str) = match v.split_once('@') {
                Some((l, o)) => (l, Some(o)),
                None => (v, None),
            };
            let length: f64 = len_str.parse().map_err(|_| ParserError::MalformedAttribute {
                line: line_no,
                tag: tag_name.to_string(),
                reason: format!("expected an integer length, found {len_str:?}"),
            })?;
            attrs.push("value", AttrValue::Decimal(length));
            if let Some(offset_str) = offset_str {
                let offset: f64 = offset_str.parse().map_err(|_| ParserError::MalformedAttribute {
                    line: line_no,
                    tag: tag_name.to_string(),
                    reason: format!("expected an integer offset, found {offset_str:?}"),
                })?;
                attrs.push("offset", AttrValue::Decimal(offset));
            }
        }
        TagKind::ProgramDateTime => {
            attrs.push("value", AttrValue::QuotedString(value.trim().to_string()));
        }
        _ => unreachable!("positional parse called for an attribute-list tag"),
    }
    Ok(attrs)
}

/// Splits `KEY=value,KEY=value` respecting double-quoted strings (which may
/// contain commas) and parses each value per spec §4.3's grammar.
fn parse_attribute_list(value: &str, tag_name: &str, line_no: usize) -> Result<Attributes, ParserError> {
    let mut attrs = Attributes::new();
    for (key, raw) in split_attribute_pairs(value, tag_name, line_no)? {
        let parsed = parse_attr_value(&raw);
        attrs.push(key, parsed);
    }
    Ok(attrs)
}

fn split_attribute_pairs(value: &str, tag_name: &str, line_no: usize) -> Result<Vec<(String, String)>, ParserError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }

    let mut pairs = Vec::new();
    let mut start = 0usize;
    let mut in_quotes = false;
    let bytes = value.as_bytes();

    for (i, byte) in bytes.iter().enumerate() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b',' if !in_quotes => {
                pairs.push(split_key_value(&value[start..i], tag_name, line_no)?);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(split_key_value(&value[start..], tag_name, line_no)?);
    Ok(pairs)
}

fn split_key_value(segment: &str, tag_name: &str, line_no: usize) -> Result<(String, String), ParserError> {
    let segment = segment.trim();
    let eq = segment.find('=').ok_or_else(|| ParserError::MalformedAttribute {
        line: line_no,
        tag: tag_name.to_string(),
        reason: format!("expected KEY=value, found {segment:?}"),
    })?;
    Ok((segment[..eq].trim().to_string(), segment[eq + 1..].trim().to_string()))
}

/// Parses one attribute value per the grammar: quoted string (with
/// backslash escapes), decimal, hex (`0x…`), enum keyword, or
/// `WIDTHxHEIGHT` resolution composite.
fn parse_attr_value(raw: &str) -> AttrValue {
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return AttrValue::QuotedString(unescape(inner));
    }
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if let Ok(v) = u64::from_str_radix(hex, 16) {
            return AttrValue::HexInt(v);
        }
    }
    if let Some((w, h)) = raw.split_once('x') {
        if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
            return AttrValue::Resolution(w, h);
        }
    }
    if let Ok(n) = raw.parse::<f64>() {
        return AttrValue::Decimal(n);
    }
    AttrValue::Enum(raw.to_string())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extm3u() {
        assert_eq!(parse_line("#EXTM3U", 1).unwrap(), Some(TagEvent::ExtM3u));
    }

    #[test]
    fn parses_uri_line() {
        assert_eq!(parse_line("segment_0.m4s", 2).unwrap(), Some(TagEvent::Uri("segment_0.m4s".to_string())));
    }

    #[test]
    fn parses_extinf_with_title() {
        let event = parse_line("#EXTINF:6.006,some title", 3).unwrap().unwrap();
        match event {
            TagEvent::Tag { kind, attributes } => {
                assert_eq!(kind, TagKind::Extinf);
                assert_eq!(attributes.get("value").unwrap().as_decimal(), Some(6.006));
                assert_eq!(attributes.get("title").unwrap().as_quoted_string(), Some("some title"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_stream_inf_attribute_list_with_quoted_commas() {
        let event = parse_line(
            "#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=1920x1080,CODECS=\"avc1.4d401f,mp4a.40.2\"",
            4,
        )
        .unwrap()
        .unwrap();
        match event {
            TagEvent::Tag { kind, attributes } => {
                assert_eq!(kind, TagKind::StreamInf);
                assert_eq!(attributes.get("BANDWIDTH").unwrap().as_decimal(), Some(1280000.0));
                assert_eq!(attributes.get("RESOLUTION").unwrap().as_resolution(), Some((1920, 1080)));
                assert_eq!(
                    attributes.get("CODECS").unwrap().as_quoted_string(),
                    Some("avc1.4d401f,mp4a.40.2")
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_byterange_with_offset() {
        let event = parse_line("#EXT-X-BYTERANGE:1024@2048", 5).unwrap().unwrap();
        match event {
            TagEvent::Tag { kind, attributes } => {
                assert_eq!(kind, TagKind::ByteRange);
                assert_eq!(attributes.get("value").unwrap().as_decimal(), Some(1024.0));
                assert_eq!(attributes.get("offset").unwrap().as_decimal(), Some(2048.0));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn malformed_playlist_type_is_unknown_enum() {
        let err = parse_line("#EXT-X-PLAYLIST-TYPE:WEIRD", 6).unwrap_err();
        assert!(matches!(err, ParserError::UnknownEnum { .. }));
    }

    #[test]
    fn tolerates_crlf() {
        assert_eq!(parse_line("#EXT-X-ENDLIST\r", 7).unwrap(), Some(TagEvent::Tag { kind: TagKind::EndList, attributes: Attributes::new() }));
    }

    #[test]
    fn unrecognized_tag_is_unknown_not_an_error() {
        let event = parse_line("#EXT-X-VENDOR-THING:1", 8).unwrap().unwrap();
        assert!(matches!(event, TagEvent::Unknown(_)));
    }
}
