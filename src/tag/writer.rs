//! Formats [`TagEvent`]s back into canonical HLS playlist text.
//!
//! Booleans are written `YES`/`NO`; strings containing a comma, space, or
//! `"` are quoted with backslash escapes; attribute order within a tag is
//! whatever order the caller pushed them in (the generator is responsible
//! for stable ordering — see [`crate::manifest::generator`]).

use super::{AttrValue, Attributes, TagKind};

/// Formats a bare tag (no value), e.g. `#EXT-X-DISCONTINUITY`.
pub fn format_bare(kind: TagKind) -> String {
    format!("#{}", kind.tag_name())
}

/// Formats `#EXTM3U`.
pub fn format_extm3u() -> &'static str {
    "#EXTM3U"
}

/// Formats a tag whose attributes were parsed positionally
/// (`EXT-X-VERSION`, `EXTINF`, `EXT-X-BYTERANGE`, …) back into its
/// positional text form.
pub fn format_positional(kind: TagKind, attributes: &Attributes) -> String {
    let name = kind.tag_name();
    match kind {
        TagKind::Version | TagKind::TargetDuration | TagKind::MediaSequence | TagKind::DiscontinuitySequence => {
            let v = attributes.get("value").and_then(AttrValue::as_decimal).unwrap_or(0.0);
            format!("#{name}:{}", v as i64)
        }
        TagKind::PlaylistType => {
            let v = attributes.get("value").and_then(AttrValue::as_enum).unwrap_or("");
            format!("#{name}:{v}")
        }
        TagKind::Extinf => {
            let duration = attributes.get("value").and_then(AttrValue::as_decimal).unwrap_or(0.0);
            let title = attributes.get("title").and_then(AttrValue::as_quoted_string).unwrap_or("");
            format!("#{name}:{}", format_duration(duration)) + &format!(",{title}")
        }
        TagKind::ByteRange => {
            let len = attributes.get("value").and_then(AttrValue::as_decimal).unwrap_or(0.0) as u64;
            match attributes.get("offset").and_then(AttrValue::as_decimal) {
                Some(offset) => format!("#{name}:{len}@{}", offset as u64),
                None => format!("#{name}:{len}"),
            }
        }
        TagKind::ProgramDateTime => {
            let v = attributes.get("value").and_then(AttrValue::as_quoted_string).unwrap_or("");
            format!("#{name}:{v}")
        }
        _ => format_attribute_list(kind, attributes),
    }
}

fn format_duration(duration: f64) -> String {
    if (duration.fract()).abs() < f64::EPSILON {
        format!("{:.0}", duration)
    } else {
        format!("{:.3}", duration)
    }
}

/// Formats an attribute-list tag (`EXT-X-STREAM-INF`, `EXT-X-KEY`, …) in
/// the order attributes were pushed to `attributes`.
pub fn format_attribute_list(kind: TagKind, attributes: &Attributes) -> String {
    let name = kind.tag_name();
    let body = attributes
        .0
        .iter()
        .map(|(key, value)| format!("{key}={}", format_attr_value(value)))
        .collect::<Vec<_>>()
        .join(",");
    format!("#{name}:{body}")
}

pub fn format_attr_value(value: &AttrValue) -> String {
    match value {
        AttrValue::QuotedString(s) => format!("\"{}\"", escape(s)),
        AttrValue::Decimal(v) => {
            if (v.fract()).abs() < f64::EPSILON {
                format!("{:.0}", v)
            } else {
                format!("{v}")
            }
        }
        AttrValue::HexInt(v) => format!("0x{v:X}"),
        AttrValue::Enum(s) => s.clone(),
        AttrValue::Resolution(w, h) => format!("{w}x{h}"),
    }
}

/// Formats a boolean as `YES`/`NO` for attributes like `INDEPENDENT` or
/// `CAN-BLOCK-RELOAD`.
pub fn format_yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns true if `s` needs quoting per spec §4.3 (contains a comma,
/// space, or `"`).
pub fn needs_quoting(s: &str) -> bool {
    s.contains(',') || s.contains(' ') || s.contains('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Attributes;

    #[test]
    fn formats_extinf_without_title() {
        let mut attrs = Attributes::new();
        attrs.push("value", AttrValue::Decimal(6.006));
        assert_eq!(format_positional(TagKind::Extinf, &attrs), "#EXTINF:6.006,");
    }

    #[test]
    fn formats_targetduration_as_integer() {
        let mut attrs = Attributes::new();
        attrs.push("value", AttrValue::Decimal(7.0));
        assert_eq!(format_positional(TagKind::TargetDuration, &attrs), "#EXT-X-TARGETDURATION:7");
    }

    #[test]
    fn formats_attribute_list_preserving_order() {
        let mut attrs = Attributes::new();
        attrs.push("BANDWIDTH", AttrValue::Decimal(1_280_000.0));
        attrs.push("RESOLUTION", AttrValue::Resolution(1920, 1080));
        assert_eq!(
            format_attribute_list(TagKind::StreamInf, &attrs),
            "#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=1920x1080"
        );
    }

    #[test]
    fn yes_no_booleans() {
        assert_eq!(format_yes_no(true), "YES");
        assert_eq!(format_yes_no(false), "NO");
    }
}
