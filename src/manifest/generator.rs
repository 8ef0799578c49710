//! Produces canonical playlist text from a [`MediaPlaylist`]/[`MasterPlaylist`]
//! (spec §4.4). `parse ∘ generate ∘ parse == parse` up to attribute order.

use super::model::*;
use crate::tag::writer::{format_bare, format_extm3u, format_yes_no};
use crate::tag::{AttrValue, Attributes, TagKind};

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

fn byte_range_str(br: &ByteRange) -> String {
    match br.offset {
        Some(offset) => format!("{}@{}", br.length, offset),
        None => format!("{}", br.length),
    }
}

/// Renders a [`MediaPlaylist`] to canonical M3U8 text.
///
/// Version defaults to 7 when `EXT-X-MAP` is present (required for a media
/// playlist to carry `EXT-X-MAP` outside an I-frame playlist), else 3,
/// unless the caller set a higher version explicitly.
pub fn generate_media(playlist: &MediaPlaylist) -> String {
    let mut out = String::new();
    push_line(&mut out, format_extm3u());

    let version = effective_version(playlist);
    push_line(&mut out, format!("#EXT-X-VERSION:{version}"));
    push_line(&mut out, format!("#EXT-X-TARGETDURATION:{}", playlist.target_duration));
    push_line(&mut out, format!("#EXT-X-MEDIA-SEQUENCE:{}", playlist.media_sequence));
    if playlist.discontinuity_sequence != 0 {
        push_line(&mut out, format!("#EXT-X-DISCONTINUITY-SEQUENCE:{}", playlist.discontinuity_sequence));
    }
    if let Some(playlist_type) = playlist.playlist_type {
        push_line(&mut out, format!("#EXT-X-PLAYLIST-TYPE:{}", playlist_type.as_str()));
    }
    if playlist.independent_segments {
        push_line(&mut out, format_bare(TagKind::IndependentSegments));
    }
    if let Some(map) = &playlist.map {
        push_line(&mut out, format_map(map));
    }
    if let Some(sc) = &playlist.server_control {
        push_line(&mut out, format_server_control(sc));
    }
    if let Some(pi) = &playlist.part_inf {
        push_line(&mut out, format!("#EXT-X-PART-INF:PART-TARGET={}", format_seconds(pi.part_target)));
    }

    let mut last_key: Option<&Key> = None;
    let mut last_map: Option<&Map> = None;

    for (i, segment) in playlist.segments.iter().enumerate() {
        if let Some(parts) = playlist.parts_by_segment.get(i) {
            for part in parts {
                push_line(&mut out, format_part(part));
            }
        }
        if let Some(dr) = &segment.date_range {
            push_line(&mut out, format_daterange(dr));
        }
        if segment.discontinuity {
            push_line(&mut out, format_bare(TagKind::Discontinuity));
        }
        if let Some(pdt) = &segment.program_date_time {
            push_line(&mut out, format!("#EXT-X-PROGRAM-DATE-TIME:{pdt}"));
        }
        if segment.key.as_ref() != last_key {
            if let Some(key) = &segment.key {
                push_line(&mut out, format_key(TagKind::Key, key));
            }
            last_key = segment.key.as_ref();
        }
        if segment.map.as_ref() != last_map {
            if let Some(map) = &segment.map {
                push_line(&mut out, format_map(map));
            }
            last_map = segment.map.as_ref();
        }
        if let Some(br) = &segment.byte_range {
            push_line(&mut out, format!("#EXT-X-BYTERANGE:{}", byte_range_str(br)));
        }
        if segment.is_gap {
            push_line(&mut out, format_bare(TagKind::Gap));
        }
        push_line(&mut out, format!("#EXTINF:{},", format_extinf_duration(segment.duration)));
        push_line(&mut out, &segment.uri);
    }

    if let Some(parts) = playlist.parts_by_segment.get(playlist.segments.len()) {
        for part in parts {
            push_line(&mut out, format_part(part));
        }
    }
    if let Some(hint) = &playlist.preload_hint {
        push_line(&mut out, format_preload_hint(hint));
    }
    for report in &playlist.rendition_reports {
        push_line(&mut out, format_rendition_report(report));
    }
    if playlist.has_endlist {
        push_line(&mut out, format_bare(TagKind::EndList));
    }

    out
}

fn effective_version(playlist: &MediaPlaylist) -> u32 {
    let min_version = if playlist.map.is_some() || playlist.segments.iter().any(|s| s.map.is_some()) {
        7
    } else {
        3
    };
    playlist.version.max(min_version)
}

fn format_seconds(v: f64) -> String {
    if (v.fract()).abs() < f64::EPSILON {
        format!("{:.0}", v)
    } else {
        format!("{v}")
    }
}

fn format_extinf_duration(v: f64) -> String {
    if (v.fract()).abs() < f64::EPSILON {
        format!("{:.0}", v)
    } else {
        format!("{:.3}", v)
    }
}

fn format_key(kind: TagKind, key: &Key) -> String {
    let mut attrs = Attributes::new();
    attrs.push("METHOD", AttrValue::Enum(key.method.clone()));
    if let Some(uri) = &key.uri {
        attrs.push("URI", AttrValue::QuotedString(uri.clone()));
    }
    if let Some(iv) = &key.iv {
        attrs.push("IV", AttrValue::Enum(iv.clone()));
    }
    if let Some(kf) = &key.keyformat {
        attrs.push("KEYFORMAT", AttrValue::QuotedString(kf.clone()));
    }
    if let Some(kfv) = &key.keyformatversions {
        attrs.push("KEYFORMATVERSIONS", AttrValue::QuotedString(kfv.clone()));
    }
    crate::tag::writer::format_attribute_list(kind, &attrs)
}

fn format_map(map: &Map) -> String {
    let mut attrs = Attributes::new();
    attrs.push("URI", AttrValue::QuotedString(map.uri.clone()));
    if let Some(br) = &map.byte_range {
        attrs.push("BYTERANGE", AttrValue::QuotedString(byte_range_str(br)));
    }
    crate::tag::writer::format_attribute_list(TagKind::Map, &attrs)
}

fn format_server_control(sc: &ServerControl) -> String {
    let mut attrs = Attributes::new();
    attrs.push("CAN-BLOCK-RELOAD", AttrValue::Enum(format_yes_no(sc.can_block_reload).to_string()));
    if let Some(v) = sc.can_skip_until {
        attrs.push("CAN-SKIP-UNTIL", AttrValue::Decimal(v));
    }
    if sc.can_skip_dateranges {
        attrs.push("CAN-SKIP-DATERANGES", AttrValue::Enum("YES".to_string()));
    }
    if let Some(v) = sc.hold_back {
        attrs.push("HOLD-BACK", AttrValue::Decimal(v));
    }
    if let Some(v) = sc.part_hold_back {
        attrs.push("PART-HOLD-BACK", AttrValue::Decimal(v));
    }
    crate::tag::writer::format_attribute_list(TagKind::ServerControl, &attrs)
}

fn format_part(part: &Part) -> String {
    let mut attrs = Attributes::new();
    attrs.push("DURATION", AttrValue::Decimal(part.duration));
    attrs.push("URI", AttrValue::QuotedString(part.uri.clone()));
    if part.is_independent {
        attrs.push("INDEPENDENT", AttrValue::Enum("YES".to_string()));
    }
    if let Some(br) = &part.byte_range {
        attrs.push("BYTERANGE", AttrValue::QuotedString(byte_range_str(br)));
    }
    if part.is_gap {
        attrs.push("GAP", AttrValue::Enum("YES".to_string()));
    }
    crate::tag::writer::format_attribute_list(TagKind::Part, &attrs)
}

fn format_preload_hint(hint: &PreloadHint) -> String {
    let mut attrs = Attributes::new();
    attrs.push("TYPE", AttrValue::Enum(hint.hint_type.clone()));
    attrs.push("URI", AttrValue::QuotedString(hint.uri.clone()));
    if let Some(v) = hint.byte_range_start {
        attrs.push("BYTERANGE-START", AttrValue::Decimal(v as f64));
    }
    if let Some(v) = hint.byte_range_length {
        attrs.push("BYTERANGE-LENGTH", AttrValue::Decimal(v as f64));
    }
    crate::tag::writer::format_attribute_list(TagKind::PreloadHint, &attrs)
}

fn format_rendition_report(report: &RenditionReport) -> String {
    let mut attrs = Attributes::new();
    attrs.push("URI", AttrValue::QuotedString(report.uri.clone()));
    if let Some(v) = report.last_msn {
        attrs.push("LAST-MSN", AttrValue::Decimal(v as f64));
    }
    if let Some(v) = report.last_part {
        attrs.push("LAST-PART", AttrValue::Decimal(v as f64));
    }
    crate::tag::writer::format_attribute_list(TagKind::RenditionReport, &attrs)
}

pub fn format_daterange(dr: &DateRange) -> String {
    let mut attrs = Attributes::new();
    attrs.push("ID", AttrValue::QuotedString(dr.id.clone()));
    if let Some(class) = &dr.class {
        attrs.push("CLASS", AttrValue::QuotedString(class.clone()));
    }
    attrs.push("START-DATE", AttrValue::QuotedString(dr.start_date.clone()));
    if let Some(end) = &dr.end_date {
        attrs.push("END-DATE", AttrValue::QuotedString(end.clone()));
    }
    if let Some(d) = dr.duration {
        attrs.push("DURATION", AttrValue::Decimal(d));
    }
    if let Some(d) = dr.planned_duration {
        attrs.push("PLANNED-DURATION", AttrValue::Decimal(d));
    }
    if let Some(v) = &dr.scte35_cmd {
        attrs.push("SCTE35-CMD", AttrValue::HexInt(u64::from_str_radix(v.trim_start_matches("0x"), 16).unwrap_or(0)));
    }
    if let Some(v) = &dr.scte35_out {
        attrs.push("SCTE35-OUT", AttrValue::HexInt(u64::from_str_radix(v.trim_start_matches("0x"), 16).unwrap_or(0)));
    }
    if let Some(v) = &dr.scte35_in {
        attrs.push("SCTE35-IN", AttrValue::HexInt(u64::from_str_radix(v.trim_start_matches("0x"), 16).unwrap_or(0)));
    }
    if dr.end_on_next {
        attrs.push("END-ON-NEXT", AttrValue::Enum("YES".to_string()));
    }
    for (k, v) in &dr.custom_attributes {
        attrs.push(k.clone(), AttrValue::QuotedString(v.clone()));
    }
    crate::tag::writer::format_attribute_list(TagKind::DateRange, &attrs)
}

/// Renders a [`MasterPlaylist`] to canonical M3U8 text.
pub fn generate_master(playlist: &MasterPlaylist) -> String {
    let mut out = String::new();
    push_line(&mut out, format_extm3u());
    push_line(&mut out, format!("#EXT-X-VERSION:{}", playlist.version));
    if playlist.independent_segments {
        push_line(&mut out, format_bare(TagKind::IndependentSegments));
    }
    for key in &playlist.session_keys {
        push_line(&mut out, format_key(TagKind::SessionKey, key));
    }
    for data in &playlist.session_data {
        push_line(&mut out, format_session_data(data));
    }
    for rendition in &playlist.renditions {
        push_line(&mut out, format_rendition(rendition));
    }
    if let Some(cs) = &playlist.content_steering {
        push_line(&mut out, format_content_steering(cs));
    }
    for iframe in &playlist.iframe_variants {
        push_line(&mut out, format_iframe_variant(iframe));
    }
    for variant in &playlist.variants {
        push_line(&mut out, format_variant_stream_inf(variant));
        push_line(&mut out, &variant.uri);
    }
    out
}

fn format_session_data(data: &SessionData) -> String {
    let mut attrs = Attributes::new();
    attrs.push("DATA-ID", AttrValue::QuotedString(data.data_id.clone()));
    if let Some(v) = &data.value {
        attrs.push("VALUE", AttrValue::QuotedString(v.clone()));
    }
    if let Some(v) = &data.uri {
        attrs.push("URI", AttrValue::QuotedString(v.clone()));
    }
    if let Some(v) = &data.language {
        attrs.push("LANGUAGE", AttrValue::QuotedString(v.clone()));
    }
    crate::tag::writer::format_attribute_list(TagKind::SessionData, &attrs)
}

fn format_content_steering(cs: &ContentSteering) -> String {
    let mut attrs = Attributes::new();
    attrs.push("SERVER-URI", AttrValue::QuotedString(cs.server_uri.clone()));
    if let Some(v) = &cs.pathway_id {
        attrs.push("PATHWAY-ID", AttrValue::QuotedString(v.clone()));
    }
    crate::tag::writer::format_attribute_list(TagKind::ContentSteering, &attrs)
}

fn format_rendition(r: &Rendition) -> String {
    let mut attrs = Attributes::new();
    attrs.push("TYPE", AttrValue::Enum(r.media_type.as_str().to_string()));
    attrs.push("GROUP-ID", AttrValue::QuotedString(r.group_id.clone()));
    attrs.push("NAME", AttrValue::QuotedString(r.name.clone()));
    if let Some(v) = &r.language {
        attrs.push("LANGUAGE", AttrValue::QuotedString(v.clone()));
    }
    if let Some(v) = &r.assoc_language {
        attrs.push("ASSOC-LANGUAGE", AttrValue::QuotedString(v.clone()));
    }
    attrs.push("DEFAULT", AttrValue::Enum(format_yes_no(r.is_default).to_string()));
    attrs.push("AUTOSELECT", AttrValue::Enum(format_yes_no(r.autoselect).to_string()));
    if r.media_type == MediaType::Subtitles {
        attrs.push("FORCED", AttrValue::Enum(format_yes_no(r.forced).to_string()));
    }
    if let Some(v) = &r.uri {
        attrs.push("URI", AttrValue::QuotedString(v.clone()));
    }
    if let Some(id) = r.instream_id {
        attrs.push("INSTREAM-ID", AttrValue::QuotedString(id.format()));
    }
    if let Some(v) = &r.characteristics {
        attrs.push("CHARACTERISTICS", AttrValue::QuotedString(v.clone()));
    }
    if let Some(v) = &r.channels {
        attrs.push("CHANNELS", AttrValue::QuotedString(v.clone()));
    }
    crate::tag::writer::format_attribute_list(TagKind::Media, &attrs)
}

fn format_variant_stream_inf(v: &Variant) -> String {
    let mut attrs = Attributes::new();
    attrs.push("BANDWIDTH", AttrValue::Decimal(v.bandwidth as f64));
    if let Some(avg) = v.average_bandwidth {
        attrs.push("AVERAGE-BANDWIDTH", AttrValue::Decimal(avg as f64));
    }
    if let Some((w, h)) = v.resolution {
        attrs.push("RESOLUTION", AttrValue::Resolution(w, h));
    }
    if let Some(codecs) = &v.codecs {
        attrs.push("CODECS", AttrValue::QuotedString(codecs.clone()));
    }
    if let Some(sc) = &v.supplemental_codecs {
        attrs.push("SUPPLEMENTAL-CODECS", AttrValue::QuotedString(sc.clone()));
    }
    if let Some(fr) = v.frame_rate {
        attrs.push("FRAME-RATE", AttrValue::Decimal(fr));
    }
    if let Some(vr) = &v.video_range {
        attrs.push("VIDEO-RANGE", AttrValue::Enum(vr.clone()));
    }
    if let Some(g) = &v.audio_group {
        attrs.push("AUDIO", AttrValue::QuotedString(g.clone()));
    }
    if let Some(g) = &v.video_group {
        attrs.push("VIDEO", AttrValue::QuotedString(g.clone()));
    }
    if let Some(g) = &v.subtitles_group {
        attrs.push("SUBTITLES", AttrValue::QuotedString(g.clone()));
    }
    if let Some(g) = &v.closed_captions_group {
        attrs.push("CLOSED-CAPTIONS", AttrValue::QuotedString(g.clone()));
    }
    crate::tag::writer::format_attribute_list(TagKind::StreamInf, &attrs)
}

fn format_iframe_variant(v: &IFrameVariant) -> String {
    let mut attrs = Attributes::new();
    attrs.push("BANDWIDTH", AttrValue::Decimal(v.bandwidth as f64));
    if let Some((w, h)) = v.resolution {
        attrs.push("RESOLUTION", AttrValue::Resolution(w, h));
    }
    if let Some(codecs) = &v.codecs {
        attrs.push("CODECS", AttrValue::QuotedString(codecs.clone()));
    }
    if let Some(g) = &v.video_group {
        attrs.push("VIDEO", AttrValue::QuotedString(g.clone()));
    }
    attrs.push("URI", AttrValue::QuotedString(v.uri.clone()));
    crate::tag::writer::format_attribute_list(TagKind::IFrameStreamInf, &attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parser::parse;
    use crate::manifest::model::Playlist;

    #[test]
    fn idempotence_holds_for_a_sliding_window_style_playlist() {
        let mut playlist = MediaPlaylist::new();
        playlist.target_duration = 7;
        playlist.media_sequence = 2;
        for i in 2..5 {
            playlist.segments.push(Segment::new(6.006, format!("segment_{i}.m4s")));
        }

        let text1 = generate_media(&playlist);
        let parsed1 = match parse(&text1).unwrap() {
            Playlist::Media(m) => m,
            _ => panic!("expected media playlist"),
        };
        let text2 = generate_media(&parsed1);
        let parsed2 = match parse(&text2).unwrap() {
            Playlist::Media(m) => m,
            _ => panic!("expected media playlist"),
        };
        assert_eq!(parsed1, parsed2);
    }

    #[test]
    fn master_round_trips() {
        let mut playlist = MasterPlaylist::new();
        playlist.variants.push(Variant {
            bandwidth: 1_280_000,
            average_bandwidth: None,
            resolution: Some((1920, 1080)),
            codecs: Some("avc1.4d401f,mp4a.40.2".to_string()),
            frame_rate: None,
            video_range: None,
            supplemental_codecs: None,
            uri: "high.m3u8".to_string(),
            audio_group: None,
            video_group: None,
            subtitles_group: None,
            closed_captions_group: None,
        });
        let text = generate_master(&playlist);
        let parsed = match parse(&text).unwrap() {
            Playlist::Master(m) => m,
            _ => panic!("expected master playlist"),
        };
        assert_eq!(parsed.variants.len(), 1);
        assert_eq!(parsed.variants[0].bandwidth, 1_280_000);
    }
}
