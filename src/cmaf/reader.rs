//! Parses an ISO-BMFF box tree on demand: top-level boxes are scanned
//! eagerly, containers descend lazily via [`ParsedBox::children`].

use crate::binary::{fourcc_to_string, ByteReader};
use crate::error::CmafError;

/// Box types that recurse into children (ISO/IEC 14496-12 container boxes).
const CONTAINER_TYPES: &[&[u8; 4]] = &[
    b"moov", b"trak", b"mdia", b"minf", b"stbl", b"moof", b"traf", b"mvex", b"edts", b"dinf",
];

fn is_container(fourcc: &[u8; 4]) -> bool {
    CONTAINER_TYPES.contains(&fourcc)
}

/// A parsed box: type, raw payload (header stripped), and lazily-parsed children.
#[derive(Debug, Clone)]
pub struct ParsedBox {
    pub box_type: [u8; 4],
    pub payload: Vec<u8>,
    pub children: Vec<ParsedBox>,
}

impl ParsedBox {
    pub fn type_name(&self) -> String {
        fourcc_to_string(&self.box_type)
    }

    /// Returns the first direct child with the given four-character type.
    pub fn find_child(&self, fourcc: &[u8; 4]) -> Option<&ParsedBox> {
        self.children.iter().find(|c| &c.box_type == fourcc)
    }

    /// Resolves a `/`-separated path of box types, e.g. `"trak/mdia/minf/stbl"`.
    pub fn find_by_path(&self, path: &str) -> Option<&ParsedBox> {
        let mut current = self;
        for segment in path.split('/') {
            if segment.len() != 4 {
                return None;
            }
            let mut fourcc = [0u8; 4];
            fourcc.copy_from_slice(segment.as_bytes());
            current = current.find_child(&fourcc)?;
        }
        Some(current)
    }
}

/// Parses a top-level list of boxes from a full buffer (an init segment or
/// a media segment). Unknown box types are retained opaquely with their
/// payload available but no children parsed unless they're a recognized
/// container type.
pub fn parse_boxes(data: &[u8]) -> Result<Vec<ParsedBox>, CmafError> {
    let mut reader = ByteReader::new(data);
    let mut boxes = Vec::new();
    while !reader.is_empty() {
        boxes.push(parse_one_box(&mut reader)?);
    }
    Ok(boxes)
}

fn parse_one_box(reader: &mut ByteReader<'_>) -> Result<ParsedBox, CmafError> {
    let start = reader.position();
    let size32 = reader
        .read_u32()
        .map_err(|_| CmafError::TruncatedBox { fourcc: "????".into(), expected: 8, found: reader.remaining() })?;
    let box_type = reader
        .read_fourcc()
        .map_err(|_| CmafError::TruncatedBox { fourcc: "????".into(), expected: 8, found: reader.remaining() })?;
    let type_name = fourcc_to_string(&box_type);

    let header_len;
    let total_size: u64 = if size32 == 1 {
        let large = reader.read_u64().map_err(|_| CmafError::TruncatedBox {
            fourcc: type_name.clone(),
            expected: 16,
            found: reader.remaining(),
        })?;
        header_len = 16;
        large
    } else if size32 == 0 {
        // size-to-EOF: the remainder of the buffer from `start`.
        header_len = 8;
        (reader.remaining() + header_len) as u64
    } else {
        header_len = 8;
        size32 as u64
    };

    if total_size < header_len as u64 {
        return Err(CmafError::InvalidSize { fourcc: type_name, size: total_size });
    }

    let payload_len = (total_size as usize)
        .checked_sub(header_len)
        .ok_or(CmafError::InvalidSize { fourcc: type_name.clone(), size: total_size })?;

    let payload = reader
        .read_bytes(payload_len)
        .map_err(|_| CmafError::TruncatedBox {
            fourcc: type_name.clone(),
            expected: payload_len,
            found: reader.remaining(),
        })?
        .to_vec();

    let children = if is_container(&box_type) {
        parse_boxes(&payload)?
    } else {
        Vec::new()
    };

    let _ = start;
    Ok(ParsedBox { box_type, payload, children })
}

/// Convenience accessor: returns the required top-level box of the given
/// type or `UnknownRequiredBox`.
pub fn require_box<'a>(boxes: &'a [ParsedBox], fourcc: &[u8; 4], context: &str) -> Result<&'a ParsedBox, CmafError> {
    boxes
        .iter()
        .find(|b| &b.box_type == fourcc)
        .ok_or_else(|| CmafError::UnknownRequiredBox {
            fourcc: fourcc_to_string(fourcc),
            context: context.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmaf::writer::{write_init_segment, write_media_segment, SampleInfo, TrackConfig};
    use crate::cmaf::boxes::Codec;

    #[test]
    fn parses_init_segment_top_level_boxes() {
        let config = TrackConfig {
            track_id: 1,
            timescale: 90000,
            codec: Codec::Avc,
            width: 1280,
            height: 720,
            sample_rate: 0,
            channels: 0,
            codec_private: vec![1, 2, 3],
        };
        let init = write_init_segment(&config);
        let boxes = parse_boxes(&init).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(&boxes[0].box_type, b"ftyp");
        assert_eq!(&boxes[1].box_type, b"moov");

        let trak = boxes[1].find_by_path("trak/mdia/minf/stbl").unwrap();
        assert!(trak.find_child(b"stsd").is_some());
        assert!(boxes[1].find_child(b"mvex").is_some());
    }

    #[test]
    fn parses_media_segment_top_level_boxes() {
        let samples = vec![SampleInfo { data: vec![9; 10], duration: 100, is_keyframe: true, composition_offset: 0 }];
        let segment = write_media_segment(7, 0, &samples);
        let boxes = parse_boxes(&segment).unwrap();
        assert_eq!(boxes.len(), 3);
        assert_eq!(&boxes[0].box_type, b"styp");
        assert_eq!(&boxes[1].box_type, b"moof");
        assert_eq!(&boxes[2].box_type, b"mdat");
        assert_eq!(boxes[2].payload.len(), 10);

        let moof = &boxes[1];
        let traf = moof.find_child(b"traf").unwrap();
        assert!(traf.find_child(b"tfhd").is_some());
        assert!(traf.find_child(b"tfdt").is_some());
        assert!(traf.find_child(b"trun").is_some());
    }

    #[test]
    fn truncated_box_header_is_an_error() {
        let data = [0u8, 0, 0, 20]; // claims size 20 but only 4 bytes present
        let result = parse_boxes(&data);
        assert!(result.is_err());
    }

    #[test]
    fn require_box_reports_unknown_required_box() {
        let boxes = parse_boxes(&super::super::boxes::write_ftyp()).unwrap();
        let err = require_box(&boxes, b"moov", "init segment").unwrap_err();
        assert_eq!(
            err,
            CmafError::UnknownRequiredBox { fourcc: "moov".into(), context: "init segment".into() }
        );
    }
}
