//! Low-level ISO-BMFF box construction helpers shared by
//! [`super::writer`]'s init- and media-segment builders.

use crate::binary::ByteWriter;
use serde::{Deserialize, Serialize};

/// Codec carried by a single CMAF track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    Avc,
    Hevc,
    Aac,
}

impl Codec {
    pub fn is_video(self) -> bool {
        matches!(self, Codec::Avc | Codec::Hevc)
    }

    /// Sample entry FourCC (`avc1`, `hvc1`, `mp4a`).
    pub fn sample_entry_fourcc(self) -> &'static [u8; 4] {
        match self {
            Codec::Avc => b"avc1",
            Codec::Hevc => b"hvc1",
            Codec::Aac => b"mp4a",
        }
    }
}

/// Wraps `payload` in a standard box header (`size + fourcc + payload`).
pub fn write_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(8 + payload.len());
    w.write_box_size(8 + payload.len() as u64);
    w.write_fourcc(fourcc);
    w.write_bytes(payload);
    w.into_vec()
}

/// Wraps `payload` in a full-box header (`size + fourcc + version + flags + payload`).
pub fn write_full_box(fourcc: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = ByteWriter::with_capacity(4 + payload.len());
    body.write_u8(version);
    body.write_bytes(&flags.to_be_bytes()[1..]);
    body.write_bytes(payload);
    write_box(fourcc, body.as_slice())
}

/// Concatenates `children` and wraps them in a container box header.
pub fn write_container_box(fourcc: &[u8; 4], children: &[&[u8]]) -> Vec<u8> {
    let total: usize = children.iter().map(|c| c.len()).sum();
    let mut payload = Vec::with_capacity(total);
    for child in children {
        payload.extend_from_slice(child);
    }
    write_box(fourcc, &payload)
}

/// `ftyp` for an init segment: major brand `iso5`, compatible brands
/// `iso5`, `iso6`, `mp41`.
pub fn write_ftyp() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_fourcc(b"iso5");
    body.write_u32(0); // minor version
    for brand in [b"iso5", b"iso6", b"mp41"] {
        body.write_fourcc(brand);
    }
    write_box(b"ftyp", body.as_slice())
}

/// `styp` for a media segment: major brand `msdh`, compatible brands
/// `msdh`, `msix`.
pub fn write_styp() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_fourcc(b"msdh");
    body.write_u32(0);
    for brand in [b"msdh", b"msix"] {
        body.write_fourcc(brand);
    }
    write_box(b"styp", body.as_slice())
}

fn write_mvhd(timescale: u32, duration: u64, next_track_id: u32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // creation_time
    body.write_u32(0); // modification_time
    body.write_u32(timescale);
    body.write_u32(duration.min(u32::MAX as u64) as u32);
    body.write_fixed_16_16(1.0); // rate
    body.write_fixed_8_8(1.0); // volume
    body.write_u16(0); // reserved
    body.write_u64(0); // reserved[2]
    // unity matrix
    for v in [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0] {
        body.write_fixed_16_16(v);
    }
    body.write_u32(0x40000000); // last matrix value, 2.30 fixed point
    body.write_zeros(24); // pre_defined
    body.write_u32(next_track_id);
    write_full_box(b"mvhd", 0, 0, body.as_slice())
}

fn write_tkhd(track_id: u32, duration: u64, width: u32, height: u32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // creation_time
    body.write_u32(0); // modification_time
    body.write_u32(track_id);
    body.write_u32(0); // reserved
    body.write_u32(duration.min(u32::MAX as u64) as u32);
    body.write_u64(0); // reserved[2]
    body.write_i16(0); // layer
    body.write_i16(0); // alternate_group
    body.write_fixed_8_8(if width > 0 { 0.0 } else { 1.0 }); // volume: 1.0 for audio
    body.write_u16(0); // reserved
    for v in [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0] {
        body.write_fixed_16_16(v);
    }
    body.write_u32(0x40000000);
    body.write_fixed_16_16(width as f64);
    body.write_fixed_16_16(height as f64);
    write_full_box(b"tkhd", 0, 0x000007, body.as_slice())
}

fn write_mdhd(timescale: u32, duration: u64) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0);
    body.write_u32(0);
    body.write_u32(timescale);
    body.write_u32(duration.min(u32::MAX as u64) as u32);
    body.write_u16(0x55c4); // language "und"
    body.write_u16(0);
    write_full_box(b"mdhd", 0, 0, body.as_slice())
}

fn write_hdlr(is_video: bool) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // pre_defined
    body.write_fourcc(if is_video { b"vide" } else { b"soun" });
    body.write_zeros(12); // reserved
    let name = if is_video { b"VideoHandler\0".as_slice() } else { b"SoundHandler\0".as_slice() };
    body.write_bytes(name);
    write_full_box(b"hdlr", 0, 0, body.as_slice())
}

fn write_vmhd() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u16(0); // graphicsmode
    body.write_u16(0);
    body.write_u16(0);
    body.write_u16(0); // opcolor
    write_full_box(b"vmhd", 0, 1, body.as_slice())
}

fn write_smhd() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_i16(0); // balance
    body.write_u16(0);
    write_full_box(b"smhd", 0, 0, body.as_slice())
}

fn write_dref() -> Vec<u8> {
    let url_box = write_full_box(b"url ", 0, 1, &[]);
    let mut body = ByteWriter::new();
    body.write_u32(1); // entry_count
    body.write_bytes(&url_box);
    write_full_box(b"dref", 0, 0, body.as_slice())
}

fn write_dinf() -> Vec<u8> {
    write_container_box(b"dinf", &[&write_dref()])
}

fn write_avcc(codec_private: &[u8]) -> Vec<u8> {
    write_box(b"avcC", codec_private)
}

fn write_hvcc(codec_private: &[u8]) -> Vec<u8> {
    write_box(b"hvcC", codec_private)
}

fn write_avc1(width: u32, height: u32, codec_private: &[u8]) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_zeros(6); // reserved
    body.write_u16(1); // data_reference_index
    body.write_u16(0); // pre_defined
    body.write_u16(0); // reserved
    body.write_zeros(12); // pre_defined[3]
    body.write_u16(width as u16);
    body.write_u16(height as u16);
    body.write_fixed_16_16(72.0); // horizresolution
    body.write_fixed_16_16(72.0); // vertresolution
    body.write_u32(0); // reserved
    body.write_u16(1); // frame_count
    body.write_zeros(32); // compressorname
    body.write_u16(0x0018); // depth
    body.write_i16(-1); // pre_defined
    body.write_bytes(&write_avcc(codec_private));
    write_box(b"avc1", body.as_slice())
}

fn write_hvc1(width: u32, height: u32, codec_private: &[u8]) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_zeros(6);
    body.write_u16(1);
    body.write_u16(0);
    body.write_u16(0);
    body.write_zeros(12);
    body.write_u16(width as u16);
    body.write_u16(height as u16);
    body.write_fixed_16_16(72.0);
    body.write_fixed_16_16(72.0);
    body.write_u32(0);
    body.write_u16(1);
    body.write_zeros(32);
    body.write_u16(0x0018);
    body.write_i16(-1);
    body.write_bytes(&write_hvcc(codec_private));
    write_box(b"hvc1", body.as_slice())
}

fn write_esds(codec_private: &[u8]) -> Vec<u8> {
    // Minimal MPEG-4 ES descriptor wrapping the AudioSpecificConfig bytes.
    let mut dec_specific = vec![0x05, codec_private.len() as u8];
    dec_specific.extend_from_slice(codec_private);

    let mut dec_config = vec![0x04, (13 + dec_specific.len()) as u8];
    dec_config.push(0x40); // object type: AAC
    dec_config.push(0x15); // stream type + reserved + upstream
    dec_config.extend_from_slice(&[0, 0, 0]); // buffer size
    dec_config.extend_from_slice(&0u32.to_be_bytes()); // max bitrate
    dec_config.extend_from_slice(&0u32.to_be_bytes()); // avg bitrate
    dec_config.extend_from_slice(&dec_specific);

    let mut sl_config = vec![0x06, 0x01, 0x02];

    let mut es_descriptor = vec![0x03, (3 + dec_config.len() + sl_config.len()) as u8];
    es_descriptor.extend_from_slice(&[0, 0, 0]); // ES_ID + flags
    es_descriptor.extend_from_slice(&dec_config);
    es_descriptor.append(&mut sl_config);

    write_full_box(b"esds", 0, 0, &es_descriptor)
}

fn write_mp4a(sample_rate: u32, channels: u16, codec_private: &[u8]) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_zeros(6);
    body.write_u16(1); // data_reference_index
    body.write_u64(0); // reserved
    body.write_u16(channels);
    body.write_u16(16); // sample size
    body.write_u16(0); // pre_defined
    body.write_u16(0); // reserved
    body.write_fixed_16_16(sample_rate as f64);
    body.write_bytes(&write_esds(codec_private));
    write_box(b"mp4a", body.as_slice())
}

fn write_stsd(codec: &Codec, width: u32, height: u32, sample_rate: u32, channels: u16, codec_private: &[u8]) -> Vec<u8> {
    let entry = match codec {
        Codec::Avc => write_avc1(width, height, codec_private),
        Codec::Hevc => write_hvc1(width, height, codec_private),
        Codec::Aac => write_mp4a(sample_rate, channels, codec_private),
    };
    let mut body = ByteWriter::new();
    body.write_u32(1); // entry_count
    body.write_bytes(&entry);
    write_full_box(b"stsd", 0, 0, body.as_slice())
}

fn write_empty_time_to_sample_box(fourcc: &[u8; 4]) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // entry_count
    write_full_box(fourcc, 0, 0, body.as_slice())
}

/// `stbl/stco` (or `co64`) with zero entries: sample offsets live entirely
/// in each media segment's own `trun`, never in the init segment.
fn write_co64_empty() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // entry_count
    write_full_box(b"co64", 0, 0, body.as_slice())
}

fn write_stsc_empty() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0);
    write_full_box(b"stsc", 0, 0, body.as_slice())
}

fn write_stsz_empty() -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(0); // sample_size
    body.write_u32(0); // sample_count
    write_full_box(b"stsz", 0, 0, body.as_slice())
}

fn write_stbl(codec: &Codec, width: u32, height: u32, sample_rate: u32, channels: u16, codec_private: &[u8]) -> Vec<u8> {
    let stsd = write_stsd(codec, width, height, sample_rate, channels, codec_private);
    let stts = write_empty_time_to_sample_box(b"stts");
    let stsc = write_stsc_empty();
    let stsz = write_stsz_empty();
    let co64 = write_co64_empty();
    write_container_box(b"stbl", &[&stsd, &stts, &stsc, &stsz, &co64])
}

fn write_minf(is_video: bool, stbl: &[u8]) -> Vec<u8> {
    let media_header = if is_video { write_vmhd() } else { write_smhd() };
    let dinf = write_dinf();
    write_container_box(b"minf", &[&media_header, &dinf, stbl])
}

fn write_mdia(is_video: bool, timescale: u32, duration: u64, stbl: &[u8]) -> Vec<u8> {
    let mdhd = write_mdhd(timescale, duration);
    let hdlr = write_hdlr(is_video);
    let minf = write_minf(is_video, stbl);
    write_container_box(b"mdia", &[&mdhd, &hdlr, &minf])
}

pub fn write_video_trak(
    track_id: u32,
    timescale: u32,
    duration: u64,
    codec: &Codec,
    width: u32,
    height: u32,
    codec_private: &[u8],
) -> Vec<u8> {
    let tkhd = write_tkhd(track_id, duration, width, height);
    let stbl = write_stbl(codec, width, height, 0, 0, codec_private);
    let mdia = write_mdia(true, timescale, duration, &stbl);
    write_container_box(b"trak", &[&tkhd, &mdia])
}

pub fn write_audio_trak(
    track_id: u32,
    timescale: u32,
    duration: u64,
    sample_rate: u32,
    channels: u16,
    codec_private: &[u8],
) -> Vec<u8> {
    let tkhd = write_tkhd(track_id, duration, 0, 0);
    let stbl = write_stbl(&Codec::Aac, 0, 0, sample_rate, channels, codec_private);
    let mdia = write_mdia(false, timescale, duration, &stbl);
    write_container_box(b"trak", &[&tkhd, &mdia])
}

fn write_trex(track_id: u32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(track_id);
    body.write_u32(1); // default_sample_description_index
    body.write_u32(0); // default_sample_duration
    body.write_u32(0); // default_sample_size
    body.write_u32(0); // default_sample_flags
    write_full_box(b"trex", 0, 0, body.as_slice())
}

pub fn write_mvex(track_id: u32) -> Vec<u8> {
    write_container_box(b"mvex", &[&write_trex(track_id)])
}

pub fn write_moov(timescale: u32, duration: u64, trak: &[u8], mvex: &[u8]) -> Vec<u8> {
    let mvhd = write_mvhd(timescale, duration, 2);
    write_container_box(b"moov", &[&mvhd, trak, mvex])
}

pub fn write_mfhd(sequence_number: u32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(sequence_number);
    write_full_box(b"mfhd", 0, 0, body.as_slice())
}

pub fn write_tfhd(track_id: u32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(track_id);
    // flags=0: no base-data-offset, no sample-description-index override.
    write_full_box(b"tfhd", 0, 0, body.as_slice())
}

pub fn write_tfdt(base_media_decode_time: u64) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u64(base_media_decode_time);
    write_full_box(b"tfdt", 1, 0, body.as_slice())
}

/// A single entry in a `trun` box.
#[derive(Debug, Clone, Copy)]
pub struct TrunSample {
    pub duration: u32,
    pub size: u32,
    pub flags: u32,
    pub composition_time_offset: i32,
}

/// `trun` with per-sample duration/size/flags/cts present (flags `0x000F01`:
/// data-offset, sample-duration, sample-size, sample-flags,
/// sample-composition-time-offset).
pub fn write_trun(samples: &[TrunSample], data_offset: i32) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.write_u32(samples.len() as u32);
    body.write_i32(data_offset);
    for sample in samples {
        body.write_u32(sample.duration);
        body.write_u32(sample.size);
        body.write_u32(sample.flags);
        body.write_i32(sample.composition_time_offset);
    }
    write_full_box(b"trun", 0, 0x000F01, body.as_slice())
}

pub fn write_mdat_header(total_data_size: u64) -> Vec<u8> {
    if total_data_size + 8 > u32::MAX as u64 {
        let mut w = ByteWriter::new();
        w.write_u32(1);
        w.write_fourcc(b"mdat");
        w.write_u64(total_data_size + 16);
        w.into_vec()
    } else {
        let mut w = ByteWriter::new();
        w.write_u32((total_data_size + 8) as u32);
        w.write_fourcc(b"mdat");
        w.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftyp_has_major_and_three_compatible_brands() {
        let ftyp = write_ftyp();
        // size(4) + fourcc(4) + major(4) + minor(4) + 3*compat(4) = 28
        assert_eq!(ftyp.len(), 28);
        assert_eq!(&ftyp[8..12], b"iso5");
    }

    #[test]
    fn styp_uses_msdh_brand() {
        let styp = write_styp();
        assert_eq!(&styp[8..12], b"msdh");
    }

    #[test]
    fn mdat_header_is_16_bytes_for_huge_payloads() {
        let header = write_mdat_header(u32::MAX as u64 + 1);
        assert_eq!(header.len(), 16);
        assert_eq!(u32::from_be_bytes(header[0..4].try_into().unwrap()), 1);
    }

    #[test]
    fn mdat_header_is_8_bytes_normally() {
        let header = write_mdat_header(100);
        assert_eq!(header.len(), 8);
        assert_eq!(u32::from_be_bytes(header[0..4].try_into().unwrap()), 108);
    }
}
