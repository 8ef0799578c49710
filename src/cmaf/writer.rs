//! High-level fMP4 writer: builds init segments (`ftyp+moov`) and media
//! segments (`styp+moof+mdat`) for a single CMAF track.

use super::boxes::{self, Codec, TrunSample};
use serde::{Deserialize, Serialize};

/// Configuration for a track in an fMP4 init segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub track_id: u32,
    pub timescale: u32,
    pub codec: Codec,
    pub width: u32,
    pub height: u32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Codec-specific configuration bytes (`avcC`, `hvcC`, or AAC `AudioSpecificConfig`).
    pub codec_private: Vec<u8>,
}

/// A single sample (encoded frame) to be written into a media segment's `trun`/`mdat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleInfo {
    pub data: Vec<u8>,
    pub duration: u32,
    pub is_keyframe: bool,
    pub composition_offset: i32,
}

/// Generates an fMP4 initialization segment (`ftyp + moov`). Must be sent
/// before any media segment for the track.
pub fn write_init_segment(config: &TrackConfig) -> Vec<u8> {
    let ftyp = boxes::write_ftyp();

    let trak = if config.codec.is_video() {
        boxes::write_video_trak(
            config.track_id,
            config.timescale,
            0,
            &config.codec,
            config.width,
            config.height,
            &config.codec_private,
        )
    } else {
        boxes::write_audio_trak(
            config.track_id,
            config.timescale,
            0,
            config.sample_rate,
            config.channels,
            &config.codec_private,
        )
    };

    let mvex = boxes::write_mvex(config.track_id);
    let moov = boxes::write_moov(config.timescale, 0, &trak, &mvex);

    let mut result = Vec::with_capacity(ftyp.len() + moov.len());
    result.extend_from_slice(&ftyp);
    result.extend_from_slice(&moov);
    result
}

/// Generates an fMP4 media segment (`styp + moof + mdat`).
///
/// `seq` is the fragment sequence number (per §8 scenario 6, read back from
/// `moof/mfhd` bytes 4..8 as the same value passed here). `decode_time` is
/// the track's base media decode time in timescale units.
pub fn write_media_segment(seq: u32, decode_time: u64, samples: &[SampleInfo]) -> Vec<u8> {
    let track_id = 1u32;

    let styp = boxes::write_styp();
    let mfhd = boxes::write_mfhd(seq);
    let tfhd = boxes::write_tfhd(track_id);
    let tfdt = boxes::write_tfdt(decode_time);

    let trun_samples: Vec<TrunSample> = samples
        .iter()
        .map(|s| TrunSample {
            duration: s.duration,
            size: s.data.len() as u32,
            flags: if s.is_keyframe { 0x02000000 } else { 0x01010000 },
            composition_time_offset: s.composition_offset,
        })
        .collect();

    // trun content: fullbox header(4) + sample_count(4) + data_offset(4) + samples*16
    let trun_content_size = 4 + 4 + 4 + trun_samples.len() * 16;
    let trun_box_size = 8 + trun_content_size;
    let traf_size = 8 + tfhd.len() + tfdt.len() + trun_box_size;
    let moof_size = 8 + mfhd.len() + traf_size;

    let total_data_size: u64 = samples.iter().map(|s| s.data.len() as u64).sum();
    let mdat_hdr_size: usize = if total_data_size + 8 > u32::MAX as u64 { 16 } else { 8 };

    let data_offset = (moof_size + mdat_hdr_size) as i32;
    let trun = boxes::write_trun(&trun_samples, data_offset);

    let traf = boxes::write_container_box(b"traf", &[&tfhd, &tfdt, &trun]);
    let moof = boxes::write_container_box(b"moof", &[&mfhd, &traf]);
    let mdat_hdr = boxes::write_mdat_header(total_data_size);

    let mut result = Vec::with_capacity(styp.len() + moof.len() + mdat_hdr.len() + total_data_size as usize);
    result.extend_from_slice(&styp);
    result.extend_from_slice(&moof);
    result.extend_from_slice(&mdat_hdr);
    for sample in samples {
        result.extend_from_slice(&sample.data);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    #[test]
    fn init_segment_contains_ftyp_and_moov() {
        let config = TrackConfig {
            track_id: 1,
            timescale: 90000,
            codec: Codec::Avc,
            width: 1920,
            height: 1080,
            sample_rate: 0,
            channels: 0,
            codec_private: vec![],
        };

        let init = write_init_segment(&config);
        assert_eq!(&init[4..8], b"ftyp");
        let ftyp_size = read_u32(&init, 0) as usize;
        assert_eq!(&init[ftyp_size + 4..ftyp_size + 8], b"moov");
        let moov_size = read_u32(&init, ftyp_size) as usize;
        assert_eq!(ftyp_size + moov_size, init.len());
    }

    #[test]
    fn init_segment_audio() {
        let config = TrackConfig {
            track_id: 1,
            timescale: 48000,
            codec: Codec::Aac,
            width: 0,
            height: 0,
            sample_rate: 48000,
            channels: 2,
            codec_private: vec![0x11, 0x90],
        };

        let init = write_init_segment(&config);
        assert_eq!(&init[4..8], b"ftyp");
        let ftyp_size = read_u32(&init, 0) as usize;
        assert_eq!(&init[ftyp_size + 4..ftyp_size + 8], b"moov");
    }

    #[test]
    fn media_segment_structure_is_styp_moof_mdat() {
        let samples = vec![
            SampleInfo { data: vec![0xAA; 100], duration: 3000, is_keyframe: true, composition_offset: 0 },
            SampleInfo { data: vec![0xBB; 50], duration: 3000, is_keyframe: false, composition_offset: 1500 },
        ];

        let segment = write_media_segment(1, 0, &samples);
        assert_eq!(&segment[4..8], b"styp");
        let styp_size = read_u32(&segment, 0) as usize;
        assert_eq!(&segment[styp_size + 4..styp_size + 8], b"moof");

        let moof_size = read_u32(&segment, styp_size) as usize;
        let mdat_offset = styp_size + moof_size;
        assert_eq!(&segment[mdat_offset + 4..mdat_offset + 8], b"mdat");

        let mdat_size = read_u32(&segment, mdat_offset) as usize;
        assert_eq!(mdat_size, 8 + 150);
        assert_eq!(segment.len(), mdat_offset + mdat_size);
    }

    #[test]
    fn media_segment_mfhd_carries_sequence_number() {
        for seq in [1u32, 2, 3] {
            let segment = write_media_segment(seq, 0, &[]);
            let styp_size = read_u32(&segment, 0) as usize;
            let moof_start = styp_size;
            // moof header(8) + mfhd starts right after
            let mfhd_start = moof_start + 8;
            assert_eq!(&segment[mfhd_start + 4..mfhd_start + 8], b"mfhd");
            // mfhd payload: size(4)+fourcc(4)+version/flags(4)+sequence_number(4)
            let seq_offset = mfhd_start + 12;
            assert_eq!(read_u32(&segment, seq_offset), seq);
        }
    }

    #[test]
    fn media_segment_data_offset_points_into_mdat() {
        let samples = vec![SampleInfo { data: vec![0xFF; 200], duration: 1000, is_keyframe: true, composition_offset: 0 }];
        let segment = write_media_segment(1, 0, &samples);
        let styp_size = read_u32(&segment, 0) as usize;
        let moof_size = read_u32(&segment, styp_size) as usize;
        let data_start = styp_size + moof_size + 8;
        assert_eq!(&segment[data_start..data_start + 200], &[0xFF; 200]);
    }

    #[test]
    fn media_segment_empty_samples_still_produces_valid_boxes() {
        let segment = write_media_segment(1, 0, &[]);
        let styp_size = read_u32(&segment, 0) as usize;
        assert_eq!(&segment[styp_size + 4..styp_size + 8], b"moof");
    }
}
