use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hlskit::cmaf::writer::{write_init_segment, write_media_segment, SampleInfo, TrackConfig};
use hlskit::cmaf::Codec;

fn video_track_config() -> TrackConfig {
    TrackConfig {
        track_id: 1,
        timescale: 90_000,
        codec: Codec::Avc,
        width: 1920,
        height: 1080,
        sample_rate: 0,
        channels: 0,
        codec_private: vec![0x01, 0x64, 0x00, 0x1f],
    }
}

fn gop_samples(count: usize) -> Vec<SampleInfo> {
    (0..count)
        .map(|i| SampleInfo {
            data: vec![0xAB; 4_000],
            duration: 3_000,
            is_keyframe: i == 0,
            composition_offset: if i == 0 { 0 } else { 1_500 },
        })
        .collect()
}

fn bench_init_segment(c: &mut Criterion) {
    let config = video_track_config();
    c.bench_function("write_init_segment", |b| {
        b.iter(|| write_init_segment(black_box(&config)));
    });
}

fn bench_media_segment(c: &mut Criterion) {
    let samples = gop_samples(60);
    c.bench_function("write_media_segment_60_samples", |b| {
        b.iter(|| write_media_segment(black_box(1), black_box(0), black_box(&samples)));
    });
}

criterion_group!(benches, bench_init_segment, bench_media_segment);
criterion_main!(benches);
