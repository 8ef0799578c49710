use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hlskit::manifest::generator::generate_media;
use hlskit::manifest::model::{MediaPlaylist, Segment};
use hlskit::manifest::parser::parse;

fn sample_playlist(segment_count: u32) -> MediaPlaylist {
    let mut playlist = MediaPlaylist::new();
    playlist.target_duration = 6;
    playlist.independent_segments = true;
    for i in 0..segment_count {
        playlist.segments.push(Segment::new(6.0, format!("segment_{i}.m4s")));
    }
    playlist
}

fn bench_generate(c: &mut Criterion) {
    let playlist = sample_playlist(50);
    c.bench_function("generate_media_50_segments", |b| {
        b.iter(|| generate_media(black_box(&playlist)));
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let playlist = sample_playlist(50);
    let rendered = generate_media(&playlist);
    c.bench_function("parse_50_segment_playlist", |b| {
        b.iter(|| parse(black_box(&rendered)).unwrap());
    });
}

criterion_group!(benches, bench_generate, bench_round_trip);
criterion_main!(benches);
