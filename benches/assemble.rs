//! Benchmark: timeline assembly from per-segment clips.

use criterion::{Criterion, criterion_group, criterion_main};
use polydub::audio::{AudioTrack, PlacedClip, assemble_speech_track};
use polydub::defaults::SAMPLE_RATE;
use polydub::error::NullReporter;
use std::hint::black_box;
use tempfile::TempDir;

/// Lays out `count` clips of ~2s speech in 3s slots, every fourth one
/// overlong enough to trigger compression.
fn build_clips(dir: &TempDir, count: usize) -> Vec<PlacedClip> {
    (0..count)
        .map(|i| {
            let duration = if i % 4 == 0 { 5.0 } else { 2.0 };
            let len = (duration * SAMPLE_RATE as f64) as usize;
            let samples: Vec<i16> = (0..len).map(|n| ((n * 31) % 4096) as i16 - 2048).collect();
            let path = dir.path().join(format!("seg_{:04}.wav", i));
            AudioTrack::from_samples(samples, SAMPLE_RATE)
                .to_wav(&path)
                .expect("write clip");

            let start = i as f64 * 3.0;
            PlacedClip {
                source: path,
                start,
                end: start + 3.0,
            }
        })
        .collect()
}

fn bench_assemble(c: &mut Criterion) {
    let dir = TempDir::new().expect("tempdir");
    let clips = build_clips(&dir, 50);

    c.bench_function("assemble_50_clips", |b| {
        b.iter(|| {
            let track = assemble_speech_track(black_box(&clips), &NullReporter)
                .expect("assemble");
            black_box(track.len())
        })
    });
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
