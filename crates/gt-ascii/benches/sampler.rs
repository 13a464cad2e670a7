//! Criterion benchmarks for the sampler hot path.
//!
//! Run with: `cargo bench -p gt-ascii`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use gt_ascii::sampler::{SampleOptions, sample};
use gt_core::config::SamplingPolicy;
use gt_core::{Alphabet, FrameBuffer, ThemeTable};

/// 1920×1080 diagonal gradient, roughly a photo-sized input.
fn make_frame() -> FrameBuffer {
    let (w, h) = (1920u32, 1080u32);
    let mut fb = FrameBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = ((x + y) * 255 / (w + h)) as u8;
            fb.set_pixel(x, y, (v, 255 - v, v / 2));
        }
    }
    fb
}

fn bench_sample(c: &mut Criterion) {
    let frame = make_frame();
    let table = ThemeTable::builtin();
    let Some(theme) = table.get("light") else {
        return;
    };
    let alphabet = Alphabet::default();

    let mut group = c.benchmark_group("sample");
    for columns in [128u32, 320] {
        group.throughput(Throughput::Elements(u64::from(columns)));
        for (label, sampling) in [
            ("point", SamplingPolicy::PointSample),
            ("averaged", SamplingPolicy::AveragedResize),
        ] {
            let opts = SampleOptions {
                sampling,
                ..SampleOptions::default()
            };
            group.bench_with_input(BenchmarkId::new(label, columns), &columns, |b, &cols| {
                b.iter(|| sample(black_box(&frame), cols, theme, &alphabet, &opts));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_sample);
criterion_main!(benches);
