//! Benchmarks for layout, document assembly and sampling.
//!
//! Run with: cargo bench
//! Run with parallel decoding: cargo bench --features rayon
//!
//! The sampling benchmark needs fixtures from `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion};
use flipbook::{
    DocumentOptions, ExtractOptions, FfmpegLogLevel, Frame, PageLayout, PageSize, SampleConfig,
    VideoSource,
};
use image::{RgbImage, codecs::jpeg::JpegEncoder};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn synthetic_frames(count: u64, width: u32, height: u32) -> Vec<Frame> {
    (0..count)
        .map(|index| {
            let image = RgbImage::from_fn(width, height, |x, y| {
                image::Rgb([(x % 256) as u8, (y % 256) as u8, (index * 40 % 256) as u8])
            });
            let mut image_bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut image_bytes, 80)
                .encode_image(&image)
                .unwrap();
            Frame {
                image_bytes,
                width,
                height,
                sequence_index: index,
                timestamp: Duration::from_secs(index * 2),
            }
        })
        .collect()
}

fn benchmark_layout(criterion: &mut Criterion) {
    let sizes: Vec<(u32, u32)> = (1..=64)
        .flat_map(|w| (1..=64).map(move |h| (w * 60, h * 34)))
        .collect();
    let page = PageSize::default();

    criterion.bench_function("fit 4096 aspect ratios", |bencher| {
        bencher.iter(|| {
            for &(width, height) in &sizes {
                black_box(PageLayout::fit(width, height, page));
            }
        });
    });
}

fn benchmark_assembly(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("assemble document");
    let options = DocumentOptions::new();

    for count in [1_u64, 10, 50] {
        let frames = synthetic_frames(count, 640, 360);
        group.bench_with_input(BenchmarkId::from_parameter(count), &frames, |bencher, frames| {
            bencher.iter(|| flipbook::assemble_document(frames, &options).unwrap());
        });
    }
    group.finish();

    let frames = synthetic_frames(10, 640, 360);
    let document = flipbook::assemble_document(&frames, &options).unwrap();
    criterion.bench_function("serialise 10-page pdf", |bencher| {
        bencher.iter(|| document.to_pdf_bytes().unwrap());
    });
}

fn benchmark_sampling(criterion: &mut Criterion) {
    flipbook::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping sampling benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("sample video");
    group.sample_size(10);

    for fps in [0.5, 2.0] {
        let config = SampleConfig::default()
            .with_frames_per_second(fps)
            .with_max_dimension(320);
        group.bench_with_input(BenchmarkId::new("fps", fps), &config, |bencher, config| {
            bencher.iter(|| {
                let mut source = VideoSource::open(SAMPLE_VIDEO).unwrap();
                flipbook::extract_frames(&mut source, config, &ExtractOptions::new()).unwrap()
            });
        });
    }
    group.finish();
}

criterion::criterion_group!(benches, benchmark_layout, benchmark_assembly, benchmark_sampling);
criterion::criterion_main!(benches);
