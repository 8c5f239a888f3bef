//! FFmpeg-backed source tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

mod common;

use std::time::Duration;

use flipbook::{FlipbookError, FrameSource, VideoSource};

#[test]
fn fixture_metadata() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let source = VideoSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata().unwrap();

    assert_eq!((metadata.width, metadata.height), (640, 480));
    assert!((metadata.duration.as_secs_f64() - 5.0).abs() < 0.2);
    assert!((metadata.frames_per_second - 30.0).abs() < 0.1);
    assert!(!metadata.codec.is_empty());
}

#[test]
fn rasterize_before_seek_fails() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let result = source.rasterize(64, 48);
    assert!(matches!(result, Err(FlipbookError::SeekFailed { .. })));
}

#[test]
fn seek_then_rasterize_at_requested_size() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    source.seek(Duration::from_secs(2)).unwrap();
    let raster = source.rasterize(320, 240).unwrap();
    assert_eq!(raster.dimensions(), (320, 240));

    // Same frame, different size: the scaler is rebuilt.
    let raster = source.rasterize(100, 75).unwrap();
    assert_eq!(raster.dimensions(), (100, 75));
}

#[test]
fn seeks_backwards_and_forwards() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    for seconds in [3.0, 0.5, 4.0, 0.0] {
        source.seek(Duration::from_secs_f64(seconds)).unwrap();
        assert!(source.rasterize(32, 24).is_ok());
    }
}

#[test]
fn seek_past_end_shows_final_frame() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let duration = source.metadata().unwrap().duration;
    source.seek(duration + Duration::from_secs(10)).unwrap();
    assert!(source.rasterize(32, 24).is_ok());
}

#[test]
fn byte_source_removes_its_spill_file() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let bytes = std::fs::read(path).unwrap();
    let source = VideoSource::from_bytes(&bytes).expect("Failed to open fixture bytes");
    let spill = source.path().to_path_buf();
    assert!(spill.exists());

    drop(source);
    assert!(!spill.exists());
}
