//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions.

use std::time::Duration;

use flipbook::{ConversionConfig, Converter, FlipbookError, VideoSource};

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4");
    match result {
        Err(FlipbookError::MetadataUnavailable { reason }) => {
            assert!(
                reason.contains("this_file_does_not_exist.mp4"),
                "reason should name the file: {reason}"
            );
        }
        other => panic!("expected MetadataUnavailable, got {other:?}"),
    }
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = VideoSource::open(&invalid_file_path);
    assert!(matches!(result, Err(FlipbookError::MetadataUnavailable { .. })));
}

#[test]
fn open_invalid_bytes() {
    let result = VideoSource::from_bytes(b"garbage bytes, no container here");
    assert!(matches!(result, Err(FlipbookError::MetadataUnavailable { .. })));
}

#[test]
fn convert_missing_path_is_io_error() {
    let result = Converter::new(ConversionConfig::default()).convert_path("missing/video.mp4");
    assert!(matches!(result, Err(FlipbookError::IoError(_))));
}

#[test]
fn convert_rejects_non_video_upload_before_decoding() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("notes.txt");
    std::fs::write(&path, b"plain text").expect("Failed to write file");

    let result = Converter::new(ConversionConfig::default()).convert_path(&path);
    assert!(matches!(result, Err(FlipbookError::Validation(_))));
}

#[test]
fn convert_rejects_empty_bytes() {
    let result = Converter::new(ConversionConfig::default()).convert_bytes(Vec::new());
    assert!(matches!(result, Err(FlipbookError::Validation(_))));
}

#[test]
fn error_messages_are_descriptive() {
    let seek = FlipbookError::SeekFailed {
        timestamp: Duration::from_secs(4),
        reason: "end of stream".to_string(),
    };
    assert_eq!(seek.to_string(), "Seek to 4s failed: end of stream");

    let surface = FlipbookError::SurfaceUnavailable {
        width: 1920,
        height: 1080,
        reason: "out of memory".to_string(),
    };
    assert!(surface.to_string().contains("1920x1080"));

    let decode = FlipbookError::DecodeFailed {
        sequence_index: 3,
        reason: "truncated".to_string(),
    };
    assert!(decode.to_string().contains("frame 3"));

    assert_eq!(FlipbookError::Cancelled.to_string(), "Operation cancelled");
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: FlipbookError = io.into();
    assert!(matches!(error, FlipbookError::IoError(_)));
}
