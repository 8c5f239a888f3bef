//! Validation integration tests.

mod common;

use std::time::Duration;

use flipbook::{
    FlipbookError, SampleConfig, UploadLimits, ValidationReport, VideoMetadata, VideoSource,
    validate_metadata, validate_size, validate_upload,
};

const MEGABYTE: u64 = 1024 * 1024;

// ── Uploads ──────────────────────────────────────────────────────

#[test]
fn accepts_known_video_containers() {
    for name in ["a.mp4", "b.mov", "c.avi", "d.mkv", "e.webm", "f.m4v", "dir/talk.MP4"] {
        let report = validate_upload(name, 5 * MEGABYTE, &UploadLimits::default());
        assert!(report.is_valid(), "{name}: {report}");
        assert_eq!(report.info.len(), 1);
    }
}

#[test]
fn rejects_non_video_extensions() {
    let report = validate_upload("slides.pdf", MEGABYTE, &UploadLimits::default());
    assert!(!report.is_valid());
    assert!(report.errors[0].contains(".pdf"));
}

#[test]
fn default_limit_is_100_megabytes() {
    let limits = UploadLimits::default();
    assert_eq!(limits.max_bytes, 100 * MEGABYTE);

    assert!(validate_upload("edge.mp4", 100 * MEGABYTE, &limits).is_valid());

    let report = validate_upload("big.mp4", 150 * MEGABYTE, &limits);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("150.0 MB"), "{}", report.errors[0]);
    assert!(report.errors[0].contains("100.0 MB"), "{}", report.errors[0]);
}

#[test]
fn rejects_empty_input() {
    let report = validate_size("input", 0, &UploadLimits::default());
    assert!(!report.is_valid());
    assert!(matches!(report.into_result(), Err(FlipbookError::Validation(_))));
}

#[test]
fn size_check_has_no_extension_requirement() {
    let report = validate_size("input", 10, &UploadLimits::default());
    assert!(report.is_valid());
    assert_eq!(report.issue_count(), 0);
}

// ── Metadata ─────────────────────────────────────────────────────

#[test]
fn normal_metadata_only_has_info() {
    let metadata = VideoMetadata::new(Duration::from_secs(60), 1920, 1080);
    let report = validate_metadata(&metadata, &SampleConfig::default());

    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
    assert_eq!(report.info.len(), 1);
    assert!(report.info[0].contains("1920x1080"));
}

#[test]
fn zero_dimensions_are_errors() {
    let metadata = VideoMetadata::new(Duration::from_secs(60), 0, 1080);
    let report = validate_metadata(&metadata, &SampleConfig::default());
    assert!(!report.is_valid());
}

#[test]
fn zero_duration_is_a_warning() {
    let metadata = VideoMetadata::new(Duration::ZERO, 640, 480);
    let report = validate_metadata(&metadata, &SampleConfig::default());
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn very_long_documents_are_flagged() {
    let metadata = VideoMetadata::new(Duration::from_secs(3 * 3600), 640, 480);
    let report = validate_metadata(&metadata, &SampleConfig::default());
    assert!(report.is_valid());
    assert!(report.warnings.iter().any(|warning| warning.contains("pages")));
}

// ── Report ───────────────────────────────────────────────────────

#[test]
fn display_prefixes_each_category() {
    let report = ValidationReport {
        info: vec!["note".to_string()],
        warnings: vec!["careful".to_string()],
        errors: vec!["broken".to_string()],
    };
    let text = report.to_string();
    assert!(text.contains("[INFO] note"));
    assert!(text.contains("[WARN] careful"));
    assert!(text.contains("[ERROR] broken"));
    assert_eq!(report.issue_count(), 3);
}

#[test]
fn empty_report_says_so() {
    assert_eq!(ValidationReport::default().to_string(), "No issues found.\n");
}

#[test]
fn merge_combines_reports() {
    let mut report = validate_upload("talk.mp4", MEGABYTE, &UploadLimits::default());
    report.merge(validate_metadata(
        &VideoMetadata::new(Duration::ZERO, 0, 0),
        &SampleConfig::default(),
    ));
    assert_eq!(report.info.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.errors.len(), 1);
}

// ── Real video ───────────────────────────────────────────────────

#[test]
fn fixture_metadata_is_valid() {
    let Some(path) = common::sample_video() else {
        return;
    };

    let source = VideoSource::open(path).expect("Failed to open fixture");
    let metadata = flipbook::FrameSource::metadata(&source).unwrap();
    let report = validate_metadata(&metadata, &SampleConfig::default());
    assert!(report.is_valid(), "{report}");
}
