//! Input validation.
//!
//! Two checks guard a conversion: [`validate_upload`] looks at what the
//! caller handed over (name and size) before anything is decoded, and
//! [`validate_metadata`] looks at the resolved video against the sampling
//! settings. Both produce a [`ValidationReport`].
//!
//! # Example
//!
//! ```
//! use flipbook::{UploadLimits, validate_upload};
//!
//! let report = validate_upload("lecture.mp4", 12 * 1024 * 1024, &UploadLimits::default());
//! assert!(report.is_valid());
//!
//! let report = validate_upload("notes.txt", 2048, &UploadLimits::default());
//! assert!(!report.is_valid());
//! print!("{report}");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use crate::{
    configuration::SampleConfig, error::FlipbookError, metadata::VideoMetadata,
    sampler::expected_frame_count,
};

/// Container extensions accepted as video input.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v"];

/// Documents longer than this get a warning.
pub const PAGE_WARNING_THRESHOLD: u64 = 1000;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Limits applied to incoming videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct UploadLimits {
    /// Largest accepted input, in bytes. Defaults to 100 MiB.
    pub max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

impl UploadLimits {
    /// Set the size cap.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Findings from a validation check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues worth surfacing.
    pub warnings: Vec<String>,
    /// Problems that rule out conversion.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }

    /// Append another report's findings to this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.info.extend(other.info);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    /// Turn the report into a `Result`.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::Validation`] listing every error, if there are any.
    pub fn into_result(self) -> Result<(), FlipbookError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(FlipbookError::Validation(self.errors.join("; ")))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check an incoming video by name and size.
///
/// `name` only needs a recognisable extension; it can be a bare file name or
/// a full path.
pub fn validate_upload(name: &str, size_bytes: u64, limits: &UploadLimits) -> ValidationReport {
    let mut report = validate_size(name, size_bytes, limits);

    let extension = Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(extension) if VIDEO_EXTENSIONS.contains(&extension.as_str()) => {
            report.info.push(format!(
                "{name}: {extension} container, {:.1} MB",
                size_bytes as f64 / BYTES_PER_MEGABYTE
            ));
        }
        Some(extension) => report.errors.push(format!(
            "{name} does not look like a video (.{extension}); expected one of {}",
            VIDEO_EXTENSIONS.join(", ")
        )),
        None => report.errors.push(format!(
            "{name} has no file extension; expected one of {}",
            VIDEO_EXTENSIONS.join(", ")
        )),
    }

    report
}

/// Size checks only, for input that has no file name.
pub fn validate_size(name: &str, size_bytes: u64, limits: &UploadLimits) -> ValidationReport {
    let mut report = ValidationReport::default();

    if size_bytes == 0 {
        report.errors.push(format!("{name} is empty"));
    } else if size_bytes > limits.max_bytes {
        report.errors.push(format!(
            "{name} is {:.1} MB, above the {:.1} MB limit",
            size_bytes as f64 / BYTES_PER_MEGABYTE,
            limits.max_bytes as f64 / BYTES_PER_MEGABYTE,
        ));
    }

    report
}

/// Check resolved metadata against the sampling settings.
pub fn validate_metadata(metadata: &VideoMetadata, config: &SampleConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}x{}",
            metadata.width, metadata.height
        ));
    }

    if metadata.duration == Duration::ZERO {
        report
            .warnings
            .push("Video duration is zero; the document will have a single page".to_string());
    }

    if config.validate().is_ok() {
        let pages = expected_frame_count(metadata.duration, config.frames_per_second);
        if pages > PAGE_WARNING_THRESHOLD {
            report.warnings.push(format!(
                "Sampling at {} fps produces about {pages} pages; consider a lower rate",
                config.frames_per_second
            ));
        }
    }

    report.info.push(format!(
        "Video: {} {}x{} @ {:.2} fps, {:.2}s ({})",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.duration.as_secs_f64(),
        metadata.format,
    ));

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_message_reports_megabytes() {
        let limits = UploadLimits::default().with_max_bytes(1024 * 1024);
        let report = validate_upload("big.mp4", 3 * 1024 * 1024 + 512 * 1024, &limits);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("3.5 MB"), "{}", report.errors[0]);
        assert!(report.errors[0].contains("1.0 MB"), "{}", report.errors[0]);
    }

    #[test]
    fn extension_check_ignores_case() {
        let report = validate_upload("CLIP.MOV", 10, &UploadLimits::default());
        assert!(report.is_valid());
    }

    #[test]
    fn into_result_joins_errors() {
        let report = validate_upload("empty", 0, &UploadLimits::default());
        match report.into_result() {
            Err(FlipbookError::Validation(message)) => {
                assert!(message.contains("is empty"));
                assert!(message.contains("no file extension"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
