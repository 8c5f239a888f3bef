//! End-to-end conversion: video in, PDF out.
//!
//! [`Converter`] wires the pieces together: upload validation, opening the
//! source, sampling, metadata validation, assembly, and PDF serialisation.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ConversionConfig, Converter, FlipbookError, SampleConfig};
//!
//! let config = ConversionConfig::default()
//!     .with_sample(SampleConfig::default().with_frames_per_second(1.0));
//! let pdf = Converter::new(config).convert_path("lecture.mp4")?;
//! std::fs::write("lecture.pdf", pdf)?;
//! # Ok::<(), FlipbookError>(())
//! ```

use std::{fs, path::Path};

use crate::{
    configuration::{ExtractOptions, SampleConfig},
    document::{Document, DocumentOptions, assemble_document_with_options},
    error::FlipbookError,
    sampler::FrameSampler,
    source::{FrameSource, VideoSource},
    validation::{UploadLimits, validate_metadata, validate_size, validate_upload},
};

/// Sampling and document settings for one conversion.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct ConversionConfig {
    /// How frames are sampled.
    pub sample: SampleConfig,
    /// How pages are laid out.
    pub document: DocumentOptions,
}

impl ConversionConfig {
    /// Default sampling on A4 landscape pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sampling settings.
    pub fn with_sample(mut self, sample: SampleConfig) -> Self {
        self.sample = sample;
        self
    }

    /// Replace the document settings.
    pub fn with_document(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    /// Check both halves of the configuration.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::InvalidConfig`] for the first invalid value.
    pub fn validate(&self) -> Result<(), FlipbookError> {
        self.sample.validate()?;
        self.document.page_size.validate()
    }
}

/// Runs conversions with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
    options: ExtractOptions,
    limits: UploadLimits,
}

impl Converter {
    /// Create a converter with no progress reporting and default limits.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            options: ExtractOptions::new(),
            limits: UploadLimits::default(),
        }
    }

    /// Attach progress reporting and cancellation.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the upload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The configuration this converter runs with.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Sample `source` and assemble the frames into a document.
    ///
    /// # Errors
    ///
    /// Configuration, metadata, sampling and assembly errors, in that order.
    /// Nothing partial is returned.
    pub fn convert_source<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Document, FlipbookError> {
        self.config.validate()?;

        let sampler = FrameSampler::new(source, self.config.sample)?;

        let report = validate_metadata(sampler.metadata(), &self.config.sample);
        for warning in &report.warnings {
            log::warn!("{warning}");
        }
        report.into_result()?;

        let frames = sampler.run(&self.options)?;
        let document =
            assemble_document_with_options(&frames, &self.config.document, &self.options)?;

        log::info!(
            "Converted {} frames into a {}-page document",
            frames.len(),
            document.page_count()
        );
        Ok(document)
    }

    /// Convert the video at `path` into PDF bytes.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::Validation`] if the file fails the upload checks,
    /// otherwise as [`convert_source`](Converter::convert_source) and
    /// [`Document::to_pdf_bytes`].
    pub fn convert_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>, FlipbookError> {
        let path = path.as_ref();
        self.config.validate()?;

        let size = fs::metadata(path)?.len();
        validate_upload(&path.display().to_string(), size, &self.limits).into_result()?;

        let mut source = VideoSource::open(path)?;
        self.convert_source(&mut source)?.to_pdf_bytes()
    }

    /// Convert an in-memory video into PDF bytes.
    ///
    /// Only the size limits apply; there is no name to check.
    ///
    /// # Errors
    ///
    /// As [`convert_path`](Converter::convert_path).
    pub fn convert_bytes(&self, bytes: impl AsRef<[u8]>) -> Result<Vec<u8>, FlipbookError> {
        let bytes = bytes.as_ref();
        self.config.validate()?;

        validate_size("input", bytes.len() as u64, &self.limits).into_result()?;

        let mut source = VideoSource::from_bytes(bytes)?;
        self.convert_source(&mut source)?.to_pdf_bytes()
    }
}
