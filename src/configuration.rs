//! Sampling configuration.
//!
//! [`SampleConfig`] fixes *what* gets sampled: the rate, the output raster
//! size and the JPEG quality. [`ExtractOptions`] carries the operational
//! hooks (progress callback, cancellation token) through extraction methods
//! without polluting every signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use flipbook::{CancellationToken, DimensionBound, ExtractOptions, ProgressInfo, SampleConfig};
//!
//! let config = SampleConfig::new()
//!     .with_frames_per_second(1.0)
//!     .with_max_dimension(1280)
//!     .with_dimension_bound(DimensionBound::LongestEdge)
//!     .with_jpeg_quality(0.9);
//! assert!(config.validate().is_ok());
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(|info: &ProgressInfo| println!("{:.0}%", info.percentage)))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::FlipbookError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Which raster dimension `max_dimension` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DimensionBound {
    /// Bound the width only. A tall video may end up taller than
    /// `max_dimension`. This is the default.
    #[default]
    Width,
    /// Bound whichever of width and height is longer.
    LongestEdge,
}

/// Frame sampling settings.
///
/// Defaults: one frame every two seconds (`0.5` fps), at most 1920 pixels
/// wide, JPEG quality `0.8`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct SampleConfig {
    /// Samples per second of video. The sampling interval is
    /// `1 / frames_per_second` seconds.
    pub frames_per_second: f64,
    /// Upper bound, in pixels, for the dimension selected by
    /// [`dimension_bound`](SampleConfig::dimension_bound).
    pub max_dimension: u32,
    /// Lossy encoding quality in `0.0..=1.0`.
    pub jpeg_quality: f32,
    /// Which dimension `max_dimension` applies to.
    pub dimension_bound: DimensionBound,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 0.5,
            max_dimension: 1920,
            jpeg_quality: 0.8,
            dimension_bound: DimensionBound::Width,
        }
    }
}

impl SampleConfig {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling rate in frames per second.
    pub fn with_frames_per_second(mut self, frames_per_second: f64) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    /// Set the maximum raster dimension in pixels.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Set the JPEG quality (`0.0..=1.0`).
    pub fn with_jpeg_quality(mut self, jpeg_quality: f32) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    /// Choose which dimension `max_dimension` bounds.
    pub fn with_dimension_bound(mut self, bound: DimensionBound) -> Self {
        self.dimension_bound = bound;
        self
    }

    /// Seconds between two consecutive samples.
    pub fn interval_seconds(&self) -> f64 {
        1.0 / self.frames_per_second
    }

    /// The quality value handed to the JPEG encoder (`1..=100`).
    pub(crate) fn encoder_quality(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::InvalidConfig`] for a non-positive or
    /// non-finite rate, a zero `max_dimension`, or a quality outside
    /// `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), FlipbookError> {
        if !self.frames_per_second.is_finite() || self.frames_per_second <= 0.0 {
            return Err(FlipbookError::InvalidConfig(format!(
                "frames_per_second must be a positive number, got {}",
                self.frames_per_second
            )));
        }
        if self.max_dimension == 0 {
            return Err(FlipbookError::InvalidConfig(
                "max_dimension must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jpeg_quality) {
            return Err(FlipbookError::InvalidConfig(format!(
                "jpeg_quality must be within 0.0..=1.0, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Operational hooks for extraction and assembly.
///
/// A default-constructed value reports progress nowhere and is never
/// cancelled.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with no progress callback and no cancellation.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token fires, the sampling loop stops before its next seek
    /// and returns [`FlipbookError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
