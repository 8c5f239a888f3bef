//! Error types for the `flipbook` crate.
//!
//! [`FlipbookError`] is the single error type returned by every fallible
//! operation, from opening a video through sampling frames to writing the
//! finished PDF. Each pipeline failure has its own variant so callers can
//! tell a bad configuration from an unreadable file or a failed seek.

use std::{io::Error as IoError, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `flipbook` operations.
///
/// No operation returns partial output alongside an error: a failed sampling
/// run yields no frames and a failed assembly yields no document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlipbookError {
    /// A sampling or document setting is out of range.
    ///
    /// Raised before any decoding work starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The video's duration or dimensions could not be resolved.
    #[error("Video metadata unavailable: {reason}")]
    MetadataUnavailable {
        /// Why the metadata could not be read.
        reason: String,
    },

    /// Seeking to a sample timestamp did not produce a frame.
    #[error("Seek to {timestamp:?} failed: {reason}")]
    SeekFailed {
        /// The timestamp the sampler was seeking to.
        timestamp: Duration,
        /// Underlying reason reported by the source.
        reason: String,
    },

    /// The raster surface for the requested output size could not be created.
    #[error("Raster surface {width}x{height} unavailable: {reason}")]
    SurfaceUnavailable {
        /// Requested raster width in pixels.
        width: u32,
        /// Requested raster height in pixels.
        height: u32,
        /// Underlying reason reported by the scaler.
        reason: String,
    },

    /// A frame image could not be decoded while assembling the document.
    #[error("Failed to decode frame {sequence_index}: {reason}")]
    DecodeFailed {
        /// Sequence index of the offending frame.
        sequence_index: u64,
        /// What went wrong.
        reason: String,
    },

    /// A sampled raster could not be encoded as JPEG.
    #[error("Failed to encode frame: {0}")]
    EncodeFailed(String),

    /// The PDF document could not be serialised.
    #[error("Failed to write document: {0}")]
    DocumentWrite(String),

    /// The input was rejected by upload validation.
    #[error("Input rejected: {0}")]
    Validation(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FlipbookError {
    fn from(error: FfmpegError) -> Self {
        FlipbookError::FfmpegError(error.to_string())
    }
}
