//! Shared test doubles.

#![allow(dead_code)]

use std::time::Duration;

use flipbook::{FlipbookError, FrameSource, VideoMetadata};
use image::{Rgb, RgbImage};

pub const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Returns the fixture path if it has been generated.
pub fn sample_video() -> Option<&'static str> {
    std::path::Path::new(SAMPLE_VIDEO)
        .exists()
        .then_some(SAMPLE_VIDEO)
}

/// A deterministic in-memory video.
///
/// Each seek is recorded. Rasters are filled with a colour derived from the
/// current timestamp so frames from different positions differ.
#[derive(Debug)]
pub struct SyntheticSource {
    pub metadata: VideoMetadata,
    pub seeks: Vec<Duration>,
    pub rasterize_calls: usize,
    /// Zero-based seek call that fails.
    pub fail_seek_at: Option<usize>,
    pub fail_rasterize: bool,
    /// Return rasters of this size instead of the requested one.
    pub wrong_raster_size: Option<(u32, u32)>,
    position: Option<Duration>,
}

impl SyntheticSource {
    pub fn new(duration: Duration, width: u32, height: u32) -> Self {
        Self {
            metadata: VideoMetadata::new(duration, width, height),
            seeks: Vec::new(),
            rasterize_calls: 0,
            fail_seek_at: None,
            fail_rasterize: false,
            wrong_raster_size: None,
            position: None,
        }
    }

    pub fn failing_seek_at(mut self, call: usize) -> Self {
        self.fail_seek_at = Some(call);
        self
    }

    pub fn failing_rasterize(mut self) -> Self {
        self.fail_rasterize = true;
        self
    }

    pub fn with_wrong_raster_size(mut self, width: u32, height: u32) -> Self {
        self.wrong_raster_size = Some((width, height));
        self
    }
}

impl FrameSource for SyntheticSource {
    fn metadata(&self) -> Result<VideoMetadata, FlipbookError> {
        Ok(self.metadata.clone())
    }

    fn seek(&mut self, timestamp: Duration) -> Result<(), FlipbookError> {
        let call = self.seeks.len();
        self.seeks.push(timestamp);
        if self.fail_seek_at == Some(call) {
            self.position = None;
            return Err(FlipbookError::SeekFailed {
                timestamp,
                reason: "synthetic seek failure".to_string(),
            });
        }
        self.position = Some(timestamp.min(self.metadata.duration));
        Ok(())
    }

    fn rasterize(&mut self, width: u32, height: u32) -> Result<RgbImage, FlipbookError> {
        self.rasterize_calls += 1;
        if self.fail_rasterize {
            return Err(FlipbookError::SurfaceUnavailable {
                width,
                height,
                reason: "synthetic surface failure".to_string(),
            });
        }
        let position = self.position.ok_or(FlipbookError::SeekFailed {
            timestamp: Duration::ZERO,
            reason: "no current frame".to_string(),
        })?;

        let (width, height) = self.wrong_raster_size.unwrap_or((width, height));
        let shade = (position.as_millis() % 256) as u8;
        Ok(RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 128])))
    }
}
