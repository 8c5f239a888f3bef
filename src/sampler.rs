//! Time-based frame sampling.
//!
//! [`FrameSampler`] walks a [`FrameSource`] on a fixed schedule: one sample
//! every `1 / frames_per_second` seconds starting at zero, continuing while
//! the previous timestamp was still inside the video, with the final
//! timestamp clamped to the duration. Each sample is seeked to, rasterized at
//! the downscaled size and encoded as JPEG.
//!
//! Seeks run strictly one after another because they all move the same
//! playback cursor. Any failure aborts the whole run; callers never receive a
//! partial frame sequence.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ExtractOptions, FlipbookError, FrameSampler, SampleConfig, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! let sampler = FrameSampler::new(&mut source, SampleConfig::default())?;
//! println!("about {} frames at {:?}", sampler.expected_frames(), sampler.raster_dimensions());
//!
//! for frame in sampler.iter() {
//!     let frame = frame?;
//!     frame.save(format!("frame_{:04}.jpg", frame.sequence_index))?;
//! }
//! # Ok::<(), FlipbookError>(())
//! ```

use std::{fs, path::Path, time::Duration};

use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::{
    configuration::{DimensionBound, ExtractOptions, SampleConfig},
    error::FlipbookError,
    metadata::VideoMetadata,
    progress::{OperationType, ProgressTracker},
    source::FrameSource,
};

/// One sampled frame, JPEG-encoded.
///
/// Frames come out of a run in strictly increasing `sequence_index` and
/// `timestamp` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Encoded JPEG bytes.
    pub image_bytes: Vec<u8>,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Zero-based position of this frame within its run.
    pub sequence_index: u64,
    /// Video timestamp the frame was sampled at.
    pub timestamp: Duration,
}

impl Frame {
    /// Write the encoded image to `path` unchanged.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FlipbookError> {
        fs::write(path, &self.image_bytes)?;
        Ok(())
    }
}

/// The timestamps a sampling run visits.
///
/// Yields `(index, timestamp)` with `timestamp = min(index / fps, duration)`,
/// computed from the index so long runs do not accumulate rounding drift.
/// The schedule ends after the first timestamp that reaches the duration, so
/// a zero-length video yields exactly one entry at zero.
///
/// ```
/// use std::time::Duration;
///
/// use flipbook::SamplingSchedule;
///
/// let seconds: Vec<u64> = SamplingSchedule::new(Duration::from_secs(10), 0.5)
///     .map(|(_, timestamp)| timestamp.as_secs())
///     .collect();
/// assert_eq!(seconds, vec![0, 2, 4, 6, 8, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct SamplingSchedule {
    duration_seconds: f64,
    frames_per_second: f64,
    next_index: u64,
    finished: bool,
}

impl SamplingSchedule {
    /// Schedule samples over `duration` at `frames_per_second`.
    ///
    /// `frames_per_second` must be positive and finite; validate it through
    /// [`SampleConfig::validate`] first.
    pub fn new(duration: Duration, frames_per_second: f64) -> Self {
        Self {
            duration_seconds: duration.as_secs_f64(),
            frames_per_second,
            next_index: 0,
            finished: false,
        }
    }
}

impl Iterator for SamplingSchedule {
    type Item = (u64, Duration);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let index = self.next_index;
        let seconds = index as f64 / self.frames_per_second;
        if seconds >= self.duration_seconds {
            self.finished = true;
        }
        self.next_index += 1;

        Some((
            index,
            Duration::from_secs_f64(seconds.min(self.duration_seconds)),
        ))
    }
}

/// Estimated number of samples, `ceil(duration * fps)`.
///
/// Used as the progress denominator. The schedule produces at most one frame
/// more than this.
pub fn expected_frame_count(duration: Duration, frames_per_second: f64) -> u64 {
    (duration.as_secs_f64() * frames_per_second).ceil() as u64
}

/// Raster size for a video of the given native size.
///
/// Never upscales. Each dimension is rounded and at least one pixel.
///
/// ```
/// use std::time::Duration;
///
/// use flipbook::{SampleConfig, VideoMetadata, raster_dimensions};
///
/// let uhd = VideoMetadata::new(Duration::from_secs(10), 3840, 2160);
/// assert_eq!(raster_dimensions(&uhd, &SampleConfig::default()), (1920, 1080));
/// ```
pub fn raster_dimensions(metadata: &VideoMetadata, config: &SampleConfig) -> (u32, u32) {
    let bounded = match config.dimension_bound {
        DimensionBound::Width => metadata.width,
        DimensionBound::LongestEdge => metadata.width.max(metadata.height),
    };
    let scale = (config.max_dimension as f64 / bounded.max(1) as f64).min(1.0);

    let width = (metadata.width as f64 * scale).round().max(1.0) as u32;
    let height = (metadata.height as f64 * scale).round().max(1.0) as u32;
    (width, height)
}

/// Samples frames from a [`FrameSource`].
///
/// Construction validates the configuration and resolves the source's
/// metadata; nothing is decoded until [`run`](FrameSampler::run),
/// [`for_each_frame`](FrameSampler::for_each_frame) or
/// [`iter`](FrameSampler::iter) is called.
pub struct FrameSampler<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    config: SampleConfig,
    metadata: VideoMetadata,
    width: u32,
    height: u32,
}

impl<'a, S: FrameSource + ?Sized> FrameSampler<'a, S> {
    /// Prepare a sampling run.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::InvalidConfig`] if `config` does not validate (checked
    /// before the source is touched), [`FlipbookError::MetadataUnavailable`]
    /// if the source cannot resolve its metadata.
    pub fn new(source: &'a mut S, config: SampleConfig) -> Result<Self, FlipbookError> {
        config.validate()?;

        let metadata = source.metadata()?;
        if metadata.width == 0 || metadata.height == 0 {
            return Err(FlipbookError::MetadataUnavailable {
                reason: format!(
                    "source reports {}x{} dimensions",
                    metadata.width, metadata.height
                ),
            });
        }

        let (width, height) = raster_dimensions(&metadata, &config);
        log::debug!(
            "Sampling {}x{} video at {} fps into {}x{} rasters",
            metadata.width,
            metadata.height,
            config.frames_per_second,
            width,
            height,
        );

        Ok(Self {
            source,
            config,
            metadata,
            width,
            height,
        })
    }

    /// Metadata resolved from the source.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Output raster size as `(width, height)`.
    pub fn raster_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The timestamps this run will visit.
    pub fn schedule(&self) -> SamplingSchedule {
        SamplingSchedule::new(self.metadata.duration, self.config.frames_per_second)
    }

    /// Estimated frame count used for progress reporting.
    pub fn expected_frames(&self) -> u64 {
        expected_frame_count(self.metadata.duration, self.config.frames_per_second)
    }

    /// Sample every scheduled timestamp and collect the frames.
    ///
    /// Progress is reported after every frame and once more on completion.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::Cancelled`] if the token fires, otherwise the first
    /// error raised by the source or the encoder. No frames are returned on
    /// error.
    pub fn run(self, options: &ExtractOptions) -> Result<Vec<Frame>, FlipbookError> {
        // The estimate is unbounded for high rates; grow as frames arrive.
        let mut frames = Vec::new();
        self.for_each_frame(options, |frame| {
            frames.push(frame);
            Ok(())
        })?;
        Ok(frames)
    }

    /// Sample every scheduled timestamp, handing each frame to `callback` as
    /// soon as it is encoded.
    ///
    /// Processing stops at the first error from the source, the encoder or
    /// the callback.
    pub fn for_each_frame<F>(self, options: &ExtractOptions, mut callback: F) -> Result<(), FlipbookError>
    where
        F: FnMut(Frame) -> Result<(), FlipbookError>,
    {
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameSampling,
            self.expected_frames(),
        );
        let schedule = self.schedule();
        let quality = self.config.encoder_quality();

        for (index, timestamp) in schedule {
            if options.is_cancelled() {
                log::debug!("Sampling cancelled before seeking to {timestamp:?}");
                return Err(FlipbookError::Cancelled);
            }

            let frame = sample_frame(self.source, index, timestamp, self.width, self.height, quality)?;
            callback(frame)?;
            tracker.advance(Some(timestamp));
        }

        tracker.finish();
        Ok(())
    }

    /// Turn the run into a lazy iterator that seeks once per `next()`.
    ///
    /// The iterator stops after yielding its first error.
    pub fn iter(self) -> SampleIterator<'a, S> {
        let schedule = self.schedule();
        let quality = self.config.encoder_quality();
        SampleIterator {
            source: self.source,
            schedule,
            width: self.width,
            height: self.height,
            quality,
            failed: false,
        }
    }
}

/// Lazy, pull-based sampling.
///
/// Created by [`FrameSampler::iter`]. Borrows the source mutably for its
/// whole lifetime.
pub struct SampleIterator<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    schedule: SamplingSchedule,
    width: u32,
    height: u32,
    quality: u8,
    failed: bool,
}

impl<S: FrameSource + ?Sized> Iterator for SampleIterator<'_, S> {
    type Item = Result<Frame, FlipbookError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (index, timestamp) = self.schedule.next()?;
        let result = sample_frame(
            self.source,
            index,
            timestamp,
            self.width,
            self.height,
            self.quality,
        );
        self.failed = result.is_err();
        Some(result)
    }
}

/// Sample all frames from `source` with `config`.
///
/// Shorthand for [`FrameSampler::new`] followed by [`FrameSampler::run`].
///
/// # Errors
///
/// See [`FrameSampler::new`] and [`FrameSampler::run`].
pub fn extract_frames<S: FrameSource + ?Sized>(
    source: &mut S,
    config: &SampleConfig,
    options: &ExtractOptions,
) -> Result<Vec<Frame>, FlipbookError> {
    let frames = FrameSampler::new(source, *config)?.run(options)?;
    log::info!("Sampled {} frames", frames.len());
    Ok(frames)
}

fn sample_frame<S: FrameSource + ?Sized>(
    source: &mut S,
    index: u64,
    timestamp: Duration,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Frame, FlipbookError> {
    source.seek(timestamp)?;
    let raster = source.rasterize(width, height)?;
    if raster.dimensions() != (width, height) {
        return Err(FlipbookError::SurfaceUnavailable {
            width,
            height,
            reason: format!(
                "source produced a {}x{} raster",
                raster.width(),
                raster.height()
            ),
        });
    }

    let image_bytes = encode_jpeg(&raster, quality)?;
    log::debug!(
        "Sampled frame {index} at {:.3}s ({} bytes)",
        timestamp.as_secs_f64(),
        image_bytes.len()
    );

    Ok(Frame {
        image_bytes,
        width,
        height,
        sequence_index: index,
        timestamp,
    })
}

fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, FlipbookError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(raster)
        .map_err(|error| FlipbookError::EncodeFailed(error.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(duration: Duration, fps: f64) -> Vec<Duration> {
        SamplingSchedule::new(duration, fps).map(|(_, t)| t).collect()
    }

    #[test]
    fn zero_duration_yields_single_sample() {
        assert_eq!(timestamps(Duration::ZERO, 2.0), vec![Duration::ZERO]);
    }

    #[test]
    fn integral_product_ends_exactly_on_duration() {
        let samples = timestamps(Duration::from_secs(3), 2.0);
        assert_eq!(samples.len(), 7);
        assert_eq!(samples.last(), Some(&Duration::from_secs(3)));
    }

    #[test]
    fn fractional_product_clamps_last_sample() {
        let samples = timestamps(Duration::from_secs(9), 0.5);
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[4], Duration::from_secs(8));
        assert_eq!(samples[5], Duration::from_secs(9));
    }

    #[test]
    fn indices_are_contiguous() {
        let indices: Vec<u64> = SamplingSchedule::new(Duration::from_millis(2500), 1.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn estimate_is_within_one_of_schedule() {
        for millis in [0_u64, 1, 999, 1000, 1001, 9000, 10_000, 12_345] {
            for fps in [0.25, 0.5, 1.0, 3.0, 29.97] {
                let duration = Duration::from_millis(millis);
                let produced = SamplingSchedule::new(duration, fps).count() as u64;
                let estimate = expected_frame_count(duration, fps);
                assert!(
                    produced.abs_diff(estimate) <= 1,
                    "{millis}ms @ {fps}: produced {produced}, estimate {estimate}"
                );
            }
        }
    }

    #[test]
    fn small_videos_are_not_upscaled() {
        let metadata = VideoMetadata::new(Duration::ZERO, 640, 480);
        assert_eq!(raster_dimensions(&metadata, &SampleConfig::default()), (640, 480));
    }

    #[test]
    fn width_bound_leaves_tall_videos_tall() {
        let metadata = VideoMetadata::new(Duration::ZERO, 1080, 3840);
        let config = SampleConfig::default().with_max_dimension(720);
        assert_eq!(raster_dimensions(&metadata, &config), (720, 2560));
    }

    #[test]
    fn longest_edge_bound_limits_height() {
        let metadata = VideoMetadata::new(Duration::ZERO, 1080, 3840);
        let config = SampleConfig::default()
            .with_max_dimension(1920)
            .with_dimension_bound(DimensionBound::LongestEdge);
        assert_eq!(raster_dimensions(&metadata, &config), (540, 1920));
    }

    #[test]
    fn encoded_frames_are_jpeg() {
        let raster = RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let bytes = encode_jpeg(&raster, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
