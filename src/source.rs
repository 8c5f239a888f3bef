//! Video sources.
//!
//! The sampler drives any [`FrameSource`]: something with resolvable metadata
//! that can be positioned at a timestamp and asked for the frame showing
//! there. [`VideoSource`] is the FFmpeg-backed implementation; tests and
//! callers with their own decoders can provide others.
//!
//! A `VideoSource` owns the only playback cursor for its video. Seeking needs
//! `&mut self`, so two extractions can never interleave seeks on one source.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;
use tempfile::NamedTempFile;

use crate::{conversion, error::FlipbookError, metadata::VideoMetadata};

/// A seekable video the sampler can pull frames from.
///
/// The sampler calls [`metadata`](FrameSource::metadata) once, then
/// alternates [`seek`](FrameSource::seek) and
/// [`rasterize`](FrameSource::rasterize) for every sample timestamp, strictly
/// in that order and one call at a time.
pub trait FrameSource {
    /// Resolve duration and native dimensions.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::MetadataUnavailable`] when they cannot be determined.
    fn metadata(&self) -> Result<VideoMetadata, FlipbookError>;

    /// Move the playback cursor to `timestamp`.
    ///
    /// Returns once the frame displayed at `timestamp` is ready to be
    /// rasterized. Timestamps past the end show the final frame.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::SeekFailed`] when no frame can be produced.
    fn seek(&mut self, timestamp: Duration) -> Result<(), FlipbookError>;

    /// Render the current frame into a `width × height` RGB raster.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::SurfaceUnavailable`] when the raster surface cannot be
    /// created, [`FlipbookError::SeekFailed`] when no frame is current.
    fn rasterize(&mut self, width: u32, height: u32) -> Result<RgbImage, FlipbookError>;
}

/// A scaler together with the conversion it was built for.
struct CachedScaler {
    context: ScalingContext,
    key: (Pixel, u32, u32, u32, u32),
}

/// FFmpeg-backed [`FrameSource`].
///
/// Owns the demuxer, the decoder, the currently displayed frame and the
/// scaling context. Everything is released when the source is dropped,
/// including the temporary file backing a [`from_bytes`](VideoSource::from_bytes)
/// source.
///
/// # Example
///
/// ```no_run
/// use flipbook::{FlipbookError, SampleConfig, VideoSource};
///
/// let mut source = VideoSource::open("talk.mp4")?;
/// let frames = flipbook::extract_frames(&mut source, &SampleConfig::default(), &Default::default())?;
/// println!("sampled {} frames", frames.len());
/// # Ok::<(), FlipbookError>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    /// Stream start offset in `time_base` units.
    start_offset: i64,
    /// Container start time in microseconds.
    container_start: i64,
    metadata: VideoMetadata,
    current_frame: Option<VideoFrame>,
    scaler: Option<CachedScaler>,
    path: PathBuf,
    /// Keeps a bytes-backed source's temporary file alive. Declared last so
    /// the demuxer closes before the file is removed.
    _spill: Option<NamedTempFile>,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .field("path", &self.path)
            .field("has_current_frame", &self.current_frame.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file and resolve its metadata.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::MetadataUnavailable`] if the file cannot be opened,
    /// has no video stream, reports zero dimensions, or has no resolvable
    /// duration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        Self::open_with_spill(path.as_ref().to_path_buf(), None)
    }

    /// Open a video held in memory.
    ///
    /// FFmpeg demuxes from a seekable file, so the bytes are written to a
    /// private temporary file that lives exactly as long as the source.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::IoError`] if the temporary file cannot be written,
    /// otherwise as [`open`](VideoSource::open).
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, FlipbookError> {
        let mut spill = tempfile::Builder::new()
            .prefix("flipbook-")
            .suffix(".video")
            .tempfile()?;
        spill.write_all(bytes.as_ref())?;
        spill.flush()?;

        log::debug!(
            "Spilled {} bytes of video to {}",
            bytes.as_ref().len(),
            spill.path().display()
        );

        let path = spill.path().to_path_buf();
        Self::open_with_spill(path, Some(spill))
    }

    /// Path the source was opened from (the spill file for byte sources).
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_with_spill(path: PathBuf, spill: Option<NamedTempFile>) -> Result<Self, FlipbookError> {
        crate::ffmpeg::ensure_initialized()?;

        let unavailable = |reason: String| FlipbookError::MetadataUnavailable { reason };

        let input_context = ffmpeg_next::format::input(&path)
            .map_err(|error| unavailable(format!("cannot open {}: {error}", path.display())))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| unavailable(format!("no video stream in {}", path.display())))?;

        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_offset = conversion::start_offset(stream.start_time());
        // SAFETY: the pointer is valid for as long as `input_context` lives.
        let container_start =
            conversion::start_offset(unsafe { (*input_context.as_ptr()).start_time });

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| unavailable(format!("unreadable codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| unavailable(format!("cannot create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(unavailable(format!(
                "video stream reports {width}x{height} dimensions"
            )));
        }

        let duration = conversion::container_duration(input_context.duration())
            .or_else(|| conversion::stream_duration(stream.duration(), time_base))
            .ok_or_else(|| unavailable("duration is unknown".to_string()))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            log::warn!("Video stream {stream_index} reports no average frame rate");
            0.0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            duration,
            width,
            height,
            frames_per_second,
            codec,
            format: input_context.format().name().to_string(),
        };

        log::info!(
            "Opened video: {} (format={}, duration={:.2}s, {}x{}, codec={})",
            path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.width,
            metadata.height,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            stream_index,
            time_base,
            start_offset,
            container_start,
            metadata,
            current_frame: None,
            scaler: None,
            path,
            _spill: spill,
        })
    }

    /// Presentation time of a decoded frame in `time_base` units.
    fn frame_timestamp(frame: &VideoFrame) -> i64 {
        frame.timestamp().or_else(|| frame.pts()).unwrap_or(0)
    }

    fn seek_failed(timestamp: Duration, reason: impl Into<String>) -> FlipbookError {
        FlipbookError::SeekFailed {
            timestamp,
            reason: reason.into(),
        }
    }
}

impl FrameSource for VideoSource {
    fn metadata(&self) -> Result<VideoMetadata, FlipbookError> {
        Ok(self.metadata.clone())
    }

    fn seek(&mut self, timestamp: Duration) -> Result<(), FlipbookError> {
        self.current_frame = None;

        let seek_target = conversion::container_seek_timestamp(timestamp, self.container_start);
        self.input_context
            .seek(seek_target, ..seek_target)
            .map_err(|error| Self::seek_failed(timestamp, error.to_string()))?;
        self.decoder.flush();

        let target_pts =
            self.start_offset + conversion::duration_to_stream_timestamp(timestamp, self.time_base);

        let mut decoded = VideoFrame::empty();
        let mut last_decoded: Option<VideoFrame> = None;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .map_err(|error| Self::seek_failed(timestamp, error.to_string()))?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let frame = std::mem::replace(&mut decoded, VideoFrame::empty());
                if Self::frame_timestamp(&frame) >= target_pts {
                    self.current_frame = Some(frame);
                    return Ok(());
                }
                last_decoded = Some(frame);
            }
        }

        self.decoder
            .send_eof()
            .map_err(|error| Self::seek_failed(timestamp, error.to_string()))?;

        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let frame = std::mem::replace(&mut decoded, VideoFrame::empty());
            if Self::frame_timestamp(&frame) >= target_pts {
                self.current_frame = Some(frame);
                return Ok(());
            }
            last_decoded = Some(frame);
        }

        match last_decoded {
            Some(frame) => {
                log::debug!(
                    "Seek to {:.3}s ran past the last frame; showing the final frame",
                    timestamp.as_secs_f64()
                );
                self.current_frame = Some(frame);
                Ok(())
            }
            None => Err(Self::seek_failed(
                timestamp,
                "no frame could be decoded at or before this position",
            )),
        }
    }

    fn rasterize(&mut self, width: u32, height: u32) -> Result<RgbImage, FlipbookError> {
        let frame = self.current_frame.as_ref().ok_or_else(|| FlipbookError::SeekFailed {
            timestamp: Duration::ZERO,
            reason: "rasterize called before a successful seek".to_string(),
        })?;

        let key = (frame.format(), frame.width(), frame.height(), width, height);
        if self.scaler.as_ref().is_none_or(|cached| cached.key != key) {
            let context = ScalingContext::get(
                frame.format(),
                frame.width(),
                frame.height(),
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| FlipbookError::SurfaceUnavailable {
                width,
                height,
                reason: error.to_string(),
            })?;
            self.scaler = Some(CachedScaler { context, key });
        }

        let Some(scaler) = self.scaler.as_mut() else {
            return Err(FlipbookError::SurfaceUnavailable {
                width,
                height,
                reason: "scaler missing after creation".to_string(),
            });
        };

        let mut rgb_frame = VideoFrame::empty();
        scaler
            .context
            .run(frame, &mut rgb_frame)
            .map_err(|error| FlipbookError::SurfaceUnavailable {
                width,
                height,
                reason: error.to_string(),
            })?;

        let buffer = conversion::rgb_frame_to_buffer(&rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| FlipbookError::SurfaceUnavailable {
            width,
            height,
            reason: "scaled frame buffer is smaller than the raster".to_string(),
        })
    }
}
