//! Video metadata.
//!
//! [`VideoMetadata`] is resolved once when a [`VideoSource`](crate::VideoSource)
//! opens and is read-only afterwards. Only `duration`, `width` and `height`
//! drive sampling; the remaining fields are informational.

use std::time::Duration;

/// Metadata for the video stream being sampled.
///
/// # Example
///
/// ```no_run
/// use flipbook::{FrameSource, VideoSource};
///
/// let source = VideoSource::open("input.mp4").unwrap();
/// let metadata = source.metadata().unwrap();
/// println!("{}x{}, {:?}", metadata.width, metadata.height, metadata.duration);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Playable duration of the video.
    pub duration: Duration,
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
    /// Average frame rate of the stream, `0.0` when the container does not
    /// report one.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Metadata with only the fields sampling depends on.
    ///
    /// Handy for [`FrameSource`](crate::FrameSource) implementations that are
    /// not backed by a container.
    pub fn new(duration: Duration, width: u32, height: u32) -> Self {
        Self {
            duration,
            width,
            height,
            frames_per_second: 0.0,
            codec: String::new(),
            format: String::new(),
        }
    }

    /// Native width divided by native height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}
