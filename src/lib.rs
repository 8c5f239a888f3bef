//! # flipbook
//!
//! Turn a video into a paginated document: sample frames at a fixed rate,
//! then lay them out one per page in a PDF.
//!
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; pages are
//! written with [`lopdf`](https://crates.io/crates/lopdf).
//!
//! ## Quick Start
//!
//! ### Convert a Video
//!
//! ```no_run
//! use flipbook::{ConversionConfig, Converter};
//!
//! let pdf = Converter::new(ConversionConfig::default())
//!     .convert_path("lecture.mp4")
//!     .unwrap();
//! std::fs::write("lecture.pdf", pdf).unwrap();
//! ```
//!
//! ### Sample Frames Only
//!
//! ```no_run
//! use flipbook::{ExtractOptions, SampleConfig, VideoSource};
//!
//! let mut source = VideoSource::open("lecture.mp4").unwrap();
//! let config = SampleConfig::default()
//!     .with_frames_per_second(1.0)
//!     .with_max_dimension(1280);
//!
//! let frames = flipbook::extract_frames(&mut source, &config, &ExtractOptions::new()).unwrap();
//! for frame in &frames {
//!     frame.save(format!("frame_{:06}.jpg", frame.sequence_index)).unwrap();
//! }
//! ```
//!
//! ### Assemble a Document
//!
//! ```no_run
//! use flipbook::{DocumentOptions, ExtractOptions, PageSize, SampleConfig, VideoSource};
//!
//! let mut source = VideoSource::open("lecture.mp4").unwrap();
//! let frames = flipbook::extract_frames(&mut source, &SampleConfig::default(), &ExtractOptions::new()).unwrap();
//!
//! let options = DocumentOptions::new().with_page_size(PageSize::LETTER.landscape());
//! flipbook::assemble_document(&frames, &options)
//!     .unwrap()
//!     .save("lecture.pdf")
//!     .unwrap();
//! ```
//!
//! ## Features
//!
//! - **Fixed-rate sampling**: one frame every `1 / fps` seconds, always
//!   including the start and the final frame
//! - **Bounded rasters**: frames are scaled down (never up) to a maximum
//!   width or longest edge, preserving aspect ratio
//! - **Page layout**: each frame is centred on its page at the largest size
//!   that fits without distortion
//! - **Progress & cancellation**: callbacks plus `CancellationToken`
//! - **Streaming iteration**: lazy `SampleIterator` and push-based
//!   `for_each_frame`
//! - **Validation**: upload size and type checks, metadata sanity checks
//! - **Pluggable sources**: the sampler runs against any `FrameSource`
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FrameStream` for async sampling via Tokio |
//! | `rayon` | Parallel frame decoding during document assembly |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
mod conversion;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod validation;

pub use configuration::{DimensionBound, ExtractOptions, SampleConfig};
pub use document::{
    Document, DocumentOptions, ImageColorSpace, Page, PageImage, assemble_document,
    assemble_document_with_options,
};
pub use error::FlipbookError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use layout::{PageLayout, PageSize};
pub use metadata::VideoMetadata;
pub use pipeline::{ConversionConfig, Converter};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{
    Frame, FrameSampler, SampleIterator, SamplingSchedule, expected_frame_count, extract_frames,
    raster_dimensions,
};
pub use source::{FrameSource, VideoSource};
#[cfg(feature = "async")]
pub use stream::{FrameStream, SampleEvent, SourceInput};
pub use validation::{
    UploadLimits, ValidationReport, validate_metadata, validate_size, validate_upload,
};
