//! Progress reporting and cancellation support.
//!
//! Sampling a long video takes one seek per page, so the sampler reports a
//! [`ProgressInfo`] snapshot after every frame and checks a
//! [`CancellationToken`] before every seek.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{
//!     ExtractOptions, FlipbookError, ProgressInfo, SampleConfig, VideoSource,
//! };
//!
//! let mut source = VideoSource::open("lecture.mp4")?;
//! let options = ExtractOptions::new().with_progress(Arc::new(|info: &ProgressInfo| {
//!     println!("[{:?}] {:.1}%", info.operation, info.percentage);
//! }));
//!
//! let frames = flipbook::extract_frames(&mut source, &SampleConfig::default(), &options)?;
//! # Ok::<(), FlipbookError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The pipeline stage a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking and rasterizing frames from the video.
    FrameSampling,
    /// Decoding frames and laying them out as pages.
    DocumentAssembly,
}

/// A snapshot of progress within one run.
///
/// `percentage` never decreases between two reports of the same run and is
/// always within `0.0..=100.0`. It is derived from an estimated total, so it
/// is advisory: the last per-item report of a run may stop short of 100, but
/// the closing report of a successful run is always exactly 100.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (frames or pages) have been completed so far.
    pub current: u64,
    /// Total items expected. An estimate until the closing report, which
    /// carries the true count.
    pub total: u64,
    /// Completion percentage, clamped to `0.0..=100.0`.
    pub percentage: f32,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Video timestamp of the item just completed, when there is one.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress updates.
///
/// Callbacks run synchronously on the thread doing the work, so they should
/// return quickly. They observe but cannot halt the operation; use
/// [`CancellationToken`] for that.
///
/// Any `Fn(&ProgressInfo) + Send + Sync` closure implements this trait.
pub trait ProgressCallback: Send + Sync {
    /// Called after each completed item and once more when the run finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo) {
        self(info)
    }
}

/// Discards all progress notifications. Default when no callback is set.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state: cancelling any clone cancels them all. The sampler
/// checks the token before each seek.
///
/// # Example
///
/// ```
/// use flipbook::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one run's progress and emits callbacks.
///
/// Percentages are computed against `max(1, estimated_total)`, clamped to
/// 100 and never allowed to drop below the previous report.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: u64,
    current: u64,
    last_percentage: f32,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        estimated_total: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total: estimated_total,
            current: 0,
            last_percentage: 0.0,
            start_time: Instant::now(),
        }
    }

    /// Record one completed item and report it.
    pub(crate) fn advance(&mut self, timestamp: Option<Duration>) {
        self.current += 1;
        let raw = self.current as f32 / self.total.max(1) as f32 * 100.0;
        self.emit(raw, timestamp);
    }

    /// Emit the closing report with the true item count as the total.
    pub(crate) fn finish(&mut self) {
        self.total = self.current;
        self.emit(100.0, None);
    }

    fn emit(&mut self, raw_percentage: f32, timestamp: Option<Duration>) {
        let percentage = raw_percentage.clamp(0.0, 100.0).max(self.last_percentage);
        self.last_percentage = percentage;

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
