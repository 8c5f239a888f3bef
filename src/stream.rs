//! Async frame sampling.
//!
//! [`FrameStream`] runs the whole sampling loop on a Tokio blocking thread
//! and streams frames and progress reports back through a bounded channel.
//! One consumer sees progress, frames and errors in order, and can stop the
//! work simply by dropping the stream.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use flipbook::{CancellationToken, FlipbookError, FrameStream, SampleConfig, SampleEvent, SourceInput};
//!
//! # async fn example() -> Result<(), FlipbookError> {
//! let mut stream = FrameStream::spawn(
//!     SourceInput::Path("talk.mp4".into()),
//!     SampleConfig::default(),
//!     CancellationToken::new(),
//! );
//!
//! while let Some(event) = stream.next().await {
//!     match event? {
//!         SampleEvent::Frame(frame) => println!("frame {} at {:?}", frame.sequence_index, frame.timestamp),
//!         SampleEvent::Progress(info) => println!("{:.0}%", info.percentage),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::{
    configuration::{ExtractOptions, SampleConfig},
    error::FlipbookError,
    progress::{CancellationToken, ProgressInfo},
    sampler::{Frame, FrameSampler},
    source::VideoSource,
};

/// Bounded-channel capacity. Small, since every frame holds a full JPEG.
const CHANNEL_CAPACITY: usize = 8;

/// Where the streamed video comes from.
#[derive(Debug, Clone)]
pub enum SourceInput {
    /// A video file on disk.
    Path(PathBuf),
    /// A whole video file held in memory.
    Bytes(Vec<u8>),
}

impl SourceInput {
    fn open(self) -> Result<VideoSource, FlipbookError> {
        match self {
            SourceInput::Path(path) => VideoSource::open(path),
            SourceInput::Bytes(bytes) => VideoSource::from_bytes(bytes),
        }
    }
}

/// One item of a [`FrameStream`].
#[derive(Debug, Clone)]
pub enum SampleEvent {
    /// A sampled frame, in sequence order.
    Frame(Frame),
    /// A progress report.
    Progress(ProgressInfo),
}

type EventResult = Result<SampleEvent, FlipbookError>;

/// Sampling events produced by a background thread.
///
/// Implements [`tokio_stream::Stream`]. An error, if any, is the last item.
/// Dropping the stream stops the background loop at the next frame boundary.
pub struct FrameStream {
    receiver: Receiver<EventResult>,
    cancellation: CancellationToken,
    _handle: JoinHandle<()>,
}

impl FrameStream {
    /// Start sampling `input` on a blocking thread.
    ///
    /// Must be called from within a Tokio runtime. Firing `cancellation`
    /// ends the stream with [`FlipbookError::Cancelled`].
    pub fn spawn(input: SourceInput, config: SampleConfig, cancellation: CancellationToken) -> Self {
        let (sender, receiver) = tokio::sync::mpsc::channel(CHANNEL_CAPACITY);
        let token = cancellation.clone();

        let handle = tokio::task::spawn_blocking(move || {
            if let Err(error) = sample_blocking(input, config, token, &sender) {
                if sender.is_closed() {
                    log::debug!("Frame stream consumer went away: {error}");
                } else {
                    let _ = sender.blocking_send(Err(error));
                }
            }
        });

        Self {
            receiver,
            cancellation,
            _handle: handle,
        }
    }

    /// The token that stops this stream.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Stream for FrameStream {
    type Item = EventResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

fn sample_blocking(
    input: SourceInput,
    config: SampleConfig,
    cancellation: CancellationToken,
    sender: &Sender<EventResult>,
) -> Result<(), FlipbookError> {
    let mut source = input.open()?;

    let progress_sender = sender.clone();
    let options = ExtractOptions::new()
        .with_cancellation(cancellation)
        .with_progress(Arc::new(move |info: &ProgressInfo| {
            // A closed channel is noticed on the next frame send.
            let _ = progress_sender.blocking_send(Ok(SampleEvent::Progress(info.clone())));
        }));

    FrameSampler::new(&mut source, config)?.for_each_frame(&options, |frame| {
        sender
            .blocking_send(Ok(SampleEvent::Frame(frame)))
            .map_err(|_| FlipbookError::Cancelled)
    })
}
