//! Internal conversion helpers.
//!
//! Timestamp arithmetic between [`Duration`], FFmpeg stream time bases and
//! `AV_TIME_BASE`, plus pixel-plane copying for scaled frames.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use ffmpeg_sys_next::AV_NOPTS_VALUE;

/// Microseconds per second; FFmpeg's `AV_TIME_BASE`.
const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Copy the first plane of a packed RGB24 frame into a tightly-packed buffer.
///
/// Scaled frames often carry per-row padding (stride wider than
/// `width * 3`). The returned buffer has none, so it can go straight into
/// [`image::RgbImage::from_raw`].
pub(crate) fn rgb_frame_to_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        buffer.extend_from_slice(&row[..row_bytes]);
    }
    buffer
}

/// Convert a [`Duration`] to a container seek timestamp in `AV_TIME_BASE`.
///
/// `Input::seek` goes through `avformat_seek_file` with no stream index, so
/// it expects microseconds rather than the stream's own time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros().min(i64::MAX as u128) as i64
}

/// Container seek target for a position measured from the start of the video.
///
/// Containers with a non-zero `start_time` (microseconds) place every
/// timestamp after that offset, so the seek has to be shifted to match.
pub(crate) fn container_seek_timestamp(duration: Duration, container_start: i64) -> i64 {
    container_start.saturating_add(duration_to_seek_timestamp(duration))
}

/// Convert a [`Duration`] to a presentation timestamp in `time_base` units.
pub(crate) fn duration_to_stream_timestamp(duration: Duration, time_base: Rational) -> i64 {
    let seconds = duration.as_secs_f64();
    (seconds * time_base.denominator() as f64 / time_base.numerator() as f64) as i64
}

/// Convert a presentation timestamp in `time_base` units to seconds.
pub(crate) fn stream_timestamp_to_seconds(timestamp: i64, time_base: Rational) -> f64 {
    timestamp as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a container duration (microseconds) to a [`Duration`].
///
/// Returns `None` when FFmpeg reports the duration as unknown.
pub(crate) fn container_duration(microseconds: i64) -> Option<Duration> {
    if microseconds == AV_NOPTS_VALUE || microseconds < 0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        microseconds as f64 / MICROSECONDS_PER_SECOND,
    ))
}

/// Convert a stream duration in `time_base` units to a [`Duration`].
///
/// Returns `None` when the duration is unknown or the time base is degenerate.
pub(crate) fn stream_duration(timestamp: i64, time_base: Rational) -> Option<Duration> {
    if timestamp == AV_NOPTS_VALUE || timestamp < 0 || time_base.denominator() == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(stream_timestamp_to_seconds(
        timestamp, time_base,
    )))
}

/// A stream or container start time as reported, `0` when unknown.
pub(crate) fn start_offset(start_time: i64) -> i64 {
    if start_time == AV_NOPTS_VALUE {
        0
    } else {
        start_time
    }
}
