//! Track metadata and media sample types

use bytes::Bytes;

/// Video track metadata selected from a container
///
/// Immutable once the track is selected; replaced only if the decoder
/// reports a format change mid-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Encoding identifier (MIME-like string, e.g. `video/avc`)
    pub mime: String,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// One encoded sample pulled from the demuxer
#[derive(Debug, Clone)]
pub struct Sample {
    /// Encoded byte span
    pub data: Bytes,
    /// Presentation timestamp in microseconds, monotonically non-decreasing
    pub timestamp_us: i64,
    /// End-of-stream marker; set on the sample returned once the track
    /// is exhausted
    pub end_of_stream: bool,
}

impl Sample {
    /// Create a sample carrying encoded data
    pub fn new(data: Bytes, timestamp_us: i64) -> Self {
        Self {
            data,
            timestamp_us,
            end_of_stream: false,
        }
    }

    /// Create the empty end-of-stream marker sample
    pub fn end_of_stream() -> Self {
        Self {
            data: Bytes::new(),
            timestamp_us: 0,
            end_of_stream: true,
        }
    }
}

/// A decoded frame lent to the frame sink
///
/// The borrow is the ownership contract: the buffer belongs to the decoder
/// and is reclaimed immediately after the sink callback returns, so the
/// consumer must copy anything it wants to keep.
#[derive(Debug)]
pub struct DecodedFrame<'a> {
    /// Decoded pixel data, valid for the duration of the callback only
    pub data: &'a [u8],
    /// Presentation timestamp in milliseconds (derived by integer division
    /// from the microsecond source)
    pub timestamp_ms: i64,
}
