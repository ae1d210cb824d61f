//! Video decoder capability and its asynchronous buffer-exchange events
//!
//! The decoder operates a slot-based buffer exchange: it announces free
//! input slots, accepts one encoded sample per slot, and hands decoded
//! output back slot by slot. All announcements arrive as [`DecoderEvent`]s
//! on the channel supplied at configure time, so the exchange is an
//! explicit message stream consumed by the playback pump task rather than
//! a set of nested callbacks.

use tokio::sync::mpsc;

use crate::error::PlaybackResult;
use crate::tracks::{Sample, TrackDescriptor};

/// Index of a buffer slot inside the decoder's pool
pub type BufferSlot = usize;

/// Asynchronous notifications emitted by a [`VideoDecoder`]
///
/// Events may be generated at times outside caller control; the pump task
/// is the only consumer.
#[derive(Debug, Clone)]
pub enum DecoderEvent {
    /// The decoder is ready to accept another encoded sample
    InputReady {
        /// Free input slot to fill via [`VideoDecoder::queue_input`]
        slot: BufferSlot,
    },
    /// The decoder has produced a decoded buffer
    OutputReady {
        /// Slot holding the decoded data until released
        slot: BufferSlot,
        /// Presentation timestamp of the decoded frame in microseconds
        timestamp_us: i64,
        /// Buffer carries codec configuration only, not a displayable frame
        config_only: bool,
    },
    /// Output dimensions were (re)derived; fired once after the first start
    /// and again on any mid-stream format change
    FormatChanged {
        /// Frame width in pixels
        width: u32,
        /// Frame height in pixels
        height: u32,
    },
    /// Decoder-level fault; never fatal to the pipeline
    Error {
        /// Human-readable failure description
        reason: String,
    },
}

/// A decoder instance for one video track
///
/// Implementations wrap a hardware or software codec. Methods must not
/// block; decode completion is reported through the event channel.
pub trait VideoDecoder: Send {
    /// Bind the decoder to a track and hand it the event channel
    fn configure(
        &mut self,
        track: &TrackDescriptor,
        events: mpsc::UnboundedSender<DecoderEvent>,
    ) -> PlaybackResult<()>;

    /// Arm the exchange: announce free input slots, and on the first start
    /// report the initial dimensions via [`DecoderEvent::FormatChanged`]
    ///
    /// Also used to restart after [`VideoDecoder::flush`].
    fn start(&mut self) -> PlaybackResult<()>;

    /// Discard in-flight buffers without releasing the decoder
    ///
    /// Outstanding slot indices become invalid; a skipped release of an
    /// already-flushed output buffer is tolerated.
    fn flush(&mut self);

    /// Halt and release all decoder resources
    ///
    /// Idempotent; safe to call on an already-stopped decoder. Dropping
    /// the event sender here closes the pump's event stream.
    fn stop(&mut self);

    /// Submit one encoded sample into a previously announced free slot
    ///
    /// An end-of-stream sample carries no data and produces no output.
    fn queue_input(&mut self, slot: BufferSlot, sample: Sample) -> PlaybackResult<()>;

    /// Borrow the decoded bytes held in an output slot
    fn output_data(&self, slot: BufferSlot) -> PlaybackResult<&[u8]>;

    /// Return an output buffer to the decoder's pool (non-rendering release)
    fn release_output(&mut self, slot: BufferSlot);
}
