//! # Framepump
//!
//! A local-file video playback pump. The crate pulls encoded samples from a
//! container demuxer, feeds them to a decoder through an asynchronous
//! input/output buffer-exchange protocol, paces delivery of decoded frames
//! against the video's own presentation clock, and exposes transport
//! controls (play, pause, resume, seek, stop) plus a progress readout.
//!
//! The decoder and demuxer are abstract capabilities (see [`MediaBackend`]),
//! so the pump can run against hardware codecs or against the in-memory
//! [`synthetic`] backend used for testing and development.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoder;
pub mod demux;
pub mod error;
pub mod pacer;
pub mod player;
pub mod synthetic;
pub mod tracks;

mod session;

// Re-export main types
pub use decoder::{BufferSlot, DecoderEvent, VideoDecoder};
pub use demux::Demuxer;
pub use error::{ErrorCategory, PlaybackError, PlaybackResult};
pub use pacer::PlaybackClock;
pub use player::{FrameSink, MediaBackend, VideoPlayer};
pub use synthetic::{
    SyntheticBackend, SyntheticDecoder, SyntheticDemuxer, SyntheticStream, SYNTHETIC_MIME,
};
pub use tracks::{DecodedFrame, Sample, TrackDescriptor};
