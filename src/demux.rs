//! Container demuxer capability
//!
//! The demuxer is an abstract capability so the pump can run against a
//! platform container parser or against the in-memory synthetic source.
//! Opening lives on [`crate::MediaBackend`]; a `Demuxer` value only exists
//! after a successful open, which is what makes `seek` safe to call.

use crate::tracks::{Sample, TrackDescriptor};

/// Sequential access to the encoded samples of one video track
///
/// The implementation exclusively owns whatever file or track handle it
/// needs; dropping the demuxer releases it.
pub trait Demuxer: Send {
    /// Metadata of the selected video track
    fn track(&self) -> &TrackDescriptor;

    /// Pull the next encoded sample, advancing the read position
    ///
    /// Returns an end-of-stream marker sample once the track is exhausted;
    /// calling again keeps returning the marker.
    fn next_sample(&mut self) -> Sample;

    /// Reposition to the nearest sync point at or before `timestamp_us`
    fn seek(&mut self, timestamp_us: i64);
}
