//! In-memory synthetic media backend
//!
//! Produces synthetic samples at controlled timestamps so the pump can be
//! exercised without a container file or a platform codec. This is both
//! the test double for the capability traits and a development fallback,
//! the way a software renderer backs a hardware one.

use std::path::Path;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::decoder::{BufferSlot, DecoderEvent, VideoDecoder};
use crate::demux::Demuxer;
use crate::error::{PlaybackError, PlaybackResult};
use crate::player::MediaBackend;
use crate::tracks::{Sample, TrackDescriptor};

/// MIME type of the synthetic encoding
pub const SYNTHETIC_MIME: &str = "video/x-synthetic";

/// Shape of the stream served by a [`SyntheticBackend`]
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    /// Total number of frames in the stream
    pub frame_count: u64,
    /// Frames per second; presentation timestamps are `i * 1_000_000 / fps`
    pub fps: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Track MIME type
    pub mime: String,
    /// Distance between sync points, in frames; seeks land on these
    pub keyframe_interval: u64,
    /// Indices of samples served with a malformed (empty) payload
    pub corrupt_samples: Vec<u64>,
}

impl Default for SyntheticStream {
    fn default() -> Self {
        Self {
            frame_count: 60,
            fps: 30,
            width: 320,
            height: 240,
            mime: SYNTHETIC_MIME.to_string(),
            keyframe_interval: 10,
            corrupt_samples: Vec::new(),
        }
    }
}

impl SyntheticStream {
    fn track(&self) -> TrackDescriptor {
        TrackDescriptor {
            mime: self.mime.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Backend serving one configured synthetic stream for any path
pub struct SyntheticBackend {
    stream: Option<SyntheticStream>,
}

impl SyntheticBackend {
    /// Serve `stream` for every opened path
    pub fn new(stream: SyntheticStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// A backend whose containers never hold a video track
    pub fn without_video() -> Self {
        Self { stream: None }
    }
}

impl MediaBackend for SyntheticBackend {
    fn open_demuxer(&self, path: &Path) -> PlaybackResult<Box<dyn Demuxer>> {
        let Some(stream) = &self.stream else {
            return Err(PlaybackError::NoVideoTrack {
                path: path.to_path_buf(),
            });
        };
        Ok(Box::new(SyntheticDemuxer::new(stream.clone())))
    }

    fn create_decoder(&self, mime: &str) -> PlaybackResult<Box<dyn VideoDecoder>> {
        if mime != SYNTHETIC_MIME {
            return Err(PlaybackError::UnsupportedEncoding {
                mime: mime.to_string(),
            });
        }
        Ok(Box::new(SyntheticDecoder::new(4)))
    }
}

/// Demuxer yielding deterministic samples at controlled timestamps
pub struct SyntheticDemuxer {
    stream: SyntheticStream,
    track: TrackDescriptor,
    position: u64,
}

impl SyntheticDemuxer {
    /// Create a demuxer positioned at the start of `stream`
    pub fn new(stream: SyntheticStream) -> Self {
        let track = stream.track();
        Self {
            stream,
            track,
            position: 0,
        }
    }

    fn timestamp_us(&self, index: u64) -> i64 {
        (index as i64) * 1_000_000 / self.stream.fps as i64
    }
}

impl Demuxer for SyntheticDemuxer {
    fn track(&self) -> &TrackDescriptor {
        &self.track
    }

    fn next_sample(&mut self) -> Sample {
        if self.position >= self.stream.frame_count {
            return Sample::end_of_stream();
        }
        let index = self.position;
        self.position += 1;

        let data = if self.stream.corrupt_samples.contains(&index) {
            Bytes::new()
        } else {
            Bytes::from(vec![index as u8 ^ 0x5a; 16])
        };
        Sample::new(data, self.timestamp_us(index))
    }

    fn seek(&mut self, timestamp_us: i64) {
        let target_us = timestamp_us.max(0) as u64;
        let frame = (target_us * self.stream.fps as u64 / 1_000_000)
            .min(self.stream.frame_count.saturating_sub(1));
        // Land on the nearest preceding sync point
        self.position = frame - frame % self.stream.keyframe_interval.max(1);
        debug!(
            timestamp_us,
            frame = self.position,
            "synthetic demuxer repositioned"
        );
    }
}

enum Slot {
    Free,
    Decoded { data: Bytes },
}

/// Decoder modelling the slot-based buffer exchange
///
/// "Decoding" is the identity: the encoded payload comes back as the
/// decoded frame bytes, which is all the pump cares about.
pub struct SyntheticDecoder {
    slots: Vec<Slot>,
    events: Option<mpsc::UnboundedSender<DecoderEvent>>,
    track: Option<TrackDescriptor>,
    armed: bool,
    format_announced: bool,
}

impl SyntheticDecoder {
    /// Create a decoder with `slot_count` buffer slots
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: (0..slot_count).map(|_| Slot::Free).collect(),
            events: None,
            track: None,
            armed: false,
            format_announced: false,
        }
    }

    fn send(&self, event: DecoderEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl VideoDecoder for SyntheticDecoder {
    fn configure(
        &mut self,
        track: &TrackDescriptor,
        events: mpsc::UnboundedSender<DecoderEvent>,
    ) -> PlaybackResult<()> {
        self.track = Some(track.clone());
        self.events = Some(events);
        Ok(())
    }

    fn start(&mut self) -> PlaybackResult<()> {
        let Some(track) = self.track.clone() else {
            return Err(PlaybackError::DecoderInit {
                reason: "decoder started before configure".to_string(),
            });
        };
        self.armed = true;
        if !self.format_announced {
            self.format_announced = true;
            self.send(DecoderEvent::FormatChanged {
                width: track.width,
                height: track.height,
            });
        }
        for (slot, state) in self.slots.iter().enumerate() {
            if matches!(state, Slot::Free) {
                self.send(DecoderEvent::InputReady { slot });
            }
        }
        Ok(())
    }

    fn flush(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Free;
        }
    }

    fn stop(&mut self) {
        self.armed = false;
        self.flush();
        // Dropping the sender closes the pump's event stream.
        self.events = None;
    }

    fn queue_input(&mut self, slot: BufferSlot, sample: Sample) -> PlaybackResult<()> {
        if !self.armed {
            return Err(PlaybackError::InvalidState {
                message: "input queued on a stopped decoder".to_string(),
            });
        }
        let Some(state) = self.slots.get_mut(slot) else {
            return Err(PlaybackError::InvalidState {
                message: format!("input slot {slot} out of range"),
            });
        };
        if !matches!(state, Slot::Free) {
            // Stale slot index, e.g. an announcement from before a flush.
            return Err(PlaybackError::InvalidState {
                message: format!("input slot {slot} is not free"),
            });
        }
        if sample.end_of_stream {
            return Ok(());
        }
        if sample.data.is_empty() {
            self.send(DecoderEvent::Error {
                reason: "empty sample payload".to_string(),
            });
            // The slot survives a malformed sample; re-announce it so the
            // exchange continues with the next buffer.
            self.send(DecoderEvent::InputReady { slot });
            return Err(PlaybackError::Decode {
                reason: "empty sample payload".to_string(),
            });
        }
        let timestamp_us = sample.timestamp_us;
        *state = Slot::Decoded { data: sample.data };
        self.send(DecoderEvent::OutputReady {
            slot,
            timestamp_us,
            config_only: false,
        });
        Ok(())
    }

    fn output_data(&self, slot: BufferSlot) -> PlaybackResult<&[u8]> {
        match self.slots.get(slot) {
            Some(Slot::Decoded { data, .. }) => Ok(data),
            _ => Err(PlaybackError::InvalidState {
                message: format!("output slot {slot} holds no decoded frame"),
            }),
        }
    }

    fn release_output(&mut self, slot: BufferSlot) {
        if let Some(state) = self.slots.get_mut(slot) {
            *state = Slot::Free;
            if self.armed {
                self.send(DecoderEvent::InputReady { slot });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_fps_stream() -> SyntheticStream {
        SyntheticStream {
            frame_count: 20,
            fps: 10,
            keyframe_interval: 5,
            ..SyntheticStream::default()
        }
    }

    #[test]
    fn test_demuxer_timestamps_and_end() {
        let mut demuxer = SyntheticDemuxer::new(SyntheticStream {
            frame_count: 3,
            fps: 10,
            ..SyntheticStream::default()
        });

        assert_eq!(demuxer.next_sample().timestamp_us, 0);
        assert_eq!(demuxer.next_sample().timestamp_us, 100_000);
        assert_eq!(demuxer.next_sample().timestamp_us, 200_000);
        assert!(demuxer.next_sample().end_of_stream);
        // Exhausted demuxers keep returning the marker
        assert!(demuxer.next_sample().end_of_stream);
    }

    #[test]
    fn test_demuxer_seek_lands_on_preceding_sync_point() {
        let mut demuxer = SyntheticDemuxer::new(ten_fps_stream());

        // 1320ms -> frame 13 -> sync point at frame 10 (1000ms)
        demuxer.seek(1_320_000);
        assert_eq!(demuxer.next_sample().timestamp_us, 1_000_000);

        // Exactly on a sync point stays there
        demuxer.seek(1_500_000);
        assert_eq!(demuxer.next_sample().timestamp_us, 1_500_000);

        // Past the end clamps to the last sync point
        demuxer.seek(10_000_000);
        assert_eq!(demuxer.next_sample().timestamp_us, 1_500_000);
    }

    #[test]
    fn test_decoder_announces_format_then_slots() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut decoder = SyntheticDecoder::new(2);
        decoder.configure(&ten_fps_stream().track(), tx).unwrap();
        decoder.start().unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            DecoderEvent::FormatChanged {
                width: 320,
                height: 240
            }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            DecoderEvent::InputReady { slot: 0 }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            DecoderEvent::InputReady { slot: 1 }
        ));

        // Restart after flush re-announces slots but not the format
        decoder.flush();
        decoder.start().unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            DecoderEvent::InputReady { slot: 0 }
        ));
    }

    #[test]
    fn test_decoder_start_before_configure_fails() {
        let mut decoder = SyntheticDecoder::new(2);
        assert!(matches!(
            decoder.start(),
            Err(PlaybackError::DecoderInit { .. })
        ));
    }

    #[test]
    fn test_decoder_stop_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut decoder = SyntheticDecoder::new(2);
        decoder.configure(&ten_fps_stream().track(), tx).unwrap();
        decoder.start().unwrap();
        decoder.stop();
        decoder.stop();
        assert!(decoder
            .queue_input(0, Sample::new(Bytes::from_static(b"x"), 0))
            .is_err());
    }
}
