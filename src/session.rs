//! Decoder session: the event-handling pump loop
//!
//! A dedicated tokio task consumes the decoder's event stream and runs the
//! sample-in/frame-out exchange. The paused flag is the single cross-context
//! signal: the pump checks it before touching anything else, so once
//! `pause()` returns every subsequently handled event is a no-op. All other
//! shared state lives behind one coarse session mutex; there is no
//! fine-grained locking.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, trace, warn};

use crate::decoder::{DecoderEvent, VideoDecoder};
use crate::demux::Demuxer;
use crate::error::PlaybackResult;
use crate::pacer::PlaybackClock;
use crate::player::FrameSink;
use crate::tracks::{DecodedFrame, Sample, TrackDescriptor};

/// State shared between the transport calls and the pump task
pub(crate) struct PumpShared {
    /// The sole field the pump task reads without taking the session lock
    pub paused: AtomicBool,
    /// Last emitted frame's presentation time in milliseconds; readable
    /// from any transport state
    pub progress_ms: AtomicI64,
    /// The active session, `None` when stopped
    pub session: Mutex<Option<PumpSession>>,
}

impl PumpShared {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(true),
            progress_ms: AtomicI64::new(0),
            session: Mutex::new(None),
        }
    }
}

/// Everything owned by one playback: demuxer, decoder, clock
pub(crate) struct PumpSession {
    pub demuxer: Box<dyn Demuxer>,
    pub decoder: Box<dyn VideoDecoder>,
    pub clock: PlaybackClock,
    pub track: TrackDescriptor,
    /// Input is exhausted; queued outputs are still being emitted.
    /// Re-armed by seek together with `ended`.
    pub draining: bool,
    /// Samples queued to the decoder whose frames have not been emitted
    /// yet. Reset when a flush discards the queued work.
    pub in_flight: usize,
    /// Guards the exactly-once end-of-stream notification; re-armed by seek
    pub ended: bool,
}

impl PumpSession {
    /// Pause pumping once every queued output has drained
    ///
    /// Returns whether the end-of-stream notification should fire; the
    /// caller delivers it after releasing the session lock.
    fn finish_if_drained(&mut self, shared: &PumpShared) -> bool {
        if self.in_flight > 0 {
            return false;
        }
        shared.paused.store(true, Ordering::Release);
        if self.ended {
            return false;
        }
        self.ended = true;
        info!("end of stream drained, pumping paused");
        true
    }
}

/// Spawn the pump task consuming the decoder's event stream
///
/// The task ends when the decoder drops its sender (stop) or when the
/// transport aborts it; an aborted pacing wait is simply never resumed.
pub(crate) fn spawn_pump(
    shared: Arc<PumpShared>,
    sink: Arc<dyn FrameSink>,
    mut events: mpsc::UnboundedReceiver<DecoderEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match handle_event(&shared, sink.as_ref(), event) {
                Ok(Some(delay)) => {
                    // Real-time pacing: throttle delivery instead of
                    // buffering ahead. Runs on the pump task only.
                    tokio::time::sleep(delay).await;
                }
                Ok(None) => {}
                Err(err) => {
                    // Failures must not cross the asynchronous boundary;
                    // the pipeline continues with the next buffer.
                    warn!(error = %err, "decoder exchange handler failed, continuing");
                }
            }
        }
        trace!("decoder event stream closed, pump task exiting");
    })
}

/// Dispatch one decoder event, returning the pacing delay to wait out
fn handle_event(
    shared: &PumpShared,
    sink: &dyn FrameSink,
    event: DecoderEvent,
) -> PlaybackResult<Option<Duration>> {
    match event {
        DecoderEvent::InputReady { slot } => {
            if shared.paused.load(Ordering::Acquire) {
                return Ok(None);
            }
            let mut notify_end = false;
            {
                let mut guard = shared.session.lock();
                let Some(session) = guard.as_mut() else {
                    return Ok(None);
                };
                // Re-check under the lock: pause() holds it while raising
                // the flag, so this is the barrier that makes pause safe.
                if shared.paused.load(Ordering::Acquire) {
                    return Ok(None);
                }
                if session.draining {
                    // Input is exhausted; the slot sits idle while the
                    // queued outputs finish emitting.
                    notify_end = session.finish_if_drained(shared);
                } else {
                    let sample = session.demuxer.next_sample();
                    if sample.end_of_stream {
                        session.decoder.queue_input(slot, Sample::end_of_stream())?;
                        session.draining = true;
                        info!(in_flight = session.in_flight, "end of stream reached");
                        notify_end = session.finish_if_drained(shared);
                    } else {
                        trace!(slot, timestamp_us = sample.timestamp_us, "queueing sample");
                        session.decoder.queue_input(slot, sample)?;
                        session.in_flight += 1;
                    }
                }
            }
            if notify_end {
                sink.on_frames_ended();
            }
            Ok(None)
        }
        DecoderEvent::OutputReady {
            slot,
            timestamp_us,
            config_only,
        } => {
            if shared.paused.load(Ordering::Acquire) {
                // Leave the buffer unreleased; pause flushes, so the
                // decoder tolerates the skipped release.
                return Ok(None);
            }
            let mut guard = shared.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(None);
            };
            if shared.paused.load(Ordering::Acquire) {
                return Ok(None);
            }
            if config_only {
                session.decoder.release_output(slot);
                return Ok(None);
            }
            let timestamp_ms = timestamp_us / 1000;
            shared.progress_ms.store(timestamp_ms, Ordering::Release);
            {
                let data = session.decoder.output_data(slot)?;
                sink.on_frame_decoded(DecodedFrame { data, timestamp_ms });
            }
            session.in_flight = session.in_flight.saturating_sub(1);
            session.decoder.release_output(slot);
            let now = Instant::now();
            let delay = session.clock.delay_for(timestamp_ms, now);
            session.clock.count_frame(now);
            let notify_end = session.draining && session.finish_if_drained(shared);
            drop(guard);
            if notify_end {
                sink.on_frames_ended();
            }
            Ok(delay)
        }
        DecoderEvent::FormatChanged { width, height } => {
            {
                let mut guard = shared.session.lock();
                if let Some(session) = guard.as_mut() {
                    session.track.width = width;
                    session.track.height = height;
                }
            }
            info!(width, height, "decoder output format");
            sink.on_frame_format(width, height);
            Ok(None)
        }
        DecoderEvent::Error { reason } => {
            // Decoder-level faults never terminate playback.
            warn!(%reason, "decoder reported an error, continuing");
            Ok(None)
        }
    }
}
