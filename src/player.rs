//! Transport state machine and the embedding-application interfaces
//!
//! [`VideoPlayer`] is the caller-facing surface: play, pause, resume, seek,
//! stop, and a progress readout. It owns the active session and serializes
//! mutations made both by direct calls and by the pump task that services
//! the decoder's asynchronous events.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::decoder::VideoDecoder;
use crate::demux::Demuxer;
use crate::error::{PlaybackError, PlaybackResult};
use crate::pacer::PlaybackClock;
use crate::session::{spawn_pump, PumpSession, PumpShared};
use crate::tracks::DecodedFrame;

/// Platform decode/demux capability consumed by the player
///
/// Treated as an opaque capability interface so the pump is testable
/// against a fake in-memory implementation.
pub trait MediaBackend: Send + Sync {
    /// Open a container and select its first video track
    ///
    /// Fails with [`PlaybackError::NoVideoTrack`] when the container holds
    /// no video. The returned demuxer owns the file handle until dropped.
    fn open_demuxer(&self, path: &Path) -> PlaybackResult<Box<dyn Demuxer>>;

    /// Create a decoder instance for the given encoding
    fn create_decoder(&self, mime: &str) -> PlaybackResult<Box<dyn VideoDecoder>>;
}

/// Callback boundary forwarding decoded output to the external consumer
///
/// Callbacks are invoked from the playback pump task. They must return
/// promptly and must not call back into the player; the frame buffer is
/// reclaimed as soon as [`FrameSink::on_frame_decoded`] returns.
pub trait FrameSink: Send + Sync {
    /// Fired once per emitted frame
    fn on_frame_decoded(&self, frame: DecodedFrame<'_>);

    /// Fired exactly once when input is exhausted
    fn on_frames_ended(&self);

    /// Fired on initial configuration and on any subsequent format change
    fn on_frame_format(&self, width: u32, height: u32);
}

/// The playback pump's transport state machine
///
/// States are Stopped (no demuxer or decoder held), Playing, and Paused;
/// seek is a side-effecting action available while Playing or Paused.
/// Methods must be called from within a tokio runtime: starting playback
/// spawns the pump task, and pacing waits run on that task, never on the
/// caller.
pub struct VideoPlayer {
    backend: Arc<dyn MediaBackend>,
    sink: Arc<dyn FrameSink>,
    shared: Arc<PumpShared>,
    pump: Option<JoinHandle<()>>,
}

impl VideoPlayer {
    /// Create a stopped player bound to a backend and a frame sink
    pub fn new(backend: Arc<dyn MediaBackend>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            backend,
            sink,
            shared: Arc::new(PumpShared::new()),
            pump: None,
        }
    }

    /// Start playing the file at `path` from the beginning
    ///
    /// Performs a full stop of any existing session first, so calling this
    /// mid-playback is always safe. Resource failures (no video track,
    /// unsupported encoding) surface synchronously.
    pub fn play_video(&mut self, path: &Path) -> PlaybackResult<()> {
        self.stop_playback();

        let demuxer = self.backend.open_demuxer(path)?;
        let track = demuxer.track().clone();
        let mut decoder = self.backend.create_decoder(&track.mime)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        decoder.configure(&track, events_tx)?;
        decoder.start()?;

        let now = Instant::now();
        *self.shared.session.lock() = Some(PumpSession {
            demuxer,
            decoder,
            clock: PlaybackClock::start(now),
            track: track.clone(),
            draining: false,
            in_flight: 0,
            ended: false,
        });
        self.shared.progress_ms.store(0, Ordering::Release);
        self.shared.paused.store(false, Ordering::Release);
        self.pump = Some(spawn_pump(
            Arc::clone(&self.shared),
            Arc::clone(&self.sink),
            events_rx,
        ));

        info!(
            path = %path.display(),
            mime = %track.mime,
            width = track.width,
            height = track.height,
            "playback started"
        );
        Ok(())
    }

    /// Pause playback, flushing the decoder's in-flight buffers
    ///
    /// Once this returns, pending pump events are observed as no-ops.
    /// Calling while already paused is a harmless no-op re-flush; calling
    /// with no active session does nothing.
    pub fn pause(&mut self) {
        let mut guard = self.shared.session.lock();
        let Some(session) = guard.as_mut() else {
            debug!("pause ignored, no active session");
            return;
        };
        let was_paused = self.shared.paused.swap(true, Ordering::AcqRel);
        session.decoder.flush();
        // The flush discarded whatever was queued but not yet emitted.
        session.in_flight = 0;
        if !was_paused {
            session.clock.note_pause(Instant::now());
            info!("playback paused");
        }
    }

    /// Resume a paused playback
    ///
    /// Shifts elapsed-time accounting forward by the pause duration, so
    /// pacing after resume is unaffected by how long the pause lasted.
    pub fn resume(&mut self) -> PlaybackResult<()> {
        let mut guard = self.shared.session.lock();
        let Some(session) = guard.as_mut() else {
            return Err(PlaybackError::InvalidState {
                message: "resume without an active session".to_string(),
            });
        };
        let paused_for = session.clock.note_resume(Instant::now());
        self.shared.paused.store(false, Ordering::Release);
        session.decoder.start()?;
        info!(paused_ms = paused_for.as_millis() as u64, "playback resumed");
        Ok(())
    }

    /// Seek to `timestamp_ms`, valid while Playing or Paused
    ///
    /// Re-anchors pacing at the new position, repositions the demuxer to
    /// the nearest preceding sync point, and overwrites the progress
    /// readout. Does not change the Playing/Paused state.
    pub fn set_progress(&mut self, timestamp_ms: i64) -> PlaybackResult<()> {
        let mut guard = self.shared.session.lock();
        let Some(session) = guard.as_mut() else {
            return Err(PlaybackError::InvalidState {
                message: "seek without an active session".to_string(),
            });
        };
        session.clock.seek_to(timestamp_ms, Instant::now());
        session.demuxer.seek(timestamp_ms.saturating_mul(1000));
        // Seeking re-arms the end-of-stream notification: running into the
        // end again after a backwards seek drains and notifies again.
        session.draining = false;
        session.ended = false;
        self.shared.progress_ms.store(timestamp_ms, Ordering::Release);
        info!(timestamp_ms, "seek");
        Ok(())
    }

    /// Stop playback and release the decoder and demuxer
    ///
    /// Idempotent: callable from any state, including before any
    /// `play_video`, and safe mid-playback.
    pub fn stop_playback(&mut self) {
        self.shared.paused.store(true, Ordering::Release);
        if let Some(mut session) = self.shared.session.lock().take() {
            session.decoder.stop();
            // Demuxer and its file handle are released with the session.
            info!("playback stopped");
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }

    /// Last emitted frame's presentation time in milliseconds
    ///
    /// Pure read, callable from any state; 0 if playback never started.
    pub fn get_progress(&self) -> i64 {
        self.shared.progress_ms.load(Ordering::Acquire)
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.stop_playback();
    }
}
