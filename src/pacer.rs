//! Playback clock and real-time pacing
//!
//! Converts a frame's presentation timestamp into a wall-clock delay so
//! frames are emitted no faster than real time, and keeps a rolling
//! frame-rate counter for diagnostics. Uses [`tokio::time::Instant`] so the
//! runtime's mock clock governs pacing in tests.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Length of the rolling frame-rate diagnostic window
const FPS_WINDOW: Duration = Duration::from_secs(10);

/// Wall-clock anchor for the stream's presentation timeline
///
/// The presentation position at wall-clock time `t` is
/// `base_ms + (t - origin)`. Pause shifts `origin` forward by the pause
/// duration so elapsed-time accounting excludes the pause interval; seek
/// re-anchors `origin` at the new position.
#[derive(Debug)]
pub struct PlaybackClock {
    origin: Instant,
    base_ms: i64,
    pause_started: Option<Instant>,
    fps_window_start: Instant,
    frame_count: u32,
}

impl PlaybackClock {
    /// Start the clock at presentation time zero
    pub fn start(now: Instant) -> Self {
        Self {
            origin: now,
            base_ms: 0,
            pause_started: None,
            fps_window_start: now,
            frame_count: 0,
        }
    }

    /// Current presentation position in milliseconds
    pub fn position_ms(&self, now: Instant) -> i64 {
        self.base_ms + now.duration_since(self.origin).as_millis() as i64
    }

    /// Delay to wait before emitting a frame stamped `timestamp_ms`
    ///
    /// `None` when the frame is already due. The caller performs the wait
    /// on the pump task; an interrupted wait is a no-op.
    pub fn delay_for(&self, timestamp_ms: i64, now: Instant) -> Option<Duration> {
        let elapsed = self.position_ms(now);
        if elapsed < timestamp_ms {
            Some(Duration::from_millis((timestamp_ms - elapsed) as u64))
        } else {
            None
        }
    }

    /// Record the start of a pause interval
    pub fn note_pause(&mut self, now: Instant) {
        self.pause_started = Some(now);
    }

    /// End the pause interval, shifting the anchor and the frame-rate
    /// window forward so the pause does not count as elapsed time
    ///
    /// Returns the pause duration. A resume without a recorded pause is a
    /// zero-length shift.
    pub fn note_resume(&mut self, now: Instant) -> Duration {
        let paused_for = self
            .pause_started
            .take()
            .map(|started| now.duration_since(started))
            .unwrap_or_default();
        self.origin += paused_for;
        self.fps_window_start += paused_for;
        paused_for
    }

    /// Re-anchor the clock at a new presentation position
    pub fn seek_to(&mut self, timestamp_ms: i64, now: Instant) {
        self.origin = now;
        self.base_ms = timestamp_ms;
        self.fps_window_start = now;
        self.frame_count = 0;
    }

    /// Count one emitted frame toward the rolling frame-rate window
    pub fn count_frame(&mut self, now: Instant) {
        self.frame_count += 1;
        let window = now.duration_since(self.fps_window_start);
        if window >= FPS_WINDOW {
            let fps = self.frame_count as f64 / window.as_secs_f64();
            debug!(fps, "playback frame rate");
            self.fps_window_start = now;
            self.frame_count = 0;
        }
    }
}
