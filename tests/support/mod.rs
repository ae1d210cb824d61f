//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{sleep, Duration, Instant};

use framepump::{
    DecodedFrame, FrameSink, SyntheticBackend, SyntheticStream, VideoPlayer,
};

/// Frame sink recording everything it is handed
pub struct RecordingSink {
    frames: Mutex<Vec<i64>>,
    arrivals: Mutex<Vec<Instant>>,
    formats: Mutex<Vec<(u32, u32)>>,
    ended: AtomicUsize,
    ended_at: Mutex<Option<Instant>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Vec::new()),
            arrivals: Mutex::new(Vec::new()),
            formats: Mutex::new(Vec::new()),
            ended: AtomicUsize::new(0),
            ended_at: Mutex::new(None),
        })
    }

    pub fn frame_timestamps(&self) -> Vec<i64> {
        self.frames.lock().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn arrivals(&self) -> Vec<Instant> {
        self.arrivals.lock().clone()
    }

    pub fn formats(&self) -> Vec<(u32, u32)> {
        self.formats.lock().clone()
    }

    pub fn ended_count(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn ended_at(&self) -> Option<Instant> {
        *self.ended_at.lock()
    }
}

impl FrameSink for RecordingSink {
    fn on_frame_decoded(&self, frame: DecodedFrame<'_>) {
        // The lent buffer must carry data for the duration of the call
        assert!(!frame.data.is_empty());
        self.frames.lock().push(frame.timestamp_ms);
        self.arrivals.lock().push(Instant::now());
    }

    fn on_frames_ended(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
        self.ended_at.lock().get_or_insert_with(Instant::now);
    }

    fn on_frame_format(&self, width: u32, height: u32) {
        self.formats.lock().push((width, height));
    }
}

/// A 2 second stream at 10 fps with a sync point every 5 frames
pub fn two_second_stream() -> SyntheticStream {
    SyntheticStream {
        frame_count: 20,
        fps: 10,
        keyframe_interval: 5,
        ..SyntheticStream::default()
    }
}

/// Install the log subscriber once; respects `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Player wired to a synthetic backend and a recording sink
pub fn player_with(stream: SyntheticStream) -> (VideoPlayer, Arc<RecordingSink>) {
    init_tracing();
    let sink = RecordingSink::new();
    let player = VideoPlayer::new(Arc::new(SyntheticBackend::new(stream)), sink.clone());
    (player, sink)
}

/// Poll `condition` until it holds, advancing the (mock) clock in between
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..20_000 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
