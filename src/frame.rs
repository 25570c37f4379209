//! Frame scheduling
//!
//! The scheduler does not own a timer. The platform asks it for a frame
//! every time the display callback fires, and it hands back a `Frame`
//! only while the loop it belongs to is still current. Cancelling bumps
//! the epoch, so callbacks queued by an older loop are rejected.

use crate::consts::{FRAME_SCALE_FACTOR, MAX_FRAME_MS, NOMINAL_FRAME_MS};

/// Timing for one update/draw pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Frames since the loop started, beginning at 0
    pub count: u64,
    /// Milliseconds since the previous frame
    pub rate_ms: f64,
    /// Host timestamp of this frame (ms)
    pub timestamp: f64,
    /// Motion multiplier: `screen_scale * rate_ms * 0.01`
    pub scale: f32,
}

impl Frame {
    pub fn new(count: u64, rate_ms: f64, timestamp: f64, screen_scale: f32) -> Self {
        Self {
            count,
            rate_ms,
            timestamp,
            scale: screen_scale * rate_ms as f32 * FRAME_SCALE_FACTOR,
        }
    }
}

/// Per-loop frame counter with a cancellation epoch
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    screen_scale: f32,
    count: u64,
    last_timestamp: Option<f64>,
    /// Host handle of the outstanding frame request
    pending: Option<i32>,
    epoch: u64,
    stopped: bool,
}

impl FrameScheduler {
    pub fn new(screen_scale: f32) -> Self {
        Self {
            screen_scale,
            count: 0,
            last_timestamp: None,
            pending: None,
            epoch: 0,
            stopped: false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn set_screen_scale(&mut self, screen_scale: f32) {
        self.screen_scale = screen_scale;
    }

    /// Record an outstanding host request; returns the epoch it belongs to
    pub fn request(&mut self, handle: i32) -> u64 {
        self.pending = Some(handle);
        self.epoch
    }

    /// Start a frame for a callback issued under `epoch`
    ///
    /// Returns `None` for stale callbacks and after `stop`.
    pub fn begin(&mut self, epoch: u64, now_ms: f64) -> Option<Frame> {
        if self.stopped || epoch != self.epoch {
            log::trace!("Dropping frame from epoch {} (current {})", epoch, self.epoch);
            return None;
        }
        self.pending = None;

        let rate_ms = match self.last_timestamp {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_MS),
            None => NOMINAL_FRAME_MS,
        };
        self.last_timestamp = Some(now_ms);

        let frame = Frame::new(self.count, rate_ms, now_ms, self.screen_scale);
        self.count += 1;
        Some(frame)
    }

    /// Invalidate the current loop
    ///
    /// Returns the pending host handle the first time, so the caller can
    /// cancel it with the host; later calls return `None`.
    pub fn cancel(&mut self) -> Option<i32> {
        self.epoch += 1;
        self.pending.take()
    }

    /// Cancel and refuse every further frame
    pub fn stop(&mut self) -> Option<i32> {
        self.stopped = true;
        self.cancel()
    }

    /// Cancel the current loop and prepare a fresh one counting from 0
    pub fn restart(&mut self) -> Option<i32> {
        let pending = self.cancel();
        self.stopped = false;
        self.count = 0;
        self.last_timestamp = None;
        pending
    }
}
