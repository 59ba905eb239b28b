//! The pacing clock: a small state machine answering "is it time to send?"
//! and "how long may the reactor sleep?" in terms of recorded state and the
//! current time only — no I/O, no allocation.

use std::time::{Duration, Instant};

const STEADY_INTERVAL: Duration = Duration::from_millis(1000);
const GRACE_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct PacingClock {
    preload: u8,
    preload_emitted: u8,
    last_send_time: Option<Instant>,
    transmission_complete: bool,
}

impl PacingClock {
    pub fn new(preload: u8) -> Self {
        Self {
            preload,
            preload_emitted: 0,
            last_send_time: None,
            transmission_complete: false,
        }
    }

    /// `next_seq` is the 1-based ordinal of the probe about to be sent, not
    /// the wire sequence number (the two coincide until 16-bit wraparound).
    pub fn should_send(&self, next_seq: u32, count: Option<u32>, now: Instant) -> bool {
        if let Some(count) = count {
            if next_seq > count {
                return false;
            }
        }
        if self.preload_emitted < self.preload {
            return true;
        }
        match self.last_send_time {
            None => true,
            Some(last) => now.duration_since(last) >= STEADY_INTERVAL,
        }
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        if self.transmission_complete {
            return GRACE_WINDOW;
        }
        if self.preload_emitted < self.preload {
            return Duration::ZERO;
        }
        match self.last_send_time {
            None => Duration::ZERO,
            Some(last) => {
                let elapsed = now.duration_since(last);
                STEADY_INTERVAL.checked_sub(elapsed).unwrap_or(Duration::ZERO)
            }
        }
    }

    pub fn record_send(&mut self, now: Instant) {
        if self.preload_emitted < self.preload {
            self.preload_emitted += 1;
        }
        self.last_send_time = Some(now);
    }

    pub fn mark_transmission_complete(&mut self) {
        self.transmission_complete = true;
    }

    pub fn transmission_complete(&self) -> bool {
        self.transmission_complete
    }
}
