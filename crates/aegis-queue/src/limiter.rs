//! Wall-clock window rate limiting.

use aegis_core::Timestamp;

/// Fixed-window limiter.
///
/// The window expires passively: the first `admit` after
/// `now - window_start > window_ms` resets the window to start at `now`.
/// No timers are scheduled.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    max_in_window: u32,
    window_ms: i64,
    window_start: Timestamp,
    count_in_window: u32,
}

impl RateLimiter {
    pub fn new(max_in_window: u32, window_ms: i64) -> Self {
        Self {
            max_in_window,
            window_ms,
            window_start: Timestamp::ZERO,
            count_in_window: 0,
        }
    }

    /// Admit or reject an attempt at `now`.
    pub fn admit(&mut self, now: Timestamp) -> bool {
        if now.millis_since(self.window_start) > self.window_ms {
            self.window_start = now;
            self.count_in_window = 0;
        }

        if self.count_in_window < self.max_in_window {
            self.count_in_window += 1;
            true
        } else {
            false
        }
    }

    pub fn count_in_window(&self) -> u32 {
        self.count_in_window
    }

    pub fn window_start(&self) -> Timestamp {
        self.window_start
    }
}
