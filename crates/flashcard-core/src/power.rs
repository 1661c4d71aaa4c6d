//! Per-session display refresh and idle bookkeeping.
//!
//! Both counters are owned by the caller's session context rather than kept
//! in globals, so independent sessions never share state.

use crate::config::{DEEP_SLEEP_TIMEOUT_MS, FULL_REFRESH_THRESHOLD};

/// E-paper refresh mode requested for the next draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Partial update without flashing (default for most interactions)
    #[default]
    Fast,
    /// Flashing full update that clears ghosting
    Full,
}

/// Requests a full refresh every `threshold` completed reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshCounter {
    threshold: u8,
    reviews: u8,
    pending_full: bool,
}

impl RefreshCounter {
    /// First draw is always a full refresh.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.max(1),
            reviews: 0,
            pending_full: true,
        }
    }

    /// Count one completed review
    pub fn record_review(&mut self) {
        self.reviews = self.reviews.saturating_add(1);
        if self.reviews >= self.threshold {
            self.reviews = 0;
            self.pending_full = true;
        }
    }

    /// Force the next draw to be a full refresh
    pub fn request_full(&mut self) {
        self.pending_full = true;
    }

    /// Mode for the next draw without consuming it
    pub fn peek(&self) -> RefreshMode {
        if self.pending_full {
            RefreshMode::Full
        } else {
            RefreshMode::Fast
        }
    }

    /// Mode for the next draw; a pending full refresh is consumed.
    pub fn take(&mut self) -> RefreshMode {
        let mode = self.peek();
        self.pending_full = false;
        mode
    }
}

impl Default for RefreshCounter {
    fn default() -> Self {
        Self::new(FULL_REFRESH_THRESHOLD)
    }
}

/// Tracks time since the last input for the deep sleep decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimer {
    timeout_ms: u32,
    last_activity_ms: u64,
}

impl IdleTimer {
    pub fn new(timeout_ms: u32, now_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_activity_ms: now_ms,
        }
    }

    /// Register user activity at `now_ms`
    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    pub fn should_sleep(&self, now_ms: u64) -> bool {
        self.idle_ms(now_ms) >= u64::from(self.timeout_ms)
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(DEEP_SLEEP_TIMEOUT_MS, 0)
    }
}
