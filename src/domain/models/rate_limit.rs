use std::time::{Duration, Instant};

pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: DEFAULT_RATE_LIMIT_WINDOW,
            max_requests: DEFAULT_RATE_LIMIT_MAX,
        }
    }
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    /// Rejected; the caller's window reopens after `retry_after`.
    Deny { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Requests admitted for one client in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    started_at: Instant,
    count: u32,
}

impl WindowState {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 0,
        }
    }

    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started_at) >= window
    }

    /// Check-and-increment. The counter moves only when the request is admitted.
    pub fn admit(&mut self, now: Instant, policy: &RateLimitPolicy) -> Admission {
        if self.is_expired(now, policy.window) {
            *self = Self::new(now);
        }

        if self.count < policy.max_requests {
            self.count += 1;
            Admission::Allow
        } else {
            let elapsed = now.saturating_duration_since(self.started_at);
            Admission::Deny {
                retry_after: policy.window.saturating_sub(elapsed),
            }
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
