use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// How the completion client reacts to a provider that reports overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first call.
    pub max_retries: u32,
    /// Delay used when the provider sends no retry-after hint.
    pub default_delay: Duration,
    /// Upper bound applied to provider hints.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            default_delay: DEFAULT_RETRY_DELAY,
            max_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Total calls the client may issue, first attempt included.
    pub fn max_calls(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Retry bookkeeping for one completion call; dropped when the call resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempts_remaining: u32,
    last_delay: Duration,
    default_delay: Duration,
    max_delay: Duration,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts_remaining: policy.max_retries,
            last_delay: Duration::ZERO,
            default_delay: policy.default_delay,
            max_delay: policy.max_delay,
        }
    }

    /// Consume one retry and return how long to wait before it, or `None`
    /// once the budget is spent.
    pub fn next_delay(&mut self, hint: Option<Duration>) -> Option<Duration> {
        if self.attempts_remaining == 0 {
            return None;
        }
        self.attempts_remaining -= 1;
        let delay = hint.unwrap_or(self.default_delay).min(self.max_delay);
        self.last_delay = delay;
        Some(delay)
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn last_delay(&self) -> Duration {
        self.last_delay
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_allows_exactly_max_retries() {
        let mut state = RetryState::new(&RetryPolicy::default());
        for _ in 0..DEFAULT_MAX_RETRIES {
            assert!(state.next_delay(None).is_some());
        }
        assert!(state.is_exhausted());
        assert_eq!(state.next_delay(None), None);
    }

    #[test]
    fn hint_wins_over_default_delay() {
        let mut state = RetryState::new(&RetryPolicy::default());
        assert_eq!(
            state.next_delay(Some(Duration::from_secs(2))),
            Some(Duration::from_secs(2))
        );
        assert_eq!(state.last_delay(), Duration::from_secs(2));
        assert_eq!(state.next_delay(None), Some(DEFAULT_RETRY_DELAY));
        assert_eq!(state.attempts_remaining(), 1);
    }

    #[test]
    fn hint_is_clamped_to_max_delay() {
        let policy = RetryPolicy::default().with_max_delay(Duration::from_secs(5));
        let mut state = RetryState::new(&policy);
        assert_eq!(
            state.next_delay(Some(Duration::from_secs(3600))),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn zero_budget_never_retries() {
        let policy = RetryPolicy::default().with_max_retries(0);
        assert_eq!(policy.max_calls(), 1);
        assert_eq!(RetryState::new(&policy).next_delay(None), None);
    }
}
