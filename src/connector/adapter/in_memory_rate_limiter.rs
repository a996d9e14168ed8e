use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;

use crate::application::RateLimiter;
use crate::domain::{Admission, RateLimitPolicy, WindowState};

/// Admissions between two sweeps of expired client windows.
const SWEEP_INTERVAL: u64 = 1024;

/// Fixed-window limiter keyed by client id.
///
/// Each check-and-increment runs while holding the DashMap entry guard for
/// that client, so concurrent requests from one address cannot both take the
/// last slot. Windows reset lazily on the next request after they elapse;
/// idle clients are dropped by a sweep every [`SWEEP_INTERVAL`] checks.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    windows: DashMap<String, WindowState>,
    checks: AtomicU64,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Drop clients whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| !window.is_expired(now, self.policy.window));
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Reclaimed idle rate-limit windows");
        }
        removed
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn admit(&self, client_id: &str, now: Instant) -> Admission {
        // The entry guard is released at the end of this statement, before any sweep.
        let admission = self
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| WindowState::new(now))
            .admit(now, &self.policy);

        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if checks % SWEEP_INTERVAL == 0 {
            self.sweep(now);
        }

        admission
    }

    fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn denies_after_ceiling_per_client() {
        let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(60), 3));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.admit("10.0.0.1", now).is_allowed());
        }
        assert!(!limiter.admit("10.0.0.1", now).is_allowed());
        assert!(limiter.admit("10.0.0.2", now).is_allowed());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn denial_reports_time_until_window_reopens() {
        let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(60), 1));
        let start = Instant::now();

        limiter.admit("client", start);
        assert_eq!(
            limiter.admit("client", start + Duration::from_secs(20)),
            Admission::Deny {
                retry_after: Duration::from_secs(40)
            }
        );
        assert!(limiter
            .admit("client", start + Duration::from_secs(60))
            .is_allowed());
    }

    #[test]
    fn sweep_reclaims_only_expired_windows() {
        let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(10), 5));
        let start = Instant::now();

        limiter.admit("old", start);
        limiter.admit("fresh", start + Duration::from_secs(8));

        assert_eq!(limiter.sweep(start + Duration::from_secs(12)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn periodic_sweep_bounds_tracked_clients() {
        let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(1), 5));
        let start = Instant::now();

        for i in 0..(SWEEP_INTERVAL - 1) {
            limiter.admit(&format!("client-{i}"), start);
        }
        assert_eq!(limiter.tracked_clients(), (SWEEP_INTERVAL - 1) as usize);

        // The next check triggers a sweep after the old windows have expired.
        limiter.admit("late", start + Duration::from_secs(5));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn concurrent_admissions_never_exceed_ceiling() {
        let limiter = InMemoryRateLimiter::new(RateLimitPolicy::new(Duration::from_secs(60), 100));
        let allowed = AtomicUsize::new(0);
        let now = Instant::now();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        if limiter.admit("shared", now).is_allowed() {
                            allowed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::SeqCst), 100);
    }
}
