use std::time::Instant;

use crate::domain::Admission;

/// Per-client admission control over a trailing time window.
///
/// The check and the increment for one client id must happen atomically with
/// respect to other calls for the same id.
pub trait RateLimiter: Send + Sync {
    fn admit(&self, client_id: &str, now: Instant) -> Admission;

    /// Number of client ids currently tracked.
    fn tracked_clients(&self) -> usize;
}
