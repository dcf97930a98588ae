//! Sliding-window rate limiting for ceremony attempts.
//!
//! Admission is tracked per `(operation, identifier)` pair, where the
//! identifier is typically a username. The window is advisory and
//! process-local: it slows down online guessing against a single instance
//! but is not a security boundary against a distributed attacker or a
//! multi-process deployment. Production deployments at scale need a shared
//! counter store instead.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Per-operation, per-identifier sliding-window attempt counter.
///
/// The check-then-record step runs under the entry guard for the key, so two
/// concurrent requests cannot both claim the last remaining slot.
#[derive(Default)]
pub struct RateLimiter {
    attempts: DashMap<(String, String), Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or deny one attempt for `(operation, identifier)`.
    ///
    /// Attempts older than `now - window` are pruned first. When the pruned
    /// count has already reached `max_attempts` the call is denied without
    /// recording; otherwise the attempt is recorded and admitted.
    pub fn admit(
        &self,
        operation: &str,
        identifier: &str,
        max_attempts: usize,
        window: Duration,
    ) -> bool {
        self.admit_at(operation, identifier, max_attempts, window, Utc::now())
    }

    fn admit_at(
        &self,
        operation: &str,
        identifier: &str,
        max_attempts: usize,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let key = (operation.to_string(), identifier.to_string());
        let mut entry = self.attempts.entry(key).or_default();

        let window_start = now - window;
        entry.retain(|attempt| *attempt > window_start);

        if entry.len() >= max_attempts {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drop keys whose every attempt has aged out of `window`, bounding
    /// memory for identifiers that never return.
    pub fn sweep_idle(&self, window: Duration) -> usize {
        let cutoff = Utc::now() - window;
        let before = self.attempts.len();
        self.attempts
            .retain(|_, attempts| attempts.iter().any(|attempt| *attempt > cutoff));
        before.saturating_sub(self.attempts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 5;

    fn window() -> Duration {
        Duration::minutes(5)
    }

    #[test]
    fn test_sixth_attempt_denied() {
        let limiter = RateLimiter::new();
        for _ in 0..MAX {
            assert!(limiter.admit("authenticate_begin", "carol", MAX, window()));
        }
        assert!(!limiter.admit("authenticate_begin", "carol", MAX, window()));
    }

    #[test]
    fn test_denied_attempt_is_not_recorded() {
        let limiter = RateLimiter::new();
        let start = Utc::now();
        for i in 0..MAX {
            assert!(limiter.admit_at(
                "op",
                "carol",
                MAX,
                window(),
                start + Duration::seconds(i as i64)
            ));
        }

        // Hammering while saturated never extends the lockout window
        for i in 0..20 {
            assert!(!limiter.admit_at(
                "op",
                "carol",
                MAX,
                window(),
                start + Duration::seconds(10 + i)
            ));
        }

        // Once the original five attempts age out, admission resumes
        assert!(limiter.admit_at("op", "carol", MAX, window(), start + window() + Duration::seconds(5)));
    }

    #[test]
    fn test_window_elapse_readmits() {
        let limiter = RateLimiter::new();
        let start = Utc::now() - Duration::minutes(10);
        for _ in 0..MAX {
            assert!(limiter.admit_at("op", "carol", MAX, window(), start));
        }

        // All recorded attempts now fall outside the trailing window
        assert!(limiter.admit("op", "carol", MAX, window()));
    }

    #[test]
    fn test_identifiers_tracked_separately() {
        let limiter = RateLimiter::new();
        for _ in 0..MAX {
            assert!(limiter.admit("op", "carol", MAX, window()));
        }
        assert!(!limiter.admit("op", "carol", MAX, window()));
        assert!(limiter.admit("op", "dave", MAX, window()));
    }

    #[test]
    fn test_operations_tracked_separately() {
        let limiter = RateLimiter::new();
        for _ in 0..MAX {
            assert!(limiter.admit("authenticate_begin", "carol", MAX, window()));
        }
        assert!(!limiter.admit("authenticate_begin", "carol", MAX, window()));
        assert!(limiter.admit("authenticate_complete", "carol", MAX, window()));
    }

    #[test]
    fn test_sweep_idle() {
        let limiter = RateLimiter::new();
        let old = Utc::now() - Duration::minutes(30);
        limiter.admit_at("op", "carol", MAX, window(), old);
        limiter.admit("op", "dave", MAX, window());

        assert_eq!(limiter.sweep_idle(window()), 1);
        assert_eq!(limiter.attempts.len(), 1);
    }

    #[test]
    fn test_concurrent_admission_respects_budget() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.admit("op", "carol", MAX, Duration::minutes(5)))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, MAX);
    }
}
