//! crates/prog_helper_core/src/rate_limit.rs
//!
//! A fixed-window request counter keyed by an arbitrary string (the user id
//! at the only call site). The limiter is constructed once at process start
//! and injected through the application state; it never throws, the caller
//! turns a denied decision into a user-facing error.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

/// The outcome of one budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Unix milliseconds at which the current window expires.
    pub reset_at_ms: i64,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up, never negative.
    pub fn retry_after_secs(&self, now_ms: i64) -> i64 {
        ((self.reset_at_ms - now_ms).max(0) + 999) / 1000
    }
}

#[derive(Debug)]
struct Window {
    started_at_ms: i64,
    count: u32,
}

/// Fixed-window counters, one window per key. Budget and window size are
/// supplied per call so different endpoints can share one limiter.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request against `key` and reports whether it fits the budget.
    pub fn check(&self, key: &str, limit: u32, window_ms: i64) -> RateLimitDecision {
        self.check_at(key, limit, window_ms, Utc::now().timestamp_millis())
    }

    /// Deterministic variant taking an explicit clock reading.
    pub fn check_at(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> RateLimitDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at_ms: now_ms,
            count: 0,
        });

        if now_ms - window.started_at_ms >= window_ms {
            window.started_at_ms = now_ms;
            window.count = 0;
        }

        window.count += 1;

        RateLimitDecision {
            allowed: window.count <= limit,
            remaining: limit.saturating_sub(window.count),
            reset_at_ms: window.started_at_ms + window_ms,
        }
    }

    /// Drops windows that expired before `now_ms`, bounding memory on servers
    /// with many one-off callers.
    pub fn prune(&self, window_ms: i64, now_ms: i64) {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.retain(|_, w| now_ms - w.started_at_ms < window_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u32 = 10;
    const WINDOW_MS: i64 = 60_000;

    #[test]
    fn allows_up_to_the_budget() {
        let limiter = FixedWindowLimiter::new();
        for i in 0..LIMIT {
            let decision = limiter.check_at("user-1", LIMIT, WINDOW_MS, 1_000 + i as i64);
            assert!(decision.allowed, "request {} should pass", i + 1);
        }
    }

    #[test]
    fn eleventh_call_in_the_window_is_denied() {
        let limiter = FixedWindowLimiter::new();
        let start = 5_000;
        for i in 0..LIMIT {
            limiter.check_at("user-1", LIMIT, WINDOW_MS, start + i as i64);
        }
        let denied = limiter.check_at("user-1", LIMIT, WINDOW_MS, start + 100);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_at_ms <= start + WINDOW_MS);
    }

    #[test]
    fn first_call_after_expiry_succeeds() {
        let limiter = FixedWindowLimiter::new();
        let start = 5_000;
        for i in 0..=LIMIT {
            limiter.check_at("user-1", LIMIT, WINDOW_MS, start + i as i64);
        }
        let decision = limiter.check_at("user-1", LIMIT, WINDOW_MS, start + WINDOW_MS);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, LIMIT - 1);
    }

    #[test]
    fn keys_are_counted_independently() {
        let limiter = FixedWindowLimiter::new();
        for i in 0..LIMIT {
            limiter.check_at("user-1", LIMIT, WINDOW_MS, 1_000 + i as i64);
        }
        let other = limiter.check_at("user-2", LIMIT, WINDOW_MS, 1_500);
        assert!(other.allowed);
    }

    #[test]
    fn retry_after_rounds_up_to_whole_seconds() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at_ms: 61_500,
        };
        assert_eq!(decision.retry_after_secs(60_000), 2);
        assert_eq!(decision.retry_after_secs(61_500), 0);
        assert_eq!(decision.retry_after_secs(62_000), 0);
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = FixedWindowLimiter::new();
        limiter.check_at("stale", LIMIT, WINDOW_MS, 0);
        limiter.check_at("fresh", LIMIT, WINDOW_MS, 59_000);
        limiter.prune(WINDOW_MS, 61_000);

        let windows = limiter.windows.lock().unwrap();
        assert!(!windows.contains_key("stale"));
        assert!(windows.contains_key("fresh"));
    }
}
