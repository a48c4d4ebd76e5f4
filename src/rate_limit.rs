use std::time::Duration;

/// Trailing window for counting shares per address
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Shares allowed per address inside the window
pub const RATE_LIMIT_MAX: u64 = 25;

/// Sliding window policy applied to writes from one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_writes: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: RATE_LIMIT_WINDOW,
            max_writes: RATE_LIMIT_MAX,
        }
    }
}

impl RateLimitPolicy {
    /// Oldest `created_at` (ms) still counted at `now_ms`
    pub fn window_start(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.window.as_millis() as u64)
    }

    /// A write is allowed while the recent count stays below the maximum
    pub fn allows(&self, recent_writes: u64) -> bool {
        recent_writes < self.max_writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.window, Duration::from_secs(3600));
        assert_eq!(policy.max_writes, 25);
    }

    #[test]
    fn test_threshold() {
        let policy = RateLimitPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(24));
        assert!(!policy.allows(25));
        assert!(!policy.allows(100));
    }

    #[test]
    fn test_window_start() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.window_start(10_000_000), 10_000_000 - 3_600_000);
        assert_eq!(policy.window_start(1_000), 0);
    }
}
