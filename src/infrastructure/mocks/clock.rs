//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling
/// deterministic testing of decay and lockout behavior without sleeping.
///
/// # Examples
///
/// ```
/// use adequate_rate_limiter::infrastructure::mocks::MockClock;
/// use adequate_rate_limiter::application::ports::Clock;
///
/// let clock = MockClock::new(1_700_000_000);
/// assert_eq!(clock.now(), 1_700_000_000);
///
/// // Advance time explicitly
/// clock.advance(3600);
/// assert_eq!(clock.now(), 1_700_003_600);
///
/// // Or set it outright
/// clock.set(1_700_000_000);
/// assert_eq!(clock.now(), 1_700_000_000);
/// ```
///
/// # Thread Safety
///
/// `MockClock` is thread-safe and can be cloned to share across threads.
/// All clones share the same underlying time value.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a mock clock starting at the given unix time in seconds.
    pub fn new(start: i64) -> Self {
        Self {
            current_time: Arc::new(AtomicI64::new(start)),
        }
    }

    /// Advance the clock by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.current_time.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Set the clock to a specific unix time.
    pub fn set(&self, timestamp: i64) {
        self.current_time.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> i64 {
        self.current_time.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(10);
        assert_eq!(clock.now(), 1010);

        clock.set(500);
        assert_eq!(clock.now(), 500);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::new(1000);
        let clone = clock.clone();

        clone.advance(5);
        assert_eq!(clock.now(), 1005);
    }
}
