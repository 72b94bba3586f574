//! Clock adapters for time operations.
//!
//! Provides the `SystemClock` implementation for production use. See
//! `MockClock` (in `crate::infrastructure::mocks`) for a controllable
//! test clock.

use crate::application::ports::Clock;
use std::time::{SystemTime, UNIX_EPOCH};

/// System clock reporting unix time in whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            // Clock set before 1970; report the (negative) offset rather
            // than panic in the hot path.
            Err(err) => -(err.duration().as_secs() as i64),
        }
    }
}
