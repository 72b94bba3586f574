//! Per-event-type rate limiting configuration.

use thiserror::Error;

/// Errors raised when constructing an invalid configuration.
///
/// Validation happens once, at configure time. The quota engine itself
/// never re-checks these; feeding it an unvalidated configuration is a
/// caller bug.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_allowed` must be a positive integer.
    #[error("max_allowed must be positive")]
    ZeroMaxAllowed,
    /// `over_interval` must be a positive number of seconds (it is the
    /// divisor of the decay slope).
    #[error("over_interval must be positive")]
    ZeroOverInterval,
}

/// Rate limiting parameters for one event type.
///
/// An actor may perform at most `max_allowed` events over a rolling window
/// of `over_interval` seconds. Once the limit is hit, the actor is locked
/// out for `lockout_interval` seconds regardless of decay.
///
/// # Example
/// ```
/// use adequate_rate_limiter::EventTypeConfig;
///
/// // 100 events per hour, 5 minute lockout
/// let config = EventTypeConfig::new(100, 3600, 300).unwrap();
/// assert_eq!(config.expire_in(), 3900);
///
/// // Zero-sized windows are rejected
/// assert!(EventTypeConfig::new(100, 0, 300).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypeConfig {
    max_allowed: u32,
    over_interval: u64,
    lockout_interval: u64,
}

impl EventTypeConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns a `ConfigError` if `max_allowed` or `over_interval` is zero.
    /// A zero `lockout_interval` is valid and means no cooldown beyond the
    /// decay itself.
    pub fn new(
        max_allowed: u32,
        over_interval: u64,
        lockout_interval: u64,
    ) -> Result<Self, ConfigError> {
        if max_allowed == 0 {
            return Err(ConfigError::ZeroMaxAllowed);
        }
        if over_interval == 0 {
            return Err(ConfigError::ZeroOverInterval);
        }
        Ok(Self {
            max_allowed,
            over_interval,
            lockout_interval,
        })
    }

    /// Maximum permitted events per window.
    pub fn max_allowed(&self) -> u32 {
        self.max_allowed
    }

    /// Rolling window length in seconds.
    pub fn over_interval(&self) -> u64 {
        self.over_interval
    }

    /// Cooldown in seconds once an actor is blocked.
    pub fn lockout_interval(&self) -> u64 {
        self.lockout_interval
    }

    /// Time-to-live applied to persisted actor state, in seconds.
    ///
    /// An actor idle for this long has fully recovered and its state can
    /// safely self-expire.
    pub fn expire_in(&self) -> u64 {
        self.over_interval + self.lockout_interval
    }

    /// Decay slope: score units shed per second of idle time.
    pub fn decay_rate(&self) -> f64 {
        f64::from(self.max_allowed) / self.over_interval as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = EventTypeConfig::new(10, 3600, 300).unwrap();
        assert_eq!(config.max_allowed(), 10);
        assert_eq!(config.over_interval(), 3600);
        assert_eq!(config.lockout_interval(), 300);
        assert_eq!(config.expire_in(), 3900);
    }

    #[test]
    fn test_zero_lockout_is_valid() {
        let config = EventTypeConfig::new(5, 60, 0).unwrap();
        assert_eq!(config.expire_in(), 60);
    }

    #[test]
    fn test_zero_max_allowed_rejected() {
        assert_eq!(
            EventTypeConfig::new(0, 3600, 300),
            Err(ConfigError::ZeroMaxAllowed)
        );
    }

    #[test]
    fn test_zero_over_interval_rejected() {
        assert_eq!(
            EventTypeConfig::new(10, 0, 300),
            Err(ConfigError::ZeroOverInterval)
        );
    }

    #[test]
    fn test_decay_rate() {
        let config = EventTypeConfig::new(10, 3600, 300).unwrap();
        let rate = config.decay_rate();
        assert!((rate - 10.0 / 3600.0).abs() < 1e-12);
    }
}
