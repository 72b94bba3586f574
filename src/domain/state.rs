//! Per-actor quota state.

/// Decaying usage state for one (event type, actor) pair.
///
/// At rest the invariants hold: `0 <= score <= max_allowed` and
/// `last_blocked_at` only ever moves forward. A `last_blocked_at` of 0
/// means the actor has never been blocked.
///
/// The backing store serializes this as a 3-element list in field order
/// (score, last_updated_at, last_blocked_at); that ordering is a storage
/// concern and does not leak into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    /// Decayed usage count.
    pub score: f64,
    /// Unix timestamp (seconds) of the last persisted update.
    pub last_updated_at: i64,
    /// Unix timestamp (seconds) the actor last hit the limit, 0 if never.
    pub last_blocked_at: i64,
}

impl ActorState {
    /// State for an actor's first counted event at time `now`.
    pub fn first_event(count: u32, now: i64) -> Self {
        Self {
            score: f64::from(count),
            last_updated_at: now,
            last_blocked_at: 0,
        }
    }

    /// Whether the actor is still inside its lockout window at `now`.
    pub fn in_lockout(&self, now: i64, lockout_interval: u64) -> bool {
        now - self.last_blocked_at <= lockout_interval as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event() {
        let state = ActorState::first_event(1, 1000);
        assert_eq!(state.score, 1.0);
        assert_eq!(state.last_updated_at, 1000);
        assert_eq!(state.last_blocked_at, 0);
    }

    #[test]
    fn test_in_lockout_boundaries() {
        let state = ActorState {
            score: 10.0,
            last_updated_at: 1000,
            last_blocked_at: 1000,
        };

        // Inside the window, including the exact boundary
        assert!(state.in_lockout(1000, 300));
        assert!(state.in_lockout(1300, 300));

        // One second past the boundary
        assert!(!state.in_lockout(1301, 300));
    }

    #[test]
    fn test_never_blocked_is_not_in_lockout() {
        let state = ActorState::first_event(1, 1000);
        assert!(!state.in_lockout(1000, 300));
    }
}
