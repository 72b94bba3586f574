//! The quota decay and lockout algorithm.
//!
//! This is the algorithmic core of the crate. [`evaluate`] is a pure
//! function from (configuration, prior state, time, count) to a quota
//! outcome, so it can run unchanged inside any single atomic unit the
//! backing store offers: the in-process backend calls it while holding a
//! per-key entry lock, and the Redis Lua script mirrors it line for line.
//!
//! The model is a leaky bucket: every counted event adds `count` to the
//! actor's score, and the score drains linearly at `max_allowed /
//! over_interval` units per second, so a fully idle actor recovers
//! completely after `over_interval` seconds. When the score reaches
//! `max_allowed` the actor enters lockout: until `lockout_interval`
//! seconds have passed since the block, checks neither decay nor
//! increment the score, and the remaining fraction stays pinned at a
//! non-positive value.
//!
//! Scores only ever move when `count > 0`. A zero-count peek against an
//! actor with existing state returns the fraction computed from the
//! *undecayed* stored score and performs no write. That asymmetry is
//! deliberate: pure reads must not mutate shared state, and applying
//! decay without persisting it would make two consecutive peeks disagree
//! with the stored truth.

use crate::domain::config::EventTypeConfig;
use crate::domain::state::ActorState;

/// Result of evaluating one quota check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaOutcome {
    /// Remaining quota as a fraction of `max_allowed`.
    ///
    /// Positive means the action is allowed; zero or negative means
    /// denied. Exactly zero occurs the moment the bucket fills.
    pub remaining: f64,
    /// State to persist, if this check mutated the actor's score.
    ///
    /// `None` for zero-count peeks and for checks suppressed by lockout;
    /// the caller must not write anything in those cases.
    pub update: Option<ActorState>,
}

impl QuotaOutcome {
    fn read_only(remaining: f64) -> Self {
        Self {
            remaining,
            update: None,
        }
    }
}

/// Evaluate a quota check for one actor at time `now`.
///
/// `count` is 1 for a normal consuming check and 0 for a non-consuming
/// peek. The returned [`QuotaOutcome`] carries the remaining fraction and
/// the state write (if any) the caller must apply within the same atomic
/// unit that read `state`.
///
/// # Example
/// ```
/// use adequate_rate_limiter::domain::quota::evaluate;
/// use adequate_rate_limiter::EventTypeConfig;
///
/// let config = EventTypeConfig::new(10, 3600, 300).unwrap();
///
/// // First event: score 1, nine tenths of the quota left
/// let outcome = evaluate(&config, None, 1_700_000_000, 1);
/// assert!((outcome.remaining - 0.9).abs() < 1e-9);
/// assert!(outcome.update.is_some());
/// ```
pub fn evaluate(
    config: &EventTypeConfig,
    state: Option<&ActorState>,
    now: i64,
    count: u32,
) -> QuotaOutcome {
    let max_allowed = f64::from(config.max_allowed());

    let Some(state) = state else {
        if count == 0 {
            // Nothing recorded, nothing consumed: full quota, no write.
            return QuotaOutcome::read_only(1.0);
        }
        let fresh = ActorState::first_event(count, now);
        return QuotaOutcome {
            remaining: 1.0 - fresh.score / max_allowed,
            update: Some(fresh),
        };
    };

    if state.in_lockout(now, config.lockout_interval()) || count == 0 {
        // Lockout suppresses the update entirely, and zero-count peeks
        // never decay or increment. Both report the stored score as-is.
        return QuotaOutcome::read_only(1.0 - state.score / max_allowed);
    }

    let elapsed = (now - state.last_updated_at) as f64;
    let decayed = (state.score - config.decay_rate() * elapsed).max(0.0);

    let mut score = decayed + f64::from(count);
    let mut last_blocked_at = state.last_blocked_at;
    if score >= max_allowed {
        score = max_allowed;
        last_blocked_at = now;
    }

    QuotaOutcome {
        remaining: 1.0 - score / max_allowed,
        update: Some(ActorState {
            score,
            last_updated_at: now,
            last_blocked_at,
        }),
    }
}
