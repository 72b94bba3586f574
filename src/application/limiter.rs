//! Rate limiter facade.
//!
//! `AdequateRateLimiter` ties a clock to a quota backend and exposes the
//! caller-facing operations: configure an event type, run consuming
//! checks, peek remaining quota, and inspect stored tuples.

use crate::application::ports::{Clock, QuotaBackend, QuotaError};
use crate::domain::config::EventTypeConfig;
use crate::domain::state::ActorState;
use crate::infrastructure::clock::SystemClock;
use std::sync::Arc;

/// Distributed, decaying rate limiter.
///
/// Generic over the backend so the same call sites work against Redis in
/// production and the in-process backend in tests.
///
/// # Example
/// ```
/// use adequate_rate_limiter::{AdequateRateLimiter, MemoryBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = AdequateRateLimiter::new(MemoryBackend::new());
///
/// // 100 api calls per hour, 5 minute lockout once exhausted
/// limiter.configure("api-access", 100, 3600, 300).await?;
///
/// if limiter.allow("api-access", "user:42").await? {
///     // perform the action
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdequateRateLimiter<B> {
    backend: B,
    clock: Arc<dyn Clock>,
}

impl<B> AdequateRateLimiter<B>
where
    B: QuotaBackend,
{
    /// Create a limiter using the system clock.
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock::new()))
    }

    /// Create a limiter with an explicit clock.
    ///
    /// Tests pass a `MockClock` here to drive time deterministically;
    /// the timestamp handed to the backend is always the clock's, so
    /// even Redis-backed decay and lockout can be tested without
    /// sleeping.
    pub fn with_clock(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Configure rate limiting for an event type.
    ///
    /// Fully replaces any existing configuration; idempotent under
    /// repeated identical calls. Allows `max_allowed` events per actor
    /// over a rolling `over_interval` seconds, with a
    /// `lockout_interval`-second cooldown once the limit is hit.
    ///
    /// # Errors
    /// [`QuotaError::Config`] if `max_allowed` or `over_interval` is zero.
    pub async fn configure(
        &self,
        event_type: &str,
        max_allowed: u32,
        over_interval: u64,
        lockout_interval: u64,
    ) -> Result<(), QuotaError> {
        let config = EventTypeConfig::new(max_allowed, over_interval, lockout_interval)?;
        self.backend.put_config(event_type, &config).await?;
        tracing::debug!(
            event_type,
            max_allowed,
            over_interval,
            lockout_interval,
            "configured rate limit"
        );
        Ok(())
    }

    /// Run a quota check, counting `count` events against the actor.
    ///
    /// Returns the remaining quota fraction: `> 0` means allowed, `<= 0`
    /// means denied. Pass `count = 0` for a non-consuming peek; note that
    /// a peek against existing state reports the stored score without
    /// applying decay.
    ///
    /// # Errors
    /// [`QuotaError::ConfigNotDefined`] if the event type has never been
    /// configured.
    pub async fn check(&self, event_type: &str, actor: &str, count: u32) -> Result<f64, QuotaError> {
        self.backend
            .apply(event_type, actor, self.clock.now(), count)
            .await
    }

    /// Check whether `actor` may perform an action of `event_type`,
    /// counting the action.
    pub async fn allow(&self, event_type: &str, actor: &str) -> Result<bool, QuotaError> {
        Ok(self.check(event_type, actor, 1).await? > 0.0)
    }

    /// Remaining quota fraction without consuming any of it.
    pub async fn remaining(&self, event_type: &str, actor: &str) -> Result<f64, QuotaError> {
        self.check(event_type, actor, 0).await
    }

    /// Stored configuration for an event type, for diagnostics.
    pub async fn peek_config(
        &self,
        event_type: &str,
    ) -> Result<Option<EventTypeConfig>, QuotaError> {
        self.backend.fetch_config(event_type).await
    }

    /// Stored state for an actor, for diagnostics.
    ///
    /// The score is the persisted value at rest, not freshly decayed.
    pub async fn peek_state(
        &self,
        event_type: &str,
        actor: &str,
    ) -> Result<Option<ActorState>, QuotaError> {
        self.backend
            .fetch_state(event_type, actor, self.clock.now())
            .await
    }

    /// The backend this limiter runs against.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
