//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use crate::domain::config::{ConfigError, EventTypeConfig};
use crate::domain::state::ActorState;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Errors surfaced by quota operations.
///
/// A denied action is not an error; it is a non-positive remaining
/// fraction. The only domain-level failure is checking an event type
/// nobody has configured.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// A quota check targeted an event type with no stored configuration.
    #[error("no rate limit configured for event type `{0}`")]
    ConfigNotDefined(String),

    /// Rejected configuration parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store-level failure, passed through verbatim.
    #[cfg(feature = "redis-backend")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

/// Port for obtaining current wall-clock time.
///
/// Quota state is shared across processes, so time is expressed as unix
/// seconds rather than a process-local `Instant`. Infrastructure provides
/// concrete implementations (`SystemClock`, `MockClock`).
pub trait Clock: Send + Sync + Debug {
    /// Current unix time in whole seconds.
    fn now(&self) -> i64;
}

/// Port for the shared quota store.
///
/// Implementations must run [`apply`](QuotaBackend::apply) as one
/// indivisible unit per (event type, actor) pair: the read of
/// configuration and state, the decay computation, and the conditional
/// write may not interleave with another check for the same actor. The
/// Redis adapter delegates this to a server-side script; the in-process
/// adapter holds a per-key entry lock.
#[async_trait]
pub trait QuotaBackend: Send + Sync {
    /// Replace the configuration for an event type atomically.
    ///
    /// Readers never observe a partially written configuration.
    async fn put_config(
        &self,
        event_type: &str,
        config: &EventTypeConfig,
    ) -> Result<(), QuotaError>;

    /// Read the configuration for an event type, if any.
    ///
    /// A partially stored configuration is reported as absent.
    async fn fetch_config(&self, event_type: &str) -> Result<Option<EventTypeConfig>, QuotaError>;

    /// Atomically evaluate a quota check and persist any state change.
    ///
    /// `now` is the caller's unix timestamp in seconds; `count` is 1 for
    /// a consuming check and 0 for a peek. Returns the remaining quota
    /// fraction.
    ///
    /// # Errors
    /// [`QuotaError::ConfigNotDefined`] if the event type is unconfigured;
    /// in that case no state is written.
    async fn apply(
        &self,
        event_type: &str,
        actor: &str,
        now: i64,
        count: u32,
    ) -> Result<f64, QuotaError>;

    /// Read an actor's stored state for diagnostics.
    ///
    /// Not part of the algorithmic contract: the returned score is the
    /// value at rest, not freshly decayed. `now` lets adapters without
    /// server-side expiry filter out state past its time-to-live.
    async fn fetch_state(
        &self,
        event_type: &str,
        actor: &str,
        now: i64,
    ) -> Result<Option<ActorState>, QuotaError>;
}
