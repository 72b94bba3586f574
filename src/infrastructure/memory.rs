//! In-process quota store.
//!
//! Backs the same quota engine with a concurrent map instead of Redis.
//! Useful for single-instance deployments and for tests that need the
//! full limiter behavior without a server.
//!
//! Atomicity comes from the map's entry API: the per-key entry lock is
//! held across the read-evaluate-write of a quota check, so concurrent
//! checks for the same actor serialize exactly as the Redis script does.
//! Time-to-live is emulated by stamping each state record with its
//! expiry and treating records past it as absent.

use crate::application::ports::{QuotaBackend, QuotaError};
use crate::domain::config::EventTypeConfig;
use crate::domain::quota::evaluate;
use crate::domain::state::ActorState;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct StoredState {
    state: ActorState,
    /// Unix second at which this record stops existing.
    expires_at: i64,
}

impl StoredState {
    fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// In-process implementation of [`QuotaBackend`].
///
/// # Example
/// ```
/// use adequate_rate_limiter::{AdequateRateLimiter, MemoryBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = AdequateRateLimiter::new(MemoryBackend::new());
/// limiter.configure("login", 5, 60, 120).await?;
/// assert!(limiter.allow("login", "alice").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    configs: DashMap<String, EventTypeConfig>,
    states: DashMap<(String, String), StoredState>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live configurations.
    pub fn config_count(&self) -> usize {
        self.configs.len()
    }

    /// Drop all configurations and actor state.
    pub fn clear(&self) {
        self.configs.clear();
        self.states.clear();
    }
}

#[async_trait]
impl QuotaBackend for MemoryBackend {
    async fn put_config(
        &self,
        event_type: &str,
        config: &EventTypeConfig,
    ) -> Result<(), QuotaError> {
        // A single insert is the full atomic replace.
        self.configs.insert(event_type.to_owned(), *config);
        Ok(())
    }

    async fn fetch_config(&self, event_type: &str) -> Result<Option<EventTypeConfig>, QuotaError> {
        Ok(self.configs.get(event_type).map(|entry| *entry.value()))
    }

    async fn apply(
        &self,
        event_type: &str,
        actor: &str,
        now: i64,
        count: u32,
    ) -> Result<f64, QuotaError> {
        let config = self
            .configs
            .get(event_type)
            .map(|entry| *entry.value())
            .ok_or_else(|| QuotaError::ConfigNotDefined(event_type.to_owned()))?;
        let expires_at = now + config.expire_in() as i64;

        let key = (event_type.to_owned(), actor.to_owned());
        match self.states.entry(key) {
            Entry::Occupied(mut occupied) => {
                let stored = *occupied.get();
                let prior = stored.is_live(now).then_some(stored.state);
                let outcome = evaluate(&config, prior.as_ref(), now, count);
                if let Some(update) = outcome.update {
                    occupied.insert(StoredState {
                        state: update,
                        expires_at,
                    });
                } else if prior.is_none() {
                    // Expired record observed by a read-only check.
                    occupied.remove();
                }
                Ok(outcome.remaining)
            }
            Entry::Vacant(vacant) => {
                let outcome = evaluate(&config, None, now, count);
                if let Some(update) = outcome.update {
                    vacant.insert(StoredState {
                        state: update,
                        expires_at,
                    });
                }
                Ok(outcome.remaining)
            }
        }
    }

    async fn fetch_state(
        &self,
        event_type: &str,
        actor: &str,
        now: i64,
    ) -> Result<Option<ActorState>, QuotaError> {
        let key = (event_type.to_owned(), actor.to_owned());
        Ok(self
            .states
            .get(&key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.state))
    }
}
