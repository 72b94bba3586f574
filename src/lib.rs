//! # adequate-rate-limiter
//!
//! Smooth, configurable, space-efficient distributed rate limiting with
//! decaying scores, backed by Redis.
//!
//! Multiple service instances enforcing a quota for the same actor need a
//! single source of truth. This crate keeps per-actor usage in a shared
//! store and runs every quota check as one atomic server-side operation,
//! so concurrent checks for the same actor can never observe or produce
//! intermediate state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adequate_rate_limiter::{AdequateRateLimiter, RedisBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = RedisBackend::connect("redis://127.0.0.1/").await?;
//!     let limiter = AdequateRateLimiter::new(backend);
//!
//!     // Allow 100 api calls per actor per hour; once the limit is hit,
//!     // lock the actor out for 5 minutes.
//!     limiter.configure("api-access", 100, 3600, 300).await?;
//!
//!     if limiter.allow("api-access", "user:42").await? {
//!         // perform the action
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For single-instance deployments or tests, swap in the in-process
//! backend; the call sites stay identical:
//!
//! ```rust
//! use adequate_rate_limiter::{AdequateRateLimiter, MemoryBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = AdequateRateLimiter::new(MemoryBackend::new());
//! limiter.configure("login", 5, 60, 120).await?;
//! assert!(limiter.allow("login", "alice").await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## How it works
//!
//! Each (event type, actor) pair tracks one decaying score. A counted
//! event adds 1 (or an explicit `count`); the score drains linearly at
//! `max_allowed / over_interval` units per second, so a fully idle actor
//! recovers completely after `over_interval` seconds. This is a leaky
//! bucket with exactly three persisted numbers per actor:
//! `(score, last_updated_at, last_blocked_at)`.
//!
//! Checks return the **remaining quota fraction**
//! `1 - score / max_allowed`: positive means allowed, zero or negative
//! means denied. A denied action is not an error. The only error a check
//! can raise is [`QuotaError::ConfigNotDefined`], for event types nobody
//! has configured.
//!
//! When the score reaches `max_allowed` the actor enters **lockout**:
//! for the next `lockout_interval` seconds checks are denied and the
//! stored state is left completely untouched, neither decaying nor
//! incrementing. Actor state carries a time-to-live of
//! `over_interval + lockout_interval`, so idle actors cost nothing.
//!
//! ## Peeks do not decay
//!
//! `remaining()` (a `count = 0` check) against an actor with existing
//! state reports the fraction computed from the *stored* score, without
//! applying decay. Pure reads never mutate shared state, and the stored
//! truth only advances on counted events. Expect a peek to look staler
//! than a consuming check issued at the same moment.
//!
//! ## Atomicity
//!
//! The Redis backend runs the whole check (read config, read state,
//! decay, compare, write) inside one Lua script invoked by SHA. Scripts
//! evicted from the server cache are transparently re-registered and the
//! call retried once. The in-process backend holds a per-key lock across
//! the same read-modify-write. Checks for different actors are fully
//! independent and need no coordination.
//!
//! ## Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - `domain` - the pure decay/lockout algorithm and its record types
//! - `application` - the limiter facade and the `Clock` / `QuotaBackend`
//!   ports
//! - `infrastructure` - Redis and in-process adapters, clocks, mocks

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    config::{ConfigError, EventTypeConfig},
    quota::{evaluate, QuotaOutcome},
    state::ActorState,
};

pub use application::{
    limiter::AdequateRateLimiter,
    ports::{Clock, QuotaBackend, QuotaError},
};

pub use infrastructure::{clock::SystemClock, memory::MemoryBackend, mocks::MockClock};

#[cfg(feature = "redis-backend")]
pub use infrastructure::redis_backend::{RedisBackend, RedisBackendConfig};
