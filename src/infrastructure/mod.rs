//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Quota store implementations (Redis, in-process)

pub mod clock;
pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis_backend;

/// Mock implementations for testing.
///
/// Provides controllable test doubles for deterministic testing of
/// time-based quota behavior.
pub mod mocks;
