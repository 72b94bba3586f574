//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the rate limiter:
//! - Per-event-type configuration and its validation rules
//! - Per-actor decaying score state
//! - The quota decay and lockout algorithm
//!
//! All types in this layer are pure and easily testable.

pub mod config;
pub mod quota;
pub mod state;
