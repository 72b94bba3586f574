//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain algorithm and the backing store:
//! - Ports (traits) that infrastructure adapters implement
//! - The rate limiter facade callers interact with
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod limiter;
pub mod ports;
