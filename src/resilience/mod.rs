//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the external dependency:
//!     → circuit_breaker.rs (fail fast while open, single trial when half-open)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → outcome recorded back into the breaker
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Circuit breaker prevents cascading failures
//! - Breaker bookkeeping never blocks on the guarded call

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use timeouts::{with_deadline, Elapsed};
