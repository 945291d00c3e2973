//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (X-Forwarded-For first entry, else peer IP; 400 if neither)
//!     → rate_limit.rs (fixed-window counter in the shared store)
//!     → Pass to orchestration
//! ```
//!
//! # Design Decisions
//! - Identity is mandatory; there is no anonymous bucket
//! - Fail closed: an unreachable store rejects the request
//! - No trust in client input beyond picking the rate-limit key

pub mod identity;
pub mod rate_limit;

pub use identity::ClientId;
pub use rate_limit::{Decision, RateLimiter};
