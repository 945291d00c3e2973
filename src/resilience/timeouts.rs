//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap calls to the external dependency with a deadline
//! - Report expiry as an error distinct from the call's own failures
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timed-out guarded call counts as a breaker failure

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A deadline expired before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {}ms", .0.as_millis())]
pub struct Elapsed(pub Duration);

/// Run `fut`, failing with [`Elapsed`] once `limit` passes.
pub async fn with_deadline<T, Fut>(limit: Duration, fut: Fut) -> Result<T, Elapsed>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| Elapsed(limit))
}
