//! Request-level error taxonomy and its HTTP mapping.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures that reach the caller of ingest or summarize.
///
/// Breaker rejections and dependency failures never appear here: the
/// summarize path absorbs them into a fallback payload.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Admission rejected by the rate limiter.
    #[error("Too Many Requests")]
    RateLimited { retry_after_secs: u64 },

    /// No client identity could be derived from the request.
    #[error("Unable to determine client IP for rate limiting")]
    IdentityUnresolved,

    /// Shared backing store unreachable.
    #[error("Shared store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// Anything else that is our fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => ApiError::StoreUnavailable(e),
            StoreError::WrongType(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Store(e) => e.into(),
            CacheError::Encode(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::IdentityUnresolved => StatusCode::BAD_REQUEST,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::StoreUnavailable(source) => {
                tracing::error!(error = %source, "Request failed: shared store unavailable");
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed: internal error");
            }
            _ => {}
        }

        // Internal details stay in the logs.
        let detail = match &self {
            ApiError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        let mut response = (status, Json(json!({ "error": detail }))).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
