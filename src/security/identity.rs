//! Client identity resolution.
//!
//! The identity is the first `X-Forwarded-For` entry, else the peer IP of
//! the connection. A request with neither is rejected before admission.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// A non-empty client identifier used as the rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Returns `None` for blank input.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == id.len() {
            Some(Self(id))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pick the client identity from headers and the peer address.
pub fn resolve_client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<ClientId> {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(ClientId::new);

    forwarded.or_else(|| peer.and_then(|addr| ClientId::new(addr.ip().to_string())))
}

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        resolve_client_id(&parts.headers, peer).ok_or_else(|| {
            tracing::warn!("Unable to determine client IP for rate limiting");
            ApiError::IdentityUnresolved
        })
    }
}
