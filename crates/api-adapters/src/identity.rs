//! Identity Gate wiring: resolve the bearer token once per request, expose
//! the result to handlers, and enforce per-route requirements.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use domains::{DomainError, Identity};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller's identity, if the gate resolved one.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl CurrentIdentity {
    pub fn as_ref(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Accepts both `Bearer <token>` and a raw token.
fn bearer_token(parts: &axum::http::HeaderMap) -> Option<&str> {
    let raw = parts.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

/// Runs on every request. An absent or invalid token leaves the request
/// anonymous; rejection is the route layer's job.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = bearer_token(request.headers()).and_then(|t| state.gate.resolve(t)) {
        debug!(%identity, "request authenticated");
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Route layer for [`crate::routes::Access::RequiredIdentity`].
pub async fn require_identity(request: Request, next: Next) -> Response {
    if request.extensions().get::<Identity>().is_none() {
        return ApiError(DomainError::Unauthenticated).into_response();
    }
    next.run(request).await
}
