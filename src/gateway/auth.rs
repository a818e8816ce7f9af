//! Principal extraction
//!
//! Authentication happens upstream; the authenticator forwards the verified
//! username in `X-Authenticated-User`.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use super::types::ApiError;

pub const PRINCIPAL_HEADER: &str = "x-authenticated-user";

/// Authenticated username, injected into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

/// Reject requests without a principal, otherwise attach it.
pub async fn principal_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .headers()
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Principal(s.to_string()))
        .ok_or_else(|| ApiError::unauthorized("missing authenticated user"))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
