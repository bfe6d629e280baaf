//! Request guards
//!
//! Bearer-token authentication for axum routes. A token travels in the
//! `Authorization: Bearer <token>` header; when the caller also sends
//! `X-Username`, the token must have been issued to that username.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::core::auth::AuthError;
use crate::core::auth::api::AuthApiState;
use crate::core::auth::service::AuthService;
use crate::core::auth::validator::Principal;

/// Header carrying the username the caller claims to be
pub const AUTH_HEADER_USERNAME: &str = "X-Username";

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}

/// Username the caller claims via `X-Username`, if any.
///
/// A present header is always bound, even when empty; one that is not
/// valid UTF-8 is rejected.
pub fn caller_username(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTH_HEADER_USERNAME) else {
        return Ok(None);
    };

    std::str::from_utf8(value.as_bytes())
        .map(Some)
        .map_err(|_| AuthError::InvalidRequest(format!("{} is not valid UTF-8", AUTH_HEADER_USERNAME)))
}

fn authenticate_headers(service: &AuthService, headers: &HeaderMap) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(headers)?;
    service.authenticate(&token, caller_username(headers)?)
}

/// Middleware rejecting requests without a valid token.
///
/// The resolved [`Principal`] is stored in request extensions.
pub async fn require_auth(
    State(state): State<Arc<AuthApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = authenticate_headers(&state.auth_service, request.headers())?;
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Middleware additionally requiring the admin role
pub async fn require_admin(
    State(state): State<Arc<AuthApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = authenticate_headers(&state.auth_service, request.headers())?;

    AuthService::require_admin(&principal).inspect_err(|_| {
        tracing::warn!(
            "Admin route denied for {} ({})",
            principal.username,
            principal.role
        );
    })?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated principal
///
/// Reuses the principal a guard already resolved; otherwise validates the
/// bearer token itself.
impl FromRequestParts<Arc<AuthApiState>> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AuthApiState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        authenticate_headers(&state.auth_service, &parts.headers)
    }
}
