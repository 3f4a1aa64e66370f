//! Bearer token gate.
//!
//! [`authenticate`] runs on every route and attaches an [`Identity`] to
//! the request. It never rejects; routes that need a caller take a
//! [`CurrentUser`], which turns an anonymous identity into a 401.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use certforge_auth::Identity;
use tracing::debug;

use crate::api::error::ApiError;
use crate::state::AppState;

pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = match bearer_token(request.headers()) {
        Some(token) => match state.auth.tokens().validate(token) {
            Ok(username) => Identity::Authenticated(username),
            Err(_) => {
                debug!(path = %request.uri().path(), "Ignoring invalid bearer token");
                Identity::Anonymous
            }
        },
        None => Identity::Anonymous,
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller's username.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(Identity::username)
            .map(|username| Self(username.to_owned()))
            .ok_or(ApiError::Unauthenticated)
    }
}
