//! Login throttle middleware. Every attempt is recorded before the
//! login handler runs, whether or not the credentials turn out valid.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use certforge_auth::ThrottleDecision;
use certforge_auth::throttle::client_key;
use certforge_core::error::CertforgeError;

use crate::api::error::ApiError;
use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

pub async fn limit_logins(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let forwarded_for = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(forwarded_for, peer);

    match state.throttle.check_and_record(&key) {
        ThrottleDecision::Allowed => next.run(request).await,
        ThrottleDecision::Blocked {
            retry_after_minutes,
        } => ApiError::from(CertforgeError::RateLimited {
            retry_after_minutes,
        })
        .into_response(),
    }
}
