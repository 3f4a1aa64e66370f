//! HTTP API.

pub mod auth;
pub mod certificates;
pub mod error;
pub mod extract;
pub mod gate;
pub mod throttle;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use error::ApiError;
pub use extract::ApiJson;
pub use gate::CurrentUser;

/// Build the application router.
///
/// The gate wraps every route. The throttle wraps only the login route
/// and runs before its handler.
pub fn router(state: AppState) -> Router {
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            throttle::limit_logins,
        ));

    Router::new()
        .merge(login)
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/certificates/save-history",
            post(certificates::save_history),
        )
        .route(
            "/api/certificates/history",
            get(certificates::list_history).delete(certificates::clear_history),
        )
        .route(
            "/api/certificates/history/{id}",
            delete(certificates::delete_history),
        )
        .route(
            "/api/certificates/verify/{cert_number}",
            get(certificates::verify),
        )
        .route(
            "/api/certificates/send-email",
            post(certificates::send_email),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
