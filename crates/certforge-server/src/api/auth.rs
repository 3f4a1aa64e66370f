//! `/api/auth` handlers.

use axum::Json;
use axum::extract::State;
use certforge_auth::LoginInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::gate::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let out = state
        .auth
        .login(LoginInput {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: out.token,
        expires_at: out.expires_at,
        username: out.username,
        full_name: out.full_name,
        email: out.email,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.auth.current_user(&username).await?;

    Ok(Json(MeResponse {
        full_name: user.display_name().to_owned(),
        username: user.username,
        email: user.email,
        last_login: user.last_login_at,
    }))
}
