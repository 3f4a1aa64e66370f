//! Request body extraction.

use axum::extract::FromRequest;

use crate::api::error::ApiError;

/// `axum::Json` whose rejections are reported as `{"error": ...}` with
/// status 400 instead of axum's plain-text responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
