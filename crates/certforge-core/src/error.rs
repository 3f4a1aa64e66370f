//! Error types for the CertForge system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertforgeError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Rate limit exceeded, retry in {retry_after_minutes} minutes")]
    RateLimited { retry_after_minutes: u64 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl CertforgeError {
    /// Refusal of an operation on a resource the caller does not own.
    /// Also used for unknown resources so the two cannot be told apart.
    pub fn access_denied() -> Self {
        Self::AuthorizationDenied {
            reason: "Access denied".into(),
        }
    }
}

pub type CertforgeResult<T> = Result<T, CertforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_carries_public_reason() {
        match CertforgeError::access_denied() {
            CertforgeError::AuthorizationDenied { reason } => assert_eq!(reason, "Access denied"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
