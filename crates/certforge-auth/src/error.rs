//! Authentication error types.

use certforge_core::error::CertforgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    /// Any token that fails validation. The reason is deliberately not
    /// carried so that callers cannot tell tampering from expiry.
    #[error("invalid token")]
    TokenInvalid,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CertforgeError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::TokenInvalid => {
                CertforgeError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::AccountDisabled => CertforgeError::AccountDisabled,
            AuthError::Crypto(msg) => CertforgeError::Crypto(msg),
        }
    }
}
