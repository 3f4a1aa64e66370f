//! Authentication configuration.

use std::time::Duration;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for token verification.
    pub jwt_public_key_pem: String,
    /// Token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// Login attempts allowed per client within one window (default: 10).
    pub max_login_attempts: u32,
    /// Login throttle window in seconds (default: 900 = 15 minutes).
    pub login_window_secs: u64,
}

impl AuthConfig {
    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            token_lifetime_secs: 86_400,
            jwt_issuer: "certforge".into(),
            pepper: None,
            max_login_attempts: 10,
            login_window_secs: 900,
        }
    }
}
