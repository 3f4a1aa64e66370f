//! Bearer token issuance and validation.
//!
//! Tokens are EdDSA (Ed25519) signed JWTs carrying the username as
//! subject. The server keeps no token state: a token is valid iff its
//! signature verifies against the configured key, the issuer matches
//! and `iat <= now < exp`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject — username.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp, exclusive).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens.
///
/// Keys are parsed once at construction so that a bad key is a startup
/// error rather than a per-request one.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        // Expiry is checked against the caller's clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;

        let lifetime_secs = i64::try_from(config.token_lifetime_secs)
            .map_err(|_| AuthError::Crypto("token lifetime out of range".into()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.jwt_issuer.clone(),
            lifetime: Duration::seconds(lifetime_secs),
        })
    }

    /// Issue a token for `username`, valid from now for the configured
    /// lifetime.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.lifetime;
        let claims = TokenClaims {
            sub: username.to_owned(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::EdDSA);
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return the username it was issued to.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, Utc::now()).map(|claims| claims.sub)
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// Every failure collapses into [`AuthError::TokenInvalid`]; the
    /// underlying reason is only logged.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Bearer token rejected");
                AuthError::TokenInvalid
            })?;

        let now = now.timestamp();
        if now < claims.iat || now >= claims.exp {
            debug!(
                sub = %claims.sub,
                iat = claims.iat,
                exp = claims.exp,
                now,
                "Bearer token outside its validity window"
            );
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }
}
