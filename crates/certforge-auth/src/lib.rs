//! CertForge Auth — password verification, bearer token issuance and
//! validation, login throttling and the login flow.

pub mod config;
pub mod error;
pub mod identity;
pub mod password;
pub mod service;
pub mod throttle;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use identity::Identity;
pub use service::{AuthService, LoginInput, LoginOutput};
pub use throttle::{LoginThrottle, ThrottleConfig, ThrottleDecision};
pub use token::{IssuedToken, TokenClaims, TokenService};
