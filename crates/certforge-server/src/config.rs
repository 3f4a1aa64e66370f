//! Server configuration loaded from a TOML file.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [database]
//! url = "mem://"
//!
//! [auth]
//! private_key_path = "keys/jwt_ed25519.pem"
//! public_key_path = "keys/jwt_ed25519.pub.pem"
//!
//! [[users]]
//! username = "admin"
//! password = "admin123"
//! email = "admin@example.com"
//! full_name = "Administrator"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use certforge_auth::AuthConfig;
use certforge_core::models::user::CreateUser;
use certforge_db::DbConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    pub auth: AuthSection,
    /// Accounts created at startup when their username is still free.
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
        }
    }
}

fn default_db_url() -> String {
    DbConfig::default().url
}

fn default_namespace() -> String {
    DbConfig::default().namespace
}

fn default_database() -> String {
    DbConfig::default().database
}

/// Token signing keys and login policy. Each key is given either inline
/// as PEM or as a path to a PEM file; inline wins when both are set.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    pub private_key: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub public_key: Option<String>,
    pub public_key_path: Option<PathBuf>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    pub pepper: Option<String>,
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,
}

fn default_issuer() -> String {
    AuthConfig::default().jwt_issuer
}

fn default_token_lifetime_secs() -> u64 {
    AuthConfig::default().token_lifetime_secs
}

fn default_max_login_attempts() -> u32 {
    AuthConfig::default().max_login_attempts
}

fn default_login_window_secs() -> u64 {
    AuthConfig::default().login_window_secs
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl From<BootstrapUser> for CreateUser {
    fn from(user: BootstrapUser) -> Self {
        Self {
            username: user.username,
            password: user.password,
            email: user.email,
            full_name: user.full_name,
            active: user.active,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database.url.clone(),
            namespace: self.database.namespace.clone(),
            database: self.database.database.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
        }
    }

    /// Resolve the auth section, reading key files as needed.
    pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let auth = &self.auth;
        Ok(AuthConfig {
            jwt_private_key_pem: resolve_pem(
                "private",
                auth.private_key.as_deref(),
                auth.private_key_path.as_deref(),
            )?,
            jwt_public_key_pem: resolve_pem(
                "public",
                auth.public_key.as_deref(),
                auth.public_key_path.as_deref(),
            )?,
            token_lifetime_secs: auth.token_lifetime_secs,
            jwt_issuer: auth.issuer.clone(),
            pepper: auth.pepper.clone(),
            max_login_attempts: auth.max_login_attempts,
            login_window_secs: auth.login_window_secs,
        })
    }
}

fn resolve_pem(kind: &str, inline: Option<&str>, path: Option<&Path>) -> anyhow::Result<String> {
    match (inline, path) {
        (Some(pem), _) => Ok(pem.to_owned()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {kind} key {}", path.display())),
        (None, None) => bail!("no {kind} key configured: set `{kind}_key` or `{kind}_key_path`"),
    }
}
