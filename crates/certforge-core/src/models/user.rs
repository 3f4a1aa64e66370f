//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Globally unique, never changed after creation.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to provision a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub active: bool,
}

impl User {
    /// Display name, falling back to the username when no full name
    /// has been recorded.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}
