//! SurrealDB implementation of [`UserRepository`].

use certforge_core::error::CertforgeResult;
use certforge_core::models::user::User;
use certforge_core::repository::UserRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    password_hash: String,
    email: String,
    full_name: String,
    active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    password_hash: String,
    email: String,
    full_name: String,
    active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            full_name: self.full_name,
            active: self.active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::InvalidRecord(format!("invalid user UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            full_name: self.full_name,
            active: self.active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the credential store.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn find_by_username(&self, username: &str) -> CertforgeResult<Option<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn exists_by_username(&self, username: &str) -> CertforgeResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE username = $username GROUP ALL",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn save(&self, user: User) -> CertforgeResult<User> {
        let id_str = user.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('user', $id) SET \
                 username = $username, \
                 password_hash = $password_hash, \
                 email = $email, \
                 full_name = $full_name, \
                 active = $active, \
                 last_login_at = $last_login_at, \
                 created_at = $created_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", user.username))
            .bind(("password_hash", user.password_hash))
            .bind(("email", user.email))
            .bind(("full_name", user.full_name))
            .bind(("active", user.active))
            .bind(("last_login_at", user.last_login_at))
            .bind(("created_at", user.created_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(user.id))
    }
}
