//! Authentication service — login and user provisioning.
//!
//! Throttling is not applied here: the HTTP layer records every login
//! attempt with [`LoginThrottle`](crate::throttle::LoginThrottle)
//! before calling [`AuthService::login`].

use certforge_core::error::{CertforgeError, CertforgeResult};
use certforge_core::models::user::{CreateUser, User};
use certforge_core::repository::UserRepository;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::TokenService;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed bearer token.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
    pub full_name: String,
    pub email: String,
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    tokens: TokenService,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Result<Self, AuthError> {
        let tokens = TokenService::new(&config)?;
        Ok(Self {
            user_repo,
            tokens,
            config,
        })
    }

    /// The token service used to issue login tokens; the request gate
    /// validates with the same keys.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verify username + password and issue a bearer token.
    pub async fn login(&self, input: LoginInput) -> CertforgeResult<LoginOutput> {
        // 1. Look up user.
        let Some(mut user) = self.user_repo.find_by_username(&input.username).await? else {
            debug!(username = %input.username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials.into());
        };

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            debug!(username = %user.username, "Login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check account status.
        if !user.active {
            return Err(AuthError::AccountDisabled.into());
        }

        // 4. Issue token.
        let issued = self.tokens.issue(&user.username)?;

        // 5. Record the login.
        user.last_login_at = Some(Utc::now());
        let user = self.user_repo.save(user).await?;

        info!(username = %user.username, "User logged in");

        Ok(LoginOutput {
            token: issued.token,
            expires_at: issued.expires_at,
            full_name: user.display_name().to_owned(),
            username: user.username,
            email: user.email,
        })
    }

    /// Resolve an authenticated username to its user record.
    pub async fn current_user(&self, username: &str) -> CertforgeResult<User> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| CertforgeError::NotFound {
                entity: "user".into(),
                id: format!("username={username}"),
            })
    }

    /// Create a user unless the username is already taken.
    ///
    /// Returns `None` when the user already existed, which makes this
    /// safe to call on every startup.
    pub async fn provision_user(&self, input: CreateUser) -> CertforgeResult<Option<User>> {
        if self.user_repo.exists_by_username(&input.username).await? {
            info!(username = %input.username, "User already exists");
            return Ok(None);
        }

        let password_hash = password::hash_password(&input.password, self.config.pepper.as_deref())?;
        let user = self
            .user_repo
            .save(User {
                id: Uuid::new_v4(),
                username: input.username,
                password_hash,
                email: input.email,
                full_name: input.full_name,
                active: input.active,
                last_login_at: None,
                created_at: Utc::now(),
            })
            .await?;

        info!(username = %user.username, "Created user");
        Ok(Some(user))
    }
}
