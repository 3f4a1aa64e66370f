//! Shared application state handed to every handler.

use std::sync::Arc;

use certforge_auth::{AuthConfig, AuthError, AuthService, LoginThrottle, ThrottleConfig};
use certforge_db::repository::{SurrealCertificateSessionRepository, SurrealUserRepository};
use certforge_ledger::{DisabledNotificationSender, LedgerService, NotificationSender};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type UserRepo = SurrealUserRepository<Any>;
pub type SessionRepo = SurrealCertificateSessionRepository<Any>;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<UserRepo>>,
    pub ledger: Arc<LedgerService<SessionRepo>>,
    pub throttle: Arc<LoginThrottle>,
    pub notifier: Arc<dyn NotificationSender>,
}

impl AppState {
    /// Wire the services over one database handle. Notifications start
    /// out disabled; see [`AppState::with_notifier`].
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig) -> Result<Self, AuthError> {
        let throttle = LoginThrottle::new(ThrottleConfig::from(&auth_config));
        let auth = AuthService::new(SurrealUserRepository::new(db.clone()), auth_config)?;
        let ledger = LedgerService::new(SurrealCertificateSessionRepository::new(db));

        Ok(Self {
            auth: Arc::new(auth),
            ledger: Arc::new(ledger),
            throttle: Arc::new(throttle),
            notifier: Arc::new(DisabledNotificationSender),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSender>) -> Self {
        self.notifier = notifier;
        self
    }
}
