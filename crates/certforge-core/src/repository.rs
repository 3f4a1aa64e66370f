//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Ledger operations that mutate
//! a session take the owner id so that implementations can scope the
//! write to that owner.

use uuid::Uuid;

use crate::error::CertforgeResult;
use crate::models::{
    ledger::{CertificateRecord, CertificateSession, CreateCertificateSession},
    user::User,
};

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = CertforgeResult<Option<User>>> + Send;
    fn exists_by_username(&self, username: &str)
    -> impl Future<Output = CertforgeResult<bool>> + Send;
    /// Insert or replace the user keyed by `user.id`.
    fn save(&self, user: User) -> impl Future<Output = CertforgeResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Certificate ledger
// ---------------------------------------------------------------------------

pub trait CertificateSessionRepository: Send + Sync {
    /// Persist a whole session in a single atomic write.
    fn create(
        &self,
        input: CreateCertificateSession,
    ) -> impl Future<Output = CertforgeResult<CertificateSession>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CertforgeResult<CertificateSession>> + Send;
    /// Sessions owned by `owner_user_id`, newest first.
    fn list_by_owner(
        &self,
        owner_user_id: Uuid,
    ) -> impl Future<Output = CertforgeResult<Vec<CertificateSession>>> + Send;
    /// Delete one session, scoped to its owner. Deleting a session that
    /// does not belong to `owner_user_id` is a no-op.
    fn delete(
        &self,
        id: Uuid,
        owner_user_id: Uuid,
    ) -> impl Future<Output = CertforgeResult<()>> + Send;
    /// Delete every session of one owner.
    fn delete_by_owner(&self, owner_user_id: Uuid)
    -> impl Future<Output = CertforgeResult<()>> + Send;
    /// First record whose number equals `certificate_number` exactly,
    /// scanning sessions oldest first. The caller normalizes.
    fn find_record_by_number(
        &self,
        certificate_number: &str,
    ) -> impl Future<Output = CertforgeResult<Option<CertificateRecord>>> + Send;
    fn count(&self) -> impl Future<Output = CertforgeResult<u64>> + Send;
}
