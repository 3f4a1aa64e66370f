//! Ledger service — stamping, ownership checks and verification on top
//! of a [`CertificateSessionRepository`].

use certforge_core::error::{CertforgeError, CertforgeResult};
use certforge_core::models::ledger::{
    CertificateRecord, CertificateSession, CreateCertificateSession, DEFAULT_NOTIFY_STATUS,
    SessionDraft, normalize_certificate_number,
};
use certforge_core::repository::CertificateSessionRepository;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a public verification lookup. `NotFound` is an ordinary
/// answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(CertificateRecord),
    NotFound,
}

/// Turn a client draft into a fully stamped session as of `now`.
///
/// Every record gets `issued_at = now`, records marked notified also
/// get `notified_at = now`, and certificate numbers are normalized.
pub fn prepare_session(
    owner_user_id: Uuid,
    owner_username: &str,
    draft: SessionDraft,
    now: DateTime<Utc>,
) -> CreateCertificateSession {
    let session_name = draft
        .session_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("Session {}", now.format("%Y-%m-%dT%H:%M")));

    let certificates: Vec<CertificateRecord> = draft
        .certificates
        .into_iter()
        .map(|item| CertificateRecord {
            certificate_number: normalize_certificate_number(&item.certificate_number),
            recipient_name: item.recipient_name,
            recipient_email: item.recipient_email.unwrap_or_default(),
            course_name: item.course_name,
            issuer_name: draft.issuer_name.clone(),
            notified: item.notified,
            notify_status: item
                .notify_status
                .unwrap_or_else(|| DEFAULT_NOTIFY_STATUS.to_owned()),
            issued_at: now,
            notified_at: item.notified.then_some(now),
        })
        .collect();

    let total_certificates = draft
        .total_certificates
        .unwrap_or_else(|| u32::try_from(certificates.len()).unwrap_or(u32::MAX));

    CreateCertificateSession {
        owner_user_id,
        owner_username: owner_username.to_owned(),
        session_name,
        total_certificates,
        notifications_sent: draft.notifications_sent,
        notified_count: draft.notified_count,
        content_template: draft.content_template,
        issuer_name: draft.issuer_name,
        created_at: now,
        certificates,
    }
}

/// Certificate ledger.
///
/// Generic over the session repository so that the ledger has no
/// dependency on the database crate.
pub struct LedgerService<R: CertificateSessionRepository> {
    repo: R,
}

impl<R: CertificateSessionRepository> LedgerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stamp and persist a session in one write.
    pub async fn create_session(
        &self,
        owner_user_id: Uuid,
        owner_username: &str,
        draft: SessionDraft,
    ) -> CertforgeResult<CertificateSession> {
        let input = prepare_session(owner_user_id, owner_username, draft, Utc::now());
        let session = self.repo.create(input).await?;

        info!(
            session_id = %session.id,
            owner = %session.owner_username,
            certificates = session.certificates.len(),
            "Certificate session saved"
        );
        Ok(session)
    }

    /// The owner's sessions, newest first.
    pub async fn list_for_owner(&self, owner_user_id: Uuid) -> CertforgeResult<Vec<CertificateSession>> {
        self.repo.list_by_owner(owner_user_id).await
    }

    /// Delete a session after checking that `caller_id` owns it.
    ///
    /// Unknown ids are refused the same way as foreign ones, so the
    /// response does not reveal whether a session exists.
    pub async fn delete_session(&self, session_id: Uuid, caller_id: Uuid) -> CertforgeResult<()> {
        let session = match self.repo.get_by_id(session_id).await {
            Ok(session) => session,
            Err(CertforgeError::NotFound { .. }) => {
                warn!(%session_id, caller = %caller_id, "Delete of unknown session refused");
                return Err(CertforgeError::access_denied());
            }
            Err(e) => return Err(e),
        };

        if session.owner_user_id != caller_id {
            warn!(
                %session_id,
                caller = %caller_id,
                owner = %session.owner_user_id,
                "SECURITY: delete of a session owned by another user refused"
            );
            return Err(CertforgeError::access_denied());
        }

        self.repo.delete(session_id, caller_id).await?;
        info!(%session_id, owner = %caller_id, "Certificate session deleted");
        Ok(())
    }

    /// Delete every session owned by `owner_user_id`.
    pub async fn delete_all_for_owner(&self, owner_user_id: Uuid) -> CertforgeResult<()> {
        self.repo.delete_by_owner(owner_user_id).await?;
        info!(owner = %owner_user_id, "Certificate history cleared");
        Ok(())
    }

    /// Find a certificate by number, ignoring case and surrounding
    /// whitespace. Blank input finds nothing.
    pub async fn find_record_by_certificate_number(
        &self,
        number: &str,
    ) -> CertforgeResult<Option<CertificateRecord>> {
        let normalized = normalize_certificate_number(number);
        if normalized.is_empty() {
            return Ok(None);
        }
        self.repo.find_record_by_number(&normalized).await
    }

    /// Public verification lookup.
    pub async fn verify(&self, number: &str) -> CertforgeResult<Verification> {
        match self.find_record_by_certificate_number(number).await? {
            Some(record) => {
                info!(
                    certificate_number = %record.certificate_number,
                    recipient = %record.recipient_name,
                    "Certificate verified"
                );
                Ok(Verification::Valid(record))
            }
            None => {
                let certificate_number = normalize_certificate_number(number);
                // The count only feeds the log line; a miss is never an error.
                match self.repo.count().await {
                    Ok(sessions) => {
                        warn!(%certificate_number, sessions, "Certificate not found");
                    }
                    Err(e) => {
                        warn!(%certificate_number, error = %e, "Certificate not found");
                    }
                }
                Ok(Verification::NotFound)
            }
        }
    }
}
