//! SurrealDB implementation of [`CertificateSessionRepository`].
//!
//! Certificate records are embedded in their session document. A
//! session is created by one `CREATE` statement and removed by one
//! `DELETE`, so neither a half-written nor a half-deleted session can
//! be observed.
//!
//! Lookup by certificate number filters sessions on the embedded
//! number list and then scans the matching session's records, which is
//! O(total records) in the worst case.

use certforge_core::error::CertforgeResult;
use certforge_core::models::ledger::{
    CertificateRecord, CertificateSession, CreateCertificateSession,
};
use certforge_core::repository::CertificateSessionRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CertificateRecordRow {
    certificate_number: String,
    recipient_name: String,
    recipient_email: String,
    course_name: Option<String>,
    issuer_name: Option<String>,
    notified: bool,
    notify_status: String,
    issued_at: DateTime<Utc>,
    notified_at: Option<DateTime<Utc>>,
}

impl From<CertificateRecord> for CertificateRecordRow {
    fn from(r: CertificateRecord) -> Self {
        Self {
            certificate_number: r.certificate_number,
            recipient_name: r.recipient_name,
            recipient_email: r.recipient_email,
            course_name: r.course_name,
            issuer_name: r.issuer_name,
            notified: r.notified,
            notify_status: r.notify_status,
            issued_at: r.issued_at,
            notified_at: r.notified_at,
        }
    }
}

impl From<CertificateRecordRow> for CertificateRecord {
    fn from(r: CertificateRecordRow) -> Self {
        Self {
            certificate_number: r.certificate_number,
            recipient_name: r.recipient_name,
            recipient_email: r.recipient_email,
            course_name: r.course_name,
            issuer_name: r.issuer_name,
            notified: r.notified,
            notify_status: r.notify_status,
            issued_at: r.issued_at,
            notified_at: r.notified_at,
        }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    owner_user_id: String,
    owner_username: String,
    session_name: String,
    total_certificates: u32,
    notifications_sent: bool,
    notified_count: u32,
    content_template: Option<String>,
    issuer_name: Option<String>,
    created_at: DateTime<Utc>,
    certificates: Vec<CertificateRecordRow>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    owner_user_id: String,
    owner_username: String,
    session_name: String,
    total_certificates: u32,
    notifications_sent: bool,
    notified_count: u32,
    content_template: Option<String>,
    issuer_name: Option<String>,
    created_at: DateTime<Utc>,
    certificates: Vec<CertificateRecordRow>,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRecord(format!("invalid {what} UUID: {e}")))
}

impl SessionRow {
    fn try_into_session(self, id: Uuid) -> Result<CertificateSession, DbError> {
        Ok(CertificateSession {
            id,
            owner_user_id: parse_uuid(&self.owner_user_id, "owner")?,
            owner_username: self.owner_username,
            session_name: self.session_name,
            total_certificates: self.total_certificates,
            notifications_sent: self.notifications_sent,
            notified_count: self.notified_count,
            content_template: self.content_template,
            issuer_name: self.issuer_name,
            created_at: self.created_at,
            certificates: self.certificates.into_iter().map(Into::into).collect(),
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<CertificateSession, DbError> {
        let id = parse_uuid(&self.record_id, "session")?;
        SessionRow {
            owner_user_id: self.owner_user_id,
            owner_username: self.owner_username,
            session_name: self.session_name,
            total_certificates: self.total_certificates,
            notifications_sent: self.notifications_sent,
            notified_count: self.notified_count,
            content_template: self.content_template,
            issuer_name: self.issuer_name,
            created_at: self.created_at,
            certificates: self.certificates,
        }
        .try_into_session(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the certificate ledger store.
#[derive(Clone)]
pub struct SurrealCertificateSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCertificateSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CertificateSessionRepository for SurrealCertificateSessionRepository<C> {
    async fn create(&self, input: CreateCertificateSession) -> CertforgeResult<CertificateSession> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let certificates: Vec<CertificateRecordRow> =
            input.certificates.into_iter().map(Into::into).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('cert_session', $id) SET \
                 owner_user_id = $owner_user_id, \
                 owner_username = $owner_username, \
                 session_name = $session_name, \
                 total_certificates = $total_certificates, \
                 notifications_sent = $notifications_sent, \
                 notified_count = $notified_count, \
                 content_template = $content_template, \
                 issuer_name = $issuer_name, \
                 created_at = $created_at, \
                 certificates = $certificates",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_user_id", input.owner_user_id.to_string()))
            .bind(("owner_username", input.owner_username))
            .bind(("session_name", input.session_name))
            .bind(("total_certificates", input.total_certificates))
            .bind(("notifications_sent", input.notifications_sent))
            .bind(("notified_count", input.notified_count))
            .bind(("content_template", input.content_template))
            .bind(("issuer_name", input.issuer_name))
            .bind(("created_at", input.created_at))
            .bind(("certificates", certificates))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cert_session".into(),
            id: id_str,
        })?;

        Ok(row.try_into_session(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CertforgeResult<CertificateSession> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('cert_session', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cert_session".into(),
            id: id_str,
        })?;

        Ok(row.try_into_session(id)?)
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> CertforgeResult<Vec<CertificateSession>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM cert_session \
                 WHERE owner_user_id = $owner_user_id \
                 ORDER BY created_at DESC",
            )
            .bind(("owner_user_id", owner_user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let sessions = rows
            .into_iter()
            .map(SessionRowWithId::try_into_session)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    async fn delete(&self, id: Uuid, owner_user_id: Uuid) -> CertforgeResult<()> {
        self.db
            .query(
                "DELETE type::record('cert_session', $id) \
                 WHERE owner_user_id = $owner_user_id",
            )
            .bind(("id", id.to_string()))
            .bind(("owner_user_id", owner_user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_by_owner(&self, owner_user_id: Uuid) -> CertforgeResult<()> {
        self.db
            .query("DELETE cert_session WHERE owner_user_id = $owner_user_id")
            .bind(("owner_user_id", owner_user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn find_record_by_number(
        &self,
        certificate_number: &str,
    ) -> CertforgeResult<Option<CertificateRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM cert_session \
                 WHERE certificates.*.certificate_number CONTAINS $number \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("number", certificate_number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        debug!(
            session_id = %row.record_id,
            certificate_number,
            "Found session containing certificate"
        );

        Ok(row
            .certificates
            .into_iter()
            .find(|r| r.certificate_number == certificate_number)
            .map(Into::into))
    }

    async fn count(&self) -> CertforgeResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM cert_session GROUP ALL")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
