//! Certificate ledger domain models.
//!
//! A [`CertificateSession`] is one issuance batch created by a single
//! user. Its [`CertificateRecord`]s are embedded in the session and are
//! never addressable on their own; the certificate number is the only
//! key used to find one again (for public verification).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification status recorded when the caller does not supply one.
pub const DEFAULT_NOTIFY_STATUS: &str = "skipped";

/// Normalize a certificate number for storage and lookup: trimmed and
/// upper-cased.
pub fn normalize_certificate_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A persisted issuance session. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSession {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub owner_username: String,
    pub session_name: String,
    pub total_certificates: u32,
    pub notifications_sent: bool,
    pub notified_count: u32,
    pub content_template: Option<String>,
    /// Institution or organisation that issued the batch.
    pub issuer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub certificates: Vec<CertificateRecord>,
}

/// A single certificate embedded in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Stored normalized (see [`normalize_certificate_number`]).
    pub certificate_number: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub course_name: Option<String>,
    pub issuer_name: Option<String>,
    pub notified: bool,
    pub notify_status: String,
    pub issued_at: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
}

/// Client-supplied description of a session to record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionDraft {
    pub session_name: Option<String>,
    /// Defaults to the number of certificates when absent.
    pub total_certificates: Option<u32>,
    pub notifications_sent: bool,
    pub notified_count: u32,
    pub content_template: Option<String>,
    pub issuer_name: Option<String>,
    pub certificates: Vec<CertificateDraft>,
}

/// Client-supplied description of one certificate in a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateDraft {
    pub certificate_number: String,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub course_name: Option<String>,
    pub notified: bool,
    pub notify_status: Option<String>,
}

/// A fully stamped session ready to be persisted in one write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCertificateSession {
    pub owner_user_id: Uuid,
    pub owner_username: String,
    pub session_name: String,
    pub total_certificates: u32,
    pub notifications_sent: bool,
    pub notified_count: u32,
    pub content_template: Option<String>,
    pub issuer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub certificates: Vec<CertificateRecord>,
}
