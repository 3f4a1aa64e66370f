//! `/api/certificates` handlers: issuance history, public verification
//! and certificate notifications.

use axum::Json;
use axum::extract::{Path, State};
use certforge_core::error::CertforgeError;
use certforge_core::models::ledger::{
    CertificateDraft, CertificateRecord, CertificateSession, SessionDraft,
};
use certforge_ledger::{CertificateNotification, Verification, dispatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::gate::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveHistoryRequest {
    pub session_name: Option<String>,
    pub total_certificates: Option<u32>,
    pub notifications_sent: bool,
    pub notified_count: u32,
    pub content_template: Option<String>,
    pub issuer_name: Option<String>,
    pub certificates: Vec<CertificateItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateItem {
    pub certificate_number: String,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub course_name: Option<String>,
    pub notified: bool,
    pub notify_status: Option<String>,
}

impl From<SaveHistoryRequest> for SessionDraft {
    fn from(req: SaveHistoryRequest) -> Self {
        Self {
            session_name: req.session_name,
            total_certificates: req.total_certificates,
            notifications_sent: req.notifications_sent,
            notified_count: req.notified_count,
            content_template: req.content_template,
            issuer_name: req.issuer_name,
            certificates: req
                .certificates
                .into_iter()
                .map(|item| CertificateDraft {
                    certificate_number: item.certificate_number,
                    recipient_name: item.recipient_name,
                    recipient_email: item.recipient_email,
                    course_name: item.course_name,
                    notified: item.notified,
                    notify_status: item.notify_status,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryResponse {
    pub id: Uuid,
    pub cert_count: usize,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub session_name: String,
    pub total_certificates: u32,
    pub notifications_sent: bool,
    pub notified_count: u32,
    pub content_template: Option<String>,
    pub issuer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub certificates: Vec<RecordView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
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

impl From<CertificateRecord> for RecordView {
    fn from(record: CertificateRecord) -> Self {
        Self {
            certificate_number: record.certificate_number,
            recipient_name: record.recipient_name,
            recipient_email: record.recipient_email,
            course_name: record.course_name,
            issuer_name: record.issuer_name,
            notified: record.notified,
            notify_status: record.notify_status,
            issued_at: record.issued_at,
            notified_at: record.notified_at,
        }
    }
}

impl From<CertificateSession> for SessionView {
    fn from(session: CertificateSession) -> Self {
        Self {
            id: session.id,
            session_name: session.session_name,
            total_certificates: session.total_certificates,
            notifications_sent: session.notifications_sent,
            notified_count: session.notified_count,
            content_template: session.content_template,
            issuer_name: session.issuer_name,
            created_at: session.created_at,
            certificates: session.certificates.into_iter().map(RecordView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    #[serde(rename_all = "camelCase")]
    Valid {
        valid: bool,
        certificate_number: String,
        issued_to: String,
        issued_by: String,
        course_name: String,
        issued_at: DateTime<Utc>,
        recipient_name: String,
    },
    Invalid {
        valid: bool,
        message: &'static str,
    },
}

impl From<Verification> for VerifyResponse {
    fn from(verification: Verification) -> Self {
        match verification {
            Verification::Valid(record) => Self::Valid {
                valid: true,
                certificate_number: record.certificate_number,
                issued_to: record.recipient_name.clone(),
                issued_by: record.issuer_name.unwrap_or_default(),
                course_name: record.course_name.unwrap_or_default(),
                issued_at: record.issued_at,
                recipient_name: record.recipient_name,
            },
            Verification::NotFound => Self::Invalid {
                valid: false,
                message: "Certificate not found in database",
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendEmailRequest {
    pub to_email: String,
    pub recipient_name: Option<String>,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub subject: Option<String>,
    pub body_message: Option<String>,
    pub certificate_base64: String,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
}

pub async fn save_history(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(body): ApiJson<SaveHistoryRequest>,
) -> Result<Json<SaveHistoryResponse>, ApiError> {
    let user = state.auth.current_user(&username).await?;
    let session = state
        .ledger
        .create_session(user.id, &user.username, body.into())
        .await?;

    Ok(Json(SaveHistoryResponse {
        id: session.id,
        cert_count: session.certificates.len(),
        message: "Saved successfully",
    }))
}

pub async fn list_history(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let user = state.auth.current_user(&username).await?;
    let sessions = state.ledger.list_for_owner(user.id).await?;
    Ok(Json(sessions.into_iter().map(SessionView::from).collect()))
}

pub async fn delete_history(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.auth.current_user(&username).await?;

    // A malformed id cannot name anything the caller owns.
    let Ok(session_id) = Uuid::parse_str(&id) else {
        warn!(id = %id, caller = %user.username, "Delete with malformed session id refused");
        return Err(CertforgeError::access_denied().into());
    };

    state.ledger.delete_session(session_id, user.id).await?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.auth.current_user(&username).await?;
    state.ledger.delete_all_for_owner(user.id).await?;
    Ok(Json(MessageResponse { message: "Cleared" }))
}

/// Public: no identity required.
pub async fn verify(
    State(state): State<AppState>,
    Path(cert_number): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let verification = state.ledger.verify(&cert_number).await?;
    Ok(Json(verification.into()))
}

pub async fn send_email(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(body): ApiJson<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let notification = CertificateNotification {
        to_email: body.to_email,
        recipient_name: body.recipient_name,
        from_name: body.from_name,
        from_email: body.from_email,
        subject: body.subject,
        body_message: body.body_message,
        certificate_base64: body.certificate_base64,
    };

    let sent = dispatch(state.notifier.as_ref(), &notification).await?;
    let response = if sent {
        SendEmailResponse {
            success: true,
            message: format!("Email sent to {}", notification.to_email),
        }
    } else {
        warn!(sender = %username, to = %notification.to_email, "Certificate email not sent");
        SendEmailResponse {
            success: false,
            message: "Email could not be sent".into(),
        }
    };
    Ok(Json(response))
}
