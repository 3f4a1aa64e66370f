//! Certificate notifications.
//!
//! Delivery is an injected capability ([`NotificationSender`]); this
//! module only validates a request before handing it over.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use certforge_core::error::{CertforgeError, CertforgeResult};
use futures::future::BoxFuture;
use regex::Regex;
use tracing::{info, warn};

/// Smallest accepted encoded certificate image.
pub const MIN_PAYLOAD_LEN: usize = 100;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static FILENAME_UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-]").expect("valid filename regex"));

/// A request to deliver one rendered certificate to its recipient.
#[derive(Debug, Clone, Default)]
pub struct CertificateNotification {
    pub to_email: String,
    pub recipient_name: Option<String>,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub subject: Option<String>,
    pub body_message: Option<String>,
    /// Base64 image, optionally as a `data:image/png;base64,` URL.
    pub certificate_base64: String,
}

impl CertificateNotification {
    /// Reject malformed recipient addresses and missing or truncated
    /// certificate payloads.
    pub fn validate(&self) -> CertforgeResult<()> {
        if !EMAIL_RE.is_match(self.to_email.trim()) {
            return Err(validation("Invalid recipient email address"));
        }
        if self.certificate_base64.len() < MIN_PAYLOAD_LEN {
            return Err(validation("Certificate image is missing or invalid"));
        }
        self.attachment_bytes().map(|_| ())
    }

    /// The decoded certificate image.
    pub fn attachment_bytes(&self) -> CertforgeResult<Vec<u8>> {
        let encoded = match self.certificate_base64.split_once(',') {
            Some((_, data)) => data,
            None => self.certificate_base64.as_str(),
        };
        STANDARD
            .decode(encoded.trim())
            .map_err(|_| validation("Certificate image is missing or invalid"))
    }

    /// Attachment file name derived from the recipient name.
    pub fn attachment_filename(&self) -> String {
        let stem = match self.recipient_name.as_deref() {
            Some(name) if !name.is_empty() => FILENAME_UNSAFE_RE.replace_all(name, "_").into_owned(),
            _ => "Recipient".to_owned(),
        };
        format!("{stem}_Certificate.png")
    }
}

fn validation(message: &str) -> CertforgeError {
    CertforgeError::Validation {
        message: message.to_owned(),
    }
}

/// Outbound delivery of certificate notifications.
///
/// Returns `Ok(true)` when the notification was accepted for delivery
/// and `Ok(false)` when the provider declined it.
pub trait NotificationSender: Send + Sync {
    fn send<'a>(
        &'a self,
        notification: &'a CertificateNotification,
    ) -> BoxFuture<'a, CertforgeResult<bool>>;
}

/// Sender used when no delivery provider is configured. Every
/// notification is logged and reported as not sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotificationSender;

impl NotificationSender for DisabledNotificationSender {
    fn send<'a>(
        &'a self,
        notification: &'a CertificateNotification,
    ) -> BoxFuture<'a, CertforgeResult<bool>> {
        Box::pin(async move {
            warn!(
                to = %notification.to_email,
                attachment = %notification.attachment_filename(),
                "Notification delivery is disabled; not sent"
            );
            Ok(false)
        })
    }
}

/// Validate `notification` and hand it to `sender`.
pub async fn dispatch(
    sender: &dyn NotificationSender,
    notification: &CertificateNotification,
) -> CertforgeResult<bool> {
    notification.validate()?;
    let sent = sender.send(notification).await?;
    if sent {
        info!(to = %notification.to_email, "Certificate notification sent");
    }
    Ok(sent)
}
