//! CertForge Ledger — issuance sessions, owner-scoped deletion, public
//! certificate verification and hand-off of certificate notifications.

pub mod notify;
pub mod service;

pub use notify::{
    CertificateNotification, DisabledNotificationSender, NotificationSender, dispatch,
};
pub use service::{LedgerService, Verification, prepare_session};
