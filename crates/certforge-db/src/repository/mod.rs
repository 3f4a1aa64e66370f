//! SurrealDB repository implementations.

mod cert_session;
mod user;

pub use cert_session::SurrealCertificateSessionRepository;
pub use user::SurrealUserRepository;
