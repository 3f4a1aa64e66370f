//! Caller identity resolved by the authentication gate.

/// Who is making the request.
///
/// The gate never rejects a request; it attaches `Anonymous` when no
/// valid bearer token was presented and leaves it to each handler to
/// decide whether an authenticated caller is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(String),
}

impl Identity {
    /// The authenticated username, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(name) => Some(name),
        }
    }
}
