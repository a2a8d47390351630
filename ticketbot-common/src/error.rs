// ================================================================
// File: ticketbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request itself is malformed (wrong channel type, unknown category).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The actor is not allowed to perform the action.
    #[error("Permission error: {0}")]
    Permission(String),

    // Failures reported by the chat platform:
    #[error("Platform refused the request (missing permissions): {0}")]
    PermissionDenied(String),

    #[error("Invalid parent category: {0}")]
    InvalidParent(String),

    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Direct message blocked: {0}")]
    Blocked(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Errors the requester should see as a private reply rather than a generic failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Permission(_))
    }
}
