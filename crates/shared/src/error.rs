use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENERIC_REGISTRATION_FAILURE: &str = "Registration failed";

/// Failure of a remote geography lookup. Scoped to one cascade level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(String),
    #[error("lookup request to {url} returned HTTP {status}")]
    Status { status: u16, url: String },
    #[error("malformed lookup response: {0}")]
    Decode(String),
}

/// Failure of the registration submission. Scoped to the whole wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("malformed registration response: {0}")]
    Decode(String),
}

impl SubmitError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmitError::Rejected { .. })
    }
}

/// Error envelope the registration API may return on a non-2xx reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

impl ApiErrorBody {
    /// Picks the user-facing message out of a failed reply body.
    pub fn message_from_body(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
            if !parsed.message.trim().is_empty() {
                return parsed.message;
            }
        }

        let trimmed = body.trim();
        if trimmed.is_empty() {
            GENERIC_REGISTRATION_FAILURE.to_string()
        } else {
            trimmed.to_string()
        }
    }
}
