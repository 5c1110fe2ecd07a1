//! Client error taxonomy.
//!
//! Every failure a front-end can see falls in one of four groups, reported by
//! [`ClientError::kind`]:
//!
//! - transport: the backend could not be reached
//! - auth: credentials rejected or role not allowed
//! - validation: the backend (or the client) refused the input
//! - not found: the record no longer exists
//!
//! Nothing here retries. Each error is meant to be shown and acted on.

use std::collections::BTreeMap;

use thiserror::Error;
use vunjabei_core::AccountError;

use crate::session::SessionStorageError;

/// Message shown when the backend cannot be reached.
pub const SERVICE_UNAVAILABLE: &str =
    "Service unavailable: cannot reach the shop server. Check your connection and try again.";

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure or timeout.
    #[error("Backend unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Credentials rejected, or the session lacks the required role.
    #[error("{0}")]
    Auth(String),

    /// Input refused. `message` is the backend's text, unmodified.
    #[error("{message}")]
    Validation {
        message: String,
        /// Per-field messages, when the backend keyed them by field.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Record not found (deleted or never existed).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend failed while handling the request.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Request could not be built or the response body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body had an unexpected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Input rejected before any request was sent.
    #[error("{0}")]
    InvalidInput(String),

    /// A submission is already in flight.
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// The persisted session could not be written or removed.
    #[error("Session storage error: {0}")]
    Session(#[from] SessionStorageError),
}

/// Coarse grouping of [`ClientError`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Auth,
    Validation,
    NotFound,
    Internal,
}

impl ClientError {
    /// Build a validation error with no per-field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Which group of the taxonomy the error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable(_) => ErrorKind::Transport,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Validation { .. } | Self::InvalidInput(_) | Self::SubmissionInFlight => {
                ErrorKind::Validation
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Server { .. } | Self::Http(_) | Self::Decode(_) | Self::Session(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Text suitable for showing to the user.
    ///
    /// Outage and bad input get different wording so they are not confused.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => SERVICE_UNAVAILABLE.to_string(),
            Self::NotFound(what) => format!("Unable to load {what}. It may have been removed."),
            Self::Server { .. } | Self::Http(_) | Self::Decode(_) => {
                "Something went wrong on the server. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Field-keyed messages, if the backend returned any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

impl From<AccountError> for ClientError {
    fn from(err: AccountError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_backend_text_verbatim() {
        let err = ClientError::validation("Insufficient stock for this product.");
        assert_eq!(err.to_string(), "Insufficient stock for this product.");
        assert_eq!(err.user_message(), "Insufficient stock for this product.");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ClientError::Auth("nope".into()).kind(), ErrorKind::Auth);
        assert_eq!(
            ClientError::NotFound("product #3".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ClientError::Server {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            ClientError::SubmissionInFlight.kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_not_found_user_message() {
        let err = ClientError::NotFound("product #3".into());
        assert_eq!(
            err.user_message(),
            "Unable to load product #3. It may have been removed."
        );
    }

    #[test]
    fn test_field_errors_exposed() {
        let mut fields = BTreeMap::new();
        fields.insert("price".to_string(), vec!["A valid number is required.".to_string()]);
        let err = ClientError::Validation {
            message: "A valid number is required.".to_string(),
            fields,
        };
        assert_eq!(err.field_errors().map(BTreeMap::len), Some(1));
    }
}
