//! Account fields checked before they are sent to the backend.
//!
//! The backend stores usernames in lowercase and accepts an empty email on
//! registration. These types mirror those rules so bad input is caught as an
//! input error instead of a round trip.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing account fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The username is empty after trimming.
    #[error("username cannot be empty")]
    EmptyUsername,
    /// The username is longer than the backend allows.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The username contains characters the backend rejects.
    #[error("username may only contain letters, digits and @.+-_")]
    UsernameCharacters,
    /// The email has no `@`, or nothing before or after it.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// The password is empty after trimming.
    #[error("password cannot be empty")]
    EmptyPassword,
    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// A registration username, normalized to lowercase.
///
/// ```
/// use vunjabei_core::Username;
///
/// let name = Username::parse("  Alice ").unwrap();
/// assert_eq!(name.as_str(), "alice");
/// assert!(Username::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length accepted by the backend's user table.
    pub const MAX_LENGTH: usize = 150;

    /// Trim, lowercase and validate a username.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains
    /// characters outside letters, digits and `@.+-_`.
    pub fn parse(s: &str) -> Result<Self, AccountError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AccountError::EmptyUsername);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(AccountError::UsernameTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(AccountError::UsernameCharacters);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// The normalized username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An optional registration email.
///
/// An empty input is allowed and means "no email".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an email, accepting the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidEmail`] when a non-empty input has no
    /// `@` or an empty local part or domain.
    pub fn parse(s: &str) -> Result<Self, AccountError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(AccountError::InvalidEmail(trimmed.to_owned())),
        }
    }

    /// The email, empty when none was given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no email was given.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
