//! Unified error handling for bookbot-auth.
//!
//! Field-level problems ([`FieldError`]) stay inside the dialogue engine and
//! turn into re-prompts. Everything else is an [`AuthError`], which the
//! service boundary maps onto typed results and never lets escape as a panic
//! or a raw storage error.

use crate::db::DbError;
use thiserror::Error;

// ============================================================================
// Field validation errors
// ============================================================================

/// A single field failed validation. Recovered locally by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("username must not contain spaces")]
    UsernameWhitespace,

    #[error("birthdate {0} is outside the allowed range")]
    DateOutOfRange(chrono::NaiveDate),

    #[error("not a valid date: {0}")]
    MalformedDate(String),

    #[error("{value} is not a selectable {step}")]
    CalendarOutOfRange { step: &'static str, value: i64 },

    #[error("unexpected input for this step")]
    UnexpectedInput,
}

/// Shown whenever storage is unreachable or too slow.
pub const SERVICE_UNAVAILABLE: &str =
    "The service is temporarily unavailable. Please try again in a moment.";

// ============================================================================
// Auth errors (propagated to the service boundary)
// ============================================================================

/// Conflict kinds raised by uniqueness constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("identity already registered")]
    IdentityRegistered,
    #[error("username already in use")]
    UsernameTaken,
}

/// Errors that terminate an auth operation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid field: {0}")]
    Validation(#[from] FieldError),

    #[error("conflict: {0}")]
    Conflict(Conflict),

    /// Unknown username and wrong password are deliberately the same error.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session expired")]
    SessionExpired,

    #[error("storage unavailable: {0}")]
    Storage(DbError),
}

impl AuthError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(Conflict::IdentityRegistered) => "identity_registered",
            Self::Conflict(Conflict::UsernameTaken) => "username_taken",
            Self::InvalidCredentials => "invalid_credentials",
            Self::SessionExpired => "session_expired",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// The one human-readable line shown to a chat user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => format!("{e}. Please try again."),
            Self::Conflict(Conflict::IdentityRegistered) => {
                "You are already registered. Type /start to log in.".to_string()
            }
            Self::Conflict(Conflict::UsernameTaken) => {
                "That username is already in use. Type /start to try again.".to_string()
            }
            Self::InvalidCredentials => {
                "Login failed. Invalid username or password. Type /start to try again.".to_string()
            }
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::Storage(_) => SERVICE_UNAVAILABLE.to_string(),
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::IdentityRegistered(_) => Self::Conflict(Conflict::IdentityRegistered),
            DbError::UsernameTaken(_) => Self::Conflict(Conflict::UsernameTaken),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_db_conflicts_map_to_conflict() {
        let err = AuthError::from(DbError::UsernameTaken("ana".into()));
        assert!(matches!(err, AuthError::Conflict(Conflict::UsernameTaken)));
        assert_eq!(err.error_code(), "username_taken");

        let err = AuthError::from(DbError::IdentityRegistered(1));
        assert_eq!(err.error_code(), "identity_registered");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_is_retryable() {
        let err = AuthError::from(DbError::Timeout(Duration::from_secs(1)));
        assert!(err.is_retryable());
        assert!(err.user_message().contains("temporarily unavailable"));
    }

    #[test]
    fn test_expired_differs_from_bad_credentials() {
        assert_ne!(
            AuthError::SessionExpired.user_message(),
            AuthError::InvalidCredentials.user_message()
        );
    }
}
