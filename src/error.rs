//! Outcome taxonomy shared by authentication, session and administration flows.
//!
//! Every failure a caller can observe is one of these variants. None of them
//! is fatal: the CLI renders them, the library never panics on them.

use crate::directory::{DirectoryError, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid input: {}", .reasons.join("; "))]
    InvalidFormat { reasons: Vec<String> },
    #[error("Account locked, try again in {minutes_remaining} minute(s)")]
    Locked { minutes_remaining: i64 },
    #[error("User not found")]
    UserNotFound,
    #[error("Role does not match this account")]
    RoleMismatch,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Password too weak: {}", .reasons.join("; "))]
    WeakPassword { reasons: Vec<String> },
    #[error("A user with this email or username already exists")]
    DuplicateUser,
    #[error("No active session")]
    NoSession,
    #[error("Session expired")]
    Expired,
    #[error("Session verification failed")]
    VerificationFailed,
    #[error("Not authorized: {reason}")]
    AuthorizationDenied { reason: String },
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for logs and UI presentation.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::Locked { .. } => "LOCKED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RoleMismatch => "ROLE_MISMATCH",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::WeakPassword { .. } => "WEAK_PASSWORD",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::NoSession => "NO_SESSION",
            Self::Expired => "EXPIRED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::AuthorizationDenied { .. } => "AUTHORIZATION_DENIED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub(crate) fn denied(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DuplicateUser => Self::DuplicateUser,
            DirectoryError::UserNotFound => Self::UserNotFound,
            DirectoryError::Invalid(err) => Self::Internal(err.to_string()),
            DirectoryError::Storage(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_snake() {
        let errors = [
            AuthError::InvalidFormat {
                reasons: vec!["bad".to_string()],
            },
            AuthError::Locked {
                minutes_remaining: 3,
            },
            AuthError::UserNotFound,
            AuthError::RoleMismatch,
            AuthError::InvalidPassword,
            AuthError::WeakPassword {
                reasons: Vec::new(),
            },
            AuthError::DuplicateUser,
            AuthError::NoSession,
            AuthError::Expired,
            AuthError::VerificationFailed,
            AuthError::denied("nope"),
            AuthError::Internal("disk".to_string()),
        ];
        for err in errors {
            let code = err.code();
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn directory_errors_map_to_outcomes() {
        assert_eq!(
            AuthError::from(DirectoryError::DuplicateUser),
            AuthError::DuplicateUser
        );
        assert_eq!(
            AuthError::from(DirectoryError::UserNotFound),
            AuthError::UserNotFound
        );
    }

    #[test]
    fn locked_message_mentions_minutes() {
        let err = AuthError::Locked {
            minutes_remaining: 14,
        };
        assert_eq!(
            err.to_string(),
            "Account locked, try again in 14 minute(s)"
        );
    }
}
