//! Format-level credential checks.
//!
//! Validators only look at the shape of input; they never consult the store.

use regex::Regex;
use serde::Serialize;

use crate::permission::Role;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;

/// Verdict of a single check: accepted, or rejected with human-readable reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub accepted: bool,
    pub reasons: Vec<String>,
}

impl Validation {
    #[must_use]
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reasons: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            accepted: reasons.is_empty(),
            reasons,
        }
    }

    /// Combine two verdicts; the result is accepted only if both are.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.accepted = self.accepted && other.accepted;
        self.reasons.extend(other.reasons);
        self
    }
}

pub trait CredentialValidator: Send + Sync {
    fn validate_email(&self, email: &str) -> Validation;
    fn validate_password(&self, password: &str) -> Validation;
    fn validate_role(&self, role: &str) -> Validation;
    fn validate_username(&self, username: &str) -> Validation;

    fn validate_login(&self, email: &str, password: &str, role: &str) -> Validation {
        let password_present = if password.is_empty() {
            Validation::from_reasons(vec!["Password is required".to_string()])
        } else {
            Validation::accept()
        };
        self.validate_email(email)
            .and(password_present)
            .and(self.validate_role(role))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultValidator;

impl CredentialValidator for DefaultValidator {
    fn validate_email(&self, email: &str) -> Validation {
        let email = email.trim();
        if email.is_empty() {
            return Validation::from_reasons(vec!["Email is required".to_string()]);
        }
        if valid_email(email) {
            Validation::accept()
        } else {
            Validation::from_reasons(vec!["Invalid email format".to_string()])
        }
    }

    fn validate_password(&self, password: &str) -> Validation {
        let mut reasons = Vec::new();
        let length = password.chars().count();
        if length < MIN_PASSWORD_LEN {
            reasons.push(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            ));
        }
        if length > MAX_PASSWORD_LEN {
            reasons.push(format!(
                "Password must be at most {MAX_PASSWORD_LEN} characters long"
            ));
        }
        if !password.chars().any(char::is_alphabetic) {
            reasons.push("Password must contain at least one letter".to_string());
        }
        Validation::from_reasons(reasons)
    }

    fn validate_role(&self, role: &str) -> Validation {
        if role.parse::<Role>().is_ok() {
            return Validation::accept();
        }
        let allowed = Role::ALL.map(Role::as_str).join(", ");
        Validation::from_reasons(vec![format!(
            "Invalid role '{role}', expected one of: {allowed}"
        )])
    }

    fn validate_username(&self, username: &str) -> Validation {
        if valid_username(username) {
            Validation::accept()
        } else {
            Validation::from_reasons(vec![
                "Username must be 3-32 characters of letters, digits, '.', '_' or '-'".to_string(),
            ])
        }
    }
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").is_ok_and(|regex| regex.is_match(username))
}
