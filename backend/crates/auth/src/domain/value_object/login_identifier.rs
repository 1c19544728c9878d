//! Login Identifier Classification
//!
//! A login form accepts one free-form identifier field. Its shape
//! decides the lookup path and, later, the verification channel:
//! contains `@` → email; leading `+` or all digits → phone; otherwise
//! username.

use crate::domain::value_object::{email::Email, phone::PhoneNumber, user_name::UserName};
use kernel::error::app_error::{AppError, AppResult};

/// Classified login identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(Email),
    Phone(PhoneNumber),
    Username(UserName),
}

impl LoginIdentifier {
    /// Classify a raw identifier string.
    ///
    /// Classification happens before validation, so a malformed email
    /// still fails as an email rather than silently becoming a username.
    pub fn classify(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(AppError::bad_request("Identifier cannot be empty"));
        }

        if trimmed.contains('@') {
            return Ok(Self::Email(Email::new(trimmed)?));
        }

        let digits_only = trimmed.chars().all(|c| c.is_ascii_digit());
        if trimmed.starts_with('+') || digits_only {
            return Ok(Self::Phone(PhoneNumber::new(trimmed)?));
        }

        Ok(Self::Username(UserName::new(trimmed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_email() {
        let id = LoginIdentifier::classify("patient@example.com").unwrap();
        assert!(matches!(id, LoginIdentifier::Email(_)));
    }

    #[test]
    fn test_classify_phone() {
        assert!(matches!(
            LoginIdentifier::classify("+14155552671").unwrap(),
            LoginIdentifier::Phone(_)
        ));
        assert!(matches!(
            LoginIdentifier::classify("14155552671").unwrap(),
            LoginIdentifier::Phone(_)
        ));
    }

    #[test]
    fn test_classify_username() {
        let id = LoginIdentifier::classify("dr.smith").unwrap();
        assert!(matches!(id, LoginIdentifier::Username(_)));
    }

    #[test]
    fn test_malformed_email_stays_an_email_error() {
        // Contains '@' so it must not fall through to the username path
        assert!(LoginIdentifier::classify("broken@").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(LoginIdentifier::classify("   ").is_err());
    }
}
