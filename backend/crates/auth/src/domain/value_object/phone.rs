//! Phone Number Value Object
//!
//! E.164-leaning phone number: optional leading `+`, then digits.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Phone number value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new phone number with validation
    pub fn new(phone: impl Into<String>) -> AppResult<Self> {
        let phone: String = phone.into().chars().filter(|c| !c.is_whitespace()).collect();

        let digits = phone.strip_prefix('+').unwrap_or(&phone);

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::bad_request("Invalid phone number format"));
        }

        if digits.len() < PHONE_MIN_DIGITS || digits.len() > PHONE_MAX_DIGITS {
            return Err(AppError::bad_request(format!(
                "Phone number must have between {} and {} digits",
                PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
            )));
        }

        Ok(Self(phone))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(phone: impl Into<String>) -> Self {
        Self(phone.into())
    }

    /// Get the phone number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
