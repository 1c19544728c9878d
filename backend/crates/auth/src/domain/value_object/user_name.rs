//! User Name Value Object
//!
//! Unique handle used as a login identifier alongside email and phone.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const USER_NAME_MIN_LENGTH: usize = 3;
const USER_NAME_MAX_LENGTH: usize = 32;

/// User name value object
///
/// ASCII alphanumerics, `.`, `_`, `-`; stored lowercase so lookups are
/// case-insensitive. Must not look like an email or phone number, since
/// login classifies identifiers by shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a new user name with validation
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_lowercase();

        if name.len() < USER_NAME_MIN_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be at least {} characters",
                USER_NAME_MIN_LENGTH
            )));
        }

        if name.len() > USER_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be at most {} characters",
                USER_NAME_MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Err(AppError::bad_request(
                "Username may only contain letters, digits, '.', '_' and '-'",
            ));
        }

        // Would be classified as a phone number at login
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::bad_request("Username cannot be all digits"));
        }

        Ok(Self(name))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the user name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
