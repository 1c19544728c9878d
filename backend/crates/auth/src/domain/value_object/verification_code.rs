//! Verification Code Value Object
//!
//! Short human-facing code sent over email. Six characters, uppercase
//! letters and digits, drawn from a CSPRNG.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Code length in characters
pub const CODE_LENGTH: usize = 6;

/// Verification code value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh random code
    pub fn generate() -> Self {
        Self(platform::crypto::verification_code(CODE_LENGTH))
    }

    /// Parse user-submitted input. Uppercased first, so codes typed in
    /// lowercase still match.
    pub fn parse(input: &str) -> AppResult<Self> {
        let code = input.trim().to_uppercase();

        if code.len() != CODE_LENGTH
            || !code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(AppError::bad_request("Invalid verification code format"));
        }

        Ok(Self(code))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
