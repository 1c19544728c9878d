//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Register
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Registration response: no tokens until the email is verified
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub account_id: String,
    pub email: String,
    pub username: String,
    /// Presented to the resend endpoint while unverified
    pub pending_session_token: String,
}

// ============================================================================
// Login (two steps)
// ============================================================================

/// Login request, step one
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email, username, or phone number
    pub identifier: String,
    pub password: String,
}

/// A verification challenge was dispatched
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallengeResponse {
    /// "email" or "phone"
    pub channel: String,
    /// Masked destination the code went to
    pub destination: String,
}

/// Login request, step two
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLoginCodeRequest {
    pub identifier: String,
    pub code: String,
}

/// Authenticated session bundle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================================================
// Verification
// ============================================================================

/// Email verification request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Phone verification request (account taken from the access token)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneRequest {
    pub code: String,
}

/// Email code resend request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendEmailCodeRequest {
    pub pending_session_token: String,
}
