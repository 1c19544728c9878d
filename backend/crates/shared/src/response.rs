//! API Response Envelope
//!
//! Every endpoint answers with the same JSON shape, success or failure:
//!
//! ```json
//! { "success": true, "statusCode": 200, "message": "...", "data": { ... } }
//! { "success": false, "statusCode": 404, "message": "...", "errors": ["..."] }
//! ```

use serde::Serialize;

/// Uniform response envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn success(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code,
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }

    /// Successful response with no payload.
    pub fn success_empty(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status_code,
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    /// Failure response with a single message.
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    /// Failure response with detailed error messages.
    pub fn failure_with_errors(
        status_code: u16,
        message: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            status_code,
            message: message.into(),
            errors: Some(errors),
            data: None,
        }
    }
}
