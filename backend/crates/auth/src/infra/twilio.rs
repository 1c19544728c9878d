//! Twilio Verify Phone Notifier
//!
//! The Verify service owns code generation, delivery, expiry, and
//! attempt counting. We start a verification and later ask whether a
//! submitted code was approved.

use serde::Deserialize;
use tracing::debug;

use crate::domain::notifier::{CodeCheck, PhoneNotifier};
use crate::domain::value_object::phone::PhoneNumber;
use crate::error::{AuthError, AuthResult};

/// Twilio Verify API credentials
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Verify service SID (the `VA...` identifier)
    pub service_sid: String,
}

pub struct TwilioVerifyClient {
    http: reqwest::Client,
    config: TwilioConfig,
    base_url: String,
}

impl TwilioVerifyClient {
    pub fn new(config: TwilioConfig) -> Self {
        let base_url = format!(
            "https://verify.twilio.com/v2/Services/{}",
            config.service_sid
        );
        Self {
            http: reqwest::Client::new(),
            config,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct VerificationResponse {
    status: String,
}

impl PhoneNotifier for TwilioVerifyClient {
    async fn send_code(&self, phone: &PhoneNumber) -> AuthResult<()> {
        let response = self
            .http
            .post(format!("{}/Verifications", self.base_url))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", phone.as_str()), ("Channel", "sms")])
            .send()
            .await
            .map_err(|e| AuthError::Delivery(format!("Verify request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Delivery(format!(
                "Verify service answered {}",
                response.status()
            )));
        }

        debug!("phone verification started");
        Ok(())
    }

    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> AuthResult<CodeCheck> {
        let response = self
            .http
            .post(format!("{}/VerificationCheck", self.base_url))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", phone.as_str()), ("Code", code)])
            .send()
            .await
            .map_err(|e| AuthError::Delivery(format!("Verify check failed: {}", e)))?;

        // 404 means no open verification for this number, which reads
        // as a rejected code rather than a transport failure
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(CodeCheck::Rejected);
        }
        if !response.status().is_success() {
            return Err(AuthError::Delivery(format!(
                "Verify service answered {}",
                response.status()
            )));
        }

        let body: VerificationResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Delivery(format!("Verify response unreadable: {}", e)))?;

        Ok(match body.status.as_str() {
            "approved" => CodeCheck::Approved,
            "pending" => CodeCheck::Pending,
            _ => CodeCheck::Rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_embeds_service_sid() {
        let client = TwilioVerifyClient::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            service_sid: "VA456".to_string(),
        });
        assert_eq!(client.base_url, "https://verify.twilio.com/v2/Services/VA456");
    }
}
