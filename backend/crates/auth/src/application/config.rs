//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// JWT issuer claim
    pub jwt_issuer: String,
    /// JWT audience claim
    pub jwt_audience: String,
    /// Access token lifetime (30 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (15 days)
    pub refresh_token_ttl: Duration,
    /// Email verification code lifetime (15 minutes)
    pub email_code_ttl: Duration,
    /// Phone challenge marker lifetime (5 minutes)
    pub phone_code_ttl: Duration,
    /// Pending-verification session lifetime (1 hour)
    pub pending_session_ttl: Duration,
    /// Minimum interval between resends (1 minute)
    pub resend_interval: Duration,
    /// Identifier lookup cache lifetime (24 hours)
    pub identifier_cache_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "clinic-api".to_string(),
            jwt_audience: "clinic-clients".to_string(),
            access_token_ttl: Duration::from_secs(30 * 60),
            refresh_token_ttl: Duration::from_secs(15 * 24 * 3600),
            email_code_ttl: Duration::from_secs(15 * 60),
            phone_code_ttl: Duration::from_secs(5 * 60),
            pending_session_ttl: Duration::from_secs(3600),
            resend_interval: Duration::from_secs(60),
            identifier_cache_ttl: Duration::from_secs(24 * 3600),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random JWT secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: platform::crypto::opaque_token(32),
            ..Default::default()
        }
    }

    /// Blacklist TTL: always the full access-token lifetime, so the
    /// entry outlives the token without decoding it
    pub fn blacklist_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
