//! Ephemeral Store
//!
//! Narrow key-value interface for all short-lived state: verification
//! codes, pending-verification sessions, rate-limit markers, the
//! access-token blacklist, cached refresh tokens, and identifier
//! lookups. String keys and values, per-key TTL, no cross-key
//! transactions. Store failures surface as `TransientStore` errors and
//! are never retried here.

use std::time::Duration;

use crate::error::AuthResult;

/// Ephemeral key-value store trait
#[trait_variant::make(EphemeralStore: Send)]
pub trait LocalEphemeralStore {
    /// Fetch a value; `None` when the key is absent or expired
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Write a value with a TTL, overwriting any existing entry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()>;

    /// Delete a key; returns whether it existed
    async fn delete(&self, key: &str) -> AuthResult<bool>;
}

/// Key construction, centralized so every reader and writer agrees on
/// the layout.
pub mod keys {
    use kernel::id::AccountId;

    use crate::domain::value_object::{email::Email, phone::PhoneNumber, user_name::UserName};

    /// Email verification code entry: one per (email, code) pair
    pub fn email_code(email: &Email, code: &str) -> String {
        format!("verify:email:{}:code:{}", email, code)
    }

    /// Pointer to the currently valid code for an email. Lets a reissue
    /// find and delete its predecessor.
    pub fn email_active_code(email: &Email) -> String {
        format!("verify:email:active:{}", email)
    }

    /// Marker that a phone challenge is outstanding
    pub fn phone_pending(phone: &PhoneNumber) -> String {
        format!("verify:phone:{}", phone)
    }

    /// Pending-verification session, token side
    pub fn pending_session(token: &str) -> String {
        format!("pending:session:{}", token)
    }

    /// Pending-verification session, account side
    pub fn pending_account(account_id: &AccountId) -> String {
        format!("pending:account:{}", account_id)
    }

    /// Cached refresh token per account/device
    pub fn refresh_token(account_id: &AccountId, ip: &str) -> String {
        format!("refresh:{}:{}", account_id, ip)
    }

    /// Blacklisted access token
    pub fn blacklist(account_id: &AccountId, access_token: &str) -> String {
        format!("blacklist:{}:{}", account_id, access_token)
    }

    /// Resend rate-limit marker, email channel
    pub fn rate_limit_email(email: &Email) -> String {
        format!("ratelimit:email:{}", email)
    }

    /// Resend rate-limit marker, phone channel
    pub fn rate_limit_phone(phone: &PhoneNumber) -> String {
        format!("ratelimit:phone:{}", phone)
    }

    /// Identifier lookup cache
    pub fn account_by_email(email: &Email) -> String {
        format!("account:email:{}", email)
    }

    pub fn account_by_username(username: &UserName) -> String {
        format!("account:username:{}", username)
    }

    pub fn account_by_phone(phone: &PhoneNumber) -> String {
        format!("account:phone:{}", phone)
    }
}
