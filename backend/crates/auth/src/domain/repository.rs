//! Repository Traits
//!
//! Interfaces for durable persistence. Implementation is in the
//! infrastructure layer.

use kernel::id::AccountId;

use crate::domain::entity::{account::Account, refresh_token::RefreshToken};
use crate::domain::value_object::{email::Email, phone::PhoneNumber, user_name::UserName};
use crate::error::AuthResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Find account by username
    async fn find_by_username(&self, username: &UserName) -> AuthResult<Option<Account>>;

    /// Find account by confirmed phone. Unconfirmed phones never match:
    /// ownership has not been proven.
    async fn find_by_confirmed_phone(&self, phone: &PhoneNumber) -> AuthResult<Option<Account>>;

    /// Check if an email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Check if a username is already registered
    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool>;

    /// Check if a phone number is already attached to any account,
    /// confirmed or not
    async fn exists_by_phone(&self, phone: &PhoneNumber) -> AuthResult<bool>;

    /// Update account (confirmation flags, lockout state)
    async fn update(&self, account: &Account) -> AuthResult<()>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Persist a new token
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Most recent active (non-revoked, non-used, non-expired) token
    /// for the account, if any
    async fn find_active(&self, account_id: &AccountId) -> AuthResult<Option<RefreshToken>>;

    /// All active tokens for the account
    async fn find_all_active(&self, account_id: &AccountId) -> AuthResult<Vec<RefreshToken>>;

    /// Update a token (state transitions)
    async fn update(&self, token: &RefreshToken) -> AuthResult<()>;
}
