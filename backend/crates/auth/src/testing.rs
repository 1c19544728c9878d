//! In-memory fakes for use-case tests.
//!
//! Mirror the production trait impls closely enough that the use cases
//! cannot tell the difference: TTLs expire, deletes report existence,
//! and notifier failures surface as `Delivery` errors.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use kernel::id::AccountId;

use crate::domain::entity::{account::Account, refresh_token::RefreshToken};
use crate::domain::notifier::{CodeCheck, MailNotifier, PhoneNotifier};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::store::EphemeralStore;
use crate::domain::value_object::{email::Email, phone::PhoneNumber, user_name::UserName};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Ephemeral store fake
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot of a live entry, for assertions
    pub fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, deadline)| *deadline > Instant::now())
            .map(|(value, _)| value.clone())
    }
}

impl EphemeralStore for MemoryStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        Ok(entries.remove(key).is_some())
    }
}

// ============================================================================
// Repository fake (accounts + refresh tokens, like the Pg impl)
// ============================================================================

#[derive(Default)]
pub struct MemoryRepository {
    accounts: Mutex<Vec<Account>>,
    tokens: Mutex<Vec<RefreshToken>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: Account) -> Self {
        let repo = Self::default();
        repo.accounts.lock().unwrap().push(account);
        repo
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn token_snapshot(&self) -> Vec<RefreshToken> {
        self.tokens.lock().unwrap().clone()
    }
}

impl AccountRepository for MemoryRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        self.accounts.lock().unwrap().push(account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == *id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == *email)
            .cloned())
    }

    async fn find_by_username(&self, username: &UserName) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == *username)
            .cloned())
    }

    async fn find_by_confirmed_phone(&self, phone: &PhoneNumber) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.phone_confirmed && a.phone.as_ref() == Some(phone))
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.email == *email))
    }

    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.username == *username))
    }

    async fn exists_by_phone(&self, phone: &PhoneNumber) -> AuthResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.phone.as_ref() == Some(phone)))
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(AuthError::AccountNotFound),
        }
    }
}

impl RefreshTokenRepository for MemoryRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn find_active(&self, account_id: &AccountId) -> AuthResult<Option<RefreshToken>> {
        let now = Utc::now();
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == *account_id && t.is_active(now))
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn find_all_active(&self, account_id: &AccountId) -> AuthResult<Vec<RefreshToken>> {
        let now = Utc::now();
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == *account_id && t.is_active(now))
            .cloned()
            .collect())
    }

    async fn update(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == token.id) {
            Some(slot) => {
                *slot = token.clone();
                Ok(())
            }
            None => Err(AuthError::Internal("Refresh token not found".to_string())),
        }
    }
}

// ============================================================================
// Notifier fakes
// ============================================================================

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailNotifier for RecordingMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> AuthResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::Delivery("smtp unavailable (fake)".to_string()));
        }
        self.sent.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}

pub struct FakePhoneProvider {
    sent: Mutex<Vec<String>>,
    result: Mutex<CodeCheck>,
}

impl Default for FakePhoneProvider {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            result: Mutex::new(CodeCheck::Approved),
        }
    }
}

impl FakePhoneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(result: CodeCheck) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            result: Mutex::new(result),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl PhoneNotifier for FakePhoneProvider {
    async fn send_code(&self, phone: &PhoneNumber) -> AuthResult<()> {
        self.sent.lock().unwrap().push(phone.to_string());
        Ok(())
    }

    async fn check_code(&self, _phone: &PhoneNumber, _code: &str) -> AuthResult<CodeCheck> {
        Ok(*self.result.lock().unwrap())
    }
}

// ============================================================================
// Builders
// ============================================================================

use crate::domain::value_object::role::Role;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};

/// Unverified account with the given email/username and password
pub fn account_with_password(email: &str, username: &str, password: &str) -> Account {
    let raw = RawPassword::new(password.to_string()).unwrap();
    Account::new(
        Email::new(email).unwrap(),
        UserName::new(username).unwrap(),
        None,
        UserPassword::from_raw(&raw, None).unwrap(),
        Role::Patient,
        None,
        None,
    )
}

/// Verified account ready to log in over the email channel
pub fn verified_account(email: &str, username: &str, password: &str) -> Account {
    let mut account = account_with_password(email, username, password);
    account.email_confirmed = true;
    account
}
