//! Account Entity
//!
//! Identity record: contact identifiers, credential hash, confirmation
//! flags, and the lockout counter. Created at registration, mutated by
//! verification and lockout logic, never deleted by this subsystem.

use chrono::{DateTime, Duration, Utc};
use kernel::id::AccountId;

use crate::domain::value_object::{
    email::Email, phone::PhoneNumber, role::Role, user_name::UserName, user_password::UserPassword,
};

/// Consecutive failures before the account locks
pub const LOCKOUT_THRESHOLD: u16 = 5;

/// Lockout window in minutes
pub const LOCKOUT_MINUTES: i64 = 5;

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    /// Unique email address
    pub email: Email,
    /// Unique username handle
    pub username: UserName,
    /// Optional phone number (unique when present)
    pub phone: Option<PhoneNumber>,
    /// Argon2id password hash
    pub password: UserPassword,
    /// Email ownership proven via verification code
    pub email_confirmed: bool,
    /// Phone ownership proven via the SMS provider
    pub phone_confirmed: bool,
    pub role: Role,
    /// Consecutive failed password checks since the last success
    pub failed_login_count: i16,
    /// While set and in the future, password checks short-circuit
    pub lockout_until: Option<DateTime<Utc>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unverified account
    pub fn new(
        email: Email,
        username: UserName,
        phone: Option<PhoneNumber>,
        password: UserPassword,
        role: Role,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email,
            username,
            phone,
            password,
            email_confirmed: false,
            phone_confirmed: false,
            role,
            failed_login_count: 0,
            lockout_until: None,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account is currently locked out
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout_until.is_some_and(|until| until > now)
    }

    /// Remaining lockout in whole minutes, floored, at least 1.
    /// Only meaningful while locked.
    pub fn lockout_remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        self.lockout_until
            .map(|until| (until - now).num_minutes().max(1))
            .unwrap_or(0)
    }

    /// Record a failed password check. At the threshold the account
    /// locks and the counter resets.
    pub fn record_login_failure(&mut self, now: DateTime<Utc>) {
        self.failed_login_count += 1;
        if self.failed_login_count >= LOCKOUT_THRESHOLD as i16 {
            self.lockout_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
            self.failed_login_count = 0;
        }
        self.updated_at = now;
    }

    /// Record a successful password check
    pub fn reset_login_failures(&mut self) {
        self.failed_login_count = 0;
        self.lockout_until = None;
        self.updated_at = Utc::now();
    }

    /// Mark the email as confirmed
    pub fn confirm_email(&mut self) {
        self.email_confirmed = true;
        self.updated_at = Utc::now();
    }

    /// Mark the phone as confirmed
    pub fn confirm_phone(&mut self) {
        self.phone_confirmed = true;
        self.updated_at = Utc::now();
    }
}
