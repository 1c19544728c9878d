//! Refresh Token Entity
//!
//! Opaque long-lived token backing silent re-authentication. State
//! machine: Active until used, revoked, or expired; `Active → Used` and
//! `Active → Revoked` are terminal. Either transition attempted from a
//! non-Active state is a [`TokenStateError`]; logout orchestration logs
//! and swallows it, everything else propagates.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AccountId, RefreshTokenId};
use thiserror::Error;

/// Refresh token lifetime in days
pub const REFRESH_TOKEN_DAYS: i64 = 15;

/// Why a token was revoked; stored alongside the revocation audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Logout,
    LogoutAll,
    EmailVerification,
}

impl RevocationReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::LogoutAll => "logout_all",
            RevocationReason::EmailVerification => "email_verification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "logout" => Some(RevocationReason::Logout),
            "logout_all" => Some(RevocationReason::LogoutAll),
            "email_verification" => Some(RevocationReason::EmailVerification),
            _ => None,
        }
    }
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Illegal state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStateError {
    #[error("Refresh token is already revoked")]
    AlreadyRevoked,

    #[error("Refresh token is already used")]
    AlreadyUsed,

    #[error("Refresh token is expired")]
    Expired,
}

/// Refresh token entity
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub account_id: AccountId,
    /// Opaque token string; matched by exact string, never decoded
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub used: bool,
    pub created_by_ip: String,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by_ip: Option<String>,
    pub revocation_reason: Option<RevocationReason>,
    /// Token that superseded this one on rotation, if any
    pub replaced_by: Option<String>,
}

impl RefreshToken {
    /// Create a new active token valid for [`REFRESH_TOKEN_DAYS`]
    pub fn new(account_id: AccountId, token: String, created_by_ip: String) -> Self {
        let now = Utc::now();
        Self {
            id: RefreshTokenId::new(),
            account_id,
            token,
            created_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_DAYS),
            revoked: false,
            used: false,
            created_by_ip,
            revoked_at: None,
            revoked_by_ip: None,
            revocation_reason: None,
            replaced_by: None,
        }
    }

    /// `active ⇔ !revoked ∧ !used ∧ now ≤ expires_at`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.used && now <= self.expires_at
    }

    fn check_active(&self, now: DateTime<Utc>) -> Result<(), TokenStateError> {
        if self.revoked {
            return Err(TokenStateError::AlreadyRevoked);
        }
        if self.used {
            return Err(TokenStateError::AlreadyUsed);
        }
        if now > self.expires_at {
            return Err(TokenStateError::Expired);
        }
        Ok(())
    }

    /// Active → Used (terminal)
    pub fn mark_used(&mut self, replaced_by: Option<String>) -> Result<(), TokenStateError> {
        self.check_active(Utc::now())?;
        self.used = true;
        self.replaced_by = replaced_by;
        Ok(())
    }

    /// Active → Revoked (terminal)
    pub fn revoke(&mut self, ip: &str, reason: RevocationReason) -> Result<(), TokenStateError> {
        let now = Utc::now();
        self.check_active(now)?;
        self.revoked = true;
        self.revoked_at = Some(now);
        self.revoked_by_ip = Some(ip.to_string());
        self.revocation_reason = Some(reason);
        Ok(())
    }
}
