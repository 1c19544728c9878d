//! Verification Code Engine
//!
//! Issues and checks the out-of-band challenges behind registration and
//! two-step login. Email codes are generated and stored locally with an
//! active-code pointer so a reissue invalidates its predecessor. Phone
//! codes are owned by the SMS provider; we only keep a marker that a
//! challenge is outstanding.

use std::sync::Arc;

use kernel::id::AccountId;
use tracing::{debug, info};

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::notifier::{CodeCheck, MailNotifier, PhoneNotifier};
use crate::domain::repository::AccountRepository;
use crate::domain::store::{EphemeralStore, keys};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::phone::PhoneNumber;
use crate::domain::value_object::verification_code::VerificationCode;
use crate::error::AuthResult;

/// Placeholder value for keys whose presence is the information
const MARKER: &str = "1";

pub struct VerificationCodeEngine<R, S, M, P> {
    accounts: Arc<R>,
    store: Arc<S>,
    mailer: Arc<M>,
    phone: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<R, S, M, P> VerificationCodeEngine<R, S, M, P>
where
    R: AccountRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        accounts: Arc<R>,
        store: Arc<S>,
        mailer: Arc<M>,
        phone: Arc<P>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            accounts,
            store,
            mailer,
            phone,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Email channel
    // ------------------------------------------------------------------

    /// Generate, store, and send a fresh email code.
    ///
    /// Any previously issued code for this address is deleted first, so
    /// exactly one code is redeemable per address at a time. The code is
    /// persisted before the send: if delivery fails the caller sees the
    /// error, and the stored code simply expires.
    pub async fn issue_email_code(&self, email: &Email) -> AuthResult<VerificationCode> {
        let code = VerificationCode::generate();
        let ttl = self.config.email_code_ttl;

        let active_key = keys::email_active_code(email);
        if let Some(previous) = self.store.get(&active_key).await? {
            self.store.delete(&keys::email_code(email, &previous)).await?;
            debug!(email = %email, "superseded previous email verification code");
        }

        self.store
            .set(&keys::email_code(email, code.as_str()), MARKER, ttl)
            .await?;
        self.store.set(&active_key, code.as_str(), ttl).await?;

        self.mailer
            .send(email, "Your verification code", &code_email_body(&code))
            .await?;

        info!(email = %email, "email verification code issued");
        Ok(code)
    }

    /// Whether this code is currently redeemable for this address
    pub async fn check_email_code(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> AuthResult<bool> {
        let stored = self
            .store
            .get(&keys::email_code(email, code.as_str()))
            .await?;
        Ok(stored.is_some())
    }

    /// Delete a redeemed code and its active pointer
    pub async fn consume_email_code(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> AuthResult<()> {
        self.store
            .delete(&keys::email_code(email, code.as_str()))
            .await?;
        self.store.delete(&keys::email_active_code(email)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phone channel
    // ------------------------------------------------------------------

    /// Ask the provider to start a phone challenge and record that one
    /// is outstanding
    pub async fn issue_phone_challenge(&self, phone: &PhoneNumber) -> AuthResult<()> {
        self.store
            .set(&keys::phone_pending(phone), MARKER, self.config.phone_code_ttl)
            .await?;
        self.phone.send_code(phone).await?;
        info!(phone = %phone, "phone verification challenge started");
        Ok(())
    }

    /// Ask the provider whether a submitted phone code satisfies the
    /// open challenge. The outstanding-challenge marker is cleared on
    /// approval.
    pub async fn check_phone_code(&self, phone: &PhoneNumber, code: &str) -> AuthResult<CodeCheck> {
        let outcome = self.phone.check_code(phone, code).await?;
        if outcome == CodeCheck::Approved {
            self.store.delete(&keys::phone_pending(phone)).await?;
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Pending-verification sessions
    // ------------------------------------------------------------------

    /// Open a pending-verification session for a not-yet-verified
    /// account. Returns the opaque session token; both directions of the
    /// mapping are stored under the same TTL.
    pub async fn open_pending_session(&self, account_id: &AccountId) -> AuthResult<String> {
        let token = platform::crypto::opaque_token(32);
        let ttl = self.config.pending_session_ttl;
        self.store
            .set(&keys::pending_session(&token), &account_id.to_string(), ttl)
            .await?;
        self.store
            .set(&keys::pending_account(account_id), &token, ttl)
            .await?;
        Ok(token)
    }

    /// Resolve a pending-session token back to its account id
    pub async fn account_for_session(&self, token: &str) -> AuthResult<Option<AccountId>> {
        let Some(raw) = self.store.get(&keys::pending_session(token)).await? else {
            return Ok(None);
        };
        Ok(AccountId::parse(&raw).ok())
    }

    /// Drop both sides of a pending-verification session
    pub async fn close_pending_session(&self, account_id: &AccountId) -> AuthResult<()> {
        if let Some(token) = self.store.get(&keys::pending_account(account_id)).await? {
            self.store.delete(&keys::pending_session(&token)).await?;
        }
        self.store.delete(&keys::pending_account(account_id)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resends
    // ------------------------------------------------------------------

    /// Reissue the email code for a pending-verification session.
    ///
    /// Returns `false` without revealing why when the session is
    /// unknown, the email is already verified, or a resend happened
    /// within the last minute.
    pub async fn resend_email(&self, session_token: &str) -> AuthResult<bool> {
        let Some(account_id) = self.account_for_session(session_token).await? else {
            return Ok(false);
        };
        let Some(account) = self.accounts.find_by_id(&account_id).await? else {
            return Ok(false);
        };
        if account.email_confirmed {
            return Ok(false);
        }

        let limit_key = keys::rate_limit_email(&account.email);
        if self.store.get(&limit_key).await?.is_some() {
            debug!(email = %account.email, "email code resend rate-limited");
            return Ok(false);
        }

        self.issue_email_code(&account.email).await?;
        self.store
            .set(&limit_key, MARKER, self.config.resend_interval)
            .await?;
        Ok(true)
    }

    /// Restart the phone challenge for an authenticated account.
    ///
    /// Returns `false` when the account has no phone, the phone is
    /// already verified, or a resend happened within the last minute.
    pub async fn resend_phone(&self, account: &Account) -> AuthResult<bool> {
        let Some(phone) = account.phone.as_ref() else {
            return Ok(false);
        };
        if account.phone_confirmed {
            return Ok(false);
        }

        let limit_key = keys::rate_limit_phone(phone);
        if self.store.get(&limit_key).await?.is_some() {
            debug!(phone = %phone, "phone challenge resend rate-limited");
            return Ok(false);
        }

        self.issue_phone_challenge(phone).await?;
        self.store
            .set(&limit_key, MARKER, self.config.resend_interval)
            .await?;
        Ok(true)
    }
}

fn code_email_body(code: &VerificationCode) -> String {
    format!(
        "<html><body>\
         <h2>Verify your email</h2>\
         <p>Your verification code is:</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{}</p>\
         <p>The code expires in 15 minutes. If you did not request it, you can ignore this message.</p>\
         </body></html>",
        code.as_str()
    )
}
