//! Verify Email Use Case
//!
//! Redeems a registration verification code. On success the account's
//! email is confirmed, the pending-verification session is dropped, any
//! refresh tokens issued before verification are revoked, and a fresh
//! session is minted so the user lands signed in.

use std::sync::Arc;

use tracing::info;

use crate::application::tokens::TokenEngine;
use crate::application::verification::VerificationCodeEngine;
use crate::application::verify_login_code::{AuthTokens, issue_auth_tokens};
use crate::domain::entity::refresh_token::RevocationReason;
use crate::domain::notifier::{MailNotifier, PhoneNotifier};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::store::EphemeralStore;
use crate::domain::value_object::email::Email;
use crate::domain::value_object::verification_code::VerificationCode;
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<R, T, S, M, P> {
    accounts: Arc<R>,
    verification: Arc<VerificationCodeEngine<R, S, M, P>>,
    tokens: Arc<TokenEngine<T, S>>,
}

impl<R, T, S, M, P> VerifyEmailUseCase<R, T, S, M, P>
where
    R: AccountRepository,
    T: RefreshTokenRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        accounts: Arc<R>,
        verification: Arc<VerificationCodeEngine<R, S, M, P>>,
        tokens: Arc<TokenEngine<T, S>>,
    ) -> Self {
        Self {
            accounts,
            verification,
            tokens,
        }
    }

    pub async fn execute(
        &self,
        email: &str,
        code: &str,
        client_ip: &str,
    ) -> AuthResult<AuthTokens> {
        let email = Email::new(email)?;
        let code = VerificationCode::parse(code).map_err(|_| AuthError::CodeInvalid)?;

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            return Err(AuthError::AccountNotFound);
        };
        if account.email_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        if !self.verification.check_email_code(&email, &code).await? {
            return Err(AuthError::CodeInvalid);
        }
        self.verification.consume_email_code(&email, &code).await?;

        account.confirm_email();
        self.accounts.update(&account).await?;

        self.verification.close_pending_session(&account.id).await?;

        // Anything issued before the email was proven is dead now
        self.tokens
            .revoke_all(&account.id, client_ip, RevocationReason::EmailVerification)
            .await?;

        let bundle = issue_auth_tokens(&self.tokens, &account, client_ip).await?;
        info!(account_id = %account.id, "email verified, session issued");
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::testing::{
        FakePhoneProvider, MemoryRepository, MemoryStore, RecordingMailer, account_with_password,
    };
    use chrono::Utc;

    struct Fixture {
        use_case: VerifyEmailUseCase<
            MemoryRepository,
            MemoryRepository,
            MemoryStore,
            RecordingMailer,
            FakePhoneProvider,
        >,
        verification:
            Arc<VerificationCodeEngine<MemoryRepository, MemoryStore, RecordingMailer, FakePhoneProvider>>,
        tokens: Arc<TokenEngine<MemoryRepository, MemoryStore>>,
        repo: Arc<MemoryRepository>,
    }

    fn fixture(repo: MemoryRepository) -> Fixture {
        let repo = Arc::new(repo);
        let store = Arc::new(MemoryStore::new());
        let config = Arc::new(AuthConfig::with_random_secret());
        let verification = Arc::new(VerificationCodeEngine::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            Arc::new(RecordingMailer::new()),
            Arc::new(FakePhoneProvider::new()),
            Arc::clone(&config),
        ));
        let tokens = Arc::new(TokenEngine::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            config,
        ));
        Fixture {
            use_case: VerifyEmailUseCase::new(
                Arc::clone(&repo),
                Arc::clone(&verification),
                Arc::clone(&tokens),
            ),
            verification,
            tokens,
            repo,
        }
    }

    #[tokio::test]
    async fn test_valid_code_confirms_and_issues_session() {
        let account = account_with_password("ada@example.com", "ada", "S3cure-pass");
        let f = fixture(MemoryRepository::with_account(account));
        let email = Email::new("ada@example.com").unwrap();
        let code = f.verification.issue_email_code(&email).await.unwrap();

        let bundle = f
            .use_case
            .execute("ada@example.com", code.as_str(), "10.0.0.1")
            .await
            .unwrap();

        assert!(!bundle.access_token.is_empty());
        let stored = f
            .repo
            .find_by_email(&email)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.email_confirmed);

        // The code cannot be redeemed twice
        let err = f
            .use_case
            .execute("ada@example.com", code.as_str(), "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyVerified));
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected() {
        let account = account_with_password("ada@example.com", "ada", "S3cure-pass");
        let f = fixture(MemoryRepository::with_account(account));
        let email = Email::new("ada@example.com").unwrap();
        f.verification.issue_email_code(&email).await.unwrap();

        let err = f
            .use_case
            .execute("ada@example.com", "WR0NG1", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CodeInvalid));

        let stored = f.repo.find_by_email(&email).await.unwrap().unwrap();
        assert!(!stored.email_confirmed);
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let f = fixture(MemoryRepository::new());
        let err = f
            .use_case
            .execute("ghost@example.com", "AB12CD", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_verification_revokes_pre_verification_tokens() {
        let account = account_with_password("ada@example.com", "ada", "S3cure-pass");
        let id = account.id;
        let f = fixture(MemoryRepository::with_account(account));
        let email = Email::new("ada@example.com").unwrap();

        // A refresh token issued before verification, somehow
        let stale = f.tokens.new_refresh_token_value();
        f.tokens
            .persist_refresh_token(&id, &stale, "10.0.0.1")
            .await
            .unwrap();

        let code = f.verification.issue_email_code(&email).await.unwrap();
        f.use_case
            .execute("ada@example.com", code.as_str(), "10.0.0.1")
            .await
            .unwrap();

        let now = Utc::now();
        let snapshot = f.repo.token_snapshot();
        let stale_row = snapshot.iter().find(|t| t.token == stale).unwrap();
        assert!(!stale_row.is_active(now));
        assert_eq!(
            stale_row.revocation_reason,
            Some(RevocationReason::EmailVerification)
        );
        // The freshly issued token is the only active one
        assert_eq!(snapshot.iter().filter(|t| t.is_active(now)).count(), 1);
    }

    #[tokio::test]
    async fn test_pending_session_dropped_after_verification() {
        let account = account_with_password("ada@example.com", "ada", "S3cure-pass");
        let id = account.id;
        let f = fixture(MemoryRepository::with_account(account));
        let email = Email::new("ada@example.com").unwrap();

        let session = f.verification.open_pending_session(&id).await.unwrap();
        let code = f.verification.issue_email_code(&email).await.unwrap();

        f.use_case
            .execute("ada@example.com", code.as_str(), "10.0.0.1")
            .await
            .unwrap();

        assert_eq!(f.verification.account_for_session(&session).await.unwrap(), None);
    }
}
