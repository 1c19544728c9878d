//! Registration Use Case
//!
//! Creates an unverified account, warms the identifier cache, issues the
//! first email verification code, and opens a pending-verification
//! session so the registrant can request resends without credentials.
//! No tokens are issued until the email is verified.

use std::sync::Arc;

use tracing::info;

use crate::application::config::AuthConfig;
use crate::application::verification::VerificationCodeEngine;
use crate::domain::entity::account::Account;
use crate::domain::notifier::{MailNotifier, PhoneNotifier};
use crate::domain::repository::AccountRepository;
use crate::domain::store::{EphemeralStore, keys};
use crate::domain::value_object::{
    email::Email, phone::PhoneNumber, role::Role, user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Raw registration request
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Registration result: identity created, verification pending
#[derive(Debug)]
pub struct RegisterOutput {
    pub account_id: String,
    pub email: String,
    pub username: String,
    /// Token for resend requests while the email is unverified
    pub pending_session_token: String,
}

pub struct RegisterUseCase<R, S, M, P> {
    accounts: Arc<R>,
    store: Arc<S>,
    verification: Arc<VerificationCodeEngine<R, S, M, P>>,
    config: Arc<AuthConfig>,
}

impl<R, S, M, P> RegisterUseCase<R, S, M, P>
where
    R: AccountRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        accounts: Arc<R>,
        store: Arc<S>,
        verification: Arc<VerificationCodeEngine<R, S, M, P>>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            accounts,
            store,
            verification,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(input.email)?;
        let username = UserName::new(input.username)?;
        let phone = input.phone.map(PhoneNumber::new).transpose()?;
        let raw_password = RawPassword::new(input.password)?;

        // One message for any collision, so enumeration attempts
        // learn nothing about which identifier exists
        if self.accounts.exists_by_email(&email).await?
            || self.accounts.exists_by_username(&username).await?
        {
            return Err(AuthError::DuplicateIdentity);
        }
        // A phone may be claimed by at most one account, even before it
        // is confirmed; otherwise a later confirmation on one account
        // would strand the other's verify attempt
        if let Some(phone) = &phone {
            if self.accounts.exists_by_phone(phone).await? {
                return Err(AuthError::DuplicateIdentity);
            }
        }

        let password = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let account = Account::new(
            email.clone(),
            username.clone(),
            phone,
            password,
            Role::Patient,
            input.first_name,
            input.last_name,
        );
        self.accounts.create(&account).await?;

        let cache_ttl = self.config.identifier_cache_ttl;
        self.store
            .set(
                &keys::account_by_email(&email),
                &account.id.to_string(),
                cache_ttl,
            )
            .await?;
        self.store
            .set(
                &keys::account_by_username(&username),
                &account.id.to_string(),
                cache_ttl,
            )
            .await?;

        // Delivery failure propagates; the account exists and the code
        // can be reissued through the resend flow later
        self.verification.issue_email_code(&email).await?;
        let pending_session_token = self.verification.open_pending_session(&account.id).await?;

        info!(account_id = %account.id, "account registered, awaiting email verification");

        Ok(RegisterOutput {
            account_id: account.id.to_string(),
            email: email.into_db(),
            username: username.into_db(),
            pending_session_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePhoneProvider, MemoryRepository, MemoryStore, RecordingMailer};

    struct Fixture {
        use_case: RegisterUseCase<MemoryRepository, MemoryStore, RecordingMailer, FakePhoneProvider>,
        repo: Arc<MemoryRepository>,
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryRepository::new(), RecordingMailer::new())
    }

    fn fixture_with(repo: MemoryRepository, mailer: RecordingMailer) -> Fixture {
        let repo = Arc::new(repo);
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);
        let config = Arc::new(AuthConfig::with_random_secret());
        let verification = Arc::new(VerificationCodeEngine::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            Arc::clone(&mailer),
            Arc::new(FakePhoneProvider::new()),
            Arc::clone(&config),
        ));
        let use_case = RegisterUseCase::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            verification,
            config,
        );
        Fixture {
            use_case,
            repo,
            store,
            mailer,
        }
    }

    fn sample_input() -> RegisterInput {
        RegisterInput {
            email: "Ada@Example.com".to_string(),
            username: "ada".to_string(),
            password: "S3cure-pass".to_string(),
            phone: None,
            first_name: Some("Ada".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_account_and_sends_code() {
        let f = fixture();

        let output = f.use_case.execute(sample_input()).await.unwrap();

        assert_eq!(output.email, "ada@example.com");
        assert_eq!(f.repo.account_count(), 1);
        assert_eq!(f.mailer.sent().len(), 1);
        assert!(!output.pending_session_token.is_empty());

        // Identifier cache warmed
        assert_eq!(
            f.store.peek("account:email:ada@example.com"),
            Some(output.account_id.clone())
        );
        assert_eq!(
            f.store.peek("account:username:ada"),
            Some(output.account_id)
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_conflict() {
        let f = fixture();
        f.use_case.execute(sample_input()).await.unwrap();

        let mut input = sample_input();
        input.username = "different".to_string();
        let err = f.use_case.execute(input).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
        assert_eq!(f.repo.account_count(), 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_is_conflict() {
        let f = fixture();
        f.use_case.execute(sample_input()).await.unwrap();

        let mut input = sample_input();
        input.email = "other@example.com".to_string();
        let err = f.use_case.execute(input).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_register_duplicate_phone_is_conflict() {
        let f = fixture();
        let mut input = sample_input();
        input.phone = Some("+14155552671".to_string());
        f.use_case.execute(input).await.unwrap();

        // Different email and username, same (still unconfirmed) phone
        let mut input = sample_input();
        input.email = "other@example.com".to_string();
        input.username = "other".to_string();
        input.phone = Some("+14155552671".to_string());
        let err = f.use_case.execute(input).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
        assert_eq!(f.repo.account_count(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let f = fixture();
        let mut input = sample_input();
        input.email = "not-an-email".to_string();

        let err = f.use_case.execute(input).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(f.repo.account_count(), 0);
    }

    #[tokio::test]
    async fn test_register_delivery_failure_propagates() {
        let f = fixture_with(MemoryRepository::new(), RecordingMailer::failing());

        let err = f.use_case.execute(sample_input()).await.unwrap_err();
        assert!(matches!(err, AuthError::Delivery(_)));
        // Account exists; the client is told the code never arrived
        assert_eq!(f.repo.account_count(), 1);
    }
}
