//! Login Use Case (step one of two)
//!
//! Checks credentials and dispatches a verification challenge over the
//! channel implied by the identifier. No tokens are issued here; the
//! session only materializes once the code is verified.

use std::sync::Arc;

use tracing::info;

use crate::application::resolver::{IdentityResolver, PasswordCheck};
use crate::application::verification::VerificationCodeEngine;
use crate::domain::notifier::{MailNotifier, PhoneNotifier};
use crate::domain::repository::AccountRepository;
use crate::domain::store::EphemeralStore;
use crate::domain::value_object::login_identifier::LoginIdentifier;
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

/// Which channel the verification code went out on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationChannel {
    Email,
    Phone,
}

impl VerificationChannel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VerificationChannel::Email => "email",
            VerificationChannel::Phone => "phone",
        }
    }
}

/// Challenge dispatched; the client must now submit the code
#[derive(Debug)]
pub struct LoginChallenge {
    pub channel: VerificationChannel,
    /// Partially masked destination, safe to echo back to the client
    pub destination: String,
}

pub struct LoginUseCase<R, S, M, P> {
    resolver: Arc<IdentityResolver<R, S>>,
    verification: Arc<VerificationCodeEngine<R, S, M, P>>,
}

impl<R, S, M, P> LoginUseCase<R, S, M, P>
where
    R: AccountRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        resolver: Arc<IdentityResolver<R, S>>,
        verification: Arc<VerificationCodeEngine<R, S, M, P>>,
    ) -> Self {
        Self {
            resolver,
            verification,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginChallenge> {
        let identifier = LoginIdentifier::classify(&input.identifier)?;

        let Some(mut account) = self.resolver.resolve(&identifier).await? else {
            // Same answer as a wrong password, so probes cannot tell
            // unknown identifiers from bad credentials
            return Err(AuthError::InvalidCredentials);
        };

        match self
            .resolver
            .check_password(&mut account, &input.password)
            .await?
        {
            PasswordCheck::Ok => {}
            PasswordCheck::WrongPassword => return Err(AuthError::InvalidCredentials),
            PasswordCheck::LockedOut(minutes) => return Err(AuthError::LockedOut { minutes }),
        }

        let challenge = match &identifier {
            LoginIdentifier::Phone(phone) => {
                // Resolution already required a confirmed phone
                self.verification.issue_phone_challenge(phone).await?;
                LoginChallenge {
                    channel: VerificationChannel::Phone,
                    destination: mask_phone(phone.as_str()),
                }
            }
            LoginIdentifier::Email(_) | LoginIdentifier::Username(_) => {
                if !account.email_confirmed {
                    return Err(AuthError::EmailNotConfirmed);
                }
                self.verification.issue_email_code(&account.email).await?;
                LoginChallenge {
                    channel: VerificationChannel::Email,
                    destination: mask_email(account.email.as_str()),
                }
            }
        };

        info!(account_id = %account.id, channel = challenge.channel.as_str(), "login challenge dispatched");
        Ok(challenge)
    }
}

/// `ada@example.com` becomes `a***@example.com`
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let head: String = local.chars().take(1).collect();
            format!("{}***@{}", head, domain)
        }
        None => "***".to_string(),
    }
}

/// `+15551234567` becomes `**********67`
fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    let visible = 2.min(chars.len());
    let masked = "*".repeat(chars.len() - visible);
    let tail: String = chars[chars.len() - visible..].iter().collect();
    format!("{}{}", masked, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::entity::account::LOCKOUT_THRESHOLD;
    use crate::domain::value_object::phone::PhoneNumber;
    use crate::testing::{
        FakePhoneProvider, MemoryRepository, MemoryStore, RecordingMailer, account_with_password,
        verified_account,
    };

    struct Fixture {
        use_case: LoginUseCase<MemoryRepository, MemoryStore, RecordingMailer, FakePhoneProvider>,
        mailer: Arc<RecordingMailer>,
        phone: Arc<FakePhoneProvider>,
    }

    fn fixture(repo: MemoryRepository) -> Fixture {
        let repo = Arc::new(repo);
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let phone = Arc::new(FakePhoneProvider::new());
        let config = Arc::new(AuthConfig::with_random_secret());
        let resolver = Arc::new(IdentityResolver::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            Arc::clone(&config),
        ));
        let verification = Arc::new(VerificationCodeEngine::new(
            Arc::clone(&repo),
            Arc::clone(&store),
            Arc::clone(&mailer),
            Arc::clone(&phone),
            config,
        ));
        Fixture {
            use_case: LoginUseCase::new(resolver, verification),
            mailer,
            phone,
        }
    }

    fn login(identifier: &str, password: &str) -> LoginInput {
        LoginInput {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_by_email_dispatches_email_challenge() {
        let f = fixture(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));

        let challenge = f
            .use_case
            .execute(login("ada@example.com", "S3cure-pass"))
            .await
            .unwrap();

        assert_eq!(challenge.channel, VerificationChannel::Email);
        assert_eq!(challenge.destination, "a***@example.com");
        assert_eq!(f.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_login_by_username_uses_email_channel() {
        let f = fixture(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));

        let challenge = f
            .use_case
            .execute(login("ada", "S3cure-pass"))
            .await
            .unwrap();
        assert_eq!(challenge.channel, VerificationChannel::Email);
    }

    #[tokio::test]
    async fn test_login_by_confirmed_phone_uses_phone_channel() {
        let mut account = verified_account("ada@example.com", "ada", "S3cure-pass");
        account.phone = Some(PhoneNumber::new("+15551234567").unwrap());
        account.phone_confirmed = true;
        let f = fixture(MemoryRepository::with_account(account));

        let challenge = f
            .use_case
            .execute(login("+15551234567", "S3cure-pass"))
            .await
            .unwrap();

        assert_eq!(challenge.channel, VerificationChannel::Phone);
        assert!(challenge.destination.ends_with("67"));
        assert_eq!(f.phone.sent().len(), 1);
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_identifier_reads_as_invalid_credentials() {
        let f = fixture(MemoryRepository::new());
        let err = f
            .use_case
            .execute(login("ghost@example.com", "S3cure-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let f = fixture(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));
        let err = f
            .use_case
            .execute(login("ada@example.com", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unverified_email_blocks_login() {
        let f = fixture(MemoryRepository::with_account(account_with_password(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));
        let err = f
            .use_case
            .execute(login("ada@example.com", "S3cure-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotConfirmed));
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_failures() {
        let f = fixture(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));

        for _ in 0..LOCKOUT_THRESHOLD {
            let _ = f
                .use_case
                .execute(login("ada@example.com", "wrong-password"))
                .await;
        }

        // Correct password still refused while locked
        let err = f
            .use_case
            .execute(login("ada@example.com", "S3cure-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LockedOut { minutes } if minutes >= 1));
    }

    #[test]
    fn test_masking() {
        assert_eq!(mask_email("ada@example.com"), "a***@example.com");
        assert_eq!(mask_phone("+15551234567"), "**********67");
    }
}
