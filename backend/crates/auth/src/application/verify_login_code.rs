//! Verify Login Code Use Case (step two of two)
//!
//! Redeems the challenge dispatched by login and mints the session:
//! a signed access token plus a persisted opaque refresh token. The
//! email/username path consumes a locally stored code; the phone path
//! defers the check to the SMS provider.

use std::sync::Arc;

use tracing::info;

use crate::application::resolver::IdentityResolver;
use crate::application::tokens::TokenEngine;
use crate::application::verification::VerificationCodeEngine;
use crate::domain::entity::account::Account;
use crate::domain::notifier::{CodeCheck, MailNotifier, PhoneNotifier};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::store::EphemeralStore;
use crate::domain::value_object::login_identifier::LoginIdentifier;
use crate::domain::value_object::verification_code::VerificationCode;
use crate::error::{AuthError, AuthResult};

/// Authenticated session bundle
#[derive(Debug)]
pub struct AuthTokens {
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issue the full session bundle for a verified account
pub(crate) async fn issue_auth_tokens<T, S>(
    engine: &TokenEngine<T, S>,
    account: &Account,
    client_ip: &str,
) -> AuthResult<AuthTokens>
where
    T: RefreshTokenRepository,
    S: EphemeralStore,
{
    let access_token = engine.issue_access_token(account)?;
    let refresh_token = engine.new_refresh_token_value();
    engine
        .persist_refresh_token(&account.id, &refresh_token, client_ip)
        .await?;

    Ok(AuthTokens {
        account_id: account.id.to_string(),
        email: account.email.as_str().to_string(),
        username: account.username.as_str().to_string(),
        role: account.role.as_str().to_string(),
        access_token,
        refresh_token,
    })
}

pub struct VerifyLoginCodeUseCase<R, T, S, M, P> {
    resolver: Arc<IdentityResolver<R, S>>,
    verification: Arc<VerificationCodeEngine<R, S, M, P>>,
    tokens: Arc<TokenEngine<T, S>>,
}

impl<R, T, S, M, P> VerifyLoginCodeUseCase<R, T, S, M, P>
where
    R: AccountRepository,
    T: RefreshTokenRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        resolver: Arc<IdentityResolver<R, S>>,
        verification: Arc<VerificationCodeEngine<R, S, M, P>>,
        tokens: Arc<TokenEngine<T, S>>,
    ) -> Self {
        Self {
            resolver,
            verification,
            tokens,
        }
    }

    pub async fn execute(
        &self,
        identifier: &str,
        code: &str,
        client_ip: &str,
    ) -> AuthResult<AuthTokens> {
        let identifier = LoginIdentifier::classify(identifier)?;

        // Unknown identifiers get the same answer as a bad code
        let Some(account) = self.resolver.resolve(&identifier).await? else {
            return Err(AuthError::CodeInvalid);
        };

        match &identifier {
            LoginIdentifier::Phone(phone) => {
                let outcome = self.verification.check_phone_code(phone, code).await?;
                if outcome != CodeCheck::Approved {
                    return Err(AuthError::CodeInvalid);
                }
            }
            LoginIdentifier::Email(_) | LoginIdentifier::Username(_) => {
                let code = VerificationCode::parse(code).map_err(|_| AuthError::CodeInvalid)?;
                if !self
                    .verification
                    .check_email_code(&account.email, &code)
                    .await?
                {
                    return Err(AuthError::CodeInvalid);
                }
                self.verification
                    .consume_email_code(&account.email, &code)
                    .await?;
            }
        }

        let bundle = issue_auth_tokens(&self.tokens, &account, client_ip).await?;
        info!(account_id = %account.id, "login completed, session issued");
        Ok(bundle)
    }
}
