//! Verify Phone Use Case
//!
//! Confirms phone ownership for an already-authenticated account. The
//! code itself lives with the SMS provider; we only record the outcome.
//! No tokens are issued, the caller's session is untouched.

use std::sync::Arc;

use kernel::id::AccountId;
use tracing::info;

use crate::application::verification::VerificationCodeEngine;
use crate::domain::notifier::{CodeCheck, MailNotifier, PhoneNotifier};
use crate::domain::repository::AccountRepository;
use crate::domain::store::EphemeralStore;
use crate::error::{AuthError, AuthResult};

pub struct VerifyPhoneUseCase<R, S, M, P> {
    accounts: Arc<R>,
    verification: Arc<VerificationCodeEngine<R, S, M, P>>,
}

impl<R, S, M, P> VerifyPhoneUseCase<R, S, M, P>
where
    R: AccountRepository,
    S: EphemeralStore,
    M: MailNotifier,
    P: PhoneNotifier,
{
    pub fn new(
        accounts: Arc<R>,
        verification: Arc<VerificationCodeEngine<R, S, M, P>>,
    ) -> Self {
        Self {
            accounts,
            verification,
        }
    }

    pub async fn execute(&self, account_id: &AccountId, code: &str) -> AuthResult<()> {
        let Some(mut account) = self.accounts.find_by_id(account_id).await? else {
            return Err(AuthError::AccountNotFound);
        };
        let Some(phone) = account.phone.clone() else {
            return Err(AuthError::Validation(
                "No phone number on the account".to_string(),
            ));
        };
        if account.phone_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        let outcome = self.verification.check_phone_code(&phone, code).await?;
        if outcome != CodeCheck::Approved {
            return Err(AuthError::CodeInvalid);
        }

        account.confirm_phone();
        self.accounts.update(&account).await?;

        info!(account_id = %account.id, "phone number verified");
        Ok(())
    }
}
