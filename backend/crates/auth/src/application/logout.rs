//! Logout Use Cases
//!
//! Logout must always appear to succeed: a refresh token that is
//! already gone, expired, or revoked ends exactly the session the
//! caller wanted ended. Only infrastructure failures propagate. The
//! access token is blacklisted for the rest of its lifetime since a
//! signed JWT stays verifiable after the session is over.

use std::sync::Arc;

use kernel::id::AccountId;
use tracing::info;

use crate::application::tokens::TokenEngine;
use crate::domain::entity::refresh_token::RevocationReason;
use crate::domain::repository::RefreshTokenRepository;
use crate::domain::store::{EphemeralStore, keys};
use crate::error::AuthResult;

pub struct LogoutUseCase<T, S> {
    tokens: Arc<TokenEngine<T, S>>,
    store: Arc<S>,
}

impl<T, S> LogoutUseCase<T, S>
where
    T: RefreshTokenRepository,
    S: EphemeralStore,
{
    pub fn new(tokens: Arc<TokenEngine<T, S>>, store: Arc<S>) -> Self {
        Self { tokens, store }
    }

    /// End the session on this client: blacklist the presented access
    /// token and revoke the refresh token cached for this client IP
    pub async fn execute(
        &self,
        account_id: &AccountId,
        access_token: &str,
        client_ip: &str,
    ) -> AuthResult<()> {
        self.tokens
            .blacklist_access_token(account_id, access_token)
            .await?;

        let cached = self
            .store
            .get(&keys::refresh_token(account_id, client_ip))
            .await?;
        self.tokens.drop_cached_refresh(account_id, client_ip).await?;

        if let Some(refresh_value) = cached {
            self.tokens
                .revoke_matching(account_id, &refresh_value, client_ip, RevocationReason::Logout)
                .await?;
        }

        info!(account_id = %account_id, "logged out");
        Ok(())
    }

    /// End every session for the account
    pub async fn execute_all(
        &self,
        account_id: &AccountId,
        access_token: &str,
        client_ip: &str,
    ) -> AuthResult<()> {
        self.tokens
            .blacklist_access_token(account_id, access_token)
            .await?;
        self.tokens.drop_cached_refresh(account_id, client_ip).await?;

        let revoked = self
            .tokens
            .revoke_all(account_id, client_ip, RevocationReason::LogoutAll)
            .await?;

        info!(account_id = %account_id, revoked, "logged out everywhere");
        Ok(())
    }
}
