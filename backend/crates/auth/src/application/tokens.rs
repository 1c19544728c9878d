//! Token Engine
//!
//! Access tokens are short-lived HS256 JWTs carrying identity claims.
//! Refresh tokens are opaque random strings persisted in the database
//! and mirrored into the ephemeral store per account/client-IP pair.
//! Revocation is DB-side for refresh tokens and blacklist-side for
//! access tokens still inside their lifetime.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::AccountId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::entity::refresh_token::{RefreshToken, RevocationReason};
use crate::domain::repository::RefreshTokenRepository;
use crate::domain::store::{EphemeralStore, keys};
use crate::error::{AuthError, AuthResult};

/// Random bytes behind each opaque refresh token
const REFRESH_TOKEN_BYTES: usize = 64;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id
    pub sub: String,
    /// Unique token id
    pub jti: String,
    /// Username handle
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// Parse the subject back into an account id
    pub fn account_id(&self) -> AuthResult<AccountId> {
        AccountId::parse(&self.sub).map_err(|_| AuthError::Unauthorized)
    }
}

pub struct TokenEngine<T, S> {
    tokens: Arc<T>,
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<T, S> TokenEngine<T, S>
where
    T: RefreshTokenRepository,
    S: EphemeralStore,
{
    pub fn new(tokens: Arc<T>, store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            tokens,
            store,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Access tokens
    // ------------------------------------------------------------------

    /// Sign a fresh access token for the account
    pub fn issue_access_token(&self, account: &Account) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: account.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            name: account.username.to_string(),
            email: account.email.to_string(),
            roles: vec![account.role.as_str().to_string()],
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::from_std(self.config.access_token_ttl)
                .map_err(|e| AuthError::Internal(e.to_string()))?)
            .timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {}", e)))
    }

    /// Decode and validate an access token's signature, lifetime,
    /// issuer, and audience
    pub fn decode_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            debug!(error = %err, "access token rejected");
            AuthError::Unauthorized
        })
    }

    /// Blacklist an access token for the remainder of its lifetime
    pub async fn blacklist_access_token(
        &self,
        account_id: &AccountId,
        token: &str,
    ) -> AuthResult<()> {
        self.store
            .set(
                &keys::blacklist(account_id, token),
                "1",
                self.config.blacklist_ttl(),
            )
            .await
    }

    /// Whether this (account, token) pair has been blacklisted
    pub async fn is_blacklisted(&self, account_id: &AccountId, token: &str) -> AuthResult<bool> {
        Ok(self
            .store
            .get(&keys::blacklist(account_id, token))
            .await?
            .is_some())
    }

    // ------------------------------------------------------------------
    // Refresh tokens
    // ------------------------------------------------------------------

    /// Mint an opaque refresh token value
    pub fn new_refresh_token_value(&self) -> String {
        platform::crypto::opaque_token(REFRESH_TOKEN_BYTES)
    }

    /// Persist a refresh token and mirror it into the ephemeral store
    /// for the issuing client IP
    pub async fn persist_refresh_token(
        &self,
        account_id: &AccountId,
        token_value: &str,
        client_ip: &str,
    ) -> AuthResult<RefreshToken> {
        let token = RefreshToken::new(*account_id, token_value.to_string(), client_ip.to_string());
        self.tokens.create(&token).await?;
        self.store
            .set(
                &keys::refresh_token(account_id, client_ip),
                token_value,
                self.config.refresh_token_ttl,
            )
            .await?;
        Ok(token)
    }

    /// Drop the cached refresh token for an account/client-IP pair
    pub async fn drop_cached_refresh(&self, account_id: &AccountId, client_ip: &str) -> AuthResult<()> {
        self.store
            .delete(&keys::refresh_token(account_id, client_ip))
            .await?;
        Ok(())
    }

    /// Revoke the active refresh token matching `token_value`, if any.
    ///
    /// A stale or already-revoked token is not an error here: the
    /// client's goal is to end the session, and that session is already
    /// over. Such cases are logged and swallowed.
    pub async fn revoke_matching(
        &self,
        account_id: &AccountId,
        token_value: &str,
        client_ip: &str,
        reason: RevocationReason,
    ) -> AuthResult<()> {
        let active = self.tokens.find_all_active(account_id).await?;
        let Some(mut token) = active
            .into_iter()
            .find(|t| platform::crypto::constant_time_eq(t.token.as_bytes(), token_value.as_bytes()))
        else {
            debug!(account_id = %account_id, "no active refresh token matched; nothing to revoke");
            return Ok(());
        };

        match token.revoke(client_ip, reason) {
            Ok(()) => self.tokens.update(&token).await,
            Err(state) => {
                warn!(account_id = %account_id, error = %state, "refresh token changed state mid-revoke");
                Ok(())
            }
        }
    }

    /// Revoke every active refresh token for the account. Idempotent;
    /// returns how many tokens were revoked.
    pub async fn revoke_all(
        &self,
        account_id: &AccountId,
        client_ip: &str,
        reason: RevocationReason,
    ) -> AuthResult<usize> {
        let active = self.tokens.find_all_active(account_id).await?;
        let mut revoked = 0;
        for mut token in active {
            match token.revoke(client_ip, reason) {
                Ok(()) => {
                    self.tokens.update(&token).await?;
                    revoked += 1;
                }
                Err(state) => {
                    warn!(account_id = %account_id, error = %state, "skipping token that changed state mid-revoke");
                }
            }
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRepository, MemoryStore, verified_account};

    fn engine(
        repo: Arc<MemoryRepository>,
        store: Arc<MemoryStore>,
    ) -> TokenEngine<MemoryRepository, MemoryStore> {
        TokenEngine::new(repo, store, Arc::new(AuthConfig::with_random_secret()))
    }

    #[test]
    fn test_access_token_round_trip() {
        let engine = engine(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryStore::new()),
        );
        let account = verified_account("ada@example.com", "ada", "S3cure-pass");

        let token = engine.issue_access_token(&account).unwrap();
        let claims = engine.decode_access_token(&token).unwrap();

        assert_eq!(claims.account_id().unwrap(), account.id);
        assert_eq!(claims.name, "ada");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.roles, vec!["Patient".to_string()]);
        assert_eq!(claims.iss, "clinic-api");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let account = verified_account("ada@example.com", "ada", "S3cure-pass");
        let signer = engine(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryStore::new()),
        );
        let verifier = engine(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryStore::new()),
        );

        let token = signer.issue_access_token(&account).unwrap();
        let err = verifier.decode_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_blacklist_round_trip() {
        let engine = engine(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryStore::new()),
        );
        let id = AccountId::new();

        assert!(!engine.is_blacklisted(&id, "tok").await.unwrap());
        engine.blacklist_access_token(&id, "tok").await.unwrap();
        assert!(engine.is_blacklisted(&id, "tok").await.unwrap());
        // Scoped per account
        assert!(!engine.is_blacklisted(&AccountId::new(), "tok").await.unwrap());
    }

    #[tokio::test]
    async fn test_persist_and_revoke_all() {
        let repo = Arc::new(MemoryRepository::new());
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&repo), Arc::clone(&store));
        let id = AccountId::new();

        for _ in 0..3 {
            let value = engine.new_refresh_token_value();
            engine
                .persist_refresh_token(&id, &value, "10.0.0.1")
                .await
                .unwrap();
        }

        let revoked = engine
            .revoke_all(&id, "10.0.0.1", RevocationReason::LogoutAll)
            .await
            .unwrap();
        assert_eq!(revoked, 3);

        // Second pass finds nothing active
        let revoked = engine
            .revoke_all(&id, "10.0.0.1", RevocationReason::LogoutAll)
            .await
            .unwrap();
        assert_eq!(revoked, 0);
    }

    #[tokio::test]
    async fn test_revoke_matching_swallows_unknown_token() {
        let engine = engine(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryStore::new()),
        );
        let id = AccountId::new();

        engine
            .revoke_matching(&id, "never-issued", "10.0.0.1", RevocationReason::Logout)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_persist_mirrors_into_store() {
        let repo = Arc::new(MemoryRepository::new());
        let store = Arc::new(MemoryStore::new());
        let engine = engine(repo, Arc::clone(&store));
        let id = AccountId::new();

        let value = engine.new_refresh_token_value();
        engine
            .persist_refresh_token(&id, &value, "10.0.0.1")
            .await
            .unwrap();

        let key = format!("refresh:{}:10.0.0.1", id);
        assert_eq!(store.peek(&key), Some(value));
    }
}
