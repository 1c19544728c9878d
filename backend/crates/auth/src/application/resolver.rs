//! Identity Resolution
//!
//! Turns a raw login identifier into an account, fronted by a 24-hour
//! identifier cache, and runs the password/lockout check that every
//! credential-bearing flow shares.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::AccountId;
use tracing::warn;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::store::{EphemeralStore, keys};
use crate::domain::value_object::login_identifier::LoginIdentifier;
use crate::domain::value_object::user_password::RawPassword;
use crate::error::AuthResult;

/// Outcome of a password check against a loaded account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Password matched and the account is not locked
    Ok,
    /// Password did not match; the failure has been recorded
    WrongPassword,
    /// Account is locked out for at least this many minutes
    LockedOut(i64),
}

/// Shared identifier-to-account resolution
pub struct IdentityResolver<R, S> {
    accounts: Arc<R>,
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<R, S> IdentityResolver<R, S>
where
    R: AccountRepository,
    S: EphemeralStore,
{
    pub fn new(accounts: Arc<R>, store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            accounts,
            store,
            config,
        }
    }

    /// Resolve an identifier to its account, if any.
    ///
    /// Email and username lookups consult the cache first. Phone lookups
    /// always go to the database, because only a confirmed phone may
    /// authenticate and confirmation status can change under the cache.
    pub async fn resolve(&self, identifier: &LoginIdentifier) -> AuthResult<Option<Account>> {
        match identifier {
            LoginIdentifier::Email(email) => {
                let key = keys::account_by_email(email);
                if let Some(account) = self.from_cache(&key).await? {
                    return Ok(Some(account));
                }
                let found = self.accounts.find_by_email(email).await?;
                if let Some(ref account) = found {
                    self.cache(&key, &account.id).await;
                }
                Ok(found)
            }
            LoginIdentifier::Username(username) => {
                let key = keys::account_by_username(username);
                if let Some(account) = self.from_cache(&key).await? {
                    return Ok(Some(account));
                }
                let found = self.accounts.find_by_username(username).await?;
                if let Some(ref account) = found {
                    self.cache(&key, &account.id).await;
                }
                Ok(found)
            }
            LoginIdentifier::Phone(phone) => {
                let found = self.accounts.find_by_confirmed_phone(phone).await?;
                if let Some(ref account) = found {
                    self.cache(&keys::account_by_phone(phone), &account.id).await;
                }
                Ok(found)
            }
        }
    }

    /// Check a password attempt, persisting lockout state.
    ///
    /// While locked, the password is not even verified. A wrong password
    /// increments the failure counter and may trip the lockout; a
    /// correct one clears any accumulated failures.
    pub async fn check_password(
        &self,
        account: &mut Account,
        password: &str,
    ) -> AuthResult<PasswordCheck> {
        let now = Utc::now();
        if account.is_locked(now) {
            return Ok(PasswordCheck::LockedOut(
                account.lockout_remaining_minutes(now),
            ));
        }

        // An attempt that fails the password policy cannot equal any
        // stored password, so it counts as a plain mismatch
        let matched = RawPassword::new(password.to_string())
            .map(|raw| account.password.verify(&raw, self.config.pepper()))
            .unwrap_or(false);

        if matched {
            if account.failed_login_count > 0 {
                account.reset_login_failures();
                self.accounts.update(account).await?;
            }
            return Ok(PasswordCheck::Ok);
        }

        account.record_login_failure(now);
        self.accounts.update(account).await?;

        if account.is_locked(now) {
            Ok(PasswordCheck::LockedOut(
                account.lockout_remaining_minutes(now),
            ))
        } else {
            Ok(PasswordCheck::WrongPassword)
        }
    }

    async fn from_cache(&self, key: &str) -> AuthResult<Option<Account>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let Ok(id) = AccountId::parse(&raw) else {
            warn!(key, "identifier cache held an unparseable account id");
            let _ = self.store.delete(key).await;
            return Ok(None);
        };
        // A cached id whose row is gone falls through to a fresh lookup
        self.accounts.find_by_id(&id).await
    }

    async fn cache(&self, key: &str, id: &AccountId) {
        let ttl = self.config.identifier_cache_ttl;
        if let Err(err) = self.store.set(key, &id.to_string(), ttl).await {
            warn!(key, error = %err, "failed to cache identifier lookup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::account::LOCKOUT_THRESHOLD;
    use crate::testing::{MemoryRepository, MemoryStore, verified_account};

    fn resolver(
        repo: Arc<MemoryRepository>,
        store: Arc<MemoryStore>,
    ) -> IdentityResolver<MemoryRepository, MemoryStore> {
        IdentityResolver::new(repo, store, Arc::new(AuthConfig::with_random_secret()))
    }

    #[tokio::test]
    async fn test_resolve_email_populates_cache() {
        let account = verified_account("ada@example.com", "ada", "S3cure-pass");
        let id = account.id;
        let repo = Arc::new(MemoryRepository::with_account(account));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(repo, Arc::clone(&store));

        let identifier = LoginIdentifier::classify("ada@example.com").unwrap();
        let found = resolver.resolve(&identifier).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(
            store.peek("account:email:ada@example.com"),
            Some(id.to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_unknown_username_is_none() {
        let repo = Arc::new(MemoryRepository::new());
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(repo, store);

        let identifier = LoginIdentifier::classify("nobody").unwrap();
        assert!(resolver.resolve(&identifier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_phone_requires_confirmation() {
        let mut account = verified_account("ada@example.com", "ada", "S3cure-pass");
        account.phone = Some(
            crate::domain::value_object::phone::PhoneNumber::new("+15551234567").unwrap(),
        );
        // phone_confirmed stays false
        let repo = Arc::new(MemoryRepository::with_account(account));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(repo, store);

        let identifier = LoginIdentifier::classify("+15551234567").unwrap();
        assert!(resolver.resolve(&identifier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_cache_entry_falls_back_to_database() {
        let account = verified_account("ada@example.com", "ada", "S3cure-pass");
        let id = account.id;
        let repo = Arc::new(MemoryRepository::with_account(account));
        let store = Arc::new(MemoryStore::new());
        // Cache points at an account that no longer exists
        store
            .set(
                "account:email:ada@example.com",
                &AccountId::new().to_string(),
                std::time::Duration::from_secs(60),
            )
            .await
            .unwrap();
        let resolver = resolver(repo, store);

        let identifier = LoginIdentifier::classify("ada@example.com").unwrap();
        let found = resolver.resolve(&identifier).await.unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn test_wrong_password_then_lockout() {
        let repo = Arc::new(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::clone(&repo), store);

        let identifier = LoginIdentifier::classify("ada").unwrap();
        let mut account = resolver.resolve(&identifier).await.unwrap().unwrap();

        for _ in 0..LOCKOUT_THRESHOLD - 1 {
            let check = resolver
                .check_password(&mut account, "wrong-password")
                .await
                .unwrap();
            assert_eq!(check, PasswordCheck::WrongPassword);
        }
        let check = resolver
            .check_password(&mut account, "wrong-password")
            .await
            .unwrap();
        assert!(matches!(check, PasswordCheck::LockedOut(m) if m >= 1));

        // Even the right password is refused while locked
        let check = resolver
            .check_password(&mut account, "S3cure-pass")
            .await
            .unwrap();
        assert!(matches!(check, PasswordCheck::LockedOut(_)));
    }

    #[tokio::test]
    async fn test_correct_password_resets_failures() {
        let repo = Arc::new(MemoryRepository::with_account(verified_account(
            "ada@example.com",
            "ada",
            "S3cure-pass",
        )));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::clone(&repo), store);

        let identifier = LoginIdentifier::classify("ada").unwrap();
        let mut account = resolver.resolve(&identifier).await.unwrap().unwrap();

        resolver
            .check_password(&mut account, "nope-nope-nope")
            .await
            .unwrap();
        assert_eq!(account.failed_login_count, 1);

        let check = resolver
            .check_password(&mut account, "S3cure-pass")
            .await
            .unwrap();
        assert_eq!(check, PasswordCheck::Ok);
        assert_eq!(account.failed_login_count, 0);

        let stored = resolver.resolve(&identifier).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_count, 0);
    }
}
