//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, RefreshTokenId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::account::Account;
use crate::domain::entity::refresh_token::{RefreshToken, RevocationReason};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::value_object::{
    email::Email, phone::PhoneNumber, role::Role, user_name::UserName,
    user_password::UserPassword,
};
use crate::error::AuthResult;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete refresh tokens whose lifetime ended long ago
    pub async fn cleanup_expired_tokens(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now() - chrono::Duration::days(30))
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

const ACCOUNT_COLUMNS: &str = r#"
    id,
    email,
    username,
    phone,
    password_hash,
    email_confirmed,
    phone_confirmed,
    role,
    failed_login_count,
    lockout_until,
    first_name,
    last_name,
    created_at,
    updated_at
"#;

impl AccountRepository for PgAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id,
                email,
                username,
                phone,
                password_hash,
                email_confirmed,
                phone_confirmed,
                role,
                failed_login_count,
                lockout_until,
                first_name,
                last_name,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.phone.as_ref().map(|p| p.as_str()))
        .bind(account.password.as_phc_string())
        .bind(account.email_confirmed)
        .bind(account.phone_confirmed)
        .bind(account.role.id())
        .bind(account.failed_login_count)
        .bind(account.lockout_until)
        .bind(account.first_name.as_deref())
        .bind(account.last_name.as_deref())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_username(&self, username: &UserName) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_confirmed_phone(&self, phone: &PhoneNumber) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE phone = $1 AND phone_confirmed = TRUE"
        ))
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    async fn exists_by_phone(&self, phone: &PhoneNumber) -> AuthResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE phone = $1)")
                .bind(phone.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                username = $3,
                phone = $4,
                password_hash = $5,
                email_confirmed = $6,
                phone_confirmed = $7,
                role = $8,
                failed_login_count = $9,
                lockout_until = $10,
                first_name = $11,
                last_name = $12,
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.phone.as_ref().map(|p| p.as_str()))
        .bind(account.password.as_phc_string())
        .bind(account.email_confirmed)
        .bind(account.phone_confirmed)
        .bind(account.role.id())
        .bind(account.failed_login_count)
        .bind(account.lockout_until)
        .bind(account.first_name.as_deref())
        .bind(account.last_name.as_deref())
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

const TOKEN_COLUMNS: &str = r#"
    id,
    account_id,
    token,
    created_at,
    expires_at,
    revoked,
    used,
    created_by_ip,
    revoked_at,
    revoked_by_ip,
    revocation_reason,
    replaced_by
"#;

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id,
                account_id,
                token,
                created_at,
                expires_at,
                revoked,
                used,
                created_by_ip,
                revoked_at,
                revoked_by_ip,
                revocation_reason,
                replaced_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.account_id.as_uuid())
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.used)
        .bind(&token.created_by_ip)
        .bind(token.revoked_at)
        .bind(token.revoked_by_ip.as_deref())
        .bind(token.revocation_reason.map(|r| r.as_str()))
        .bind(token.replaced_by.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active(&self, account_id: &AccountId) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            SELECT {TOKEN_COLUMNS} FROM refresh_tokens
            WHERE account_id = $1
              AND revoked = FALSE
              AND used = FALSE
              AND expires_at >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(account_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshTokenRow::into_token))
    }

    async fn find_all_active(&self, account_id: &AccountId) -> AuthResult<Vec<RefreshToken>> {
        let rows = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            SELECT {TOKEN_COLUMNS} FROM refresh_tokens
            WHERE account_id = $1
              AND revoked = FALSE
              AND used = FALSE
              AND expires_at >= $2
            "#
        ))
        .bind(account_id.as_uuid())
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RefreshTokenRow::into_token).collect())
    }

    async fn update(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET
                revoked = $2,
                used = $3,
                revoked_at = $4,
                revoked_by_ip = $5,
                revocation_reason = $6,
                replaced_by = $7
            WHERE id = $1
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.revoked)
        .bind(token.used)
        .bind(token.revoked_at)
        .bind(token.revoked_by_ip.as_deref())
        .bind(token.revocation_reason.map(|r| r.as_str()))
        .bind(token.replaced_by.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    username: String,
    phone: Option<String>,
    password_hash: String,
    email_confirmed: bool,
    phone_confirmed: bool,
    role: i16,
    failed_login_count: i16,
    lockout_until: Option<DateTime<Utc>>,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            email: Email::from_db(self.email),
            username: UserName::from_db(self.username),
            phone: self.phone.map(PhoneNumber::from_db),
            password: UserPassword::from_phc_string(self.password_hash)?,
            email_confirmed: self.email_confirmed,
            phone_confirmed: self.phone_confirmed,
            role: Role::from_id(self.role),
            failed_login_count: self.failed_login_count,
            lockout_until: self.lockout_until,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    account_id: Uuid,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked: bool,
    used: bool,
    created_by_ip: String,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by_ip: Option<String>,
    revocation_reason: Option<String>,
    replaced_by: Option<String>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: RefreshTokenId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            token: self.token,
            created_at: self.created_at,
            expires_at: self.expires_at,
            revoked: self.revoked,
            used: self.used,
            created_by_ip: self.created_by_ip,
            revoked_at: self.revoked_at,
            revoked_by_ip: self.revoked_by_ip,
            revocation_reason: self.revocation_reason.as_deref().and_then(RevocationReason::parse),
            replaced_by: self.replaced_by,
        }
    }
}
