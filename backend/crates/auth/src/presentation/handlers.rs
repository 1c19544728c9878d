//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;

use kernel::response::ApiResponse;
use platform::client::extract_client_ip;

use crate::application::config::AuthConfig;
use crate::application::resolver::IdentityResolver;
use crate::application::tokens::{AccessClaims, TokenEngine};
use crate::application::verification::VerificationCodeEngine;
use crate::application::{
    AuthTokens, LoginInput, LoginUseCase, LogoutUseCase, RegisterInput, RegisterUseCase,
    VerifyEmailUseCase, VerifyLoginCodeUseCase, VerifyPhoneUseCase,
};
use crate::domain::notifier::{MailNotifier, PhoneNotifier};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::store::EphemeralStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthTokensResponse, LoginChallengeResponse, LoginRequest, RegisterRequest, RegisterResponse,
    ResendEmailCodeRequest, VerifyEmailRequest, VerifyLoginCodeRequest, VerifyPhoneRequest,
};
use crate::presentation::middleware::BearerToken;

/// Shared state for auth handlers
pub struct AuthAppState<R, S, M, P>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub store: Arc<S>,
    pub mailer: Arc<M>,
    pub phone: Arc<P>,
    pub config: Arc<AuthConfig>,
}

// Arc fields only, so Clone must not require it of the adapters
impl<R, S, M, P> Clone for AuthAppState<R, S, M, P>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            store: Arc::clone(&self.store),
            mailer: Arc::clone(&self.mailer),
            phone: Arc::clone(&self.phone),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, S, M, P> AuthAppState<R, S, M, P>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    pub fn resolver(&self) -> Arc<IdentityResolver<R, S>> {
        Arc::new(IdentityResolver::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        ))
    }

    pub fn verification(&self) -> Arc<VerificationCodeEngine<R, S, M, P>> {
        Arc::new(VerificationCodeEngine::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.store),
            Arc::clone(&self.mailer),
            Arc::clone(&self.phone),
            Arc::clone(&self.config),
        ))
    }

    pub fn token_engine(&self) -> Arc<TokenEngine<R, S>> {
        Arc::new(TokenEngine::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        ))
    }
}

fn client_ip(headers: &HeaderMap, addr: std::net::SocketAddr) -> String {
    extract_client_ip(headers, Some(addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn tokens_response(bundle: AuthTokens) -> AuthTokensResponse {
    AuthTokensResponse {
        account_id: bundle.account_id,
        email: bundle.email,
        username: bundle.username,
        role: bundle.role,
        access_token: bundle.access_token,
        refresh_token: bundle.refresh_token,
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        Arc::clone(&state.repo),
        Arc::clone(&state.store),
        state.verification(),
        Arc::clone(&state.config),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            username: req.username,
            password: req.password,
            phone: req.phone,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            StatusCode::CREATED.as_u16(),
            "Registered. Check your email for the verification code",
            RegisterResponse {
                account_id: output.account_id,
                email: output.email,
                username: output.username,
                pending_session_token: output.pending_session_token,
            },
        )),
    ))
}

// ============================================================================
// Login, step one
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.resolver(), state.verification());

    let challenge = use_case
        .execute(LoginInput {
            identifier: req.identifier,
            password: req.password,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Verification code sent",
        LoginChallengeResponse {
            channel: challenge.channel.as_str().to_string(),
            destination: challenge.destination,
        },
    )))
}

// ============================================================================
// Login, step two
// ============================================================================

/// POST /api/auth/verify-login-code
pub async fn verify_login_code<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<VerifyLoginCodeRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let client_ip = client_ip(&headers, addr);

    let use_case =
        VerifyLoginCodeUseCase::new(state.resolver(), state.verification(), state.token_engine());

    let bundle = use_case
        .execute(&req.identifier, &req.code, &client_ip)
        .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Login successful",
        tokens_response(bundle),
    )))
}

// ============================================================================
// Email verification
// ============================================================================

/// POST /api/auth/verify-email
pub async fn verify_email<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let client_ip = client_ip(&headers, addr);

    let use_case = VerifyEmailUseCase::new(
        Arc::clone(&state.repo),
        state.verification(),
        state.token_engine(),
    );

    let bundle = use_case
        .execute(&req.email, &req.code, &client_ip)
        .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Email verified",
        tokens_response(bundle),
    )))
}

/// POST /api/auth/resend-email-code
pub async fn resend_email_code<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    Json(req): Json<ResendEmailCodeRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let sent = state
        .verification()
        .resend_email(&req.pending_session_token)
        .await?;

    // One answer for unknown sessions, verified accounts, and rate
    // limits alike
    if sent {
        Ok(Json(ApiResponse::<()>::success_empty(
            StatusCode::OK.as_u16(),
            "Verification code sent",
        )))
    } else {
        Err(AuthError::CodeResendUnavailable)
    }
}

// ============================================================================
// Phone verification (protected)
// ============================================================================

/// POST /api/auth/verify-phone
pub async fn verify_phone<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    axum::Extension(claims): axum::Extension<AccessClaims>,
    Json(req): Json<VerifyPhoneRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let account_id = claims.account_id()?;
    let use_case = VerifyPhoneUseCase::new(Arc::clone(&state.repo), state.verification());

    use_case.execute(&account_id, &req.code).await?;

    Ok(Json(ApiResponse::<()>::success_empty(
        StatusCode::OK.as_u16(),
        "Phone number verified",
    )))
}

/// POST /api/auth/resend-phone-code
pub async fn resend_phone_code<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    axum::Extension(claims): axum::Extension<AccessClaims>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let account_id = claims.account_id()?;
    let Some(account) = state.repo.find_by_id(&account_id).await?
    else {
        return Err(AuthError::AccountNotFound);
    };

    let sent = state.verification().resend_phone(&account).await?;

    if sent {
        Ok(Json(ApiResponse::<()>::success_empty(
            StatusCode::OK.as_u16(),
            "Verification code sent",
        )))
    } else {
        Err(AuthError::CodeResendUnavailable)
    }
}

// ============================================================================
// Logout (protected)
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    axum::Extension(claims): axum::Extension<AccessClaims>,
    axum::Extension(BearerToken(access_token)): axum::Extension<BearerToken>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let client_ip = client_ip(&headers, addr);
    let account_id = claims.account_id()?;

    let use_case = LogoutUseCase::new(state.token_engine(), Arc::clone(&state.store));
    use_case
        .execute(&account_id, &access_token, &client_ip)
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty(
        StatusCode::OK.as_u16(),
        "Logged out",
    )))
}

/// POST /api/auth/logout-all
pub async fn logout_all<R, S, M, P>(
    State(state): State<AuthAppState<R, S, M, P>>,
    axum::Extension(claims): axum::Extension<AccessClaims>,
    axum::Extension(BearerToken(access_token)): axum::Extension<BearerToken>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let client_ip = client_ip(&headers, addr);
    let account_id = claims.account_id()?;

    let use_case = LogoutUseCase::new(state.token_engine(), Arc::clone(&state.store));
    use_case
        .execute_all(&account_id, &access_token, &client_ip)
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty(
        StatusCode::OK.as_u16(),
        "Logged out on all devices",
    )))
}
