//! Auth Router

use axum::{Router, middleware::from_fn, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::notifier::{MailNotifier, PhoneNotifier};
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::store::EphemeralStore;
use crate::infra::postgres::PgAuthRepository;
use crate::infra::redis::RedisStore;
use crate::infra::smtp::SmtpMailer;
use crate::infra::twilio::TwilioVerifyClient;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_access_token};

/// Create the Auth router with the production adapters
pub fn auth_router(
    repo: PgAuthRepository,
    store: RedisStore,
    mailer: SmtpMailer,
    phone: TwilioVerifyClient,
    config: AuthConfig,
) -> Router {
    auth_router_generic(repo, store, mailer, phone, config)
}

/// Create the Auth router over any adapter implementations
pub fn auth_router_generic<R, S, M, P>(
    repo: R,
    store: S,
    mailer: M,
    phone: P,
    config: AuthConfig,
) -> Router
where
    R: AccountRepository + RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
    M: MailNotifier + Send + Sync + 'static,
    P: PhoneNotifier + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        store: Arc::new(store),
        mailer: Arc::new(mailer),
        phone: Arc::new(phone),
        config: Arc::new(config),
    };

    let guard = AuthMiddlewareState {
        tokens: state.token_engine(),
    };

    let protected = Router::new()
        .route("/verify-phone", post(handlers::verify_phone::<R, S, M, P>))
        .route(
            "/resend-phone-code",
            post(handlers::resend_phone_code::<R, S, M, P>),
        )
        .route("/logout", post(handlers::logout::<R, S, M, P>))
        .route("/logout-all", post(handlers::logout_all::<R, S, M, P>))
        .route_layer(from_fn(move |req, next| {
            require_access_token(guard.clone(), req, next)
        }));

    Router::new()
        .route("/register", post(handlers::register::<R, S, M, P>))
        .route("/login", post(handlers::login::<R, S, M, P>))
        .route(
            "/verify-login-code",
            post(handlers::verify_login_code::<R, S, M, P>),
        )
        .route("/verify-email", post(handlers::verify_email::<R, S, M, P>))
        .route(
            "/resend-email-code",
            post(handlers::resend_email_code::<R, S, M, P>),
        )
        .merge(protected)
        .with_state(state)
}
