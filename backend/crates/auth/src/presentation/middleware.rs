//! Auth Middleware
//!
//! Bearer-token guard for protected routes. Validates the JWT and
//! rejects tokens that were blacklisted by a logout, then exposes the
//! claims and the raw token to downstream handlers via extensions.

use axum::body::Body;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::tokens::TokenEngine;
use crate::domain::repository::RefreshTokenRepository;
use crate::domain::store::EphemeralStore;
use crate::error::AuthError;

/// Raw bearer token, kept around so logout can blacklist exactly the
/// token that authorized the request
#[derive(Clone)]
pub struct BearerToken(pub String);

/// Middleware state
pub struct AuthMiddlewareState<T, S>
where
    T: RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
{
    pub tokens: Arc<TokenEngine<T, S>>,
}

impl<T, S> Clone for AuthMiddlewareState<T, S>
where
    T: RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// Middleware that requires a valid, non-blacklisted access token
pub async fn require_access_token<T, S>(
    state: AuthMiddlewareState<T, S>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    T: RefreshTokenRepository + Send + Sync + 'static,
    S: EphemeralStore + Send + Sync + 'static,
{
    let Some(token) = bearer_token(&req) else {
        return Err(AuthError::Unauthorized.into_response());
    };

    let claims = match state.tokens.decode_access_token(&token) {
        Ok(claims) => claims,
        Err(err) => return Err(err.into_response()),
    };

    let account_id = match claims.account_id() {
        Ok(id) => id,
        Err(err) => return Err(err.into_response()),
    };

    match state.tokens.is_blacklisted(&account_id, &token).await {
        Ok(false) => {}
        Ok(true) => return Err(AuthError::Unauthorized.into_response()),
        Err(err) => return Err(err.into_response()),
    }

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    (!token.is_empty()).then(|| token.to_string())
}
