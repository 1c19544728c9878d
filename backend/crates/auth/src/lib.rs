//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database, Redis, and notification transport implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration with email verification
//! - Two-step login: password check, then a code on the matched channel
//!   (email or SMS)
//! - JWT access tokens plus opaque refresh tokens with revocation
//! - Access-token blacklist consulted by the auth middleware
//! - Role-based access (Patient, Doctor, Admin)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Verification codes generated from a CSPRNG; a reissued code
//!   supersedes the previous one immediately
//! - Automatic lockout after failed login attempts
//! - Logout always appears to succeed; stale-token states are logged only

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use infra::redis::RedisStore;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
