//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod login;
pub mod logout;
pub mod register;
pub mod resolver;
pub mod tokens;
pub mod verification;
pub mod verify_email;
pub mod verify_login_code;
pub mod verify_phone;

// Re-exports
pub use config::AuthConfig;
pub use login::{LoginChallenge, LoginInput, LoginUseCase, VerificationChannel};
pub use logout::LogoutUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use resolver::{IdentityResolver, PasswordCheck};
pub use tokens::{AccessClaims, TokenEngine};
pub use verification::VerificationCodeEngine;
pub use verify_email::VerifyEmailUseCase;
pub use verify_login_code::{AuthTokens, VerifyLoginCodeUseCase};
pub use verify_phone::VerifyPhoneUseCase;
