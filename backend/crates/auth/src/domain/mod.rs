//! Domain Layer
//!
//! Contains entities, value objects, repository traits, and the
//! ephemeral store / notifier interfaces.

pub mod entity;
pub mod notifier;
pub mod repository;
pub mod store;
pub mod value_object;

// Re-exports
pub use entity::{account::Account, refresh_token::RefreshToken};
pub use notifier::{CodeCheck, MailNotifier, PhoneNotifier};
pub use repository::{AccountRepository, RefreshTokenRepository};
pub use store::EphemeralStore;
