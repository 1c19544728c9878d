//! Notification Dispatch Interfaces
//!
//! Outbound delivery traits. Transport internals live in the
//! infrastructure layer; the domain only knows "send this" and, for the
//! phone channel, "did the provider approve this code".

use crate::domain::value_object::{email::Email, phone::PhoneNumber};
use crate::error::AuthResult;

/// Outcome of a provider-side code check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matched; the challenge is satisfied
    Approved,
    /// Challenge still open, code did not match
    Pending,
    /// Anything else the provider reports (expired, canceled, max attempts)
    Rejected,
}

/// Email delivery trait
#[trait_variant::make(MailNotifier: Send)]
pub trait LocalMailNotifier {
    /// Send an HTML email
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> AuthResult<()>;
}

/// SMS verification provider trait
///
/// The provider owns the phone code lifecycle: we ask it to start a
/// challenge and later to check a submitted code. Codes are never
/// stored or compared locally.
#[trait_variant::make(PhoneNotifier: Send)]
pub trait LocalPhoneNotifier {
    /// Start a verification challenge for the phone
    async fn send_code(&self, phone: &PhoneNumber) -> AuthResult<()>;

    /// Check a submitted code against the open challenge
    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> AuthResult<CodeCheck>;
}
