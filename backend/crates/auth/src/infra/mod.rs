//! Infrastructure Layer
//!
//! Concrete adapters: PostgreSQL persistence, Redis ephemeral state,
//! SMTP mail delivery, and the Twilio Verify phone channel.

pub mod postgres;
pub mod redis;
pub mod smtp;
pub mod twilio;

pub use postgres::PgAuthRepository;
pub use redis::RedisStore;
pub use smtp::{SmtpConfig, SmtpMailer};
pub use twilio::{TwilioConfig, TwilioVerifyClient};
