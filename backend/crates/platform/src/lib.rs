//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, verification codes, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Client IP extraction from HTTP headers

pub mod client;
pub mod crypto;
pub mod password;
