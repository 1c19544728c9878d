//! Value Object Module

pub mod email;
pub mod login_identifier;
pub mod phone;
pub mod role;
pub mod user_name;
pub mod user_password;
pub mod verification_code;
