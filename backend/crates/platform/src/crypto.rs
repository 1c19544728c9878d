//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};

/// Alphabet used for human-facing verification codes.
///
/// Uppercase letters and digits only, so codes survive being read aloud
/// or typed from an SMS.
const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate an opaque token: `len` random bytes, base64-encoded.
pub fn opaque_token(len: usize) -> String {
    to_base64(&random_bytes(len))
}

/// Generate a short verification code of `len` characters.
///
/// Characters are drawn uniformly from [`CODE_ALPHABET`]: CSPRNG bytes
/// past the largest multiple of the alphabet size (252) are rejected
/// rather than folded, so no symbol is over-represented.
pub fn verification_code(len: usize) -> String {
    const ZONE: u8 = (u8::MAX / 36) * 36;

    let mut code = String::with_capacity(len);
    while code.len() < len {
        for b in random_bytes(len) {
            if code.len() == len {
                break;
            }
            if b < ZONE {
                code.push(CODE_ALPHABET[(b % 36) as usize] as char);
            }
        }
    }
    code
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
