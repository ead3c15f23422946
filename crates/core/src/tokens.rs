//! Scan-token generation.
//!
//! Batches and units carry opaque hex tokens embedded in scannable URLs.
//! Tokens are random and unique by construction (128 bits); the database
//! additionally enforces uniqueness.

use rand::Rng;

/// Number of random bytes per scan token (hex-encoded to 32 characters).
pub const TOKEN_BYTES: usize = 16;

/// Generate a fresh opaque scan token.
pub fn generate_scan_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_32_hex_chars() {
        let token = generate_scan_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_scan_token();
        let b = generate_scan_token();
        assert_ne!(a, b);
    }
}
