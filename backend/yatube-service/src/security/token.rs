/// Opaque API tokens
///
/// A token is 20 random bytes rendered as 40 lowercase hex characters. Only the
/// SHA-256 digest of a token is ever persisted.
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

pub const TOKEN_BYTES: usize = 20;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Tokens that could never have been minted are rejected before any lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.to_ascii_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}
