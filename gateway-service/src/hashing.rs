use sha2::{Digest, Sha256};

/// Hash an identity secret to its stable opaque handle: SHA-256 over the raw
/// secret, lowercase hex, no prefix. Safe to log and index.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
