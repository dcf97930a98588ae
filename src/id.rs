//! Random id and nonce generation.
//!
//! Ceremony ids are the correlation handle the server trusts between the
//! "begin" and "complete" halves of a ceremony, so they carry 128 bits of
//! entropy and are URL-safe. Challenge nonces are 32 bytes of raw randomness.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Random bytes per generated id (128 bits).
const ID_ENTROPY_BYTES: usize = 16;

/// Random bytes per ceremony challenge nonce.
const CHALLENGE_BYTES: usize = 32;

/// Generate a prefixed, URL-safe id with 128 bits of entropy.
///
/// The format is `{prefix}_{random}` where the random part is base64url
/// without padding.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS random source unavailable");

    format!("{prefix}_{}", BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// Check that an id is `{expected_prefix}_` followed by at least 128 bits of
/// base64url-encoded randomness.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= ID_ENTROPY_BYTES,
        Err(_) => false,
    }
}

/// Generate a fresh random challenge nonce for one ceremony attempt.
pub fn generate_challenge() -> Vec<u8> {
    let mut bytes = vec![0u8; CHALLENGE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS random source unavailable");
    bytes
}
