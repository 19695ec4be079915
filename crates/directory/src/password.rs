//! Password credential helpers. The directory stores SHA-1 hex hashes.

use rand::Rng;
use sha1::{Digest, Sha1};

use gaccount_core::error::{AccountError, Result};

/// The hash function name sent alongside hashed passwords.
pub const HASH_FUNCTION: &str = "SHA-1";

const RANDOM_PASSWORD_LEN: usize = 30;

/// True for exactly 40 hex characters, either case.
pub fn is_password_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn validate_password_hash(hash: &str) -> Result<()> {
    if is_password_hash(hash) {
        return Ok(());
    }
    Err(AccountError::Validation(
        "password must be a 40 character SHA-1 hex hash".into(),
    ))
}

/// SHA-1 hex digest of a plaintext password.
pub fn hash_password(plain: &str) -> String {
    hex::encode(Sha1::digest(plain.as_bytes()))
}

/// Hash of a random printable-ASCII password, used for freshly created
/// accounts until the owner activates them.
pub fn random_password_hash() -> String {
    let mut rng = rand::thread_rng();
    let plain: String = (0..RANDOM_PASSWORD_LEN)
        .map(|_| char::from(rng.gen_range(33u8..=126u8)))
        .collect();
    hash_password(&plain)
}
