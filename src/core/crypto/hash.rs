//! Truncated Argon2id hash for rotation detection.
//!
//! Two sealed copies of the same plaintext carry the same hash, so operators
//! can tell whether a value changed without decrypting it. At four bytes or
//! fewer this is brute-forceable and must never gate access.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::core::constants::HASH_MAX_LENGTH;
use crate::error::{CipherError, Result};

const ARGON2_ITERATIONS: u32 = 16;
const ARGON2_MEMORY_KIB: u32 = 64;
const ARGON2_PARALLELISM: u32 = 1;

/// Fixed key mixed into every hash in place of a per-value salt.
const HASH_KEY: &[u8] = b"CELLAR_SECRET_HASH_V1";

/// Hash `secret` and truncate the result to `length` bytes (capped at 4).
///
/// Returns an empty vector for `length == 0`.
///
/// # Errors
///
/// Returns `CipherError::Hash` if Argon2 rejects its parameters.
pub fn hash(secret: &[u8], length: u8) -> Result<Vec<u8>> {
    let length = usize::from(length.min(HASH_MAX_LENGTH));
    if length == 0 {
        return Ok(Vec::new());
    }

    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(usize::from(HASH_MAX_LENGTH)),
    )
    .map_err(|e| CipherError::Hash(e.to_string()))?;

    let mut out = [0u8; HASH_MAX_LENGTH as usize];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(secret, HASH_KEY, &mut out)
        .map_err(|e| CipherError::Hash(e.to_string()))?;

    Ok(out[..length].to_vec())
}
