//! Base58 text encoding and randomness helpers.
//!
//! Token bodies use base58check (bitcoin alphabet plus a four byte checksum),
//! so a corrupted character is reported as a format error instead of decoding
//! into a different key.

use crate::error::{CipherError, Result};

/// Encode a token body as base58check.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_check().into_string()
}

/// Decode a base58check token body.
///
/// # Errors
///
/// Returns `CipherError::InvalidFormat` on characters outside the alphabet or
/// a checksum mismatch.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    if encoded.is_empty() {
        return Err(CipherError::format("empty base58 segment").into());
    }
    bs58::decode(encoded)
        .with_check(None)
        .into_vec()
        .map_err(|e| CipherError::format(format!("base58: {}", e)).into())
}

/// Encode identifiers that carry no checksum (vault ids, random names).
pub fn encode_plain(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Fill a fixed-size buffer from the operating system's entropy source.
///
/// # Errors
///
/// Returns `CipherError::Entropy` if the entropy source fails.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CipherError::Entropy(e.to_string()))?;
    Ok(buf)
}
