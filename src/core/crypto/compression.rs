//! Flagged zlib compression for envelope plaintexts.
//!
//! The first byte records the mode: `1` for zlib, `0` for raw. Raw is used
//! whenever compression would not shrink the data, so the output is never
//! larger than the input plus the flag byte.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{CipherError, Result};

const RAW: u8 = 0;
const ZLIB: u8 = 1;

/// Compress `data`, falling back to raw bytes when that is smaller.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    let mut out;
    if compressed.len() < data.len() {
        out = Vec::with_capacity(compressed.len() + 1);
        out.push(ZLIB);
        out.extend_from_slice(&compressed);
    } else {
        out = Vec::with_capacity(data.len() + 1);
        out.push(RAW);
        out.extend_from_slice(data);
    }
    Ok(out)
}

/// Reverse [`compress`].
///
/// # Errors
///
/// Returns `CipherError::DecryptionFailed` for an unknown flag or a corrupt
/// zlib stream. Callers only see this payload after authentication, so a bad
/// payload means the data cannot be trusted.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (flag, body) = data.split_first().ok_or(CipherError::DecryptionFailed)?;
    match *flag {
        RAW => Ok(body.to_vec()),
        ZLIB => {
            let mut out = Vec::new();
            ZlibDecoder::new(body)
                .read_to_end(&mut out)
                .map_err(|_| CipherError::DecryptionFailed)?;
            Ok(out)
        }
        _ => Err(CipherError::DecryptionFailed.into()),
    }
}
