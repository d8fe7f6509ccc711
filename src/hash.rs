use sha1::{Digest, Sha1};

use crate::error::{GitError, Result};

pub const HASH_LEN: usize = 20;

/// SHA-1 of an arbitrary byte sequence.
pub fn sha1(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Lowercase 40-character hex encoding of a 20-byte digest.
pub fn hex_of(raw: &[u8; HASH_LEN]) -> String {
    hex::encode(raw)
}

/// Decode a 40-character hex string into a 20-byte digest.
pub fn raw_of(hex_str: &str) -> Result<[u8; HASH_LEN]> {
    if hex_str.len() != HASH_LEN * 2 {
        return Err(GitError::BadHex(format!(
            "expected {} hex chars, got {}",
            HASH_LEN * 2,
            hex_str.len()
        )));
    }
    let bytes = hex::decode(hex_str).map_err(|e| GitError::BadHex(e.to_string()))?;
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}
