//! File integrity checks (MD5, or SHA-256 for 64-char digests).
//!
//! Digests are computed by streaming the file in fixed-size chunks so memory
//! use stays bounded regardless of file size.

use anyhow::{Context, Result};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Hex length of an MD5 digest.
const MD5_HEX_LEN: usize = 32;
/// Hex length of a SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

fn digest_path<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute MD5 of a file and return the digest as lowercase hex.
pub fn md5_path(path: &Path) -> Result<String> {
    digest_path::<Md5>(path)
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    digest_path::<Sha256>(path)
}

/// MD5 of an in-memory buffer as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Fails unless `expected` has the length of an MD5 or SHA-256 hex digest.
pub fn check_supported(expected: &str) -> Result<()> {
    match expected.len() {
        MD5_HEX_LEN | SHA256_HEX_LEN => Ok(()),
        n => anyhow::bail!(
            "unsupported checksum {:?}: {} hex chars, expected {} (MD5) or {} (SHA-256)",
            expected,
            n,
            MD5_HEX_LEN,
            SHA256_HEX_LEN
        ),
    }
}

/// Digest an in-memory buffer with the algorithm implied by the length of
/// `expected`; `None` for unsupported lengths.
pub fn digest_bytes(data: &[u8], expected: &str) -> Option<String> {
    match expected.len() {
        MD5_HEX_LEN => Some(md5_hex(data)),
        SHA256_HEX_LEN => Some(hex::encode(Sha256::digest(data))),
        _ => None,
    }
}

/// Like [`verify`], for content already read into memory.
pub fn verify_bytes(data: &[u8], expected: &str) -> bool {
    match digest_bytes(data, expected) {
        Some(actual) => actual.eq_ignore_ascii_case(expected),
        None => {
            tracing::warn!(%expected, "unsupported checksum length {}", expected.len());
            false
        }
    }
}

/// Digest `path` with the algorithm implied by the length of `expected`.
/// Returns `Ok(None)` when `expected` is neither an MD5 nor a SHA-256 digest.
pub fn digest_for(path: &Path, expected: &str) -> Result<Option<String>> {
    match expected.len() {
        MD5_HEX_LEN => md5_path(path).map(Some),
        SHA256_HEX_LEN => sha256_path(path).map(Some),
        _ => Ok(None),
    }
}

/// Returns true if `path` exists, is readable and its digest equals `expected`
/// (hex, case-insensitive). Missing or unreadable files never verify.
pub fn verify(path: &Path, expected: &str) -> bool {
    match digest_for(path, expected) {
        Ok(Some(actual)) => {
            let ok = actual.eq_ignore_ascii_case(expected);
            tracing::debug!(path = %path.display(), %actual, %expected, ok, "checksum");
            ok
        }
        Ok(None) => {
            tracing::warn!(%expected, "unsupported checksum length {}", expected.len());
            false
        }
        Err(e) => {
            tracing::debug!("checksum skipped: {:#}", e);
            false
        }
    }
}
