//! Fetch-if-needed: verify the cached file, otherwise download it to a `.part`
//! temp file, verify the download and rename it into place.

mod progress;
mod storage;
mod transport;

pub use progress::{ProgressLogger, ProgressStats};
pub use storage::{temp_path, TempFile, TEMP_SUFFIX};
pub use transport::{CurlTransport, Transport};

use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::checksum;
use crate::config::FetchConfig;
use crate::error::{Result, SemeionError};

/// Outcome of a successful `ensure_local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The local file already verified; no network call was made.
    AlreadyPresent,
    /// The file was downloaded, verified and moved into place.
    Downloaded { bytes: u64 },
}

/// Make sure `dest_dir/filename` exists and matches `expected_checksum`,
/// downloading it from `url` through `transport` only when it does not.
///
/// A download whose checksum does not match is left at `<filename>.part`
/// and reported as `ChecksumMismatch`; nothing is retried.
pub fn ensure_local(
    url: &str,
    dest_dir: &Path,
    filename: &str,
    expected_checksum: &str,
    config: &FetchConfig,
    transport: &dyn Transport,
) -> Result<FetchStatus> {
    let final_path = dest_dir.join(filename);
    if checksum::verify(&final_path, expected_checksum) {
        tracing::info!("{} already downloaded and verified", final_path.display());
        return Ok(FetchStatus::AlreadyPresent);
    }

    check_url(url).map_err(|e| SemeionError::fetch_failed(url, e))?;
    checksum::check_supported(expected_checksum)
        .map_err(|e| SemeionError::fetch_failed(url, e))?;
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("create {}", dest_dir.display()))
        .map_err(|e| SemeionError::fetch_failed(url, e))?;

    let tp = temp_path(&final_path);
    tracing::info!("downloading {} to {}", url, final_path.display());
    let (tmp, bytes) = download_to(url, &tp, filename, config, transport)
        .map_err(|e| SemeionError::fetch_failed(url, e))?;

    let actual = checksum::digest_for(&tp, expected_checksum)
        .and_then(|d| d.context("checksum length changed after validation"))
        .map_err(|e| SemeionError::fetch_failed(url, e))?;
    if !actual.eq_ignore_ascii_case(expected_checksum) {
        tracing::warn!(
            "checksum mismatch for {}: expected {}, got {}; leaving file for inspection",
            tp.display(),
            expected_checksum,
            actual
        );
        return Err(SemeionError::ChecksumMismatch {
            path: tp,
            expected: expected_checksum.to_string(),
            actual,
        });
    }

    tmp.finalize(&final_path)
        .map_err(|e| SemeionError::fetch_failed(url, e))?;
    tracing::info!("downloaded {} bytes to {}", bytes, final_path.display());
    Ok(FetchStatus::Downloaded { bytes })
}

/// Only plain HTTP(S) resources are fetched.
fn check_url(url: &str) -> anyhow::Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("invalid URL {:?}", url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("unsupported URL scheme {:?}", other),
    }
}

fn download_to(
    url: &str,
    temp_path: &Path,
    label: &str,
    config: &FetchConfig,
    transport: &dyn Transport,
) -> anyhow::Result<(TempFile, u64)> {
    let mut tmp = TempFile::create(temp_path)?;
    let mut progress = ProgressLogger::new(label, config.show_progress);
    let bytes = transport.fetch(url, &mut tmp, config, &mut |done, total| {
        progress.update(done, total);
    })?;
    tmp.flush()?;
    tmp.sync()?;
    Ok((tmp, bytes))
}
