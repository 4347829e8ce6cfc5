//! Network primitive behind the fetcher: one GET streamed into a sink.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Duration;

use crate::config::FetchConfig;

/// Retrieves a remote resource. Implementations stream the body into `sink`,
/// call `on_progress(bytes_done, total_bytes)` as data arrives and return the
/// number of body bytes written.
pub trait Transport {
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn Write,
        config: &FetchConfig,
        on_progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64>;
}

/// Single-stream libcurl GET (follows redirects, honours the configured timeouts).
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

impl Transport for CurlTransport {
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn Write,
        config: &FetchConfig,
        on_progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(config.max_redirections)?;
        easy.connect_timeout(Duration::from_secs(config.connect_timeout_secs))?;
        easy.low_speed_limit(config.low_speed_limit)?;
        easy.low_speed_time(Duration::from_secs(config.low_speed_time_secs))?;
        easy.timeout(Duration::from_secs(config.timeout_secs))?;
        easy.progress(true)?;

        let mut written = 0u64;
        let mut write_err: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.progress_function(|dltotal, dlnow, _, _| {
                let total = (dltotal > 0.0).then_some(dltotal as u64);
                on_progress(dlnow as u64, total);
                true
            })?;
            transfer.perform()
        };

        if let Some(e) = write_err {
            return Err(e).context("writing response body failed");
        }
        performed.context("GET request failed")?;

        let code = easy.response_code().context("no response code")?;
        if !(200..300).contains(&code) {
            anyhow::bail!("GET {} returned HTTP {}", url, code);
        }
        tracing::debug!(url, code, bytes = written, "GET complete");
        Ok(written)
    }
}
