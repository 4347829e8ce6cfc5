//! Logging init for programs embedding the loader. The library itself only
//! emits `tracing` events and never installs a subscriber; a binary or test
//! harness that wants to see them calls [`init_logging`] once at startup and
//! falls back to [`init_logging_stderr`] when the XDG state log file
//! (`$XDG_STATE_HOME/semeion/semeion.log`) cannot be opened. `RUST_LOG`
//! overrides the default `info,semeion=debug` filter.
//!
//! ```no_run
//! if let Err(e) = semeion::logging::init_logging() {
//!     semeion::logging::init_logging_stderr();
//!     tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
//! }
//! let data = semeion::Semeion::new("~/data/semeion", true)?;
//! tracing::info!("{} samples", data.len());
//! # Ok::<(), semeion::SemeionError>(())
//! ```

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,semeion=debug";

/// Writer that is either the log file or stderr (used when the file clone fails).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log file location: `~/.local/state/semeion/semeion.log`. Creates the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("semeion")?;
    Ok(xdg_dirs.place_state_file("semeion.log")?)
}

/// Initialize structured logging to the XDG state log file.
/// On failure (e.g. log dir unwritable) returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let log_file_path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer = BoxMakeWriter::new(FileMakeWriter(file));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("semeion logging initialized at {}", log_file_path.display());
    Ok(())
}

/// Initialize logging to stderr only. Returns false if a global subscriber was already set.
pub fn init_logging_stderr() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_or_stderr_writes_to_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let mut w = FileMakeWriter(f.reopen().unwrap()).make_writer();
        w.write_all(b"line\n").unwrap();
        w.flush().unwrap();
        assert_eq!(std::fs::read(f.path()).unwrap(), b"line\n");
    }

    #[test]
    fn stderr_init_is_idempotent() {
        init_logging_stderr();
        assert!(!init_logging_stderr());
    }
}
