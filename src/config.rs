use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SEMEION_URL: &str =
    "http://archive.ics.uci.edu/ml/machine-learning-databases/semeion/semeion.data";
pub const SEMEION_FILENAME: &str = "semeion.data";
pub const SEMEION_MD5: &str = "cb545d371d2ce14ec121470795a77432";

/// Where the dataset file comes from and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Remote location fetched with a single GET.
    pub url: String,
    /// File name under the dataset root.
    pub filename: String,
    /// Expected digest as hex: 32 chars for MD5, 64 for SHA-256.
    pub checksum: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: SEMEION_URL.to_string(),
            filename: SEMEION_FILENAME.to_string(),
            checksum: SEMEION_MD5.to_string(),
        }
    }
}

/// Transfer tuning for the fetch step (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds.
    pub timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    pub max_redirections: u32,
    /// Log download progress at info level.
    pub show_progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 600,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            show_progress: true,
        }
    }
}

/// Configuration loaded from `~/.config/semeion/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemeionConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl SemeionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid semeion config")
    }
}

/// Path of an existing user config file, if there is one.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("semeion")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load configuration from disk, falling back to defaults when no file exists.
/// Never writes a config file.
pub fn load() -> Result<SemeionConfig> {
    match config_path()? {
        Some(path) => load_from(&path),
        None => Ok(SemeionConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<SemeionConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg = SemeionConfig::from_toml_str(&data)
        .with_context(|| format!("parse {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}
