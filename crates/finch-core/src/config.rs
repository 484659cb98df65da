use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default minimum period between successful seed fetches (12 hours).
pub const DEFAULT_MIN_DOWNLOAD_PERIOD_MS: u64 = 12 * 60 * 60 * 1000;

/// Default cap on failed attempts in one retry chain.
pub const DEFAULT_MAX_REQUEST_COUNT: u32 = 5;

/// Platform reschedule backoff (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Base delay in seconds for exponential backoff (e.g. 30.0 = 30s).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 30.0,
            max_delay_secs: 5 * 60 * 60,
        }
    }
}

/// Global configuration loaded from `~/.config/finch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinchConfig {
    /// Minimum time between successful fetches, in milliseconds. 0 forces enqueue.
    pub min_download_period_ms: u64,
    /// Always replace a pending fetch job when scheduling.
    pub ignore_pending_download: bool,
    /// Failed attempts in one chain after which no reschedule is requested.
    pub max_request_count: u32,
    /// Browser milestone sent with the seed request.
    #[serde(default)]
    pub milestone: Option<u32>,
    /// Release channel sent with the seed request (e.g. "stable").
    #[serde(default)]
    pub channel: Option<String>,
    /// Optional restrict mode parameter.
    #[serde(default)]
    pub restrict_mode: Option<String>,
    /// Seed endpoint used by the HTTP downloader.
    #[serde(default)]
    pub seed_url: Option<String>,
    /// Optional backoff policy for rescheduled jobs; if missing, built-in defaults are used.
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
    /// How often the job runner checks for a ready job, in seconds.
    pub poll_interval_secs: u64,
    /// If false, the runner treats the device as always charging.
    pub require_charging_check: bool,
}

impl Default for FinchConfig {
    fn default() -> Self {
        Self {
            min_download_period_ms: DEFAULT_MIN_DOWNLOAD_PERIOD_MS,
            ignore_pending_download: false,
            max_request_count: DEFAULT_MAX_REQUEST_COUNT,
            milestone: None,
            channel: None,
            restrict_mode: None,
            seed_url: None,
            backoff: None,
            poll_interval_secs: 60,
            require_charging_check: true,
        }
    }
}

/// Command-line overrides layered on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    /// `--finch-seed-min-download-period=<ms>`
    pub min_download_period_ms: Option<u64>,
    /// `--finch-seed-ignore-pending-download`
    pub ignore_pending_download: bool,
}

/// Resolved scheduler settings, handed to the fetcher at construction.
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub min_download_period: Duration,
    pub ignore_pending_download: bool,
    pub max_request_count: u32,
    pub milestone: Option<u32>,
    pub channel: Option<String>,
    pub restrict_mode: Option<String>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        FinchConfig::default().fetcher_settings(&FlagOverrides::default())
    }
}

impl FinchConfig {
    /// Resolve scheduler settings; command-line flags win over the file.
    pub fn fetcher_settings(&self, flags: &FlagOverrides) -> FetcherSettings {
        let period_ms = flags
            .min_download_period_ms
            .unwrap_or(self.min_download_period_ms);
        FetcherSettings {
            min_download_period: Duration::from_millis(period_ms),
            ignore_pending_download: self.ignore_pending_download || flags.ignore_pending_download,
            max_request_count: self.max_request_count.max(1),
            milestone: self.milestone,
            channel: self.channel.clone(),
            restrict_mode: self.restrict_mode.clone(),
        }
    }

    pub fn backoff_or_default(&self) -> BackoffConfig {
        self.backoff.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("finch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// State directory: `~/.local/state/finch`. Holds the DB, stamp, seed, records file and socket.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("finch")?;
    Ok(xdg_dirs.get_state_home().join("finch"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FinchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FinchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FinchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
