//! Application configuration. API credentials, paths, pacing.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SESSION_PATH: &str = "./mediainfo_bot.session";
pub const DEFAULT_TEMP_DIR: &str = "./temp_downloads";
pub const DEFAULT_MEDIAINFO_BIN: &str = "mediainfo";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    /// BotFather token. Read from TG_MEDIAINFO_BOT_TOKEN.
    pub bot_token: Option<String>,
    pub session_path: Option<String>,

    /// Directory for downloaded files while they are analyzed. Read from TG_MEDIAINFO_TEMP_DIR.
    #[serde(default)]
    pub temp_dir: Option<String>,

    /// Analysis program. Read from TG_MEDIAINFO_MEDIAINFO_BIN.
    #[serde(default)]
    pub mediainfo_bin: Option<String>,

    /// Kill the analysis program after this many seconds (default 120).
    #[serde(default)]
    pub analysis_timeout_secs: Option<u64>,

    /// Pause after every processed media item of a history scan (default 3).
    #[serde(default)]
    pub item_delay_secs: Option<u64>,

    /// Minimum interval between progress updates of a scan (default 15).
    #[serde(default)]
    pub progress_interval_secs: Option<u64>,

    /// Extra seconds added to every FloodWait (default 5).
    #[serde(default)]
    pub flood_margin_secs: Option<u64>,
}

impl AppConfig {
    /// Build from `TG_MEDIAINFO_*` variables and the optional `TG_MEDIAINFO_CONFIG` file.
    /// `.env` is loaded once by the caller before this runs.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TG_MEDIAINFO"));
        if let Ok(path) = std::env::var("TG_MEDIAINFO_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn session_path_or_default(&self) -> PathBuf {
        PathBuf::from(
            self.session_path
                .as_deref()
                .unwrap_or(DEFAULT_SESSION_PATH),
        )
    }

    pub fn temp_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.temp_dir.as_deref().unwrap_or(DEFAULT_TEMP_DIR))
    }

    pub fn mediainfo_bin_or_default(&self) -> String {
        self.mediainfo_bin
            .clone()
            .unwrap_or_else(|| DEFAULT_MEDIAINFO_BIN.to_string())
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs.unwrap_or(120))
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_secs(self.item_delay_secs.unwrap_or(3))
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs.unwrap_or(15))
    }

    pub fn flood_margin(&self) -> Duration {
        Duration::from_secs(self.flood_margin_secs.unwrap_or(5))
    }

    /// Bot token from config or TG_MEDIAINFO_BOT_TOKEN; empty values count as missing.
    pub fn bot_token(&self) -> Option<String> {
        self.bot_token.clone().filter(|t| !t.trim().is_empty())
    }
}
