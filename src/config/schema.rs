use std::time::Duration;

use serde::Deserialize;

use crate::gateway::DEFAULT_BASE_URL;
use crate::models::{SortDirection, SortKey, ViewQuery};

/// Top-level application settings.
///
/// File format: TOML, at `TRACK_CATALOG_CONFIG_PATH` or the platform config
/// directory (`~/.config/track-catalog/config.toml` on Linux).
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TRACK_CATALOG__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub view: ViewSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Collection endpoint; items live at `{base_url}/{id}`.
    pub base_url: String,
    /// How many records the initial load asks for.
    pub list_limit: usize,
    pub connect_timeout_secs: u64,
    /// Also used as the write timeout.
    pub read_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            list_limit: 12,
            connect_timeout_secs: 5,
            read_timeout_secs: 15,
        }
    }
}

impl ApiSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Initial filter and ordering of the list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub min_rating: f64,
}

impl ViewSettings {
    pub fn initial_query(&self) -> ViewQuery {
        ViewQuery::default()
            .with_min_rating(self.min_rating)
            .sorted_by(self.sort_key, self.direction)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`. Logs go to stderr,
    /// which the terminal UI shares, so the default is silent.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "off".to_string(),
        }
    }
}
