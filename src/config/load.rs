use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use super::schema::Settings;
use crate::models::{RATING_MAX, RATING_MIN};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_VAR: &str = "TRACK_CATALOG_CONFIG_PATH";
/// Prefix for per-key overrides, e.g. `TRACK_CATALOG__API__LIST_LIMIT=20`.
pub const ENV_PREFIX: &str = "TRACK_CATALOG";

impl Settings {
    /// Load settings from the resolved config file and the environment.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Load settings from `path` (if it exists) and the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Basic sanity checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.api.base_url.trim().is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if self.api.list_limit == 0 {
            return Err("api.list_limit must be >= 1".to_string());
        }
        if !(RATING_MIN..=RATING_MAX).contains(&self.view.min_rating) {
            return Err(format!(
                "view.min_rating must be between {RATING_MIN} and {RATING_MAX}"
            ));
        }
        if self.log.level.parse::<log::LevelFilter>().is_err() {
            return Err(format!("log.level '{}' is not a log level", self.log.level));
        }
        Ok(())
    }
}

/// Resolve the config path from `TRACK_CATALOG_CONFIG_PATH` or the platform
/// default.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

/// `<config dir>/track-catalog/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "track-catalog").map(|dirs| dirs.config_dir().join("config.toml"))
}
