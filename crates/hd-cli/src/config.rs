//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// strftime pattern used for event times in the report.
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: "%d/%m/%y %H:%M".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HD_*)
        figment = figment.merge(Env::prefixed("HD_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for hd.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_time_format_is_short_day_month() {
        assert_eq!(Config::default().time_format, "%d/%m/%y %H:%M");
    }

    #[test]
    fn config_file_overrides_default() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "time_format = \"%Y-%m-%d %H:%M\"\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.time_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn dirs_config_path_ends_with_hd() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "hd");
    }
}
