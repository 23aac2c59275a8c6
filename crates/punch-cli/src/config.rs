//! Where the shift database lives.
//!
//! The only setting is `database_path`. It is resolved in layers, each
//! overriding the last: the platform data directory, then
//! `config.toml` in the platform config directory, then a file named
//! with `--config`, then the `PUNCH_DATABASE_PATH` environment
//! variable.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Config {
    /// Resolves the configuration, layering an explicit config file
    /// over the default locations when one is given.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("punch").join("config.toml")));
        }
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("PUNCH_")).extract()
    }
}

/// `<data dir>/punch/punch.db`, falling back to the working directory
/// when the platform has no data directory.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("punch")
        .join("punch.db")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn default_database_path_is_under_the_punch_data_dir() {
        let config = Config::default();
        let mut components = config.database_path.components().rev();
        assert_eq!(components.next().unwrap().as_os_str(), "punch.db");
        assert_eq!(components.next().unwrap().as_os_str(), "punch");
    }

    #[test]
    fn explicit_config_file_overrides_the_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("punch.toml");
        fs::write(&config_file, "database_path = \"/srv/clock/shifts.db\"\n").unwrap();

        let config = Config::load_from(Some(&config_file)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/clock/shifts.db"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.database_path, Config::default().database_path);
    }
}
