use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "FRESHCAL_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the todo document and logs.
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    /// Lines shown in the header, one picked at random per month change.
    pub quotes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            log_level: "info".into(),
            quotes: default_quotes(),
        }
    }
}

fn default_quotes() -> Vec<String> {
    [
        "Keep going, one small step today.",
        "Resting is part of the work too.",
        "Stay curious, stay kind.",
        "Good things are on their way.",
        "Eat on time, smile on time.",
        "You are doing better than you think.",
        "Life is bright and everything is lovely.",
        "Let your mood catch some sunshine.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "freshcal")
}

pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let dirs = project_dirs().context("locating config directory")?;
    Ok(dirs.config_dir().join("config.yml"))
}

impl Config {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {:?}", path))?;
        Ok(config)
    }

    pub fn load() -> Result<Config> {
        Config::load_from(&config_path()?)
    }

    /// Resolves the data directory: explicit override, then config, then the
    /// platform data dir.
    pub fn data_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dirs = project_dirs().context("locating data directory")?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.quotes.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "log_level: debug\ndata_dir: /tmp/freshcal-data\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/freshcal-data")));
        assert_eq!(config.quotes, default_quotes());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "quotes: [unclosed\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config file"));
    }

    #[test]
    fn override_wins_over_config() {
        let config = Config {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let over = PathBuf::from("/from/flag");
        assert_eq!(config.data_dir(Some(&over)).unwrap(), over);
        assert_eq!(
            config.data_dir(None).unwrap(),
            PathBuf::from("/from/config")
        );
    }
}
