//! Loading and saving the configuration document

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::document::{Configuration, GlobalSettings};
use crate::constants::config::{APP_DIR, BACKUP_EXTENSION, FILENAME, ICON_DIR};

pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(FILENAME);
    path
}

/// Owns the on-disk location of the document
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Icon directory: the configured one, or `icons/` beside the config file
    pub fn icon_dir(&self, global: &GlobalSettings) -> PathBuf {
        match &global.icon_dir {
            Some(dir) => PathBuf::from(dir),
            None => self
                .path
                .parent()
                .map_or_else(|| PathBuf::from(ICON_DIR), |p| p.join(ICON_DIR)),
        }
    }

    /// Loads the document. A missing file yields the first-start document;
    /// an unreadable one is moved aside and replaced.
    pub fn load(&self) -> Configuration {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No config file, starting with a fresh bar");
                let config = Configuration::first_start();
                if let Err(err) = self.save(&config) {
                    error!(error = ?err, "Failed to write initial config");
                }
                return config;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read config file, using defaults");
                return Configuration::first_start();
            }
        };

        match serde_json::from_str::<Configuration>(&contents) {
            Ok(mut config) => {
                config.validate_and_clamp();
                info!(path = %self.path.display(), bars = config.bars.len(), "Loaded config");
                config
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to parse config file");
                let backup = self.path.with_extension(BACKUP_EXTENSION);
                match fs::rename(&self.path, &backup) {
                    Ok(()) => warn!(backup = %backup.display(), "Moved broken config aside"),
                    Err(err) => error!(error = %err, "Failed to move broken config aside"),
                }
                Configuration::first_start()
            }
        }
    }

    pub fn save(&self, config: &Configuration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?;
        fs::write(&self.path, contents)
            .context(format!("Failed to write config file to {}", self.path.display()))?;
        Ok(())
    }

    /// Saves, retrying once; the error of the second attempt is returned
    pub fn save_with_retry(&self, config: &Configuration) -> Result<()> {
        match self.save(config) {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(error = ?first, "Config save failed, retrying");
                self.save(config)
                    .inspect_err(|err| error!(error = ?err, "Config save failed twice"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BarConfig;

    #[test]
    fn test_missing_file_creates_first_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));
        let config = store.load();
        assert_eq!(config, Configuration::first_start());
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let mut config = Configuration::default();
        config.bars.push(BarConfig::default());
        config.global.pies_always_center = true;
        store.save_with_retry(&config).unwrap();
        assert_eq!(store.load(), config);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);
        let config = store.load();
        assert_eq!(config, Configuration::first_start());
        assert!(dir.path().join("config.json.bak").exists());
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(blocker.join("config.json"));
        assert!(store.save_with_retry(&Configuration::default()).is_err());
    }

    #[test]
    fn test_load_survives_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(blocker.join("config.json"));
        assert_eq!(store.load(), Configuration::first_start());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_icon_dir_defaults_beside_config() {
        let store = ConfigStore::new("/tmp/x/config.json");
        assert_eq!(store.icon_dir(&GlobalSettings::default()), PathBuf::from("/tmp/x/icons"));
    }
}
