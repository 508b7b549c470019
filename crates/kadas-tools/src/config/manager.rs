//! Persistence of the tool configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::AppConfig;

/// Configuration manager shared between the tools and the host
pub type SharedConfig = Arc<RwLock<ConfigManager>>;

const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Owns the tool configuration and its file on disk
///
/// A missing or unreadable file never fails construction: the defaults are
/// used and written back on the first `save` after a change.
#[derive(Debug)]
pub struct ConfigManager {
    config: AppConfig,
    path: PathBuf,
    /// Unsaved changes, including version upgrades done while loading
    dirty: bool,
}

impl ConfigManager {
    /// Manager for `<config dir>/kadas/config.ron`
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (config, dirty) = if path.exists() {
            match Self::load(&path) {
                Ok(config) => {
                    let upgraded = config.version < AppConfig::CURRENT_VERSION;
                    (Self::upgrade(config), upgraded)
                }
                Err(e) => {
                    tracing::warn!("Ignoring config {}: {}", path.display(), e);
                    (AppConfig::new(), false)
                }
            }
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            (AppConfig::new(), false)
        };

        Self {
            config,
            path,
            dirty,
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kadas")
            .join(CONFIG_FILE)
    }

    /// Parse a config file as is, without version handling
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: AppConfig =
            ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        tracing::debug!("Read config version {} from {}", config.version, path.display());
        Ok(config)
    }

    /// Bring an older config to the current version
    fn upgrade(mut config: AppConfig) -> AppConfig {
        if config.version > AppConfig::CURRENT_VERSION {
            tracing::warn!(
                "Config version {} is newer than supported version {}",
                config.version,
                AppConfig::CURRENT_VERSION
            );
        } else if config.version < AppConfig::CURRENT_VERSION {
            // Version 0 predates the history limit; zero would disable undo
            if config.tools.history_limit == 0 {
                config.tools.history_limit = kadas_core::DEFAULT_HISTORY_LIMIT;
            }
            tracing::info!(
                "Upgraded config from version {} to {}",
                config.version,
                AppConfig::CURRENT_VERSION
            );
            config.version = AppConfig::CURRENT_VERSION;
        }
        config
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Mutable access; marks the configuration as changed
    pub fn config_mut(&mut self) -> &mut AppConfig {
        self.dirty = true;
        &mut self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write pending changes; the file is replaced atomically
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let pretty = ron::ser::PrettyConfig::default().struct_names(false);
        let content = ron::ser::to_string_pretty(&self.config, pretty)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let staging = self.path.with_extension("ron.tmp");
        std::fs::write(&staging, content)
            .and_then(|_| std::fs::rename(&staging, &self.path))
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved config to {}", self.path.display());
        self.dirty = false;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        self.config = AppConfig::new();
        self.dirty = true;
    }

    /// Wrap into a [`SharedConfig`]
    pub fn into_shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join(CONFIG_FILE));
        assert_eq!(manager.config(), &AppConfig::new());
        assert!(!manager.is_dirty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kadas").join(CONFIG_FILE);

        let mut manager = ConfigManager::with_path(&path);
        manager.config_mut().minmax.heightmap = Some("/data/dhm25.tif".into());
        manager.config_mut().tools.history_limit = 20;
        manager.save().unwrap();
        assert!(!manager.is_dirty());
        assert!(!path.with_extension("ron.tmp").exists());

        let reloaded = ConfigManager::with_path(&path);
        assert_eq!(reloaded.config().minmax.heightmap.as_deref(), Some("/data/dhm25.tif"));
        assert_eq!(reloaded.config().tools.history_limit, 20);
    }

    #[test]
    fn test_unversioned_config_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "(tools: (show_numeric_input: true, history_limit: 0))").unwrap();

        let manager = ConfigManager::with_path(&path);
        assert!(manager.is_dirty());
        assert_eq!(manager.config().version, AppConfig::CURRENT_VERSION);
        assert!(manager.config().tools.show_numeric_input);
        assert_eq!(manager.config().tools.history_limit, kadas_core::DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not ron at all (").unwrap();

        assert!(matches!(ConfigManager::load(&path), Err(ConfigError::Deserialize(_))));
        let manager = ConfigManager::with_path(&path);
        assert_eq!(manager.config(), &AppConfig::new());
        assert!(!manager.is_dirty());
    }

    #[test]
    fn test_shared_config() {
        let dir = tempfile::tempdir().unwrap();
        let shared = ConfigManager::with_path(dir.path().join(CONFIG_FILE)).into_shared();
        shared.write().config_mut().tools.show_numeric_input = true;
        assert!(shared.read().config().tools.show_numeric_input);
        assert!(shared.read().is_dirty());
    }
}
