use directories::ProjectDirs;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{error::ConfigStoreError, settings::Settings};

/// Where the last used settings live between runs
pub trait ConfigStore: std::fmt::Debug {
    /// Saved settings, or the defaults when nothing usable is stored
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), ConfigStoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mathblitz") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("mathblitz_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Settings, ConfigStoreError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match self.try_load() {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable settings file");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps settings in memory only
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: RefCell<Option<Settings>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<Settings> {
        self.saved.borrow().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Settings {
        self.saved().unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigStoreError> {
        *self.saved.borrow_mut() = Some(settings.clone());
        Ok(())
    }
}
