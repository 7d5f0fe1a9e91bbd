//! Cache Preferences
//!
//! Small persisted settings record: where the cache lives and how large it
//! may grow. Stored as pretty-printed JSON under the platform's local
//! app-data directory; defaults are written on first use. The core treats
//! the loaded record as read-only input for one invocation.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::CacheError;

const SETTINGS_DIR_NAME: &str = "remote-media-cache";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Default cache budget: 1 GiB
const DEFAULT_MAX_CACHE_SIZE_MB: u64 = 1024;

/// Persisted cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePreferences {
    #[serde(rename = "CacheDirectory")]
    pub cache_directory: PathBuf,
    #[serde(rename = "MaxCacheSizeMB")]
    pub max_cache_size_mb: u64,
}

impl CachePreferences {
    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_mb * 1024 * 1024
    }
}

/// Loads and saves the settings file under a fixed base directory
pub struct PreferenceStore {
    settings_dir: PathBuf,
}

impl PreferenceStore {
    /// Store rooted at the platform's local app-data directory
    pub fn open_default() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::at(base.join(SETTINGS_DIR_NAME))
    }

    /// Store rooted at an explicit directory
    pub fn at(settings_dir: PathBuf) -> Self {
        Self { settings_dir }
    }

    fn settings_path(&self) -> PathBuf {
        self.settings_dir.join(SETTINGS_FILE_NAME)
    }

    fn defaults(&self) -> CachePreferences {
        CachePreferences {
            cache_directory: self.settings_dir.join("cache"),
            max_cache_size_mb: DEFAULT_MAX_CACHE_SIZE_MB,
        }
    }

    /// Load preferences, writing and returning the defaults when no
    /// settings file exists yet
    pub fn load_or_init(&self) -> Result<CachePreferences, CacheError> {
        let path = self.settings_path();
        if !path.exists() {
            let prefs = self.defaults();
            self.save(&prefs)?;
            info!(path = %path.display(), "Created default preferences");
            return Ok(prefs);
        }

        let raw = fs::read_to_string(&path)
            .map_err(|e| CacheError::Preferences(format!("{}: {e}", path.display())))?;
        let prefs: CachePreferences = serde_json::from_str(&raw)
            .map_err(|e| CacheError::Preferences(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded preferences");
        Ok(prefs)
    }

    /// Persist preferences as pretty-printed JSON
    pub fn save(&self, prefs: &CachePreferences) -> Result<(), CacheError> {
        fs::create_dir_all(&self.settings_dir)
            .map_err(|e| CacheError::Preferences(format!("{}: {e}", self.settings_dir.display())))?;

        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| CacheError::Preferences(e.to_string()))?;
        let path = self.settings_path();
        fs::write(&path, json)
            .map_err(|e| CacheError::Preferences(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Apply a partial settings update, persisting the merged record
    pub fn update(
        &self,
        cache_directory: Option<PathBuf>,
        max_cache_size_mb: Option<u64>,
    ) -> Result<CachePreferences, CacheError> {
        let mut prefs = self.load_or_init()?;

        let mut changed = false;
        if let Some(dir) = cache_directory {
            prefs.cache_directory = dir;
            changed = true;
        }
        if let Some(max_mb) = max_cache_size_mb {
            prefs.max_cache_size_mb = max_mb;
            changed = true;
        }

        if changed {
            self.save(&prefs)?;
            info!(
                cache_dir = %prefs.cache_directory.display(),
                max_mb = prefs.max_cache_size_mb,
                "Updated preferences"
            );
        }
        Ok(prefs)
    }
}
