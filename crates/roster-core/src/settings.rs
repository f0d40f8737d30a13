// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Settings persistence
//
// Settings are stored in a local JSON file next to the favorites slot.

use crate::types::{AppError, AppSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Resolve the per-user config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf, AppError> {
    let config_dir = directories::ProjectDirs::from("com", "roster", "roster")
        .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
        .config_dir()
        .to_path_buf();

    fs::create_dir_all(&config_dir)
        .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

    Ok(config_dir)
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store in the user's config directory
    pub fn new() -> Result<Self, AppError> {
        Self::open(config_dir()?.join("settings.json"))
    }

    /// Open the settings file at `file_path`, writing defaults if it is missing
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            store.persist()?;
        }

        Ok(store)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Persist settings to disk
    fn persist(&self) -> Result<(), AppError> {
        let settings = self.settings.read().unwrap_or_else(|e| e.into_inner());

        let content = serde_json::to_string_pretty(&*settings)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> AppSettings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Validate, replace and persist settings
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        new_settings.validate()?;
        tracing::info!("Updating settings, base URL: {}", new_settings.base_url);
        {
            let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
            *settings = new_settings;
        }

        let result = self.persist();
        if let Err(e) = &result {
            tracing::error!("Failed to persist settings: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get(), AppSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        store
            .update(AppSettings {
                base_url: "http://localhost:3000".to_string(),
                prune_favorites_on_delete: true,
            })
            .unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get().base_url, "http://localhost:3000");
        assert!(reopened.get().prune_favorites_on_delete);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("pruneFavoritesOnDelete"));
    }

    #[test]
    fn test_update_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        let result = store.update(AppSettings {
            base_url: "not a url".to_string(),
            ..AppSettings::default()
        });
        assert!(result.is_err());
        assert_eq!(store.get(), AppSettings::default());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[]").unwrap();
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get(), AppSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"pruneFavoritesOnDelete":true}"#).unwrap();
        let settings = SettingsStore::open(&path).unwrap().get();
        assert!(settings.prune_favorites_on_delete);
        assert_eq!(settings.base_url, crate::types::DEFAULT_BASE_URL);
    }
}
