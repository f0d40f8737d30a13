// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Application State

use roster_core::{
    AppError, FileFavoritesStore, HttpPlayerRepository, RosterReconciler, SettingsStore,
};
use std::fs;
use std::path::PathBuf;

pub type Reconciler = RosterReconciler<HttpPlayerRepository, FileFavoritesStore>;

/// Stores and the reconciler for one command invocation
pub struct AppState {
    pub settings: SettingsStore,
    pub reconciler: Reconciler,
}

impl AppState {
    /// Open the stores and build a reconciler for the configured API.
    ///
    /// `base_url` overrides the persisted setting for this run only.
    pub fn new(config_dir: Option<PathBuf>, base_url: Option<String>) -> Result<Self, AppError> {
        let (settings, favorites) = match config_dir {
            Some(dir) => {
                fs::create_dir_all(&dir)
                    .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;
                (
                    SettingsStore::open(dir.join("settings.json"))?,
                    FileFavoritesStore::in_dir(&dir),
                )
            }
            None => (SettingsStore::new()?, FileFavoritesStore::new()?),
        };

        let mut effective = settings.get();
        if let Some(base_url) = base_url {
            effective.base_url = base_url;
            effective.validate()?;
        }

        tracing::debug!("Using player API at {}", effective.base_url);
        let reconciler = RosterReconciler::with_options(
            HttpPlayerRepository::new(&effective.base_url),
            favorites,
            effective.to_reconciler_options(),
        );

        Ok(Self {
            settings,
            reconciler,
        })
    }
}
