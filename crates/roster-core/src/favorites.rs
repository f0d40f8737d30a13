// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Local favorites storage
//
// Favorite player identifiers are stored in a single local JSON slot,
// read and written wholesale.

use crate::settings;
use crate::types::{AppError, PersistenceError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the storage slot holding the favorite identifiers
pub const FAVORITES_SLOT: &str = "favorites";

/// Set of favorite player identifiers.
///
/// Stored as a sequence that keeps insertion order, but compared as a set.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FavoriteSet {
    ids: Vec<String>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Return a new set with `id` removed if present, appended otherwise
    pub fn toggle(&self, id: &str) -> FavoriteSet {
        if self.contains(id) {
            self.without(id)
        } else {
            let mut ids = self.ids.clone();
            ids.push(id.to_string());
            FavoriteSet { ids }
        }
    }

    /// Return a new set with `id` removed
    pub fn without(&self, id: &str) -> FavoriteSet {
        FavoriteSet {
            ids: self.ids.iter().filter(|f| *f != id).cloned().collect(),
        }
    }
}

impl PartialEq for FavoriteSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

impl From<Vec<String>> for FavoriteSet {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<FavoriteSet> for Vec<String> {
    fn from(set: FavoriteSet) -> Self {
        set.ids
    }
}

impl<S: Into<String>> FromIterator<S> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids: Vec<String> = Vec::new();
        for id in iter {
            let id = id.into();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        FavoriteSet { ids }
    }
}

/// Durable storage for the favorite set
pub trait FavoritesStore: Send + Sync {
    /// Read the persisted set. Never fails: unreadable or corrupt storage
    /// yields an empty set.
    fn load(&self) -> FavoriteSet;

    /// Replace the persisted set with `favorites`
    fn save(&self, favorites: &FavoriteSet) -> Result<(), PersistenceError>;
}

/// File-based favorites store
#[derive(Debug, Clone)]
pub struct FileFavoritesStore {
    file_path: PathBuf,
}

impl FileFavoritesStore {
    /// Create a store in the user's config directory
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::in_dir(settings::config_dir()?))
    }

    /// Create a store whose slot lives in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(format!("{}.json", FAVORITES_SLOT)))
    }

    /// Create a store backed by an explicit file
    pub fn at_path(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn read(&self) -> Result<Option<FavoriteSet>, PersistenceError> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path)
            .map_err(|e| PersistenceError::FileIo(format!("Failed to read favorites: {}", e)))?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| PersistenceError::Serialization(format!("Failed to parse favorites: {}", e)))
    }
}

impl FavoritesStore for FileFavoritesStore {
    fn load(&self) -> FavoriteSet {
        match self.read() {
            Ok(Some(favorites)) => {
                tracing::debug!("Loaded {} favorites", favorites.len());
                favorites
            }
            Ok(None) => FavoriteSet::new(),
            Err(e) => {
                tracing::warn!("Failed to load favorites, starting empty: {}", e);
                FavoriteSet::new()
            }
        }
    }

    fn save(&self, favorites: &FavoriteSet) -> Result<(), PersistenceError> {
        let content = serde_json::to_string(favorites).map_err(|e| {
            PersistenceError::Serialization(format!("Failed to serialize favorites: {}", e))
        })?;

        // Write beside the slot and rename over it so readers never see a partial file
        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .map_err(|e| PersistenceError::FileIo(format!("Failed to write favorites: {}", e)))?;
        fs::rename(&tmp_path, &self.file_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            PersistenceError::FileIo(format!("Failed to replace favorites: {}", e))
        })?;

        tracing::debug!("Saved {} favorites", favorites.len());
        Ok(())
    }
}
