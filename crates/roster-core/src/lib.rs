// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Shared logic for all frontends
//
// This crate provides:
// - Player, RosterViewEntry and the error taxonomy
// - PlayerRepository and its HTTP implementation
// - FileFavoritesStore for persistent favorites
// - SettingsStore for persistent settings
// - RosterReconciler, which keeps the roster and favorites in sync
//
// Frontend-specific code lives in separate crates.

pub mod favorites;
pub mod reconciler;
pub mod repository;
pub mod settings;
pub mod types;

// Re-export commonly used items
pub use favorites::{FavoriteSet, FavoritesStore, FileFavoritesStore, FAVORITES_SLOT};
pub use reconciler::{reconcile, FavoriteUpdate, ReconcilerOptions, RosterReconciler};
pub use repository::{HttpPlayerRepository, PlayerRepository};
pub use settings::SettingsStore;
pub use types::{
    AppError, AppSettings, CreateError, DeleteError, FetchError, PersistenceError, Player,
    PlayerDraft, PlayerField, PlayerFields, RemoteError, RosterViewEntry, UpdateError,
    ValidationError, DEFAULT_BASE_URL,
};
