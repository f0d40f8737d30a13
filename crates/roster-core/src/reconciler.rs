// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Roster reconciliation
//
// Merges the remotely fetched player list with the locally persisted
// favorite set. One reconciler is built per active view and dropped when
// the view goes away.

use crate::favorites::{FavoriteSet, FavoritesStore};
use crate::repository::PlayerRepository;
use crate::types::{
    CreateError, DeleteError, FetchError, PersistenceError, Player, PlayerFields, RosterViewEntry,
    UpdateError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Behavior switches for a reconciler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Remove a deleted player's identifier from the favorites. When off,
    /// stale identifiers stay in the persisted set.
    pub prune_favorites_on_delete: bool,
}

/// Result of a favorites mutation.
///
/// The change is applied in memory even when persisting it failed; in that
/// case `warning` carries the failure for the frontend to show.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteUpdate {
    pub view: Vec<RosterViewEntry>,
    pub warning: Option<PersistenceError>,
}

/// Annotate each player with its favorite status, keeping the given order
pub fn reconcile(players: &[Player], favorites: &FavoriteSet) -> Vec<RosterViewEntry> {
    players
        .iter()
        .map(|player| RosterViewEntry {
            is_favorite: favorites.contains(&player.id),
            player: player.clone(),
        })
        .collect()
}

#[derive(Debug, Default)]
struct RosterState {
    players: Vec<Player>,
    favorites: FavoriteSet,
}

/// Keeps the last-fetched roster and the favorite set consistent for one view
pub struct RosterReconciler<R, S> {
    repository: R,
    store: S,
    options: ReconcilerOptions,
    state: RwLock<RosterState>,
    active: AtomicBool,
}

impl<R: PlayerRepository, S: FavoritesStore> RosterReconciler<R, S> {
    pub fn new(repository: R, store: S) -> Self {
        Self::with_options(repository, store, ReconcilerOptions::default())
    }

    /// Create a reconciler, seeding the favorite set from the store
    pub fn with_options(repository: R, store: S, options: ReconcilerOptions) -> Self {
        let favorites = store.load();

        Self {
            repository,
            store,
            options,
            state: RwLock::new(RosterState {
                players: Vec::new(),
                favorites,
            }),
            active: AtomicBool::new(true),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn options(&self) -> ReconcilerOptions {
        self.options
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Entry point for a view becoming visible: marks it active and refreshes
    pub async fn on_activate(&self) -> Result<Vec<RosterViewEntry>, FetchError> {
        self.active.store(true, Ordering::SeqCst);
        self.refresh().await
    }

    /// Mark the view as gone. Requests already in flight still complete,
    /// but their results no longer touch this reconciler's state.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Current view against the last-fetched roster
    pub fn view(&self) -> Vec<RosterViewEntry> {
        let state = self.read_state();
        reconcile(&state.players, &state.favorites)
    }

    pub fn favorites(&self) -> FavoriteSet {
        self.read_state().favorites.clone()
    }

    /// Fetch the roster and re-read the favorite set.
    ///
    /// Overlapping refreshes are not coalesced: each one stores its result
    /// when it lands, so the last to finish wins.
    pub async fn refresh(&self) -> Result<Vec<RosterViewEntry>, FetchError> {
        let players = self.repository.list().await.map_err(|e| {
            tracing::error!("Failed to fetch players: {}", e);
            FetchError::from(e)
        })?;
        let favorites = self.store.load();
        let view = reconcile(&players, &favorites);

        if self.is_active() {
            let mut state = self.write_state();
            state.players = players;
            state.favorites = favorites;
        } else {
            tracing::debug!("Discarding refresh result for inactive view");
        }

        Ok(view)
    }

    /// Fetch one player for the detail view
    pub async fn player_detail(&self, id: &str) -> Result<RosterViewEntry, FetchError> {
        let player = self.repository.get(id).await.map_err(|e| {
            tracing::error!("Failed to fetch player {}: {}", id, e);
            FetchError::from(e)
        })?;
        let is_favorite = self.read_state().favorites.contains(&player.id);

        Ok(RosterViewEntry {
            player,
            is_favorite,
        })
    }

    /// Flip `id` in the favorite set and persist it
    pub fn toggle_favorite(&self, id: &str) -> FavoriteUpdate {
        self.mutate_favorites(|favorites| favorites.toggle(id))
    }

    /// Remove `id` from the favorite set (never adds)
    pub fn remove_favorite(&self, id: &str) -> FavoriteUpdate {
        self.mutate_favorites(|favorites| favorites.without(id))
    }

    /// Empty the favorite set
    pub fn clear_favorites(&self) -> FavoriteUpdate {
        self.mutate_favorites(|_| FavoriteSet::new())
    }

    /// Favorites view: the last-fetched roster filtered to favorite players
    pub fn favorite_players(&self) -> Vec<RosterViewEntry> {
        let state = self.read_state();
        reconcile(&state.players, &state.favorites)
            .into_iter()
            .filter(|entry| entry.is_favorite)
            .collect()
    }

    /// Delete a player remotely, then drop it from the cached roster
    pub async fn delete_player(&self, id: &str) -> Result<Vec<RosterViewEntry>, DeleteError> {
        self.repository.delete(id).await.map_err(|e| {
            tracing::error!("Failed to delete player {}: {}", id, e);
            DeleteError::from(e)
        })?;

        if !self.is_active() {
            tracing::debug!("Player {} deleted after view was deactivated", id);
            return Ok(self.view());
        }

        let mut state = self.write_state();
        if let Some(index) = state.players.iter().position(|p| p.id == id) {
            state.players.remove(index);
        }

        if self.options.prune_favorites_on_delete && state.favorites.contains(id) {
            state.favorites = state.favorites.without(id);
            if let Err(e) = self.store.save(&state.favorites) {
                tracing::warn!("Failed to save favorites after pruning {}: {}", id, e);
            }
        }

        Ok(reconcile(&state.players, &state.favorites))
    }

    /// Validate and create a player. The cached roster is left alone; callers
    /// refresh or use [`Self::apply_player`].
    pub async fn add_player(&self, fields: &PlayerFields) -> Result<Player, CreateError> {
        let draft = fields.validate().map_err(|e| {
            tracing::warn!("Rejected new player: {}", e);
            e
        })?;

        self.repository.create(&draft).await.map_err(|e| {
            tracing::error!("Failed to add player: {}", e);
            CreateError::from(e)
        })
    }

    /// Validate and update a player. The cached roster is left alone.
    pub async fn update_player(&self, id: &str, fields: &PlayerFields) -> Result<Player, UpdateError> {
        let draft = fields.validate().map_err(|e| {
            tracing::warn!("Rejected update for player {}: {}", id, e);
            e
        })?;

        self.repository.update(id, &draft).await.map_err(|e| {
            tracing::error!("Failed to update player {}: {}", id, e);
            UpdateError::from(e)
        })
    }

    /// Merge a created or updated player into the cached roster: replaces the
    /// entry with the same id in place, or appends it
    pub fn apply_player(&self, player: Player) -> Vec<RosterViewEntry> {
        let mut state = self.write_state();
        match state.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => state.players.push(player),
        }
        reconcile(&state.players, &state.favorites)
    }

    fn mutate_favorites(&self, change: impl FnOnce(&FavoriteSet) -> FavoriteSet) -> FavoriteUpdate {
        let mut state = self.write_state();
        state.favorites = change(&state.favorites);

        // Saved under the lock so the slot always matches the latest mutation
        let warning = match self.store.save(&state.favorites) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to save favorites: {}", e);
                Some(e)
            }
        };

        FavoriteUpdate {
            view: reconcile(&state.players, &state.favorites),
            warning,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RosterState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RosterState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::FileFavoritesStore;
    use crate::types::{PlayerDraft, PlayerField, RemoteError};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn player(id: &str, name: &str) -> Player {
        Player {
            id: id.to_string(),
            name: name.to_string(),
            age: 20,
            price: 10.0,
            is_captain: false,
            image_url: String::new(),
        }
    }

    fn fields(name: &str, age: &str) -> PlayerFields {
        PlayerFields {
            name: name.to_string(),
            age: age.to_string(),
            price: "10".to_string(),
            captain: "no".to_string(),
            image_url: String::new(),
        }
    }

    #[derive(Default)]
    struct MockRepository {
        players: Mutex<Vec<Player>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockRepository {
        fn with_players(players: Vec<Player>) -> Self {
            Self {
                players: Mutex::new(players),
                ..Self::default()
            }
        }

        fn begin(&self) -> Result<(), RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(RemoteError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn to_player(id: String, draft: &PlayerDraft) -> Player {
            Player {
                id,
                name: draft.name.clone(),
                age: draft.age,
                price: draft.price,
                is_captain: draft.is_captain,
                image_url: draft.image_url.clone(),
            }
        }
    }

    #[async_trait]
    impl PlayerRepository for MockRepository {
        async fn list(&self) -> Result<Vec<Player>, RemoteError> {
            self.begin()?;
            Ok(self.players.lock().unwrap().clone())
        }

        async fn get(&self, id: &str) -> Result<Player, RemoteError> {
            self.begin()?;
            self.players
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(RemoteError::Status {
                    status: 404,
                    body: "Not found".to_string(),
                })
        }

        async fn create(&self, draft: &PlayerDraft) -> Result<Player, RemoteError> {
            self.begin()?;
            let mut players = self.players.lock().unwrap();
            let created = Self::to_player((players.len() + 100).to_string(), draft);
            players.push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: &str, draft: &PlayerDraft) -> Result<Player, RemoteError> {
            self.begin()?;
            Ok(Self::to_player(id.to_string(), draft))
        }

        async fn delete(&self, id: &str) -> Result<(), RemoteError> {
            self.begin()?;
            self.players.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }
    }

    fn store_with(dir: &tempfile::TempDir, ids: &[&str]) -> FileFavoritesStore {
        let store = FileFavoritesStore::in_dir(dir.path());
        store.save(&ids.iter().copied().collect()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_refresh_marks_favorites() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["1"]));

        let view = reconciler.refresh().await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].player.name, "A");
        assert!(view[0].is_favorite);
    }

    #[tokio::test]
    async fn test_refresh_keeps_remote_order() {
        let dir = tempfile::tempdir().unwrap();
        let players = vec![player("3", "C"), player("1", "A"), player("2", "B")];
        let repo = MockRepository::with_players(players.clone());
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["2", "9"]));

        let view = reconciler.refresh().await.unwrap();
        let ids: Vec<&str> = view.iter().map(|e| e.player.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        let flags: Vec<bool> = view.iter().map(|e| e.is_favorite).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[tokio::test]
    async fn test_refresh_with_unreadable_store_is_all_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFavoritesStore::in_dir(dir.path());
        std::fs::write(store.file_path(), "not json").unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A"), player("2", "B")]);
        let reconciler = RosterReconciler::new(repo, store);

        let view = reconciler.refresh().await.unwrap();
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|e| !e.is_favorite));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_roster() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &[]));
        reconciler.refresh().await.unwrap();

        reconciler.repository().fail.store(true, Ordering::SeqCst);
        let err = reconciler.refresh().await.unwrap_err();
        assert!(matches!(err.0, RemoteError::Status { status: 500, .. }));
        assert_eq!(reconciler.view().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite_persists_without_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["1"]));
        reconciler.refresh().await.unwrap();
        let calls = reconciler.repository().calls.load(Ordering::SeqCst);

        let update = reconciler.toggle_favorite("1");
        assert!(update.warning.is_none());
        assert!(!update.view[0].is_favorite);
        assert!(reconciler.favorites().is_empty());
        assert!(FileFavoritesStore::in_dir(dir.path()).load().is_empty());
        assert_eq!(reconciler.repository().calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_toggle_save_failure_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFavoritesStore::in_dir(dir.path().join("gone"));
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store);
        reconciler.refresh().await.unwrap();

        let update = reconciler.toggle_favorite("1");
        assert!(matches!(update.warning, Some(PersistenceError::FileIo(_))));
        // not rolled back
        assert!(update.view[0].is_favorite);
        assert!(reconciler.favorites().contains("1"));
    }

    #[tokio::test]
    async fn test_delete_leaves_favorites_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A"), player("2", "B")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["1", "2"]));
        reconciler.refresh().await.unwrap();

        let view = reconciler.delete_player("1").await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].player.id, "2");
        // stale identifier stays in the set and on disk
        assert!(reconciler.favorites().contains("1"));
        assert!(FileFavoritesStore::in_dir(dir.path()).load().contains("1"));
    }

    #[tokio::test]
    async fn test_delete_prunes_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A"), player("2", "B")]);
        let options = ReconcilerOptions {
            prune_favorites_on_delete: true,
        };
        let reconciler =
            RosterReconciler::with_options(repo, store_with(&dir, &["1", "2"]), options);
        reconciler.refresh().await.unwrap();

        reconciler.delete_player("1").await.unwrap();
        assert!(!reconciler.favorites().contains("1"));
        assert!(!FileFavoritesStore::in_dir(dir.path()).load().contains("1"));
        assert!(reconciler.favorites().contains("2"));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_roster() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &[]));
        reconciler.refresh().await.unwrap();

        reconciler.repository().fail.store(true, Ordering::SeqCst);
        assert!(reconciler.delete_player("1").await.is_err());
        assert_eq!(reconciler.view().len(), 1);
    }

    #[tokio::test]
    async fn test_add_player_validation_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = RosterReconciler::new(MockRepository::default(), store_with(&dir, &[]));

        let err = reconciler.add_player(&fields("B", "abc")).await.unwrap_err();
        match err {
            CreateError::Validation(e) => assert_eq!(e.field, PlayerField::Age),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(reconciler.repository().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_player_does_not_touch_cached_roster() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = RosterReconciler::new(MockRepository::default(), store_with(&dir, &[]));
        reconciler.refresh().await.unwrap();

        let created = reconciler.add_player(&fields("B", "22")).await.unwrap();
        assert_eq!(created.name, "B");
        assert_eq!(created.age, 22);
        assert!(reconciler.view().is_empty());

        let view = reconciler.apply_player(created.clone());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].player, created);
    }

    #[tokio::test]
    async fn test_update_player_validation_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A"), player("2", "B")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["1"]));
        reconciler.refresh().await.unwrap();

        let mut bad = fields("A2", "30");
        bad.price = "free".to_string();
        assert!(matches!(
            reconciler.update_player("1", &bad).await,
            Err(UpdateError::Validation(_))
        ));

        let updated = reconciler.update_player("1", &fields("A2", "30")).await.unwrap();
        assert_eq!(reconciler.view()[0].player.name, "A");

        let view = reconciler.apply_player(updated);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].player.name, "A2");
        assert!(view[0].is_favorite);
    }

    #[tokio::test]
    async fn test_player_detail_annotates_favorite() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A"), player("2", "B")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["2"]));

        assert!(reconciler.player_detail("2").await.unwrap().is_favorite);
        assert!(!reconciler.player_detail("1").await.unwrap().is_favorite);
        assert!(reconciler.player_detail("9").await.is_err());
    }

    #[tokio::test]
    async fn test_favorites_view_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let players = vec![player("1", "A"), player("2", "B"), player("3", "C")];
        let repo = MockRepository::with_players(players);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &["3", "1", "gone"]));
        reconciler.refresh().await.unwrap();

        let favorites = reconciler.favorite_players();
        let ids: Vec<&str> = favorites.iter().map(|e| e.player.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let update = reconciler.remove_favorite("3");
        assert_eq!(update.view.iter().filter(|e| e.is_favorite).count(), 1);
        // removing a non-favorite never adds it
        reconciler.remove_favorite("2");
        assert!(!reconciler.favorites().contains("2"));

        let update = reconciler.clear_favorites();
        assert!(update.view.iter().all(|e| !e.is_favorite));
        assert!(FileFavoritesStore::in_dir(dir.path()).load().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_view_discards_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MockRepository::with_players(vec![player("1", "A")]);
        let reconciler = RosterReconciler::new(repo, store_with(&dir, &[]));

        reconciler.deactivate();
        let view = reconciler.refresh().await.unwrap();
        assert_eq!(view.len(), 1);
        assert!(reconciler.view().is_empty());

        let view = reconciler.on_activate().await.unwrap();
        assert!(reconciler.is_active());
        assert_eq!(view, reconciler.view());
    }

    #[test]
    fn test_reconcile_drops_nothing_and_adds_nothing() {
        let players = vec![player("1", "A"), player("2", "B")];
        let favorites: FavoriteSet = ["2", "phantom"].into_iter().collect();
        let view = reconcile(&players, &favorites);
        assert_eq!(view.len(), players.len());
        assert!(!view[0].is_favorite);
        assert!(view[1].is_favorite);
    }
}
