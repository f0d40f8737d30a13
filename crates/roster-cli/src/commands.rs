// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Command Handlers

use crate::state::AppState;
use clap::{Args, Subcommand};
use roster_core::{AppError, AppSettings, FavoriteUpdate, PlayerFields, RosterViewEntry};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all players, marking favorites
    List,
    /// Show one player's details
    Show { id: String },
    /// Toggle a player's favorite status
    Favorite { id: String },
    /// Remove a player from the favorites
    Unfavorite { id: String },
    /// List favorite players
    Favorites,
    /// Remove every favorite
    ClearFavorites,
    /// Delete a player from the roster
    Delete { id: String },
    /// Add a new player
    Add(PlayerArgs),
    /// Replace a player's details
    Update {
        id: String,
        #[command(flatten)]
        fields: PlayerArgs,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Debug, Args)]
pub struct PlayerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub age: String,
    #[arg(long)]
    pub price: String,
    /// yes or no
    #[arg(long, default_value = "no")]
    pub captain: String,
    #[arg(long, default_value = "")]
    pub image: String,
}

impl From<PlayerArgs> for PlayerFields {
    fn from(args: PlayerArgs) -> Self {
        PlayerFields {
            name: args.name,
            age: args.age,
            price: args.price,
            captain: args.captain,
            image_url: args.image,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Set the player API base URL
    SetBaseUrl { url: String },
    /// Enable or disable dropping favorites of deleted players
    PruneOnDelete {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

/// Run one command against a freshly activated view
pub async fn run(state: &AppState, command: Command) -> Result<(), AppError> {
    let reconciler = &state.reconciler;

    match command {
        Command::List => {
            let view = reconciler.on_activate().await?;
            print_entries(&view, "No players found.");
        }
        Command::Show { id } => {
            let entry = reconciler.player_detail(&id).await?;
            print_detail(&entry);
        }
        Command::Favorite { id } => {
            activate_best_effort(state).await;
            let update = reconciler.toggle_favorite(&id);
            let now = if reconciler.favorites().contains(&id) {
                "added to"
            } else {
                "removed from"
            };
            println!("Player {} {} favorites.", id, now);
            print_update(&update);
        }
        Command::Unfavorite { id } => {
            activate_best_effort(state).await;
            let update = reconciler.remove_favorite(&id);
            println!("Player {} removed from favorites.", id);
            print_update(&update);
        }
        Command::Favorites => {
            reconciler.on_activate().await?;
            print_entries(&reconciler.favorite_players(), "No favorite players found.");
        }
        Command::ClearFavorites => {
            let update = reconciler.clear_favorites();
            println!("All favorites cleared.");
            warn_persistence(&update);
        }
        Command::Delete { id } => {
            reconciler.on_activate().await?;
            let view = reconciler.delete_player(&id).await?;
            println!("Player deleted successfully!");
            print_entries(&view, "No players left.");
        }
        Command::Add(args) => {
            let player = reconciler.add_player(&args.into()).await?;
            println!("Player added successfully! (id {})", player.id);
        }
        Command::Update { id, fields } => {
            let player = reconciler.update_player(&id, &fields.into()).await?;
            let is_favorite = reconciler.favorites().contains(&player.id);
            println!("Player updated successfully!");
            print_detail(&RosterViewEntry {
                player,
                is_favorite,
            });
        }
        Command::Settings { action } => {
            if let Some(action) = action {
                let current = state.settings.get();
                let updated = match action {
                    SettingsAction::SetBaseUrl { url } => AppSettings {
                        base_url: url,
                        ..current
                    },
                    SettingsAction::PruneOnDelete { enabled } => AppSettings {
                        prune_favorites_on_delete: enabled,
                        ..current
                    },
                };
                state.settings.update(updated)?;
            }
            print_settings(state);
        }
    }

    Ok(())
}

/// Refresh before a favorites change so the printed view is current; the
/// change itself does not need the network
async fn activate_best_effort(state: &AppState) {
    if let Err(e) = state.reconciler.on_activate().await {
        eprintln!("Warning: {}", e);
    }
}

fn print_entries(entries: &[RosterViewEntry], empty: &str) {
    if entries.is_empty() {
        println!("{}", empty);
        return;
    }

    for entry in entries {
        let player = &entry.player;
        println!(
            "{} {:>4}  {:<24} ${:<10}{}",
            if entry.is_favorite { "*" } else { " " },
            player.id,
            player.name,
            player.price,
            if player.is_captain { "(C)" } else { "" },
        );
    }
}

fn print_detail(entry: &RosterViewEntry) {
    let player = &entry.player;
    println!("{}", player.name);
    println!("  Id:       {}", player.id);
    println!("  Age:      {}", player.age);
    println!("  Price:    ${}", player.price);
    println!("  Captain:  {}", if player.is_captain { "Yes" } else { "No" });
    if !player.image_url.is_empty() {
        println!("  Image:    {}", player.image_url);
    }
    println!("  Favorite: {}", if entry.is_favorite { "Yes" } else { "No" });
}

fn print_update(update: &FavoriteUpdate) {
    warn_persistence(update);
    print_entries(&update.view, "");
}

fn warn_persistence(update: &FavoriteUpdate) {
    if let Some(warning) = &update.warning {
        eprintln!("Warning: favorites were not saved: {}", warning);
    }
}

fn print_settings(state: &AppState) {
    let settings = state.settings.get();
    println!("Settings file:      {}", state.settings.file_path().display());
    println!("Base URL:           {}", settings.base_url);
    println!(
        "Prune on delete:    {}",
        if settings.prune_favorites_on_delete { "on" } else { "off" }
    );
}
