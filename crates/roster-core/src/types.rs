// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Type definitions

use serde::{Deserialize, Serialize};

/// Base URL of the hosted player API used when no override is configured
pub const DEFAULT_BASE_URL: &str = "https://65451fd55a0b4b04436dad71.mockapi.io";

/// A player record as stored by the remote API.
///
/// Field names on the wire follow the API (`player`, `captain`, `image`).
/// Decoding is lenient about numbers sent as strings and captain flags sent
/// as `"Yes"`/`"No"`, since records created by older clients look like that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(rename = "player", default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::age")]
    pub age: u32,
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(rename = "captain", default, deserialize_with = "lenient::captain")]
    pub is_captain: bool,
    #[serde(rename = "image", default, deserialize_with = "lenient::string")]
    pub image_url: String,
}

/// Raw, unvalidated player input as typed into a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerFields {
    pub name: String,
    pub age: String,
    pub price: String,
    pub captain: String,
    pub image_url: String,
}

impl PlayerFields {
    /// Coerce the raw input into typed values.
    ///
    /// Only type coercion is checked: the name and image URL are passed
    /// through untouched, even when empty.
    pub fn validate(&self) -> Result<PlayerDraft, ValidationError> {
        let age = parse_age(&self.age).ok_or_else(|| {
            ValidationError::new(PlayerField::Age, &self.age, "expected a non-negative whole number")
        })?;
        let price = parse_price(&self.price).ok_or_else(|| {
            ValidationError::new(PlayerField::Price, &self.price, "expected a non-negative number")
        })?;
        let is_captain = parse_captain(&self.captain).ok_or_else(|| {
            ValidationError::new(PlayerField::Captain, &self.captain, "expected yes or no")
        })?;

        Ok(PlayerDraft {
            name: self.name.clone(),
            age,
            price,
            is_captain,
            image_url: self.image_url.clone(),
        })
    }
}

/// Validated player fields ready to be sent to the API (no identifier)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDraft {
    #[serde(rename = "player")]
    pub name: String,
    pub age: u32,
    pub price: f64,
    #[serde(rename = "captain")]
    pub is_captain: bool,
    #[serde(rename = "image")]
    pub image_url: String,
}

/// A player annotated with its favorite status for one render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterViewEntry {
    pub player: Player,
    pub is_favorite: bool,
}

/// Parse an age as typed by a user or sent by an older client
pub fn parse_age(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok()
}

/// Parse a price; rejects negative, NaN and infinite values
pub fn parse_price(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Parse a captain flag (`yes`/`no`/`true`/`false`, case-insensitive)
pub fn parse_captain(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

mod lenient {
    use serde::de::{self, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(de::Error::custom(format!("invalid player id: {}", other))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    pub fn age<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(0),
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| de::Error::custom(format!("invalid age: {}", n))),
            Value::String(s) => {
                super::parse_age(&s).ok_or_else(|| de::Error::custom(format!("invalid age: {:?}", s)))
            }
            other => Err(de::Error::custom(format!("invalid age: {}", other))),
        }
    }

    pub fn price<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .filter(|p| *p >= 0.0)
                .ok_or_else(|| de::Error::custom(format!("invalid price: {}", n))),
            Value::String(s) => super::parse_price(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid price: {:?}", s))),
            other => Err(de::Error::custom(format!("invalid price: {}", other))),
        }
    }

    pub fn captain<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::String(s) => super::parse_captain(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid captain flag: {:?}", s))),
            other => Err(de::Error::custom(format!("invalid captain flag: {}", other))),
        }
    }
}

/// Application settings (frontend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the player API; `/Player` is appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Drop a player's identifier from the favorites when the player is deleted
    #[serde(default)]
    pub prune_favorites_on_delete: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            prune_favorites_on_delete: false,
        }
    }
}

impl AppSettings {
    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::InvalidConfig(format!("Invalid base URL {:?}: {}", self.base_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(AppError::InvalidConfig(format!(
                "Unsupported base URL scheme: {}",
                other
            ))),
        }
    }

    /// Convert to reconciler options
    pub fn to_reconciler_options(&self) -> crate::reconciler::ReconcilerOptions {
        crate::reconciler::ReconcilerOptions {
            prune_favorites_on_delete: self.prune_favorites_on_delete,
        }
    }
}

/// Player input field that failed coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Age,
    Price,
    Captain,
}

impl std::fmt::Display for PlayerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Age => "age",
            Self::Price => "price",
            Self::Captain => "captain",
        };
        f.write_str(name)
    }
}

/// Input rejected locally, before any request is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} {value:?}: {reason}")]
pub struct ValidationError {
    pub field: PlayerField,
    pub value: String,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: PlayerField, value: &str, reason: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// Failure talking to the player API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to fetch players: {0}")]
pub struct FetchError(#[from] pub RemoteError);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to add player: {0}")]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to update player: {0}")]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to delete player: {0}")]
pub struct DeleteError(#[from] pub RemoteError);

/// The local favorites slot could not be read or written
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Create(#[from] CreateError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}
