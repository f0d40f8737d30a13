// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Remote player repository
//
// The player API is a plain JSON CRUD endpoint. Every call is made once;
// failures are reported to the caller and never retried here.

use crate::types::{Player, PlayerDraft, RemoteError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Remote CRUD access to players, keyed by identifier
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Player>, RemoteError>;
    async fn get(&self, id: &str) -> Result<Player, RemoteError>;
    async fn create(&self, draft: &PlayerDraft) -> Result<Player, RemoteError>;
    async fn update(&self, id: &str, draft: &PlayerDraft) -> Result<Player, RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Player repository backed by the HTTP API
pub struct HttpPlayerRepository {
    http_client: Client,
    base_url: String,
}

impl HttpPlayerRepository {
    /// Create a repository for the API rooted at `base_url`.
    ///
    /// No request timeout is set; the connection's own behavior governs latency.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/Player", self.base_url)
    }

    fn player_url(&self, id: &str) -> String {
        format!("{}/Player/{}", self.base_url, id)
    }

    /// Turn a non-2xx response into a status error
    async fn check_status(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Serialization(format!("Failed to parse response: {}", e)))
    }
}

fn network_error(e: reqwest::Error) -> RemoteError {
    if e.is_connect() {
        RemoteError::Network(format!("Cannot connect: {}", e))
    } else {
        RemoteError::Network(format!("Request failed: {}", e))
    }
}

#[async_trait]
impl PlayerRepository for HttpPlayerRepository {
    async fn list(&self) -> Result<Vec<Player>, RemoteError> {
        let response = self
            .http_client
            .get(self.collection_url())
            .send()
            .await
            .map_err(network_error)?;

        let players: Vec<Player> = Self::parse(response).await?;
        tracing::debug!("Fetched {} players", players.len());
        Ok(players)
    }

    async fn get(&self, id: &str) -> Result<Player, RemoteError> {
        let response = self
            .http_client
            .get(self.player_url(id))
            .send()
            .await
            .map_err(network_error)?;

        Self::parse(response).await
    }

    async fn create(&self, draft: &PlayerDraft) -> Result<Player, RemoteError> {
        let response = self
            .http_client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await
            .map_err(network_error)?;

        let player: Player = Self::parse(response).await?;
        tracing::info!("Created player {} ({})", player.id, player.name);
        Ok(player)
    }

    async fn update(&self, id: &str, draft: &PlayerDraft) -> Result<Player, RemoteError> {
        let response = self
            .http_client
            .put(self.player_url(id))
            .json(draft)
            .send()
            .await
            .map_err(network_error)?;

        let player: Player = Self::parse(response).await?;
        tracing::info!("Updated player {}", player.id);
        Ok(player)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .http_client
            .delete(self.player_url(id))
            .send()
            .await
            .map_err(network_error)?;

        // The body is an acknowledgement only
        Self::check_status(response).await?;
        tracing::info!("Deleted player {}", id);
        Ok(())
    }
}
