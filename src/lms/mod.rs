//! Media server binding.
//!
//! [`PlayerClient`] is the command/query surface the session controller
//! drives; [`LmsClient`] implements it over the server's JSON-RPC endpoint.
//! Every operation resolves the player afresh, nothing is cached between
//! calls.

pub mod models;
pub mod subscriber;

use crate::artwork::ArtworkFetcher;
use crate::config::Config;
use models::{
    FavoriteEntry, FavoriteKind, MenuResult, PlayerHandle, PlayersResult, StatusResult, Track,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("player {name:?} not found on the server")]
    Unavailable { name: String },
    #[error("media server request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected media server response: {0}")]
    Protocol(String),
}

/// Transport commands and queries against the configured player.
///
/// Commands succeed once the server accepted them; the resulting playback
/// change arrives later through the event feed.
#[allow(async_fn_in_trait)]
pub trait PlayerClient {
    async fn resolve_player(&self) -> Result<PlayerHandle, PlayerError>;
    async fn play(&self) -> Result<(), PlayerError>;
    async fn pause(&self) -> Result<(), PlayerError>;
    async fn next(&self) -> Result<(), PlayerError>;
    async fn previous(&self) -> Result<(), PlayerError>;
    async fn load_url(&self, url: &str) -> Result<(), PlayerError>;
    async fn refresh_current_track(&self) -> Result<Option<Track>, PlayerError>;
    async fn list_favorites(&self) -> Result<Vec<FavoriteEntry>, PlayerError>;
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
    player_name: String,
    favorites_user: String,
    favorites_app: String,
    artwork: ArtworkFetcher,
}

#[derive(Debug, Clone)]
pub struct LmsClient {
    inner: Arc<Inner>,
}

impl LmsClient {
    const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

    pub fn new(cfg: &Config) -> Result<Self, PlayerError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("inkplayer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(
            http.clone(),
            cfg.server.http_base(),
            cfg,
            ArtworkFetcher::new(http),
        ))
    }

    fn with_http(
        http: reqwest::Client,
        base_url: String,
        cfg: &Config,
        artwork: ArtworkFetcher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                player_name: cfg.player.name.clone(),
                favorites_user: cfg.favorites.user.clone(),
                favorites_app: cfg.favorites.app.clone(),
                artwork,
            }),
        }
    }

    /// Issue one `slim.request` and return its `result` object.
    async fn request(
        &self,
        player_id: &str,
        command: &[&str],
    ) -> Result<serde_json::Value, PlayerError> {
        debug!(player_id, ?command, "jsonrpc request");
        let body = json!({
            "id": 1,
            "method": "slim.request",
            "params": [player_id, command],
        });
        let response: serde_json::Value = self
            .inner
            .http
            .post(format!("{}/jsonrpc.js", self.inner.base_url))
            .timeout(Self::REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn query<T: DeserializeOwned + Default>(
        &self,
        player_id: &str,
        command: &[&str],
    ) -> Result<T, PlayerError> {
        let value = self.request(player_id, command).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(value)
            .map_err(|e| PlayerError::Protocol(format!("{}: {e}", command.join(" "))))
    }

    async fn command(&self, command: &[&str]) -> Result<(), PlayerError> {
        let player = self.resolve_player().await?;
        self.request(&player.id, command).await?;
        Ok(())
    }

    /// Make a server-relative image path absolute.
    fn image_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.inner.base_url, url.trim_start_matches('/'))
        }
    }

    /// Item id of the configured user's node in the favorites menu.
    async fn favorites_root(&self, player: &PlayerHandle) -> Result<Option<String>, PlayerError> {
        let app = self.inner.favorites_app.as_str();
        let menu_tag = format!("menu:{app}");
        let menu: MenuResult = self
            .query(&player.id, &[app, "items", "0", "255", menu_tag.as_str()])
            .await?;
        Ok(menu
            .item_loop
            .iter()
            .find(|item| item.text == self.inner.favorites_user)
            .and_then(|item| item.item_id()))
    }

    async fn favorites_branch(&self, kind: FavoriteKind) -> Result<Vec<FavoriteEntry>, PlayerError> {
        let player = self.resolve_player().await?;
        let Some(root) = self.favorites_root(&player).await? else {
            debug!(user = %self.inner.favorites_user, "no favorites node for user");
            return Ok(Vec::new());
        };

        let app = self.inner.favorites_app.as_str();
        let menu_tag = format!("menu:{app}");
        let branch = format!("item_id:{root}.{}", kind.branch());
        let menu: MenuResult = self
            .query(&player.id, &[app, "items", "0", "255", menu_tag.as_str(), branch.as_str()])
            .await?;

        let mut entries = Vec::with_capacity(menu.item_loop.len());
        for item in menu.item_loop {
            let preset = item.preset_params.unwrap_or_default();
            let Some(url) = preset.favorites_url else {
                debug!(text = %item.text, "favorite without launch url, skipped");
                continue;
            };
            let (title, subtitle) = match kind {
                FavoriteKind::Playlist => (item.text.clone(), self.inner.favorites_user.clone()),
                FavoriteKind::Album => match item.text.split_once('\n') {
                    Some((title, artist)) => (title.to_string(), artist.to_string()),
                    None => (item.text.clone(), String::new()),
                },
            };
            let artwork = match preset.icon {
                Some(icon) => self.inner.artwork.fetch(&self.image_url(&icon)).await,
                None => crate::artwork::Artwork::fallback(),
            };
            entries.push(FavoriteEntry {
                kind,
                title,
                subtitle,
                artwork,
                url,
            });
        }
        Ok(entries)
    }
}

impl PlayerClient for LmsClient {
    async fn resolve_player(&self) -> Result<PlayerHandle, PlayerError> {
        let players: PlayersResult = self.query("", &["players", "0", "99"]).await?;
        players
            .players_loop
            .into_iter()
            .find(|p| p.name == self.inner.player_name)
            .map(|p| PlayerHandle {
                id: p.playerid,
                name: p.name,
            })
            .ok_or_else(|| PlayerError::Unavailable {
                name: self.inner.player_name.clone(),
            })
    }

    async fn play(&self) -> Result<(), PlayerError> {
        self.command(&["play"]).await
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.command(&["pause", "1"]).await
    }

    async fn next(&self) -> Result<(), PlayerError> {
        self.command(&["playlist", "index", "+1"]).await
    }

    async fn previous(&self) -> Result<(), PlayerError> {
        self.command(&["button", "jump_rew"]).await
    }

    async fn load_url(&self, url: &str) -> Result<(), PlayerError> {
        self.command(&["playlist", "play", url]).await
    }

    async fn refresh_current_track(&self) -> Result<Option<Track>, PlayerError> {
        let player = self.resolve_player().await?;
        let status: StatusResult = self
            .query(&player.id, &["status", "-", "1", "tags:aldKJjt"])
            .await?;
        let Some(current) = status.playlist_loop.into_iter().next() else {
            return Ok(None);
        };

        let art_url = match current.artwork_url.as_deref() {
            Some(url) if !url.is_empty() => self.image_url(url),
            _ => self.image_url(&format!(
                "/music/current/cover.jpg?player={}",
                urlencoding::encode(&player.id)
            )),
        };

        Ok(Some(Track {
            title: current.title,
            artist: current.artist.unwrap_or_default(),
            album: current.album.unwrap_or_default(),
            duration_seconds: status.duration.or(current.duration),
            artwork: self.inner.artwork.fetch(&art_url).await,
            elapsed_seconds: status.time.unwrap_or(0.0),
        }))
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteEntry>, PlayerError> {
        let (playlists, albums) = tokio::join!(
            self.favorites_branch(FavoriteKind::Playlist),
            self.favorites_branch(FavoriteKind::Album),
        );
        let mut favorites = playlists?;
        favorites.extend(albums?);
        Ok(favorites)
    }
}
