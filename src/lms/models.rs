use crate::artwork::Artwork;
use serde::{Deserialize, Deserializer};

/// Snapshot of the track the player reports; replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: Option<f64>,
    pub artwork: Artwork,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    Album,
    Playlist,
}

impl FavoriteKind {
    /// Index of the branch under the user's node in the favorites tree.
    pub fn branch(self) -> u8 {
        match self {
            FavoriteKind::Album => 1,
            FavoriteKind::Playlist => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FavoriteKind::Album => "album",
            FavoriteKind::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub kind: FavoriteKind,
    pub title: String,
    /// Artist for albums, owner for playlists.
    pub subtitle: String,
    pub artwork: Artwork,
    pub url: String,
}

/// A player as resolved on the server for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHandle {
    pub id: String,
    pub name: String,
}

// JSON-RPC payloads. The server is loose with number types, so numeric
// fields accept both numbers and numeric strings.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PlayersResult {
    pub players_loop: Vec<PlayerEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerEntry {
    pub name: String,
    pub playerid: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatusResult {
    #[serde(deserialize_with = "lenient_f64")]
    pub time: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    pub playlist_loop: Vec<StatusTrack>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatusTrack {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork_url: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MenuResult {
    pub item_loop: Vec<MenuItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MenuItem {
    pub text: String,
    pub actions: Option<MenuActions>,
    #[serde(rename = "presetParams")]
    pub preset_params: Option<PresetParams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MenuActions {
    pub go: Option<MenuGo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MenuGo {
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PresetParams {
    pub icon: Option<String>,
    pub favorites_url: Option<String>,
}

impl MenuItem {
    pub fn item_id(&self) -> Option<String> {
        let id = self.actions.as_ref()?.go.as_ref()?.params.get("item_id")?;
        match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_accepts_string_numbers() {
        let status: StatusResult = serde_json::from_value(json!({
            "time": "12.5",
            "duration": 215,
            "playlist_loop": [{"title": "So What", "duration": "545.2"}]
        }))
        .unwrap();
        assert_eq!(status.time, Some(12.5));
        assert_eq!(status.duration, Some(215.0));
        assert_eq!(status.playlist_loop[0].duration, Some(545.2));
        assert_eq!(status.playlist_loop[0].artist, None);
    }

    #[test]
    fn test_menu_item_id_number_or_string() {
        let menu: MenuResult = serde_json::from_value(json!({
            "item_loop": [
                {"text": "alice", "actions": {"go": {"params": {"item_id": "3f2a"}}}},
                {"text": "bob", "actions": {"go": {"params": {"item_id": 7}}}},
                {"text": "no actions"}
            ]
        }))
        .unwrap();
        assert_eq!(menu.item_loop[0].item_id().as_deref(), Some("3f2a"));
        assert_eq!(menu.item_loop[1].item_id().as_deref(), Some("7"));
        assert_eq!(menu.item_loop[2].item_id(), None);
    }
}
