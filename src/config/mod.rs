use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub player: PlayerConfig,
    pub favorites: FavoritesConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or address of the media server.
    pub host: String,
    /// JSON-RPC port (`/jsonrpc.js`).
    pub http_port: u16,
    /// Line-oriented CLI port used for the event subscription.
    pub cli_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Display name of the player as shown by the server.
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Account whose saved playlists and albums are listed.
    pub user: String,
    /// Server-side app exposing the favorites tree.
    pub app: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Partial refreshes allowed before a full refresh is forced.
    pub partial_update_count: u32,
    /// Hours between two scheduled full refreshes.
    pub full_refresh_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 9000,
            cli_port: 9090,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            user: "default".to_string(),
            app: "spotty".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            partial_update_count: 100,
            full_refresh_hours: 12,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "inkplayer", "inkplayer");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("inkplayer"));
        Self { data_dir }
    }
}

impl ServerConfig {
    pub fn http_base(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }
}

impl DisplayConfig {
    pub fn full_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.full_refresh_hours.saturating_mul(3600))
    }
}

impl Config {
    /// Overlay the deployment environment on top of the file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("LMS_SERVER") {
            self.server.host = v;
        }
        if let Some(v) = parse_var(&lookup, "LMS_HTTP_PORT")? {
            self.server.http_port = v;
        }
        if let Some(v) = parse_var(&lookup, "LMS_CLI_PORT")? {
            self.server.cli_port = v;
        }
        if let Some(v) = lookup("PLAYER_NAME") {
            self.player.name = v;
        }
        if let Some(v) = lookup("SPOTIFY_USER") {
            self.favorites.user = v;
        }
        if let Some(v) = lookup("FAVORITES_APP") {
            self.favorites.app = v;
        }
        if let Some(v) = parse_var(&lookup, "PARTIAL_UPDATE_COUNT")? {
            self.display.partial_update_count = v;
        }
        if let Some(v) = parse_var(&lookup, "FULL_REFRESH_TIME")? {
            self.display.full_refresh_hours = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log.level = v.to_lowercase();
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => {
            let v = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {name}: {raw:?}"))?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "inkplayer", "inkplayer").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Read the config file (writing defaults on first start) and apply the
/// process environment.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut cfg = load_file(override_path)?;
    cfg.apply_env(|name| std::env::var(name).ok())?;
    Ok(cfg)
}

fn load_file(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
        }
        let cfg = Config::default();
        let raw = toml::to_string_pretty(&cfg).context("serialize default config")?;
        fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_suit_local_testing() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.cli_port, 9090);
        assert_eq!(cfg.server.http_base(), "http://127.0.0.1:9000");
        assert_eq!(cfg.player.name, "default");
        assert_eq!(cfg.display.partial_update_count, 100);
        assert_eq!(cfg.display.full_refresh_interval(), Duration::from_secs(12 * 3600));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[
            ("LMS_SERVER", "lms.local"),
            ("PLAYER_NAME", "Kitchen"),
            ("SPOTIFY_USER", "alice"),
            ("PARTIAL_UPDATE_COUNT", "25"),
            ("FULL_REFRESH_TIME", "3"),
            ("LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(cfg.server.host, "lms.local");
        assert_eq!(cfg.player.name, "Kitchen");
        assert_eq!(cfg.favorites.user, "alice");
        assert_eq!(cfg.display.partial_update_count, 25);
        assert_eq!(cfg.display.full_refresh_hours, 3);
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env(env(&[("PARTIAL_UPDATE_COUNT", "lots")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("PARTIAL_UPDATE_COUNT"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str("[player]\nname = \"Den\"\n").unwrap();
        assert_eq!(cfg.player.name, "Den");
        assert_eq!(cfg.server.http_port, 9000);
        assert_eq!(cfg.favorites.app, "spotty");
    }
}
