use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key value written into freshly created config files.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_YOUTUBE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    /// Channel IDs, in the order they were added.
    pub subscriptions: Vec<String>,
    pub feed: FeedConfig,
    pub player: PlayerConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// How many uploads to keep per channel.
    pub max_videos_per_channel: u32,
    /// Minutes before the video cache goes stale.
    pub cache_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Cap on the stream height mpv is asked for.
    pub max_resolution: u32,
    /// Mark a video watched when playback starts.
    pub mark_as_watched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    /// Overrides the watched-history database location.
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            subscriptions: Vec::new(),
            feed: FeedConfig::default(),
            player: PlayerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_videos_per_channel: 5,
            cache_minutes: 30,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_resolution: 1080,
            mark_as_watched: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "subfeed", "subfeed");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("subfeed"));
        Self {
            data_dir,
            database: None,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        match &self.paths.database {
            Some(p) => p.clone(),
            None => self.paths.data_dir.join("watched.db"),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed.cache_minutes * 60)
    }
}

impl ApiConfig {
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != PLACEHOLDER_API_KEY
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "subfeed", "subfeed").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Writes subscription changes back into the config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new(override_path: Option<&Path>) -> Self {
        Self {
            path: override_path.map(Path::to_path_buf),
        }
    }
}

impl crate::feed::SubscriptionStore for ConfigStore {
    fn persist(&mut self, ids: &[String]) -> anyhow::Result<()> {
        // Re-read the file first so edits to unrelated settings are kept.
        let path = self.path.as_deref();
        let mut cfg = load(path)?;
        cfg.subscriptions = ids.to_vec();
        save(&cfg, path)
    }
}
