use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::script::BuiltinScript;

/// Env var that forces reduced motion regardless of the config file.
pub const REDUCED_MOTION_ENV: &str = "STAGEHAND_REDUCED_MOTION";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub builtin: String,
    pub script: Option<PathBuf>,
    pub reduced_motion: bool,
    pub audio: bool,
    pub volume: f32,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builtin: BuiltinScript::Update.to_string().to_lowercase(),
            script: None,
            reduced_motion: false,
            audio: true,
            volume: 0.6,
            tick_rate_ms: 50,
        }
    }
}

impl Config {
    /// Reduced motion from the config or the environment. Any value other
    /// than empty, `0` or `false` turns it on.
    pub fn reduced_motion_with_env(&self, env: Option<&str>) -> bool {
        self.reduced_motion
            || env.is_some_and(|v| !matches!(v.trim(), "" | "0" | "false"))
    }

    pub fn reduced_motion_from_env(&self) -> bool {
        self.reduced_motion_with_env(std::env::var(REDUCED_MOTION_ENV).ok().as_deref())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "stagehand") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("stagehand_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
