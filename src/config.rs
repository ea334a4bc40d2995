use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

const DEFAULT_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_secs: DEFAULT_INTERVAL_SECS,
            output_dir: PathBuf::from("."),
        }
    }
}

impl GeneralConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Replaces values the sampling loop cannot run with.
    pub fn sanitized(mut self) -> Self {
        if self.general.interval_secs == 0 {
            warn!(
                "interval_secs = 0 is not allowed, using {}",
                DEFAULT_INTERVAL_SECS
            );
            self.general.interval_secs = DEFAULT_INTERVAL_SECS;
        }
        self
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("memtrail").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            warn!("ignoring unparsable config {}: {e}", path.display());
            Config::default()
        }
    }
}
