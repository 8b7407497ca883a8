// Configuration boundary: the JSON file is read and validated here once, and
// the rest of the crate only ever sees the typed `Config` value.

use crate::api::Credentials;
use crate::errors::{MemeError, MemeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at the config file when `--config` is
/// not given on the command line.
pub const CONFIG_ENV_VAR: &str = "DAILY_MEMES_CONFIG";

const APP_DIR: &str = "daily-memes";

/// Every setting a run needs. Field names mirror the keys in `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub imgur_client_id: String,
    pub imgur_client_secret: String,
    pub imgur_access_token: String,
    pub imgur_refresh_token: String,
    /// Directory the memes are picked from.
    pub memes: PathBuf,
    /// How many memes go into one album.
    pub limit: usize,
    pub imgur_album_title_prefix: String,
    pub imgur_album_desc: String,
    /// Where the used-set lives; defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_path: Option<PathBuf>,
}

impl Config {
    /// Read and validate the config at `path`.
    pub fn load(path: &Path) -> MemeResult<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating; `authorize` uses this to fill in tokens
    /// that are still blank.
    pub fn read(path: &Path) -> MemeResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MemeError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            MemeError::Config(format!("cannot parse '{}': {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Write the config back as pretty JSON, e.g. after `authorize` swapped
    /// in fresh tokens.
    pub fn save(&self, path: &Path) -> MemeResult<()> {
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| MemeError::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(path, body).map_err(|e| {
            MemeError::Config(format!("cannot write '{}': {}", path.display(), e))
        })
    }

    /// Reject blank settings up front so a run never starts half-configured.
    pub fn validate(&self) -> MemeResult<()> {
        let required = [
            ("imgur_client_id", self.imgur_client_id.as_str()),
            ("imgur_client_secret", self.imgur_client_secret.as_str()),
            ("imgur_access_token", self.imgur_access_token.as_str()),
            ("imgur_refresh_token", self.imgur_refresh_token.as_str()),
            ("imgur_album_title_prefix", self.imgur_album_title_prefix.as_str()),
            ("imgur_album_desc", self.imgur_album_desc.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(MemeError::Config(format!("'{}' must not be empty", field)));
            }
        }
        if self.memes.as_os_str().is_empty() {
            return Err(MemeError::Config("'memes' must not be empty".into()));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.imgur_client_id.clone(),
            client_secret: self.imgur_client_secret.clone(),
            access_token: self.imgur_access_token.clone(),
            refresh_token: self.imgur_refresh_token.clone(),
        }
    }

    /// Take over tokens handed out during authentication. Returns whether the
    /// refresh token changed, i.e. whether the config must be saved for the
    /// next run to authenticate.
    pub fn adopt_tokens(&mut self, credentials: &Credentials) -> bool {
        let rotated = self.imgur_refresh_token != credentials.refresh_token;
        self.imgur_access_token = credentials.access_token.clone();
        self.imgur_refresh_token = credentials.refresh_token.clone();
        rotated
    }

    /// Resolved used-set location.
    pub fn used_path(&self) -> PathBuf {
        self.used_path.clone().unwrap_or_else(default_used_path)
    }
}

/// Pick the config file: explicit flag, then `DAILY_MEMES_CONFIG`, then the
/// platform config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

fn default_used_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("used.txt")
}
