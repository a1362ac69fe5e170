use axum_extra::extract::cookie::Key;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::StudyError;
use crate::router::StaticAssets;

/// Runtime configuration, layered as defaults < `STUDY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    /// The one username allowed to mutate data.
    pub account: String,
    /// Key material for the private session cookie; at least 64 bytes.
    pub session_secret: Option<String>,
    pub static_dir: PathBuf,
    pub insecure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:checklist.db".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            loglevel: "info".to_string(),
            account: "owner".to_string(),
            session_secret: None,
            static_dir: PathBuf::from("."),
            insecure_cookie: false,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("STUDY_"))
    }

    /// Load from the process environment. A bare `PORT` variable is honoured
    /// when `STUDY_LISTEN_ADDR` is not set.
    pub fn load() -> Result<Self, StudyError> {
        let port = std::env::var("PORT").ok();
        let explicit_addr = std::env::var_os("STUDY_LISTEN_ADDR").is_some();
        let mut cfg = Self::from_figment(Self::figment())?;
        if !explicit_addr && let Some(port) = port {
            cfg.apply_port(&port);
        }
        Ok(cfg)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, StudyError> {
        let cfg: Config = figment.extract()?;
        if cfg.account.trim().is_empty() {
            return Err(StudyError::Config("account must not be empty".to_string()));
        }
        Ok(cfg)
    }

    fn apply_port(&mut self, port: &str) {
        let port = port.trim();
        if !port.is_empty() {
            self.listen_addr = format!("0.0.0.0:{port}");
        }
    }

    /// File name of the SQLite database, when `database_url` names a file.
    pub fn database_file_name(&self) -> Option<String> {
        let url = self.database_url.as_str();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() || path == ":memory:" {
            return None;
        }
        Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn static_assets(&self) -> StaticAssets {
        let assets = StaticAssets::new(self.static_dir.clone());
        match self.database_file_name() {
            Some(name) => assets.hide_database_files(&name),
            None => assets,
        }
    }

    /// Cookie key for session encryption. Without a configured secret a random
    /// key is generated, so sessions do not survive a restart.
    pub fn session_key(&self) -> Result<Key, StudyError> {
        match self.session_secret.as_deref() {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
                StudyError::Config("session_secret must be at least 64 bytes".to_string())
            }),
            None => {
                warn!("no session_secret configured; generating an ephemeral session key");
                Ok(Key::generate())
            }
        }
    }
}
