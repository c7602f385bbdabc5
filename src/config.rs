use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "SOUNDBOARD_BRIDGE_CONFIG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8877;
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_LISTEN_PORT: u16 = 8878;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Host or Port not configured")]
    MissingHostOrPort,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Address of the soundboard application.
    pub host: String,
    pub port: u16,
    /// Retry on a fixed timer after the connection fails or closes.
    pub reconnect: bool,
    pub reconnect_interval_ms: u64,
    /// Where the panel API is served.
    pub listen: SocketAddr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reconnect: true,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_LISTEN_PORT)),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() || self.port == 0 {
            return Err(ConfigError::MissingHostOrPort);
        }
        Ok(())
    }

    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host.trim(), self.port)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub async fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: BridgeConfig =
            tokio::task::spawn_blocking(move || serde_json::from_str::<BridgeConfig>(&content))
                .await?
                .with_context(|| format!("Invalid config file {}", path.display()))?;

        log::info!("Config loaded from: {}", path.display());
        Ok(config)
    }

    /// Loads from `path`, else from the file named by `SOUNDBOARD_BRIDGE_CONFIG`,
    /// else falls back to defaults.
    pub async fn load(path: Option<PathBuf>) -> Result<Self, anyhow::Error> {
        let path = path.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        match path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                log::info!("No config file given, using defaults.");
                Ok(Self::default())
            }
        }
    }
}
