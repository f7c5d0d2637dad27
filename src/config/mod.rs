use anyhow::{Context, Result};
use serde::Deserialize;

/// Complete chorus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChorusConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Plaintext greeting sent as the first frame of every subscribe session
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_greeting() -> String {
    "chorus says hello".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            greeting: default_greeting(),
            static_dir: default_static_dir(),
        }
    }
}

/// Fan-out configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Update ring capacity; a subscriber this many records behind loses
    /// the overflow rather than blocking publishers
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_body_bytes() -> usize {
    1_048_576
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<ChorusConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path))?;
    let config: ChorusConfig =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path))?;
    Ok(config)
}
