use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG: &str = r#"
[api]
# Backend root; every endpoint lives under <base_url>/api
base_url = "http://localhost:3001"
timeout_secs = 30

[dashboard]
page_size = 20
# How long the "deleted" banner stays up
success_message_secs = 3

[session]
# Delay before re-probing the session after a login whose cookie is not visible yet
verify_retry_ms = 1000
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_success_message_secs")]
    pub success_message_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            success_message_secs: default_success_message_secs(),
        }
    }
}

impl DashboardSettings {
    pub fn success_message_ttl(&self) -> Duration {
        Duration::from_secs(self.success_message_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_verify_retry_ms")]
    pub verify_retry_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            verify_retry_ms: default_verify_retry_ms(),
        }
    }
}

impl SessionSettings {
    pub fn verify_retry_delay(&self) -> Duration {
        Duration::from_millis(self.verify_retry_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    shared_types::DEFAULT_PAGE_SIZE
}

fn default_success_message_secs() -> u64 {
    3
}

fn default_verify_retry_ms() -> u64 {
    1000
}

impl ClientConfig {
    /// Loads the config from the user's config directory, writing the
    /// default file first if none exists.
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();
        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Reads `config_path`, then applies `LEADS_<SECTION>__<KEY>` variables
    /// such as `LEADS_API__BASE_URL`.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(
                Environment::with_prefix("LEADS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ClientConfig = builder.try_deserialize()?;
        Ok(config)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("leads").join("client.toml")
    } else {
        PathBuf::from("client.toml")
    }
}
