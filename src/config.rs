use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub modules: ModulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// One Unisphere endpoint to poll. Every enabled module runs against each
/// configured endpoint with its own session client.
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub username: String,
    pub password: SecretString,
    /// Skip TLS certificate verification (self-signed array certificates).
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Static labels attached to every metric and log record of this endpoint.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModulesConfig {
    #[serde(default)]
    pub metric: MetricModuleConfig,
    #[serde(default)]
    pub alert: AlertModuleConfig,
    #[serde(default)]
    pub event: EventModuleConfig,
    #[serde(default)]
    pub capacity: CapacityModuleConfig,
    #[serde(default)]
    pub storage_processor: StorageProcessorModuleConfig,
}

/// Realtime metric module: catalog path patterns to register. A pattern
/// ending in `%` matches by containment, anything else matches exactly.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricModuleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlertModuleConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Entries with a severity code below this are dropped.
    #[serde(default)]
    pub min_severity: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventModuleConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Entries with a severity code below this are dropped. Events default to
    /// ERROR and above; the array logs a lot below that.
    #[serde(default = "default_event_severity")]
    pub min_severity: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CapacityModuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageProcessorModuleConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for EventModuleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_severity: default_event_severity(),
        }
    }
}

impl Default for CapacityModuleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl EndpointConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9100
}

fn default_poll_interval() -> u64 {
    60
}

fn default_event_severity() -> i64 {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("UNISPHERE_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("at least one [[endpoints]] entry is required");
        }
        for endpoint in &self.endpoints {
            if endpoint.url.is_empty() {
                anyhow::bail!("endpoint url must not be empty");
            }
            if endpoint.poll_interval_seconds == 0 {
                anyhow::bail!(
                    "poll_interval_seconds must be at least 1 for {}",
                    endpoint.url
                );
            }
        }
        Ok(())
    }
}
