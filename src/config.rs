use anyhow::{Context, Result, ensure};
use std::{env, time::Duration};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Door controller address and credentials
    pub device: DeviceEnvConfig,

    /// HTTP client configuration
    pub client: ClientConfig,

    /// Status polling configuration
    pub poller: PollerConfig,
}

#[derive(Clone, Debug)]
pub struct DeviceEnvConfig {
    pub host_address: String,
    pub auth_key: String,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub request_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl AppConfig {
    /// Load the configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load the configuration from an arbitrary variable lookup
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            device: DeviceEnvConfig::load(&lookup)?,
            client: ClientConfig::load(&lookup)?,
            poller: PollerConfig::load(&lookup)?,
        })
    }
}

impl DeviceEnvConfig {
    const DEFAULT_HOST: &'static str = "192.168.1.100";

    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host_address = lookup("DOOR_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let auth_key = lookup("DOOR_AUTH_KEY").context("failed to get DOOR_AUTH_KEY")?;

        Ok(Self {
            host_address,
            auth_key,
        })
    }
}

impl ClientConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let request_timeout = seconds(lookup, "DOOR_REQUEST_TIMEOUT_SECS", 5)?;

        Ok(Self { request_timeout })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl PollerConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let interval = seconds(lookup, "DOOR_POLL_INTERVAL_SECS", 5)?;

        Ok(Self { interval })
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Result<Duration> {
    let secs = match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("failed to parse {name}: invalid format"))?,
        None => default,
    };

    ensure!(secs > 0, "failed to parse {name}: must be greater than zero");

    Ok(Duration::from_secs(secs))
}
