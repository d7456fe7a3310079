use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::domain::errors::ConfigError;
use crate::domain::value_objects::{BackoffPolicy, BridgeConfig};
use crate::infrastructure::fcm::DEFAULT_GATEWAY_URL;

pub const ENV_BROKER_HOST: &str = "HOMA_BROKER_HOST";
pub const ENV_BROKER_PORT: &str = "HOMA_BROKER_PORT";
pub const ENV_SYSTEM_ID: &str = "HOMA_SYSTEM_ID";
pub const ENV_TOPIC: &str = "FCM_TOPIC";

pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_SYSTEM_ID: &str = "123456-garage";
pub const DEFAULT_TOPIC: &str = "homa";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mqtt-to-fcm",
    version = "0.1.0",
    about = "Forwards HomA MQTT device events as Firebase Cloud Messaging notifications"
)]
pub struct Config {
    /// MQTT broker host (overrides options file and HOMA_BROKER_HOST)
    #[arg(long)]
    pub broker_host: Option<String>,

    /// MQTT broker port (overrides options file and HOMA_BROKER_PORT)
    #[arg(long)]
    pub broker_port: Option<u16>,

    /// HomA system id whose controls are watched
    #[arg(long)]
    pub system_id: Option<String>,

    /// FCM topic notifications are sent to
    #[arg(long)]
    pub topic: Option<String>,

    /// Bridge options file
    #[arg(long, env = "FCM_OPTIONS_FILE", default_value = "fcm-options.json")]
    pub options_file: PathBuf,

    /// Google service-account key file
    #[arg(long, env = "FCM_SERVICE_ACCOUNT", default_value = "service-account.json")]
    pub service_account: PathBuf,

    /// Push gateway base URL
    #[arg(long, env = "FCM_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9003")]
    pub metrics_port: u16,

    /// Timeout for each HTTP request in seconds (token exchange and send)
    #[arg(long, default_value = "10")]
    pub request_timeout: u64,

    /// Refresh the gateway credential this many seconds before it expires
    #[arg(long, default_value = "300")]
    pub token_refresh_margin: u64,

    /// Maximum concurrent dispatches
    #[arg(long, default_value = "32")]
    pub max_in_flight: usize,

    /// Initial reconnection delay in seconds
    #[arg(long, default_value = "1")]
    pub reconnect_initial_delay: u64,

    /// Maximum reconnection delay in seconds
    #[arg(long, default_value = "30")]
    pub reconnect_max_delay: u64,

    /// Reconnection backoff multiplier
    #[arg(long, default_value = "2.0")]
    pub reconnect_multiplier: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// MQTT session options from the `mqtt_connect` block
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MqttConnectOptions {
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Keep-alive in seconds
    pub keepalive: Option<u64>,
}

/// Contents of the options file. Empty strings and zero ports count as unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeOptions {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub broker_host: Option<String>,
    #[serde(default)]
    pub broker_port: Option<u16>,
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default, rename = "mqtt_connect")]
    pub mqtt_connect: MqttConnectOptions,
}

impl BridgeOptions {
    /// Load the options file; a missing file yields empty options
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Options file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

/// Longest lifetime the identity provider grants a gateway credential
const MAX_TOKEN_LIFETIME_SECS: u64 = 3600;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.metrics_port, "metrics")?;

        if self.request_timeout == 0 {
            anyhow::bail!("Request timeout cannot be 0");
        }

        if self.token_refresh_margin >= MAX_TOKEN_LIFETIME_SECS {
            anyhow::bail!(
                "Token refresh margin ({}s) must be shorter than the credential lifetime ({}s)",
                self.token_refresh_margin,
                MAX_TOKEN_LIFETIME_SECS
            );
        }

        if self.max_in_flight == 0 {
            anyhow::bail!("Maximum in-flight dispatches cannot be 0");
        }

        if !self.gateway_url.starts_with("https://") && !self.gateway_url.starts_with("http://") {
            anyhow::bail!("Gateway URL must start with https:// or http://");
        }

        if self.reconnect_multiplier <= 1.0 {
            anyhow::bail!("Reconnect multiplier must be > 1.0");
        }

        if self.reconnect_initial_delay == 0 {
            anyhow::bail!("Initial reconnection delay cannot be 0");
        }

        if self.reconnect_max_delay < self.reconnect_initial_delay {
            anyhow::bail!(
                "Maximum reconnection delay ({}) cannot be less than initial delay ({})",
                self.reconnect_max_delay,
                self.reconnect_initial_delay
            );
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    /// Resolve bridge settings: command line > options file > environment > default.
    ///
    /// `env` looks up environment variables; `main` passes `std::env::var`.
    pub fn resolve<F>(&self, options: &BridgeOptions, env: F) -> Result<BridgeConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let broker_host = non_empty(self.broker_host.clone())
            .or_else(|| non_empty(options.broker_host.clone()))
            .or_else(|| non_empty(env(ENV_BROKER_HOST)))
            .ok_or(ConfigError::MissingParameter("broker host"))?;

        let non_zero = |port: Option<u16>| port.filter(|p| *p != 0);

        let broker_port = match non_zero(self.broker_port).or_else(|| non_zero(options.broker_port)) {
            Some(port) => port,
            None => match non_empty(env(ENV_BROKER_PORT)) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidParameter {
                    name: "broker port",
                    reason: format!("{}='{}' is not a port number", ENV_BROKER_PORT, raw),
                })?,
                None => DEFAULT_BROKER_PORT,
            },
        };

        let system_id = non_empty(self.system_id.clone())
            .or_else(|| non_empty(options.system_id.clone()))
            .or_else(|| non_empty(env(ENV_SYSTEM_ID)))
            .unwrap_or_else(|| DEFAULT_SYSTEM_ID.to_string());

        let topic = non_empty(self.topic.clone())
            .or_else(|| non_empty(options.topic.clone()))
            .or_else(|| non_empty(env(ENV_TOPIC)))
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let mut config = BridgeConfig::new(broker_host, broker_port, system_id, topic)?;

        let connect = &options.mqtt_connect;
        if let Some(client_id) = non_empty(connect.client_id.clone()) {
            config = config.with_client_id(client_id);
        }
        if let Some(username) = non_empty(connect.username.clone()) {
            config = config.with_credentials(username, connect.password.clone().unwrap_or_default());
        }
        if let Some(keepalive) = connect.keepalive.filter(|secs| *secs > 0) {
            config = config.with_keep_alive(Duration::from_secs(keepalive));
        }

        Ok(config)
    }

    pub fn to_backoff_policy(&self) -> crate::domain::errors::Result<BackoffPolicy> {
        BackoffPolicy::new(
            Duration::from_secs(self.reconnect_initial_delay),
            Duration::from_secs(self.reconnect_max_delay),
            self.reconnect_multiplier,
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin)
    }
}
