use std::time::Duration;

use crate::domain::errors::ConfigError;

const DEFAULT_CLIENT_ID_PREFIX: &str = "mqtt-to-fcm";
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Resolved settings the bridge runs with
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    broker_host: String,
    broker_port: u16,
    system_id: String,
    target_topic: String,
    client_id: String,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
}

impl BridgeConfig {
    pub fn new(
        broker_host: String,
        broker_port: u16,
        system_id: String,
        target_topic: String,
    ) -> Result<Self, ConfigError> {
        if broker_host.trim().is_empty() {
            return Err(ConfigError::MissingParameter("broker host"));
        }
        if broker_port == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "broker port",
                reason: "port cannot be zero".to_string(),
            });
        }
        if system_id.is_empty() || system_id.contains(&['/', '+', '#'][..]) {
            return Err(ConfigError::InvalidParameter {
                name: "system id",
                reason: format!("'{}' is not a single topic level", system_id),
            });
        }
        if target_topic.is_empty() {
            return Err(ConfigError::MissingParameter("push topic"));
        }

        let client_id = format!("{}-{}", DEFAULT_CLIENT_ID_PREFIX, system_id);
        Ok(Self {
            broker_host,
            broker_port,
            system_id,
            target_topic,
            client_id,
            credentials: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        })
    }

    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn broker_host(&self) -> &str {
        &self.broker_host
    }

    pub fn broker_port(&self) -> u16 {
        self.broker_port
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn target_topic(&self) -> &str {
        &self.target_topic
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }
}
