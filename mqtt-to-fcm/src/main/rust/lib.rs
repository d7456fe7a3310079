pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shutdown;

// Re-exports for convenience
pub use application::services::{BridgeService, CredentialProvider, EventRouter};
pub use config::{BridgeOptions, Config};
pub use domain::entities::{ConnectionLifecycle, StateTransition};
pub use domain::errors::{AuthError, ConfigError, DispatchError, DomainError, Result};
pub use domain::ports::{
    BusClient, BusNotification, MetricsReporter, NotificationSender, TokenExchanger, TokenSource,
};
pub use domain::services::NotificationBuilder;
pub use domain::value_objects::{
    BackoffPolicy, BridgeConfig, BusEvent, ConnectionState, Credential, DispatchResult,
    NotificationPayload, RoutingTable,
};
pub use infrastructure::fcm::PushDispatcher;
pub use infrastructure::google::{ServiceAccountExchanger, ServiceAccountKey};
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
pub use infrastructure::mqtt::MqttBusClient;
