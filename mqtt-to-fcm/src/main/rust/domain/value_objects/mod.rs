mod backoff_policy;
mod bridge_config;
mod bus_event;
mod connection_state;
mod credential;
mod dispatch_result;
mod notification_payload;
pub mod routing_table;

pub use backoff_policy::BackoffPolicy;
pub use bridge_config::BridgeConfig;
pub use bus_event::BusEvent;
pub use connection_state::ConnectionState;
pub use credential::Credential;
pub use dispatch_result::DispatchResult;
pub use notification_payload::{AndroidNotification, NotificationPayload};
pub use routing_table::{NotificationContent, RoutingTable, RuleHandler, TopicRule};
