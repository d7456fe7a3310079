mod bus_client;
mod metrics_reporter;
mod notification_sender;
mod token_exchanger;

pub use bus_client::{BusClient, BusNotification};
pub use metrics_reporter::MetricsReporter;
pub use notification_sender::NotificationSender;
pub use token_exchanger::{TokenExchanger, TokenSource};
