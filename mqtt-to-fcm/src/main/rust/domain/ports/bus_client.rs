use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::BusEvent;

/// What the bus client reports to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusNotification {
    /// A fresh session was established; previous subscriptions are gone
    Connected,
    /// A message arrived on a subscribed topic
    Event(BusEvent),
    /// The session dropped; the client reconnects on its own
    ConnectionLost { reason: String },
}

/// Port for publish/subscribe bus clients
#[async_trait]
pub trait BusClient: Send {
    /// Subscribe to a topic filter on the current session
    async fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Wait for the next notification.
    /// Returns `None` once the client is closed for good.
    async fn next_notification(&mut self) -> Option<BusNotification>;
}
