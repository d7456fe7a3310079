use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::ports::{MetricsReporter, NotificationSender};
use crate::domain::services::NotificationBuilder;
use crate::domain::value_objects::{BusEvent, DispatchResult, RoutingTable};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Turns bus events into gateway dispatches according to the routing table
pub struct EventRouter {
    table: RoutingTable,
    target_topic: String,
    sender: Arc<dyn NotificationSender>,
    metrics: Arc<dyn MetricsReporter>,
    in_flight: Arc<Semaphore>,
}

impl EventRouter {
    pub fn new(
        table: RoutingTable,
        target_topic: String,
        sender: Arc<dyn NotificationSender>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            table,
            target_topic,
            sender,
            metrics,
            in_flight: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
        }
    }

    /// Cap concurrent dispatches. Events past the cap wait in their own task.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.in_flight = Arc::new(Semaphore::new(max_in_flight.max(1)));
        self
    }

    /// Handle one bus event without waiting for the dispatch.
    ///
    /// Returns the dispatch task, or `None` when no rule matches the topic.
    pub fn on_event(&self, event: BusEvent) -> Option<JoinHandle<DispatchResult>> {
        tracing::info!("Bus message received: {} = {}", event.topic(), event.payload_text());

        let Some(rule) = self.table.resolve(event.topic()) else {
            tracing::debug!(topic = %event.topic(), "No rule for topic, ignoring");
            self.metrics.report_event_received(false);
            return None;
        };
        self.metrics.report_event_received(true);

        let content = rule.apply(&event);
        let payload = NotificationBuilder::build(
            &self.target_topic,
            &content.title,
            &content.body,
            content.color.as_deref(),
            content.tag.as_deref(),
        );

        let sender = Arc::clone(&self.sender);
        let metrics = Arc::clone(&self.metrics);
        let in_flight = Arc::clone(&self.in_flight);

        Some(tokio::spawn(async move {
            // The semaphore is never closed
            let _permit = in_flight.acquire_owned().await.ok();
            let result = sender.send(&payload).await;
            metrics.report_dispatch(&result);
            result
        }))
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }
}
