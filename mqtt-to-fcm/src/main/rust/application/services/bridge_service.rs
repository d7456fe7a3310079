use std::future::Future;
use std::sync::Arc;

use crate::application::services::EventRouter;
use crate::domain::entities::ConnectionLifecycle;
use crate::domain::errors::Result;
use crate::domain::ports::{BusClient, BusNotification, MetricsReporter};
use crate::domain::value_objects::ConnectionState;

/// Application service owning the bus session and feeding the router
pub struct BridgeService {
    bus: Box<dyn BusClient>,
    router: EventRouter,
    subscriptions: Vec<String>,
    lifecycle: ConnectionLifecycle,
    metrics: Arc<dyn MetricsReporter>,
}

impl BridgeService {
    pub fn new(
        bus: Box<dyn BusClient>,
        router: EventRouter,
        subscriptions: Vec<String>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            bus,
            router,
            subscriptions,
            lifecycle: ConnectionLifecycle::new(),
            metrics,
        }
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.lifecycle.current_state()
    }

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    /// Process bus notifications until `shutdown` resolves or the bus closes
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut reconnect_attempt = 0u32;

        self.lifecycle.transition_to_connecting();
        self.metrics.report_state_change(self.lifecycle.current_state());

        loop {
            let notification = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                notification = self.bus.next_notification() => notification,
            };

            match notification {
                Some(BusNotification::Connected) => {
                    reconnect_attempt = 0;
                    self.lifecycle.transition_to_connected();
                    self.metrics.report_state_change(self.lifecycle.current_state());
                    tracing::info!(
                        "Connected to bus (session {}), subscribing to {} topics",
                        self.lifecycle.connect_count(),
                        self.subscriptions.len()
                    );
                    self.subscribe_all().await;
                }
                Some(BusNotification::Event(event)) => {
                    // Dispatch outcome is logged by the sender
                    let _ = self.router.on_event(event);
                }
                Some(BusNotification::ConnectionLost { reason }) => {
                    if let Some(uptime) = self.lifecycle.uptime() {
                        tracing::warn!("Bus connection lost after {:?}: {}", uptime, reason);
                    } else {
                        tracing::warn!("Bus connection attempt failed: {}", reason);
                    }
                    reconnect_attempt += 1;
                    self.metrics.report_reconnect_attempt();
                    self.lifecycle
                        .transition_to_reconnecting(reconnect_attempt, Some(reason));
                    self.metrics.report_state_change(self.lifecycle.current_state());
                }
                None => {
                    tracing::info!("Bus client closed");
                    break;
                }
            }
        }

        self.lifecycle.transition_to_stopped(Some("Stopped".to_string()));
        self.metrics.report_state_change(self.lifecycle.current_state());
        tracing::info!("Bridge stopped");

        Ok(())
    }

    /// Failures are logged only; the next `Connected` subscribes again
    async fn subscribe_all(&mut self) {
        for topic in &self.subscriptions {
            match self.bus.subscribe(topic).await {
                Ok(()) => tracing::debug!(topic = %topic, "Subscribed"),
                Err(e) => tracing::warn!(topic = %topic, "Subscription failed: {}", e),
            }
        }
    }
}
