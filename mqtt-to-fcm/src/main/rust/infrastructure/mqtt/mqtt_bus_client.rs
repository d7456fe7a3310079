use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{BusClient, BusNotification};
use crate::domain::value_objects::{BackoffPolicy, BridgeConfig, BusEvent};

/// Requests buffered between the client handle and the event loop
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Delay schedule across consecutive failed connection attempts
#[derive(Debug)]
struct ReconnectSchedule {
    policy: BackoffPolicy,
    failures: u32,
    delay: Duration,
}

impl ReconnectSchedule {
    fn new(policy: BackoffPolicy) -> Self {
        let delay = policy.initial_delay();
        Self {
            policy,
            failures: 0,
            delay,
        }
    }

    fn on_failure(&mut self) -> Duration {
        self.delay = if self.failures == 0 {
            self.policy.initial_delay()
        } else {
            self.policy.next_delay(self.delay)
        };
        self.failures += 1;
        self.delay
    }

    fn on_connected(&mut self) {
        self.failures = 0;
    }
}

/// MQTT implementation of the bus port on top of `rumqttc`.
///
/// The event loop reconnects by itself when polled after an error; this
/// adapter only spaces the attempts out. Sessions are clean, so the
/// service must subscribe again after every `Connected`.
pub struct MqttBusClient {
    client: AsyncClient,
    event_loop: EventLoop,
    schedule: ReconnectSchedule,
    wait_before_poll: Option<Duration>,
}

impl MqttBusClient {
    pub fn new(config: &BridgeConfig, backoff: BackoffPolicy) -> Self {
        let mut options = MqttOptions::new(
            config.client_id(),
            config.broker_host(),
            config.broker_port(),
        );
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);
        if let Some((username, password)) = config.credentials() {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        tracing::info!(
            "MQTT client {} targeting {}:{}",
            config.client_id(),
            config.broker_host(),
            config.broker_port()
        );

        Self {
            client,
            event_loop,
            schedule: ReconnectSchedule::new(backoff),
            wait_before_poll: None,
        }
    }
}

#[async_trait]
impl BusClient for MqttBusClient {
    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|e| DomainError::Bus(format!("subscribe to '{}' failed: {}", topic, e)))
    }

    async fn next_notification(&mut self) -> Option<BusNotification> {
        if let Some(delay) = self.wait_before_poll.take() {
            tracing::info!("Reconnecting to broker in {:?}", delay);
            tokio::time::sleep(delay).await;
        }

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.schedule.on_connected();
                    return Some(BusNotification::Connected);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(BusNotification::Event(BusEvent::new(
                        publish.topic,
                        publish.payload.to_vec(),
                    )));
                }
                Ok(other) => {
                    tracing::trace!("MQTT event: {:?}", other);
                }
                Err(e) => {
                    self.wait_before_poll = Some(self.schedule.on_failure());
                    return Some(BusNotification::ConnectionLost {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
