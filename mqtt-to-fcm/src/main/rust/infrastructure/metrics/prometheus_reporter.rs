use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::{ConnectionState, DispatchResult};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Connection state (0=Idle, 1=Connecting, 2=Connected, 3=Reconnecting, 4=Stopped)
    pub static ref CONNECTION_STATE: Gauge = Gauge::new(
        "bus_connection_state",
        "Current bus connection state"
    ).expect("metric can be created");

    pub static ref RECONNECT_ATTEMPTS: IntCounter = IntCounter::new(
        "bus_reconnect_attempts_total",
        "Total number of bus reconnection attempts"
    ).expect("metric can be created");

    // Labelled by whether a routing rule matched
    pub static ref EVENTS_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("bus_events_received_total", "Bus messages received"),
        &["routed"]
    ).expect("metric can be created");

    // Labelled by outcome: sent, rejected, transport, auth
    pub static ref DISPATCHES: IntCounterVec = IntCounterVec::new(
        Opts::new("push_dispatches_total", "Push gateway dispatches by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref TOKEN_EXCHANGES: IntCounterVec = IntCounterVec::new(
        Opts::new("credential_exchanges_total", "Credential exchanges by outcome"),
        &["outcome"]
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(CONNECTION_STATE.clone()))?;
        REGISTRY.register(Box::new(RECONNECT_ATTEMPTS.clone()))?;
        REGISTRY.register(Box::new(EVENTS_RECEIVED.clone()))?;
        REGISTRY.register(Box::new(DISPATCHES.clone()))?;
        REGISTRY.register(Box::new(TOKEN_EXCHANGES.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch_outcome(result: &DispatchResult) -> &'static str {
    use crate::domain::errors::DispatchError;

    match &result.error {
        None => "sent",
        Some(DispatchError::Rejected { .. }) => "rejected",
        Some(DispatchError::Transport(_)) => "transport",
        Some(DispatchError::Auth(_)) => "auth",
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, state: &ConnectionState) {
        CONNECTION_STATE.set(state.as_metric());
    }

    fn report_reconnect_attempt(&self) {
        RECONNECT_ATTEMPTS.inc();
    }

    fn report_event_received(&self, routed: bool) {
        EVENTS_RECEIVED
            .with_label_values(&[if routed { "true" } else { "false" }])
            .inc();
    }

    fn report_dispatch(&self, result: &DispatchResult) {
        DISPATCHES.with_label_values(&[dispatch_outcome(result)]).inc();
    }

    fn report_token_exchange(&self, success: bool) {
        TOKEN_EXCHANGES
            .with_label_values(&[if success { "ok" } else { "error" }])
            .inc();
    }
}
