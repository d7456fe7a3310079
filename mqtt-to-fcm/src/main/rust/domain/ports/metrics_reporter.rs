use crate::domain::value_objects::{ConnectionState, DispatchResult};

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_state_change(&self, state: &ConnectionState);
    fn report_reconnect_attempt(&self);
    fn report_event_received(&self, routed: bool);
    fn report_dispatch(&self, result: &DispatchResult);
    fn report_token_exchange(&self, success: bool);
}
