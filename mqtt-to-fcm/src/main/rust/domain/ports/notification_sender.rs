use async_trait::async_trait;

use crate::domain::value_objects::{DispatchResult, NotificationPayload};

/// Port for push gateway dispatch. Failures are reported in the result, never raised.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> DispatchResult;
}
