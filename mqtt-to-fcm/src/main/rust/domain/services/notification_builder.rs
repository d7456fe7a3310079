use crate::domain::value_objects::{AndroidNotification, NotificationPayload};

pub struct NotificationBuilder;

impl NotificationBuilder {
    /// Build the gateway payload for a topic notification.
    ///
    /// `color` and `tag` are Android overrides: `None` leaves the field out of the
    /// request so the client keeps its default icon color and collapse behaviour.
    /// Inputs are passed through untouched, the gateway validates them.
    pub fn build(
        topic: &str,
        title: &str,
        body: &str,
        color: Option<&str>,
        tag: Option<&str>,
    ) -> NotificationPayload {
        NotificationPayload::new(
            topic.to_string(),
            title.to_string(),
            body.to_string(),
            AndroidNotification {
                color: color.map(str::to_string),
                tag: tag.map(str::to_string),
            },
        )
    }
}
