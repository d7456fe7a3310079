use serde::Serialize;

/// Gateway request body for one notification.
///
/// Serializes to the HTTP v1 `messages:send` shape:
/// `{"message": {"topic", "notification": {"title", "body"}, "android": {"notification": {..}}}}`.
/// Built by [`NotificationBuilder`](crate::domain::services::NotificationBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Message {
    topic: String,
    notification: Notification,
    android: AndroidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Notification {
    title: String,
    body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct AndroidConfig {
    notification: AndroidNotification,
}

/// Android overrides. An absent field keeps the client default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NotificationPayload {
    pub(crate) fn new(
        target_topic: String,
        title: String,
        body: String,
        android: AndroidNotification,
    ) -> Self {
        Self {
            message: Message {
                topic: target_topic,
                notification: Notification { title, body },
                android: AndroidConfig {
                    notification: android,
                },
            },
        }
    }

    pub fn target_topic(&self) -> &str {
        &self.message.topic
    }

    pub fn title(&self) -> &str {
        &self.message.notification.title
    }

    pub fn body(&self) -> &str {
        &self.message.notification.body
    }

    pub fn android(&self) -> &AndroidNotification {
        &self.message.android.notification
    }
}
