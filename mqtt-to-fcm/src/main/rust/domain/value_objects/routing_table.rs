use crate::domain::value_objects::BusEvent;

pub const GARAGE_DOOR_TITLE: &str = "Garage door";
pub const GARAGE_DOOR_TAG: &str = "2";
pub const ALERT_COLOR: &str = "#FF0000";
pub const NORMAL_COLOR: &str = "#00FF00";

/// Fields a rule extracts from an event, before the gateway payload is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub color: Option<String>,
    pub tag: Option<String>,
}

/// How events on a topic become notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleHandler {
    /// Body is the raw payload. Payload equal to `alert_payload` gets `alert_color`,
    /// anything else gets `normal_color`.
    StateChange {
        title: String,
        alert_payload: String,
        alert_color: String,
        normal_color: String,
        tag: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRule {
    pattern: String,
    handler: RuleHandler,
}

impl TopicRule {
    pub fn new(pattern: impl Into<String>, handler: RuleHandler) -> Self {
        Self {
            pattern: pattern.into(),
            handler,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, topic: &str) -> bool {
        topic_matches(&self.pattern, topic)
    }

    pub fn apply(&self, event: &BusEvent) -> NotificationContent {
        match &self.handler {
            RuleHandler::StateChange {
                title,
                alert_payload,
                alert_color,
                normal_color,
                tag,
            } => {
                let body = event.payload_text().into_owned();
                let color = if body == *alert_payload {
                    alert_color
                } else {
                    normal_color
                };
                NotificationContent {
                    title: title.clone(),
                    body,
                    color: Some(color.clone()),
                    tag: tag.clone(),
                }
            }
        }
    }
}

/// Ordered topic pattern → rule table. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    rules: Vec<TopicRule>,
}

impl RoutingTable {
    pub fn new(rules: Vec<TopicRule>) -> Self {
        Self { rules }
    }

    /// Rules for a HomA system: garage door state alerts
    pub fn for_system(system_id: &str) -> Self {
        Self::new(vec![TopicRule::new(
            garage_door_topic(system_id),
            RuleHandler::StateChange {
                title: GARAGE_DOOR_TITLE.to_string(),
                alert_payload: "open".to_string(),
                alert_color: ALERT_COLOR.to_string(),
                normal_color: NORMAL_COLOR.to_string(),
                tag: Some(GARAGE_DOOR_TAG.to_string()),
            },
        )])
    }

    pub fn resolve(&self, topic: &str) -> Option<&TopicRule> {
        self.rules.iter().find(|rule| rule.matches(topic))
    }

    pub fn rules(&self) -> &[TopicRule] {
        &self.rules
    }
}

pub fn garage_door_topic(system_id: &str) -> String {
    format!("/devices/{}/controls/Garage door", system_id)
}

pub fn cistern_topic(system_id: &str) -> String {
    format!("/devices/{}/controls/Cistern/on", system_id)
}

/// Topics the bridge subscribes to on every connect.
///
/// The cistern switch has no rule yet, its events are received and ignored.
pub fn device_subscriptions(system_id: &str) -> Vec<String> {
    vec![cistern_topic(system_id), garage_door_topic(system_id)]
}

/// MQTT topic filter match with `+` (one level) and `#` (remaining levels)
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_levels = pattern.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(p), Some(t)) if p == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
