use std::borrow::Cow;

/// One message delivered by the bus for a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    topic: String,
    payload: Vec<u8>,
}

impl BusEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload decoded as UTF-8, invalid sequences replaced
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
