use std::fmt;

/// Bus connection states (pure domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not started yet
    #[default]
    Idle,
    /// Waiting for the first broker acknowledgement
    Connecting,
    /// Connected and subscribed
    Connected,
    /// Connection lost, the bus client is retrying
    Reconnecting { attempt: u32 },
    /// Service shut down
    Stopped,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Connected => write!(f, "CONNECTED"),
            Self::Reconnecting { attempt } => write!(f, "RECONNECTING (attempt {})", attempt),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl ConnectionState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Connecting => 1.0,
            Self::Connected => 2.0,
            Self::Reconnecting { .. } => 3.0,
            Self::Stopped => 4.0,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
