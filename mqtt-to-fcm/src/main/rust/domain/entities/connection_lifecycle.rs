use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::domain::value_objects::ConnectionState;

/// Transitions kept for diagnostics; older entries are dropped
const MAX_HISTORY: usize = 64;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Domain entity tracking the bus connection across reconnects
#[derive(Debug)]
pub struct ConnectionLifecycle {
    current_state: ConnectionState,
    state_history: VecDeque<StateTransition>,
    transition_count: usize,
    connected_at: Option<Instant>,
    connect_count: u32,
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self {
            current_state: ConnectionState::Idle,
            state_history: VecDeque::new(),
            transition_count: 0,
            connected_at: None,
            connect_count: 0,
        }
    }

    pub fn current_state(&self) -> &ConnectionState {
        &self.current_state
    }

    /// Time since the current connection was established
    pub fn uptime(&self) -> Option<Duration> {
        self.connected_at.map(|start| start.elapsed())
    }

    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    /// Number of successful connects, including reconnects
    pub fn connect_count(&self) -> u32 {
        self.connect_count
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.back()
    }

    pub fn transition_to_connecting(&mut self) {
        self.record_transition(ConnectionState::Connecting, None);
    }

    pub fn transition_to_connected(&mut self) {
        self.record_transition(ConnectionState::Connected, None);
        self.connected_at = Some(Instant::now());
        self.connect_count += 1;
    }

    pub fn transition_to_reconnecting(&mut self, attempt: u32, reason: Option<String>) {
        self.record_transition(ConnectionState::Reconnecting { attempt }, reason);
        self.connected_at = None;
    }

    pub fn transition_to_stopped(&mut self, reason: Option<String>) {
        self.record_transition(ConnectionState::Stopped, reason);
        self.connected_at = None;
    }

    fn record_transition(&mut self, new_state: ConnectionState, reason: Option<String>) {
        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        if self.state_history.len() == MAX_HISTORY {
            self.state_history.pop_front();
        }
        self.state_history.push_back(transition);
        self.transition_count += 1;
        self.current_state = new_state;
    }
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
