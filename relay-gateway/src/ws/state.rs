//! Stream connection state tracking.

use relay_core::types::ConnectionState;
use tokio::time::Instant;

/// Mutable state shared between a `StreamConnection` handle and its
/// socket task.
#[derive(Debug, Default)]
pub(crate) struct InternalState {
    /// Current connection state.
    pub state: ConnectionState,
    /// Incremented on every transition into Connected.
    pub epoch: u64,
    /// Failed reconnection attempts since the last successful open.
    pub reconnect_attempts: u32,
    /// Last successful connection time.
    pub last_connected: Option<Instant>,
    /// Last frame received time.
    pub last_message: Option<Instant>,
    /// Last application ping sent.
    pub last_ping: Option<Instant>,
    /// Last pong received.
    pub last_pong: Option<Instant>,
    /// Whether a ping is outstanding.
    pub awaiting_pong: bool,
}

impl InternalState {
    /// Creates a new internal state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the connection as connected and returns the new epoch.
    pub fn mark_connected(&mut self) -> u64 {
        self.state = ConnectionState::Connected;
        self.epoch += 1;
        self.reconnect_attempts = 0;
        self.last_connected = Some(Instant::now());
        self.awaiting_pong = false;
        self.epoch
    }

    /// Marks the connection as connecting.
    pub fn mark_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Marks the connection as disconnected.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.awaiting_pong = false;
    }

    /// Marks the connection as reconnecting.
    pub fn mark_reconnecting(&mut self) {
        self.state = ConnectionState::Reconnecting;
        self.reconnect_attempts += 1;
        self.awaiting_pong = false;
    }

    /// Marks the connection as closed.
    pub fn mark_closed(&mut self) {
        self.state = ConnectionState::Closed;
        self.awaiting_pong = false;
    }

    /// Records that a frame was received.
    pub fn record_message(&mut self) {
        self.last_message = Some(Instant::now());
    }

    /// Records that a ping was sent.
    pub fn record_ping(&mut self) {
        self.last_ping = Some(Instant::now());
        self.awaiting_pong = true;
    }

    /// Records that a pong was received.
    pub fn record_pong(&mut self) {
        self.last_pong = Some(Instant::now());
        self.awaiting_pong = false;
    }

    /// Returns true when a ping has been outstanding for longer than `timeout`.
    pub fn pong_overdue(&self, timeout: std::time::Duration) -> bool {
        self.awaiting_pong && self.last_ping.is_some_and(|sent| sent.elapsed() >= timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_internal_state_transitions() {
        let mut state = InternalState::new();
        assert_eq!(state.state, ConnectionState::Disconnected);
        assert_eq!(state.epoch, 0);

        state.mark_connecting();
        assert_eq!(state.mark_connected(), 1);
        assert!(state.last_connected.is_some());

        state.mark_reconnecting();
        assert_eq!(state.state, ConnectionState::Reconnecting);
        assert_eq!(state.reconnect_attempts, 1);

        state.mark_reconnecting();
        assert_eq!(state.reconnect_attempts, 2);

        assert_eq!(state.mark_connected(), 2);
        assert_eq!(state.reconnect_attempts, 0);

        state.mark_closed();
        assert!(state.state.is_inactive());
        assert_eq!(state.epoch, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_overdue() {
        let mut state = InternalState::new();
        assert!(!state.pong_overdue(Duration::from_secs(10)));

        state.record_ping();
        assert!(!state.pong_overdue(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(state.pong_overdue(Duration::from_secs(10)));

        state.record_pong();
        assert!(!state.pong_overdue(Duration::from_secs(10)));
    }
}
