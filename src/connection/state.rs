//! Port state management.

use std::time::Instant;

/// Port state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortState {
    /// Never opened, or gave up reconnecting.
    #[default]
    Disconnected,
    /// Connected and ready.
    Connected,
    /// Link failed; a background supervisor is reconnecting.
    Reconnecting,
    /// Explicitly closed by the owner.
    Closed,
}

impl PortState {
    /// Check if the port is usable.
    pub fn is_connected(&self) -> bool {
        *self == PortState::Connected
    }

    /// Check if a reconnection is in progress.
    pub fn is_reconnecting(&self) -> bool {
        *self == PortState::Reconnecting
    }

    /// Check if the port is closed, either explicitly or because it was
    /// never opened.
    pub fn is_closed(&self) -> bool {
        matches!(self, PortState::Disconnected | PortState::Closed)
    }
}

/// Port statistics.
#[derive(Debug, Clone, Default)]
pub struct PortStats {
    /// Number of successful connections, initial and repaired.
    pub connect_count: u64,
    /// Number of failed connection attempts.
    pub failure_count: u64,
    /// Number of reconnection attempts made by the supervisor.
    pub reconnect_attempts: u64,
    /// Number of repaired links.
    pub reconnect_count: u64,
    /// Total bytes written.
    pub bytes_sent: u64,
    /// Total bytes read.
    pub bytes_received: u64,
    /// Time of last successful connection.
    pub last_connected: Option<Instant>,
    /// Time of last disconnect.
    pub last_disconnected: Option<Instant>,
    /// Time of last error.
    pub last_error: Option<Instant>,
}

impl PortStats {
    /// Record a successful connection.
    pub fn record_connect(&mut self) {
        self.connect_count += 1;
        self.last_connected = Some(Instant::now());
    }

    /// Record a disconnection.
    pub fn record_disconnect(&mut self) {
        self.last_disconnected = Some(Instant::now());
    }

    /// Record a connection failure.
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_error = Some(Instant::now());
    }

    /// Record a reconnection attempt.
    pub fn record_reconnect_attempt(&mut self) {
        self.reconnect_attempts += 1;
    }

    /// Record a repaired link.
    pub fn record_reconnect(&mut self) {
        self.reconnect_count += 1;
    }

    /// Record written bytes.
    pub fn record_send(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
    }

    /// Record read bytes.
    pub fn record_receive(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
    }

    /// Get time since the last connection was established.
    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.last_connected.map(|t| t.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_state() {
        assert!(PortState::Connected.is_connected());
        assert!(!PortState::Reconnecting.is_connected());
        assert!(PortState::Reconnecting.is_reconnecting());
        assert!(PortState::Closed.is_closed());
        assert!(PortState::Disconnected.is_closed());
        assert!(!PortState::Reconnecting.is_closed());
        assert_eq!(PortState::default(), PortState::Disconnected);
    }

    #[test]
    fn test_port_stats() {
        let mut stats = PortStats::default();

        stats.record_connect();
        assert_eq!(stats.connect_count, 1);
        assert!(stats.last_connected.is_some());
        assert!(stats.uptime().is_some());

        stats.record_send(3);
        stats.record_receive(1);
        assert_eq!(stats.bytes_sent, 3);
        assert_eq!(stats.bytes_received, 1);

        stats.record_failure();
        stats.record_reconnect_attempt();
        stats.record_reconnect();
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.reconnect_attempts, 1);
        assert_eq!(stats.reconnect_count, 1);
        assert!(stats.last_error.is_some());
    }
}
