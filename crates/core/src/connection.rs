//! Backend connection status surfaced to the UI.
//!
//! The status moves `Connecting -> Reconnecting { attempt } -> Connected`
//! or `Error`. [`ConnectionMonitor`] publishes it on a
//! [`tokio::sync::watch`] channel so any number of observers see the latest
//! value without replaying history.

use serde::Serialize;
use tokio::sync::watch;

/// Current state of the link to the backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// First contact in progress.
    Connecting,
    /// A transient failure occurred and retry `attempt` is pending.
    Reconnecting { attempt: u32 },
    /// The last call reached the backend.
    Connected,
    /// Retries were exhausted or the session could not be recovered.
    Error,
}

impl ConnectionStatus {
    /// Short label suitable for a status badge.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Reconnecting { .. } => "reconnecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }

    /// Whether the status is final for the current operation.
    pub fn is_settled(self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Error)
    }
}

/// Publishes [`ConnectionStatus`] changes.
#[derive(Debug)]
pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionStatus>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    /// Create a monitor in the [`ConnectionStatus::Connecting`] state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionStatus::Connecting);
        Self { tx }
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ConnectionStatus {
        *self.tx.borrow()
    }

    pub fn connecting(&self) {
        self.set(ConnectionStatus::Connecting);
    }

    pub fn reconnecting(&self, attempt: u32) {
        self.set(ConnectionStatus::Reconnecting { attempt });
    }

    pub fn connected(&self) {
        self.set(ConnectionStatus::Connected);
    }

    pub fn failed(&self) {
        self.set(ConnectionStatus::Error);
    }

    fn set(&self, status: ConnectionStatus) {
        let previous = self.tx.send_replace(status);
        if previous != status {
            tracing::debug!(
                from = previous.label(),
                to = status.label(),
                "Connection status changed",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting() {
        let monitor = ConnectionMonitor::new();
        assert_eq!(monitor.current(), ConnectionStatus::Connecting);
        assert!(!monitor.current().is_settled());
    }

    #[test]
    fn updates_without_subscribers() {
        let monitor = ConnectionMonitor::new();
        monitor.reconnecting(2);
        assert_eq!(monitor.current(), ConnectionStatus::Reconnecting { attempt: 2 });
        monitor.connected();
        assert!(monitor.current().is_settled());
    }

    #[tokio::test]
    async fn subscribers_see_latest_status() {
        let monitor = ConnectionMonitor::new();
        let mut rx = monitor.subscribe();

        monitor.reconnecting(1);
        monitor.failed();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Error);
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(ConnectionStatus::Reconnecting { attempt: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "reconnecting", "attempt": 3}));
    }
}
