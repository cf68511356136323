use crate::types::history::HistoryBacklog;
use crate::types::message::InboundMessage;

/// Lifecycle state of one client id's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionStatus {
    Connecting = 0,
    AwaitingPairing = 1,
    Open = 2,
    Closed = 3,
}

/// Connection phase reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

/// Reason attached to a connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The account was logged out from this device.
    LoggedOut,
    /// The server rejected the stored credentials (401 / expired session).
    Unauthorized,
    /// Network-level drop.
    ConnectionLost,
    /// Server asked for a reconnect.
    RestartRequired,
    /// Any other engine-reported status code.
    Other(u16),
}

impl CloseReason {
    /// Terminal reasons invalidate the stored credentials; the tenant must
    /// re-pair from scratch. Everything else is retryable.
    pub fn is_terminal(self) -> bool {
        matches!(self, CloseReason::LoggedOut | CloseReason::Unauthorized)
    }
}

/// Connection-state notification. Any subset of the fields may be present on
/// a single event.
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub connection: Option<ConnectionState>,
    pub close_reason: Option<CloseReason>,
    /// Freshly issued pairing challenge, to be surfaced until consumed.
    pub qr: Option<String>,
}

/// An event produced by the engine on one session's private stream.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The authorization material changed; must be persisted immediately.
    CredentialsRotated(Vec<u8>),
    ConnectionUpdate(ConnectionUpdate),
    /// One-time bulk backlog of chats, messages and contacts.
    HistorySync(HistoryBacklog),
    /// Live inbound messages.
    MessagesReceived(Vec<InboundMessage>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_reasons() {
        assert!(CloseReason::LoggedOut.is_terminal());
        assert!(CloseReason::Unauthorized.is_terminal());
        assert!(!CloseReason::ConnectionLost.is_terminal());
        assert!(!CloseReason::RestartRequired.is_terminal());
        assert!(!CloseReason::Other(515).is_terminal());
    }
}
