//! Boundary to the messaging-protocol engine.
//!
//! The engine owns the wire protocol, encryption and pairing; the gateway
//! only consumes each connection's event stream and sends text through it.

use crate::types::events::TransportEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// An active connection to the messaging network for one client id.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message to a conversation.
    async fn send_text(&self, conversation_jid: &str, text: &str) -> Result<(), anyhow::Error>;

    /// Closes the connection.
    async fn disconnect(&self);
}

/// Creates engine connections. Called once per connection attempt; the
/// returned receiver is that connection's private event stream.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create_transport(
        &self,
        client_id: &str,
        credentials: Option<Vec<u8>>,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error>;
}
