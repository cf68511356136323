//! Live message forwarding.
//!
//! Every inbound text that survives the filters is forwarded to the backend
//! synchronously. A failed forward answers the sender with a fallback reply
//! and drops the message; one bad message never takes the session down.

use crate::backend::LiveMessage;
use crate::gateway::{Gateway, SessionHandle};
use crate::jid;
use crate::types::message::InboundMessage;
use log::{debug, error, warn};

/// Reply sent to the user when the backend rejects or cannot be reached.
const FALLBACK_REPLY: &str = "⚠️ Ocurrió un error procesando tu mensaje.";

/// Display name used when a message carries no push name.
const NO_NAME: &str = "Sin nombre";

impl Gateway {
    pub(crate) async fn handle_live_messages(
        &self,
        handle: &SessionHandle,
        messages: Vec<InboundMessage>,
    ) {
        for message in messages {
            self.forward_live_message(handle, message).await;
        }
    }

    async fn forward_live_message(&self, handle: &SessionHandle, message: InboundMessage) {
        let Some(content) = message.content.as_ref() else {
            return;
        };
        if message.key.from_me {
            return;
        }
        if message.broadcast || jid::is_status_broadcast(&message.key.remote_jid) {
            debug!(
                "ignoring broadcast/status message on {}",
                message.key.remote_jid
            );
            return;
        }
        if content.is_protocol() {
            return;
        }
        let Some(text) = content.text() else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        let from = jid::phone_part(&message.key.remote_jid).to_string();
        let name = message
            .push_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(NO_NAME)
            .to_string();
        let payload = LiveMessage {
            host: handle.client_id().to_string(),
            from: from.clone(),
            message: text.to_string(),
            name,
            from_me: message.key.from_me,
        };

        if let Err(e) = self.backend.forward_message(&payload).await {
            error!("forwarding message from {from} failed: {e}");
            if let Err(send_err) = handle.send_text(&from, FALLBACK_REPLY).await {
                warn!("fallback reply to {from} failed: {send_err}");
            }
        }
    }
}
