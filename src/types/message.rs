/// Identifier triple the engine attaches to every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageKey {
    /// Conversation identifier the message belongs to.
    pub remote_jid: String,
    /// Whether this side of the session authored the message.
    pub from_me: bool,
    /// Engine-assigned message id, when known.
    pub id: Option<String>,
}

/// Decoded message payload, reduced to the shapes the gateway routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain conversation text.
    Text(String),
    /// Text carried by an extended (quoted/linked) message.
    ExtendedText(String),
    /// Protocol/control payloads: receipts, revocations, key distribution.
    Protocol,
    /// Anything else the gateway does not forward (media, reactions, ...).
    Other,
}

impl MessageContent {
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) | MessageContent::ExtendedText(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, MessageContent::Protocol)
    }
}

/// A live inbound message as delivered on the event stream.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub key: MessageKey,
    /// Sender-chosen display name, if the engine surfaced one.
    pub push_name: Option<String>,
    /// Missing content means the envelope carried nothing forwardable.
    pub content: Option<MessageContent>,
    /// Set for broadcast-list deliveries.
    pub broadcast: bool,
    /// Epoch seconds.
    pub timestamp: i64,
}
