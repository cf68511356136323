use crate::types::message::{MessageContent, MessageKey};

/// One-time bulk backlog the engine delivers after (re)connecting.
#[derive(Debug, Clone, Default)]
pub struct HistoryBacklog {
    pub chats: Vec<ChatSnapshot>,
    pub messages: Vec<HistoricalMessage>,
    pub contacts: Vec<ContactRecord>,
}

/// Chat-level metadata from the backlog.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub id: String,
    pub name: Option<String>,
    pub subject: Option<String>,
    pub push_name: Option<String>,
}

/// Address-book entry. The name fields arrive with very different
/// reliability, hence the fixed merge priority in [`ContactRecord::best_name`].
#[derive(Debug, Clone, Default)]
pub struct ContactRecord {
    pub id: String,
    pub verified_name: Option<String>,
    pub name: Option<String>,
    pub notify: Option<String>,
    pub push_name: Option<String>,
    pub short_name: Option<String>,
}

impl ContactRecord {
    /// Best-known name: verified > declared > notify > push > short.
    pub fn best_name(&self) -> Option<&str> {
        [
            self.verified_name.as_deref(),
            self.name.as_deref(),
            self.notify.as_deref(),
            self.push_name.as_deref(),
            self.short_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
    }
}

/// One message inside the backlog.
#[derive(Debug, Clone, Default)]
pub struct HistoricalMessage {
    pub key: MessageKey,
    pub push_name: Option<String>,
    /// Epoch seconds; ordering key for the seed window.
    pub timestamp: i64,
    pub content: Option<MessageContent>,
}
