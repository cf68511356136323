//! Helpers for the string conversation identifiers ("JIDs") the engine uses.

/// Server suffix of direct user conversations.
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server suffix of group conversations.
pub const GROUP_SERVER: &str = "g.us";
/// The status/broadcast pseudo-conversation.
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// Phone portion of a conversation identifier (`"5989...@s.whatsapp.net"` →
/// `"5989..."`). Identifiers without a server part are returned unchanged.
pub fn phone_part(jid: &str) -> &str {
    match jid.find('@') {
        Some(at) => &jid[..at],
        None => jid,
    }
}

/// Direct-conversation identifier for a phone number.
pub fn user_jid(phone: &str) -> String {
    format!("{phone}@{USER_SERVER}")
}

pub fn is_group(jid: &str) -> bool {
    jid.ends_with(GROUP_SERVER)
}

pub fn is_status_broadcast(jid: &str) -> bool {
    jid == STATUS_BROADCAST
}
