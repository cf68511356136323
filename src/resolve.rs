//! Display-name resolution.
//!
//! Names arrive from several noisy sources (push names, the contact table,
//! chat metadata) and any of them may be missing or just the phone number
//! again. Resolution is a pure priority walk so a conversation is never
//! permanently labeled with its own number when a better name exists.

use crate::jid;
use std::collections::HashMap;

/// Name used when no candidate survives and no phone can be derived.
const UNKNOWN_NAME: &str = "unknown";

/// Chat-level naming metadata, kept only for direct conversations.
#[derive(Debug, Clone, Default)]
pub struct ChatMeta {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub push_name: Option<String>,
}

/// Whether `s` is a bare phone number: 6+ digits, optionally decorated with
/// `+`, spaces or `-`. Such strings are rejected as display names.
pub fn is_bare_phone_number(s: &str) -> bool {
    let digits = s.chars().filter(char::is_ascii_digit).count();
    digits >= 6
        && s.chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
}

fn usable(candidate: Option<&str>) -> Option<&str> {
    candidate
        .map(str::trim)
        .filter(|c| !c.is_empty() && !is_bare_phone_number(c))
}

/// Resolves the display name for a conversation.
///
/// Candidate order: message push name, contact-table name, chat name, chat
/// subject, chat push name. The first non-empty, non-numeric candidate wins;
/// otherwise the phone number derived from the identifier; otherwise a
/// literal placeholder.
pub fn resolve_display_name(
    jid_str: &str,
    contact_names: &HashMap<String, String>,
    chat_meta: Option<&ChatMeta>,
    message_push_name: Option<&str>,
) -> String {
    let candidates = [
        message_push_name,
        contact_names.get(jid_str).map(String::as_str),
        chat_meta.and_then(|m| m.name.as_deref()),
        chat_meta.and_then(|m| m.subject.as_deref()),
        chat_meta.and_then(|m| m.push_name.as_deref()),
    ];
    for candidate in candidates {
        if let Some(name) = usable(candidate) {
            return name.to_string();
        }
    }

    let phone = jid::phone_part(jid_str).trim();
    if phone.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        phone.to_string()
    }
}
