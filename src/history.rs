//! History sync pipeline.
//!
//! Consumes the one-time backlog the engine delivers after (re)connecting:
//! upserts a conversation record per chat and seeds each conversation with a
//! bounded window of its most recent messages. Backend failures are logged
//! per call and never abort the rest of the backlog.

use crate::backend::{ConversationUpsert, MessageBatch, MessageItem};
use crate::gateway::{Gateway, SessionHandle};
use crate::jid;
use crate::resolve::{self, ChatMeta};
use crate::types::history::{HistoricalMessage, HistoryBacklog};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Provenance tag for records derived from the backlog.
const SYNC_ORIGIN: &str = "sync";

/// Seed window per conversation. Backlogs can span years; the backend only
/// needs a recent window for context, not an archive import.
const MAX_SEED_MESSAGES: usize = 10;

impl Gateway {
    pub(crate) async fn handle_history_backlog(
        &self,
        handle: &SessionHandle,
        backlog: HistoryBacklog,
    ) {
        let host = handle.client_id();
        info!(
            "history backlog for {host}: {} chats, {} messages, {} contacts",
            backlog.chats.len(),
            backlog.messages.len(),
            backlog.contacts.len()
        );

        let contact_names = contact_name_index(&backlog);
        let chat_meta = chat_meta_index(&backlog);

        for chat in &backlog.chats {
            let nombre =
                resolve::resolve_display_name(&chat.id, &contact_names, chat_meta.get(&chat.id), None);
            let upsert = ConversationUpsert {
                host: host.to_string(),
                telefono: jid::phone_part(&chat.id).to_string(),
                origen: SYNC_ORIGIN.to_string(),
                nombre,
            };
            if let Err(e) = self.backend.upsert_conversation(&upsert).await {
                warn!("conversation upsert for {} failed: {e}", chat.id);
            }
        }

        for (chat_id, messages) in group_by_conversation(&backlog.messages) {
            let retained = seed_window(&messages);
            if retained.is_empty() {
                debug!("no seedable messages for {chat_id}, skipping");
                continue;
            }

            let push_name = seed_push_name(&retained);
            let nombre = resolve::resolve_display_name(
                &chat_id,
                &contact_names,
                chat_meta.get(&chat_id),
                push_name,
            );
            let batch = MessageBatch {
                host: host.to_string(),
                telefono: jid::phone_part(&chat_id).to_string(),
                nombre,
                origen: SYNC_ORIGIN.to_string(),
                items: retained.iter().map(|m| to_item(m)).collect(),
            };
            if let Err(e) = self.backend.bulk_insert_messages(&batch).await {
                warn!("bulk insert for {chat_id} failed: {e}");
            }
        }
    }
}

/// Contact id → best-known name.
fn contact_name_index(backlog: &HistoryBacklog) -> HashMap<String, String> {
    backlog
        .contacts
        .iter()
        .filter_map(|c| c.best_name().map(|name| (c.id.clone(), name.to_string())))
        .collect()
}

/// Chat id → naming metadata, direct conversations only.
fn chat_meta_index(backlog: &HistoryBacklog) -> HashMap<String, ChatMeta> {
    backlog
        .chats
        .iter()
        .filter(|chat| !jid::is_group(&chat.id))
        .map(|chat| {
            (
                chat.id.clone(),
                ChatMeta {
                    name: chat.name.clone(),
                    subject: chat.subject.clone(),
                    push_name: chat.push_name.clone(),
                },
            )
        })
        .collect()
}

fn group_by_conversation(
    messages: &[HistoricalMessage],
) -> HashMap<String, Vec<&HistoricalMessage>> {
    let mut grouped: HashMap<String, Vec<&HistoricalMessage>> = HashMap::new();
    for message in messages {
        grouped
            .entry(message.key.remote_jid.clone())
            .or_default()
            .push(message);
    }
    grouped
}

fn seedable_text(message: &HistoricalMessage) -> Option<&str> {
    message
        .content
        .as_ref()
        .and_then(|content| content.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Eligible messages sorted ascending by timestamp, capped to the most recent
/// [`MAX_SEED_MESSAGES`]. The cap is applied after filtering so ineligible
/// messages never consume window slots.
fn seed_window<'a>(messages: &[&'a HistoricalMessage]) -> Vec<&'a HistoricalMessage> {
    let mut eligible: Vec<&HistoricalMessage> = messages
        .iter()
        .copied()
        .filter(|m| seedable_text(m).is_some())
        .collect();
    eligible.sort_by_key(|m| m.timestamp);
    let cut = eligible.len().saturating_sub(MAX_SEED_MESSAGES);
    eligible.split_off(cut)
}

/// Non-numeric push name among the retained messages, preferred over the
/// chat/contact-derived name.
fn seed_push_name<'a>(retained: &[&'a HistoricalMessage]) -> Option<&'a str> {
    retained
        .iter()
        .filter_map(|m| m.push_name.as_deref())
        .map(str::trim)
        .find(|name| !name.is_empty() && !resolve::is_bare_phone_number(name))
}

fn to_item(message: &HistoricalMessage) -> MessageItem {
    MessageItem {
        // seed_window only retains messages with extractable text
        text: seedable_text(message).unwrap_or_default().to_string(),
        from_me: message.key.from_me,
        wa_message_id: message.key.id.clone(),
        wa_timestamp: message.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::{MessageContent, MessageKey};

    fn text_message(jid: &str, ts: i64, text: &str) -> HistoricalMessage {
        HistoricalMessage {
            key: MessageKey {
                remote_jid: jid.to_string(),
                from_me: false,
                id: Some(format!("MSG-{ts}")),
            },
            push_name: None,
            timestamp: ts,
            content: Some(MessageContent::Text(text.to_string())),
        }
    }

    #[test]
    fn seed_window_caps_to_most_recent_ascending() {
        let messages: Vec<HistoricalMessage> = (1..=15)
            .map(|ts| text_message("59891234567@s.whatsapp.net", ts, "hola"))
            .collect();
        let refs: Vec<&HistoricalMessage> = messages.iter().collect();

        let retained = seed_window(&refs);
        let timestamps: Vec<i64> = retained.iter().map(|m| m.timestamp).collect();
        assert_eq!(timestamps, (6..=15).collect::<Vec<i64>>());
    }

    #[test]
    fn cap_counts_only_eligible_messages() {
        let jid = "59891234567@s.whatsapp.net";
        let mut messages: Vec<HistoricalMessage> =
            (1..=8).map(|ts| text_message(jid, ts, "hola")).collect();
        for ts in 9..=20 {
            messages.push(HistoricalMessage {
                content: match ts % 3 {
                    0 => None,
                    1 => Some(MessageContent::Protocol),
                    _ => Some(MessageContent::Text("   ".into())),
                },
                ..text_message(jid, ts, "")
            });
        }
        let refs: Vec<&HistoricalMessage> = messages.iter().collect();

        let retained = seed_window(&refs);
        assert_eq!(retained.len(), 8);
        assert!(retained.iter().all(|m| seedable_text(m).is_some()));
    }

    #[test]
    fn seed_push_name_skips_numeric_names() {
        let jid = "59891234567@s.whatsapp.net";
        let mut first = text_message(jid, 1, "hola");
        first.push_name = Some("59891234567".into());
        let mut second = text_message(jid, 2, "que tal");
        second.push_name = Some("Carlos".into());

        let messages = [&first, &second];
        assert_eq!(seed_push_name(&messages), Some("Carlos"));
    }

    #[test]
    fn chat_meta_index_excludes_groups() {
        let backlog = HistoryBacklog {
            chats: vec![
                crate::types::history::ChatSnapshot {
                    id: "59891234567@s.whatsapp.net".into(),
                    name: Some("Carlos".into()),
                    ..Default::default()
                },
                crate::types::history::ChatSnapshot {
                    id: "1234-5678@g.us".into(),
                    name: Some("Grupo".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let index = chat_meta_index(&backlog);
        assert!(index.contains_key("59891234567@s.whatsapp.net"));
        assert!(!index.contains_key("1234-5678@g.us"));
    }
}
