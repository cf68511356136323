//! Client for the backend HTTP API the gateway feeds.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Payload for `POST /api/whatsapp` — one live inbound message.
#[derive(Debug, Clone, Serialize)]
pub struct LiveMessage {
    pub host: String,
    pub from: String,
    pub message: String,
    pub name: String,
    #[serde(rename = "fromMe")]
    pub from_me: bool,
}

/// Payload for `POST /api/conversaciones/upsert`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationUpsert {
    pub host: String,
    pub telefono: String,
    pub origen: String,
    pub nombre: String,
}

/// One historical message inside a bulk insert.
#[derive(Debug, Clone, Serialize)]
pub struct MessageItem {
    pub text: String,
    pub from_me: bool,
    pub wa_message_id: Option<String>,
    pub wa_timestamp: i64,
}

/// Payload for `POST /api/conversaciones/bulk-insert-mensajes`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageBatch {
    pub host: String,
    pub telefono: String,
    pub nombre: String,
    pub origen: String,
    pub items: Vec<MessageItem>,
}

/// The backend consumed by the gateway. All calls are best-effort, single
/// attempt; a non-success response is an error.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn forward_message(&self, payload: &LiveMessage) -> Result<()>;
    async fn upsert_conversation(&self, payload: &ConversationUpsert) -> Result<()>;
    async fn bulk_insert_messages(&self, payload: &MessageBatch) -> Result<()>;
}

/// `BackendApi` over plain HTTP using `ureq`. Since `ureq` is blocking, every
/// call is wrapped in `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct UreqBackendClient {
    base_url: String,
}

impl UreqBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    async fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let body = serde_json::to_vec(payload)?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            ureq::post(&url)
                .header("Content-Type", "application/json")
                .send(&body[..])?;
            Ok(())
        })
        .await?
    }
}

#[async_trait]
impl BackendApi for UreqBackendClient {
    async fn forward_message(&self, payload: &LiveMessage) -> Result<()> {
        self.post_json("/api/whatsapp", payload).await
    }

    async fn upsert_conversation(&self, payload: &ConversationUpsert) -> Result<()> {
        self.post_json("/api/conversaciones/upsert", payload).await
    }

    async fn bulk_insert_messages(&self, payload: &MessageBatch) -> Result<()> {
        self.post_json("/api/conversaciones/bulk-insert-mensajes", payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn live_message_wire_shape() {
        let payload = LiveMessage {
            host: "5491122334455".into(),
            from: "59891234567".into(),
            message: "hola".into(),
            name: "Carlos".into(),
            from_me: false,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "host": "5491122334455",
                "from": "59891234567",
                "message": "hola",
                "name": "Carlos",
                "fromMe": false,
            })
        );
    }

    #[test]
    fn message_item_null_id() {
        let item = MessageItem {
            text: "hola".into(),
            from_me: true,
            wa_message_id: None,
            wa_timestamp: 1700000000,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "text": "hola",
                "from_me": true,
                "wa_message_id": null,
                "wa_timestamp": 1700000000,
            })
        );
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = UreqBackendClient::new("http://localhost:4000/");
        assert_eq!(client.base_url, "http://localhost:4000");
    }
}
