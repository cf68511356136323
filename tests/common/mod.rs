//! Shared fakes for the integration tests: a scriptable engine and a
//! recording backend.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use whatsapp_gateway::backend::{BackendApi, ConversationUpsert, LiveMessage, MessageBatch};
use whatsapp_gateway::transport::{Transport, TransportFactory};
use whatsapp_gateway::types::events::TransportEvent;

/// Transport that records outbound sends and can be told to fail them.
#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail_sends: AtomicBool,
    pub disconnected: AtomicBool,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, conversation_jid: &str, text: &str) -> Result<(), anyhow::Error> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("transport send failed");
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation_jid.to_string(), text.to_string()));
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

/// One connection handed out by the [`FakeEngine`], with the sender side of
/// its event stream so tests can drive the session.
#[derive(Clone)]
pub struct FakeConnection {
    pub client_id: String,
    pub credentials: Option<Vec<u8>>,
    pub transport: Arc<FakeTransport>,
    pub events: mpsc::Sender<TransportEvent>,
}

impl FakeConnection {
    pub async fn emit(&self, event: TransportEvent) {
        self.events
            .send(event)
            .await
            .expect("session event task is gone");
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.transport.sent.lock().unwrap().clone()
    }
}

/// Engine fake: records every connection it was asked to create.
#[derive(Default)]
pub struct FakeEngine {
    connections: Mutex<Vec<FakeConnection>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn connection(&self, index: usize) -> FakeConnection {
        self.connections.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl TransportFactory for FakeEngine {
    async fn create_transport(
        &self,
        client_id: &str,
        credentials: Option<Vec<u8>>,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
        let (tx, rx) = mpsc::channel(32);
        let transport = Arc::new(FakeTransport::default());
        self.connections.lock().unwrap().push(FakeConnection {
            client_id: client_id.to_string(),
            credentials,
            transport: transport.clone(),
            events: tx,
        });
        Ok((transport, rx))
    }
}

/// Backend fake: records every call and can be told to fail per endpoint.
#[derive(Default)]
pub struct RecordingBackend {
    pub forwarded: Mutex<Vec<LiveMessage>>,
    pub upserts: Mutex<Vec<ConversationUpsert>>,
    pub batches: Mutex<Vec<MessageBatch>>,
    pub fail_forwards: AtomicBool,
    pub fail_upserts: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn forwarded(&self) -> Vec<LiveMessage> {
        self.forwarded.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<ConversationUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<MessageBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendApi for RecordingBackend {
    async fn forward_message(&self, payload: &LiveMessage) -> anyhow::Result<()> {
        if self.fail_forwards.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        self.forwarded.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn upsert_conversation(&self, payload: &ConversationUpsert) -> anyhow::Result<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        self.upserts.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn bulk_insert_messages(&self, payload: &MessageBatch) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Polls `condition` until it holds or the timeout elapses.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
