//! Per-tenant connection supervision.
//!
//! One [`SessionHandle`] per client id, created through [`Gateway::start_session`]
//! and driven by the connection's private event stream. Non-terminal
//! disconnects re-enter `start_session` immediately (no backoff, no retry
//! cap); terminal ones wipe the tenant's credentials so the next connection
//! starts from a fresh pairing challenge.

use crate::backend::{BackendApi, UreqBackendClient};
use crate::config::GatewayConfig;
use crate::registry::{QrChannel, Registration, SessionRegistry};
use crate::store::{CredentialStore, FileStore};
use crate::transport::{Transport, TransportFactory};
use crate::types::events::{
    ConnectionState, ConnectionUpdate, SessionStatus, TransportEvent,
};
use anyhow::{Result, anyhow};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc;

/// Live (or attempting) connection state for one client id. Exclusively owns
/// the transport of that connection.
pub struct SessionHandle {
    client_id: String,
    transport: Arc<dyn Transport>,
    status: AtomicU8,
}

impl SessionHandle {
    fn new(client_id: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            client_id: client_id.to_string(),
            transport,
            status: AtomicU8::new(SessionStatus::Connecting as u8),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(client_id: &str, transport: Arc<dyn Transport>) -> Self {
        Self::new(client_id, transport)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn status(&self) -> SessionStatus {
        match self.status.load(Ordering::Acquire) {
            s if s == SessionStatus::AwaitingPairing as u8 => SessionStatus::AwaitingPairing,
            s if s == SessionStatus::Open as u8 => SessionStatus::Open,
            s if s == SessionStatus::Closed as u8 => SessionStatus::Closed,
            _ => SessionStatus::Connecting,
        }
    }

    fn set_status(&self, status: SessionStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Sends a text message to a phone number through this session.
    pub async fn send_text(&self, phone: &str, text: &str) -> Result<()> {
        self.transport
            .send_text(&crate::jid::user_jid(phone), text)
            .await
    }
}

/// Multi-tenant connection supervisor. Owns the session registry, the QR
/// channel, credential persistence and the backend pipelines.
pub struct Gateway {
    pub(crate) registry: SessionRegistry,
    pub(crate) qr: QrChannel,
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) backend: Arc<dyn BackendApi>,
    transport_factory: Arc<dyn TransportFactory>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Active session for a client id, if any.
    pub fn session(&self, client_id: &str) -> Option<Arc<SessionHandle>> {
        self.registry.get(client_id)
    }

    /// Most recent unconsumed pairing challenge for a client id.
    pub fn pairing_challenge(&self, client_id: &str) -> Option<String> {
        self.qr.get(client_id)
    }

    /// Deletes the stored credentials for a client id, forcing re-pairing on
    /// the next connection. Does not touch a live session. Returns whether a
    /// namespace existed.
    pub async fn delete_credentials(&self, client_id: &str) -> Result<bool> {
        Ok(self.store.delete(client_id).await?)
    }

    /// Starts the session for `client_id`, or returns the already-registered
    /// handle unchanged. No new connection is opened for a tenant that
    /// already has one.
    // Returns a boxed, explicitly-`Send` future rather than using `async fn`
    // so the compiler can resolve auto-traits through the reconnect recursion
    // (start_session -> run_session -> handle_connection_update -> start_session).
    pub fn start_session<'a>(
        self: &'a Arc<Self>,
        client_id: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Arc<SessionHandle>>> + Send + 'a>>
    {
        Box::pin(async move {
            if let Some(existing) = self.registry.get(client_id) {
                return Ok(existing);
            }

            self.store.ensure_namespace(client_id).await?;
            let credentials = self.store.load(client_id).await?;
            let (transport, events) = self
                .transport_factory
                .create_transport(client_id, credentials)
                .await?;

            let handle = Arc::new(SessionHandle::new(client_id, transport));
            match self.registry.register(client_id, handle.clone()) {
                Registration::AlreadyRegistered(existing) => {
                    // Lost the race against a concurrent start for the same id.
                    handle.transport.disconnect().await;
                    return Ok(existing);
                }
                Registration::Inserted => {}
            }

            info!("session for {client_id} connecting");
            let gateway = self.clone();
            let session = handle.clone();
            tokio::spawn(async move { gateway.run_session(session, events).await });

            Ok(handle)
        })
    }

    async fn run_session(
        self: Arc<Self>,
        handle: Arc<SessionHandle>,
        mut events: mpsc::Receiver<TransportEvent>,
    ) {
        let client_id = handle.client_id().to_string();
        let mut history_synced = false;

        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::CredentialsRotated(blob) => {
                    // Losing an update risks forcing the tenant to re-pair.
                    if let Err(e) = self.store.save(&client_id, &blob).await {
                        error!("persisting rotated credentials for {client_id} failed: {e}");
                    }
                }
                TransportEvent::ConnectionUpdate(update) => {
                    if self.handle_connection_update(&handle, update).await {
                        return;
                    }
                }
                TransportEvent::HistorySync(backlog) => {
                    if history_synced {
                        debug!("ignoring repeated history backlog for {client_id}");
                    } else {
                        history_synced = true;
                        self.handle_history_backlog(&handle, backlog).await;
                    }
                }
                TransportEvent::MessagesReceived(messages) => {
                    self.handle_live_messages(&handle, messages).await;
                }
            }
        }

        // The engine dropped the stream without a close event; the state
        // machine only moves on explicit connection updates.
        debug!("event stream for {client_id} ended");
    }

    /// Returns `true` when this connection is finished and its event task
    /// must stop consuming the stream.
    async fn handle_connection_update(
        self: &Arc<Self>,
        handle: &Arc<SessionHandle>,
        update: ConnectionUpdate,
    ) -> bool {
        let client_id = handle.client_id();

        if let Some(code) = update.qr {
            info!("pairing challenge issued for {client_id}");
            self.qr.set(client_id, code);
            handle.set_status(SessionStatus::AwaitingPairing);
        }

        match update.connection {
            Some(ConnectionState::Open) => {
                info!("session for {client_id} is open");
                self.qr.remove(client_id);
                handle.set_status(SessionStatus::Open);
                false
            }
            Some(ConnectionState::Close) => {
                handle.set_status(SessionStatus::Closed);
                let reason = update.close_reason;
                let terminal = reason.is_some_and(|r| r.is_terminal());
                if terminal {
                    info!("session for {client_id} closed for good ({reason:?}); wiping credentials");
                    self.qr.remove(client_id);
                    self.registry.remove_if_current(client_id, handle);
                    if let Err(e) = self.store.delete(client_id).await {
                        error!("deleting credentials for {client_id} failed: {e}");
                    }
                } else {
                    warn!("session for {client_id} closed ({reason:?}); reconnecting");
                    // Deregister before reconnecting: the fresh start must see
                    // an empty slot, and this handler's handle is no longer
                    // canonical from here on.
                    self.registry.remove_if_current(client_id, handle);
                    if let Err(e) = self.start_session(client_id).await {
                        error!("reconnect for {client_id} failed: {e}");
                    }
                }
                true
            }
            Some(ConnectionState::Connecting) | None => false,
        }
    }
}

/// Builder for [`Gateway`]. The transport factory is always injected; backend
/// and credential store fall back to the configured HTTP client and a
/// [`FileStore`] under the configured sessions directory.
#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<GatewayConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    backend: Option<Arc<dyn BackendApi>>,
    transport_factory: Option<Arc<dyn TransportFactory>>,
}

impl GatewayBuilder {
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn BackendApi>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    pub async fn build(self) -> Result<Arc<Gateway>> {
        let transport_factory = self
            .transport_factory
            .ok_or_else(|| anyhow!("a transport factory is required"))?;
        let config = self.config.unwrap_or_default();

        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(UreqBackendClient::new(config.backend_url)) as Arc<dyn BackendApi>,
        };
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::new(config.sessions_dir).await?) as Arc<dyn CredentialStore>,
        };

        Ok(Arc::new(Gateway {
            registry: SessionRegistry::new(),
            qr: QrChannel::new(),
            store,
            backend,
            transport_factory,
        }))
    }
}
