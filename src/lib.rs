// Multi-tenant WhatsApp gateway: one supervised engine connection per client
// id, credential persistence, QR pairing exposure, history replay and live
// message forwarding to the configured backend.

pub mod backend;
pub mod config;
pub mod gateway;
pub mod http;
pub mod jid;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod transport;

pub mod types {
    pub mod events;
    pub mod history;
    pub mod message;
}

// Pipelines hanging off the Gateway type
mod forwarder;
mod history;

pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayBuilder, SessionHandle};
