//! Durable storage for per-session authorization material.

pub mod filestore;

pub use filestore::FileStore;

use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keyed store for the engine's opaque authorization blob, one namespace per
/// client id. Deleting a namespace is the only operation that forces a
/// tenant to re-pair.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates the namespace for a client id if it does not exist yet.
    async fn ensure_namespace(&self, client_id: &str) -> Result<()>;

    /// Loads the stored blob. `None` means the tenant has never paired.
    async fn load(&self, client_id: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrites the stored blob.
    async fn save(&self, client_id: &str, credentials: &[u8]) -> Result<()>;

    /// Removes the namespace. Returns whether one existed.
    async fn delete(&self, client_id: &str) -> Result<bool>;
}
