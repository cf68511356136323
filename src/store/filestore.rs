use super::{CredentialStore, Result, StoreError};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// Filename of the authorization blob inside a client namespace.
const CREDS_FILE: &str = "creds.json";

/// Filesystem-backed credential store: one directory per client id under a
/// common base path.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub async fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let base_path = path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn sanitize_filename(key: &str) -> String {
        key.replace(|c: char| !c.is_alphanumeric() && c != '.' && c != '-', "_")
    }

    fn namespace_path(&self, client_id: &str) -> PathBuf {
        self.base_path.join(Self::sanitize_filename(client_id))
    }

    fn creds_path(&self, client_id: &str) -> PathBuf {
        self.namespace_path(client_id).join(CREDS_FILE)
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn ensure_namespace(&self, client_id: &str) -> Result<()> {
        fs::create_dir_all(self.namespace_path(client_id))
            .await
            .map_err(StoreError::from)
    }

    async fn load(&self, client_id: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.creds_path(client_id)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn save(&self, client_id: &str, credentials: &[u8]) -> Result<()> {
        fs::write(self.creds_path(client_id), credentials)
            .await
            .map_err(StoreError::from)
    }

    async fn delete(&self, client_id: &str) -> Result<bool> {
        match fs::remove_dir_all(self.namespace_path(client_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
