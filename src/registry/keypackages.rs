/// KeyPackage registry: client id -> opaque key-exchange blob.
/// The relay stores and serves these without interpreting their contents.
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::RwLock;

use crate::error::RelayError;
use crate::protocol::ClientId;

#[derive(Debug, Clone, Default)]
pub struct KeyPackageRegistry {
    inner: Arc<RwLock<HashMap<ClientId, Vec<u8>>>>,
}

impl KeyPackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a KeyPackage, replacing any prior payload for the same client.
    pub async fn store(&self, client_id: &str, key_package: Vec<u8>) {
        let mut packages = self.inner.write().await;
        if packages.insert(client_id.to_string(), key_package).is_some() {
            debug!("Replaced KeyPackage for client: {}", client_id);
        } else {
            debug!("Stored KeyPackage for client: {}", client_id);
        }
    }

    pub async fn fetch(&self, client_id: &str) -> Result<Vec<u8>, RelayError> {
        let packages = self.inner.read().await;
        packages
            .get(client_id)
            .cloned()
            .ok_or_else(|| RelayError::NotFound(format!("no KeyPackage for {}", client_id)))
    }

    /// Snapshot of the client ids with a stored KeyPackage. Order is not
    /// guaranteed stable across concurrent mutation.
    pub async fn list(&self) -> Vec<ClientId> {
        let packages = self.inner.read().await;
        packages.keys().cloned().collect()
    }
}
