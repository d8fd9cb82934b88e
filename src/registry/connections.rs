/// Connection directory: client id -> live outbound channel.
/// Bindings are non-owning. The connection handler owns the socket; the
/// directory only holds the sender side of the connection's outbound queue
/// and drops it again when the connection closes.
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::protocol::{ClientId, ServerMessage};

/// Handle to one connection's outbound queue. `conn_id` identifies the
/// owning connection so teardown removes only its own bindings.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    conn_id: Uuid,
    tx: UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// Whether the owning connection's writer is still draining the queue.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a message for the connection. Returns false if the connection
    /// has gone away or the message could not be encoded.
    pub fn send(&self, message: &ServerMessage) -> bool {
        let encoded = match serde_json::to_string(message) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to serialize outbound message: {}", e);
                return false;
            }
        };
        self.tx.send(encoded).is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionDirectory {
    inner: Arc<RwLock<HashMap<ClientId, ConnectionHandle>>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a client id with a connection. A client re-binding from a
    /// new connection supersedes the old binding: last writer wins.
    pub async fn bind(&self, client_id: &str, handle: &ConnectionHandle) {
        let mut bindings = self.inner.write().await;
        let previous = bindings.insert(client_id.to_string(), handle.clone());
        match previous {
            Some(old) if old.conn_id() != handle.conn_id() => {
                debug!(
                    "Client {} re-bound from connection {} to {}",
                    client_id,
                    old.conn_id(),
                    handle.conn_id()
                );
            }
            _ => {}
        }
    }

    /// Remove every binding that points at the closing connection. Invoked
    /// from the connection handler's teardown path.
    pub async fn unbind_on_close(&self, conn_id: Uuid) {
        let mut bindings = self.inner.write().await;
        bindings.retain(|_, handle| handle.conn_id() != conn_id);
    }

    /// The live channel for a client, or None if the client is offline. A
    /// binding whose connection already closed is treated as absent.
    pub async fn lookup(&self, client_id: &str) -> Option<ConnectionHandle> {
        let bindings = self.inner.read().await;
        bindings
            .get(client_id)
            .filter(|handle| handle.is_open())
            .cloned()
    }
}
