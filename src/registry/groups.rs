/// Group registry: group id -> membership set and append-only message log.
/// Membership is monotonically non-decreasing and a group always contains
/// its creator. Groups are never deleted.
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use tokio::sync::RwLock;

use crate::error::RelayError;
use crate::protocol::{ClientId, GroupId, MessageType};

/// One relayed message, recorded at relay time. The log is an audit trail:
/// no read operation is exposed to clients.
#[derive(Debug, Clone)]
pub struct RelayedMessageRecord {
    pub sender: ClientId,
    pub message_type: MessageType,
    pub payload: Vec<u8>,
    pub sequence_no: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct GroupState {
    pub group_id: GroupId,
    pub creator: ClientId,
    members: Vec<ClientId>,
    log: Vec<RelayedMessageRecord>,
}

impl GroupState {
    fn new(group_id: GroupId, creator: ClientId) -> Self {
        Self {
            group_id,
            members: vec![creator.clone()],
            creator,
            log: Vec::new(),
        }
    }

    /// Idempotent: adding an existing member is a no-op.
    fn add_member(&mut self, client_id: &str) {
        if !self.members.iter().any(|m| m == client_id) {
            self.members.push(client_id.to_string());
        }
    }

    fn is_member(&self, client_id: &str) -> bool {
        self.members.iter().any(|m| m == client_id)
    }

    fn append(&mut self, sender: ClientId, message_type: MessageType, payload: Vec<u8>) {
        let record = RelayedMessageRecord {
            sender,
            message_type,
            payload,
            sequence_no: self.log.len() as u64,
            timestamp: Utc::now().to_rfc3339(),
        };
        self.log.push(record);
    }

    /// Members in join order.
    pub fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    inner: Arc<RwLock<HashMap<GroupId, GroupState>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group with the creator as its only member. Returns the
    /// member list of the new group.
    pub async fn create(
        &self,
        group_id: &str,
        creator_id: &str,
    ) -> Result<Vec<ClientId>, RelayError> {
        let mut groups = self.inner.write().await;
        if groups.contains_key(group_id) {
            return Err(RelayError::AlreadyExists(format!("group {}", group_id)));
        }

        let group = GroupState::new(group_id.to_string(), creator_id.to_string());
        let members = group.members.clone();
        groups.insert(group_id.to_string(), group);
        info!("Created group: {} by {}", group_id, creator_id);
        Ok(members)
    }

    /// Add a client to an existing group. Re-joining is a no-op success.
    /// Returns the member list after the join.
    pub async fn join(&self, group_id: &str, client_id: &str) -> Result<Vec<ClientId>, RelayError> {
        let mut groups = self.inner.write().await;
        match groups.get_mut(group_id) {
            Some(group) => {
                group.add_member(client_id);
                info!("Client {} joined group {}", client_id, group_id);
                Ok(group.members.clone())
            }
            None => Err(RelayError::NotFound(format!("group {}", group_id))),
        }
    }

    pub async fn members_of(&self, group_id: &str) -> Result<Vec<ClientId>, RelayError> {
        let groups = self.inner.read().await;
        groups
            .get(group_id)
            .map(|group| group.members.clone())
            .ok_or_else(|| RelayError::NotFound(format!("group {}", group_id)))
    }

    pub async fn is_member(&self, group_id: &str, client_id: &str) -> Result<bool, RelayError> {
        let groups = self.inner.read().await;
        groups
            .get(group_id)
            .map(|group| group.is_member(client_id))
            .ok_or_else(|| RelayError::NotFound(format!("group {}", group_id)))
    }

    /// Record a relayed message after checking the sender's membership, and
    /// return a snapshot of the member set. The lock is released when this
    /// returns, before any channel writes happen.
    pub async fn append_message(
        &self,
        group_id: &str,
        sender_id: &str,
        message_type: MessageType,
        payload: Vec<u8>,
    ) -> Result<Vec<ClientId>, RelayError> {
        let mut groups = self.inner.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| RelayError::NotFound(format!("group {}", group_id)))?;

        if !group.is_member(sender_id) {
            return Err(RelayError::NotMember(sender_id.to_string()));
        }

        group.append(sender_id.to_string(), message_type, payload);
        debug!(
            "Recorded message {} from {} in group {}",
            group.log_len(),
            sender_id,
            group_id
        );
        Ok(group.members.clone())
    }
}
