/// Message router: membership-checked fan-out of relayed messages.
/// Recipient determination happens under the group registry lock; channel
/// writes happen after the lock is released, so a stalled peer never blocks
/// registry operations for unrelated clients.
use log::debug;

use crate::error::RelayError;
use crate::protocol::{MessageType, ServerMessage};
use crate::registry::Registries;

/// What a relay accomplished: `delivered` counts members with a live
/// connection that accepted the forward, `recipients` counts every member
/// other than the sender. Delivery is best-effort; offline members are
/// skipped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReceipt {
    pub delivered: usize,
    pub recipients: usize,
}

pub async fn relay(
    registries: &Registries,
    group_id: &str,
    sender_id: &str,
    message_type: MessageType,
    payload: Vec<u8>,
) -> Result<RelayReceipt, RelayError> {
    // Validates membership, appends to the group log, and snapshots the
    // member set in one lock acquisition. No lock is held past this point.
    let members = registries
        .groups
        .append_message(group_id, sender_id, message_type.clone(), payload.clone())
        .await?;

    let forward = ServerMessage::Forward {
        sender: sender_id.to_string(),
        message_type,
        payload,
    };

    let mut delivered = 0;
    let mut recipients = 0;
    for member in members.iter().filter(|m| m.as_str() != sender_id) {
        recipients += 1;
        match registries.connections.lookup(member).await {
            Some(handle) => {
                if handle.send(&forward) {
                    delivered += 1;
                }
            }
            None => {
                debug!("Member {} of group {} is offline, skipping", member, group_id);
            }
        }
    }

    debug!(
        "Relayed message from {} to group {}: {}/{} delivered",
        sender_id, group_id, delivered, recipients
    );
    Ok(RelayReceipt {
        delivered,
        recipients,
    })
}
