/// Wire protocol for the relay service.
/// Newline-delimited JSON frames, one request per frame, one response per
/// frame. Relayed messages are pushed to recipients as `Forward` frames on
/// their own connections.
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, RelayError};

pub type ClientId = String;
pub type GroupId = String;

/// Maximum size of a single wire frame in bytes. Frames above this limit are
/// discarded and answered with an `Oversized` error.
pub const MAX_FRAME_BYTES: usize = 8192;

/// MLS message classes the relay forwards without interpreting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Welcome,
    Add,
    Application,
    Commit,
    Proposal,
}

/// Inbound requests. Closed set: adding a variant is a compile-time-checked
/// change everywhere the enum is matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    StoreKeyPackage {
        client_id: ClientId,
        key_package: Vec<u8>,
    },
    FetchKeyPackage {
        client_id: ClientId,
    },
    ListKeyPackages,
    CreateGroup {
        group_id: GroupId,
        creator_id: ClientId,
    },
    JoinGroup {
        group_id: GroupId,
        client_id: ClientId,
    },
    RelayMessage {
        group_id: GroupId,
        sender_id: ClientId,
        message: Vec<u8>,
        message_type: MessageType,
    },
}

impl Request {
    /// The identity a request acts as, used to bind the sending connection
    /// in the connection directory before the request is dispatched.
    pub fn acting_identity(&self) -> Option<&str> {
        match self {
            Request::StoreKeyPackage { client_id, .. } => Some(client_id),
            Request::FetchKeyPackage { client_id } => Some(client_id),
            Request::ListKeyPackages => None,
            Request::CreateGroup { creator_id, .. } => Some(creator_id),
            Request::JoinGroup { client_id, .. } => Some(client_id),
            Request::RelayMessage { sender_id, .. } => Some(sender_id),
        }
    }
}

/// Outbound messages: responses to requests, plus `Forward` frames pushed to
/// group members when a message is relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Ack {
        success: bool,
        detail: String,
    },
    KeyPackage {
        client_id: ClientId,
        key_package: Vec<u8>,
    },
    KeyPackageList {
        clients: Vec<ClientId>,
    },
    Group {
        group_id: GroupId,
        members: Vec<ClientId>,
    },
    Relayed {
        group_id: GroupId,
        delivered: usize,
        recipients: usize,
    },
    Forward {
        sender: ClientId,
        message_type: MessageType,
        payload: Vec<u8>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(err: &RelayError) -> Self {
        ServerMessage::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
