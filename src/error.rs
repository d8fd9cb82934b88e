/// Error types for the relay engine.
/// Every recoverable failure maps to a wire-level error kind; only transport
/// failures terminate a connection.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::MAX_FRAME_BYTES;

/// Wire-level error kind carried in `Error` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    NotMember,
    Malformed,
    Oversized,
    #[serde(rename = "IOError")]
    Io,
}

/// Engine errors. All variants except `Io` are recovered at the connection
/// handler: the client gets an error response and the connection stays open.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("sender not in group: {0}")]
    NotMember(String),

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("frame exceeds {} bytes", MAX_FRAME_BYTES)]
    Oversized,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::NotFound(_) => ErrorKind::NotFound,
            RelayError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RelayError::NotMember(_) => ErrorKind::NotMember,
            RelayError::Malformed(_) => ErrorKind::Malformed,
            RelayError::Oversized => ErrorKind::Oversized,
            RelayError::Io(_) => ErrorKind::Io,
        }
    }
}
