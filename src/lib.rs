/// MLS relay server library.
/// A delivery service for group-keyed secure messaging: stores per-client
/// KeyPackages, tracks group membership, and relays opaque encrypted
/// payloads between currently-connected group members. The server never
/// interprets message contents.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
