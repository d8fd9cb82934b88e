/// Handlers module
/// Provides the per-connection protocol loop and the liveness endpoint

pub mod connection;
pub mod health;

pub use connection::{handle_connection, Frame, FrameCodec};
pub use health::health;
