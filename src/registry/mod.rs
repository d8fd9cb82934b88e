/// In-memory state registries shared across connection tasks.
/// Each registry is guarded by its own lock, so an operation on one never
/// blocks operations on another. All state is volatile: a restart discards
/// stored key material, group state, and message logs.

pub mod connections;
pub mod groups;
pub mod keypackages;

pub use connections::{ConnectionDirectory, ConnectionHandle};
pub use groups::{GroupRegistry, GroupState, RelayedMessageRecord};
pub use keypackages::KeyPackageRegistry;

/// The three shared registries, injected into the dispatcher at startup.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub key_packages: KeyPackageRegistry,
    pub groups: GroupRegistry,
    pub connections: ConnectionDirectory,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}
