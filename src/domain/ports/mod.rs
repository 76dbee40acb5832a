//! Ports (trait interfaces) for external collaborators.

pub mod entry_store;
pub mod inventory;
pub mod lifecycle_source;

pub use entry_store::EntryStore;
pub use inventory::InventoryProvider;
pub use lifecycle_source::LifecycleSource;
