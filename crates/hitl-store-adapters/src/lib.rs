//! Store adapter implementations for hitl sessions.

pub mod checkpoint_store;
pub mod memory_store;
pub mod preference_store;

pub use checkpoint_store::MemoryCheckpointStore;
pub use memory_store::MemoryStore;
pub use preference_store::MemoryPreferenceStore;
