//! Session, preference and checkpoint storage contracts.

pub mod traits;
pub mod types;

pub use traits::{CheckpointStore, PreferenceStore, SessionStore};
pub use types::{CheckpointStoreError, PreferenceStoreError, SessionStoreError};
