pub mod channel_deletion;
pub mod deletion_store;

pub use channel_deletion::DeletionScheduler;
pub use deletion_store::{InMemoryDeletionStore, JsonFileDeletionStore, PendingDeletionStore};
