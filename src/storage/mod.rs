use crate::{
    domain::{PipelineItem, PositionUpdate},
    error::{PipelineError, Result},
};
use async_trait::async_trait;

pub mod file_storage;
pub mod memory;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

pub use file_storage::FileStore;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStore;

/// Backing table of pipeline items
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Checks if the store is ready for use
    async fn is_initialized(&self) -> bool;

    /// Loads a fresh snapshot of every item
    async fn list_items(&self) -> Result<Vec<PipelineItem>>;

    /// Inserts or updates rows, matching existing ones on `on_conflict`.
    /// Store-managed timestamps are maintained by the store itself.
    async fn upsert(&self, rows: &[PositionUpdate], on_conflict: &str) -> Result<()>;
}

/// Every store keys the items table by id only
pub(crate) fn ensure_id_conflict_key(on_conflict: &str) -> Result<()> {
    if on_conflict == "id" {
        Ok(())
    } else {
        Err(PipelineError::Storage(format!(
            "unsupported conflict key '{}'",
            on_conflict
        )))
    }
}
