use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline item not found: {0}")]
    ItemNotFound(String),

    #[error("Could not resolve a target status for drop target: {0}")]
    UnresolvedTarget(String),

    #[error("Failed to persist chunk {chunk_index} ({chunks_written} chunk(s) already written): {source}")]
    Persistence {
        chunk_index: usize,
        chunks_written: usize,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Store not initialized. Run 'crm-pipeline init' first.")]
    StoreNotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// True for errors raised before any write was attempted
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ItemNotFound(_) | Self::UnresolvedTarget(_))
    }
}
