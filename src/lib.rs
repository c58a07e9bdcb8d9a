//! # CRM Pipeline
//!
//! Reordering and persistence for the CRM's deal pipeline board.
//!
//! A drag-and-drop gesture is planned against a fresh snapshot of the board,
//! turned into contiguous `(id, status, position)` rows for every affected
//! column, and written through an injected [`PipelineStore`] in bounded
//! chunks.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod reorder;
pub mod storage;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use domain::{
    board::{Column, Pipeline},
    item::{ItemId, PipelineItem, PositionUpdate, Status},
};
pub use error::{PipelineError, Result};
pub use reorder::{
    handle_reorder, persist_updates, plan_reorder, FnResolver, MoveEvent, ReorderOptions,
    ReorderOutcome, ReorderPlan, TargetResolver,
};
pub use storage::PipelineStore;
