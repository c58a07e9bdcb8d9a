pub mod board;
pub mod item;
pub mod sorting;

pub use board::{Column, Pipeline};
pub use item::{ItemId, PipelineItem, PositionUpdate, Status};
pub use sorting::{column_ids, column_order, renumber};
