use crate::domain::item::{PipelineItem, Status};
use crate::domain::sorting::column_order;
use crate::reorder::TargetResolver;
use serde::{Deserialize, Serialize};

/// A droppable column on the pipeline board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Id of the column container as seen by drag-and-drop
    pub id: String,
    pub name: String,
    pub status: Status,
}

impl Column {
    /// Creates a column whose container id and label are the status itself
    pub fn for_status(status: impl Into<Status>) -> Self {
        let status = status.into();
        Self {
            id: status.as_str().to_string(),
            name: status.as_str().to_string(),
            status,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Ordered set of stages items move through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Gets the column whose container id matches
    pub fn column_by_id(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.id == id)
    }

    /// Gets the column configuration for a status
    pub fn column_for_status(&self, status: &Status) -> Option<&Column> {
        self.columns.iter().find(|col| &col.status == status)
    }

    /// Groups a snapshot by column, each in display order. Items whose status
    /// has no configured column are left out.
    pub fn board_view<'a>(&'a self, items: &'a [PipelineItem]) -> Vec<(&'a Column, Vec<&'a PipelineItem>)> {
        self.columns
            .iter()
            .map(|col| (col, column_order(items, &col.status)))
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            "Pipeline",
            vec![
                Column::for_status(Status::FIRST_CONTACT),
                Column::for_status(Status::QUOTE),
                Column::for_status(Status::NEGOTIATION),
                Column::for_status(Status::CONFIRMED),
                Column::for_status(Status::CANCELLED),
            ],
        )
    }
}

impl TargetResolver for Pipeline {
    fn is_column_id(&self, id: &str) -> bool {
        self.column_by_id(id).is_some()
    }

    fn resolve_target_status(&self, id: &str, items: &[PipelineItem]) -> Option<Status> {
        if let Some(col) = self.column_by_id(id) {
            return Some(col.status.clone());
        }
        items
            .iter()
            .find(|item| item.id.as_str() == id)
            .map(|item| item.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_stages() {
        let pipeline = Pipeline::default();
        let names: Vec<&str> = pipeline.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["1º Contato", "Orçamento", "Negociação", "Confirmado", "Cancelado"]
        );
    }

    #[test]
    fn test_resolves_column_and_item_targets() {
        let pipeline = Pipeline::new(
            "Deals",
            vec![Column::for_status("X").with_id("col-x"), Column::for_status("Y")],
        );
        let items = vec![PipelineItem::new("a", "X", 0)];

        assert!(pipeline.is_column_id("col-x"));
        assert!(!pipeline.is_column_id("X"));
        assert_eq!(
            pipeline.resolve_target_status("col-x", &items),
            Some(Status::from("X"))
        );
        assert_eq!(
            pipeline.resolve_target_status("a", &items),
            Some(Status::from("X"))
        );
        assert_eq!(pipeline.resolve_target_status("missing", &items), None);
    }

    #[test]
    fn test_board_view_orders_each_column() {
        let pipeline = Pipeline::new("Deals", vec![Column::for_status("X"), Column::for_status("Y")]);
        let items = vec![
            PipelineItem::new("b", "X", 5),
            PipelineItem::new("c", "Y", 0),
            PipelineItem::new("a", "X", 1),
            PipelineItem::new("z", "Z", 0),
        ];

        let view = pipeline.board_view(&items);
        assert_eq!(view.len(), 2);
        let x_ids: Vec<&str> = view[0].1.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(x_ids, vec!["a", "b"]);
        assert_eq!(view[1].1.len(), 1);
    }
}
