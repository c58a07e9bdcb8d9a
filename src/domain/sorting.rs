use crate::domain::item::{ItemId, PipelineItem, PositionUpdate, Status};

/// Items of one column in display order
///
/// Sorts ascending by position, with missing positions treated as 0. The sort
/// is stable, so colliding positions keep their snapshot order.
///
/// # Examples
/// ```
/// use crm_pipeline::domain::sorting::column_order;
/// use crm_pipeline::domain::{PipelineItem, Status};
///
/// let items = vec![
///     PipelineItem::new("b", "X", 2),
///     PipelineItem::new("a", "X", 1),
///     PipelineItem::new("c", "Y", 0),
/// ];
///
/// let ordered = column_order(&items, &Status::from("X"));
/// assert_eq!(ordered[0].id.as_str(), "a");
/// assert_eq!(ordered.len(), 2);
/// ```
pub fn column_order<'a>(items: &'a [PipelineItem], status: &Status) -> Vec<&'a PipelineItem> {
    let mut column: Vec<&PipelineItem> = items.iter().filter(|i| &i.status == status).collect();
    column.sort_by(|a, b| a.effective_position().total_cmp(&b.effective_position()));
    column
}

/// Ids of one column in display order
pub fn column_ids(items: &[PipelineItem], status: &Status) -> Vec<ItemId> {
    column_order(items, status)
        .into_iter()
        .map(|i| i.id.clone())
        .collect()
}

/// Assigns positions 0..N-1 following the order of `ids`
pub fn renumber(ids: &[ItemId], status: &Status) -> Vec<PositionUpdate> {
    ids.iter()
        .enumerate()
        .map(|(pos, id)| PositionUpdate::new(id.clone(), status.clone(), pos as i64))
        .collect()
}

/// Moves the element at `from` so it ends up at `to` (clamped to the end)
pub fn move_within(ids: &mut Vec<ItemId>, from: usize, to: usize) {
    if from >= ids.len() {
        return;
    }
    let id = ids.remove(from);
    let to = to.min(ids.len());
    ids.insert(to, id);
}
