//! Drag-and-drop reordering of pipeline items.
//!
//! A move is planned against a fresh snapshot of the board and then written
//! back as one batch of `(id, status, position)` rows. Every affected column
//! is renumbered `0..N-1`; positions are never interpolated.

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_CONFLICT_KEY};
use crate::domain::sorting::{column_ids, move_within, renumber};
use crate::domain::{ItemId, PipelineItem, PositionUpdate, Status};
use crate::error::{PipelineError, Result};
use crate::storage::PipelineStore;

/// Tells drop targets apart and maps them to a destination status
pub trait TargetResolver {
    /// True when `id` names a column container rather than an item
    fn is_column_id(&self, id: &str) -> bool;

    /// Destination status for a drop on `id`, which may be a column or an item
    fn resolve_target_status(&self, id: &str, items: &[PipelineItem]) -> Option<Status>;
}

/// Resolver built from a pair of closures
pub struct FnResolver<C, R> {
    is_column: C,
    resolve: R,
}

impl<C, R> FnResolver<C, R>
where
    C: Fn(&str) -> bool,
    R: Fn(&str, &[PipelineItem]) -> Option<Status>,
{
    pub fn new(is_column: C, resolve: R) -> Self {
        Self { is_column, resolve }
    }
}

impl<C, R> TargetResolver for FnResolver<C, R>
where
    C: Fn(&str) -> bool,
    R: Fn(&str, &[PipelineItem]) -> Option<Status>,
{
    fn is_column_id(&self, id: &str) -> bool {
        (self.is_column)(id)
    }

    fn resolve_target_status(&self, id: &str, items: &[PipelineItem]) -> Option<Status> {
        (self.resolve)(id, items)
    }
}

/// A single drag-and-drop gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub active_id: ItemId,
    /// Item id or column id the card was dropped on
    pub over_id: String,
}

impl MoveEvent {
    /// Creates an event for `active_id` dropped on `over_id`
    pub fn new(active_id: impl Into<ItemId>, over_id: impl Into<String>) -> Self {
        Self {
            active_id: active_id.into(),
            over_id: over_id.into(),
        }
    }
}

/// How planned rows are written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOptions {
    pub batch_size: usize,
    pub conflict_key: String,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            conflict_key: DEFAULT_CONFLICT_KEY.to_string(),
        }
    }
}

/// Result of planning a move against a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPlan {
    /// The drop leaves the board as it was
    Unchanged,
    Moved {
        active_id: ItemId,
        from: Status,
        to: Status,
        /// Rows for `from` first, then for `to` on a cross-column move
        updates: Vec<PositionUpdate>,
    },
}

impl ReorderPlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn updates(&self) -> &[PositionUpdate] {
        match self {
            Self::Unchanged => &[],
            Self::Moved { updates, .. } => updates,
        }
    }

    /// New order of a column touched by the move
    pub fn column(&self, status: &Status) -> Vec<&ItemId> {
        let mut rows: Vec<&PositionUpdate> = self
            .updates()
            .iter()
            .filter(|u| &u.status == status)
            .collect();
        rows.sort_by_key(|u| u.position);
        rows.into_iter().map(|u| &u.id).collect()
    }
}

/// A persisted move and the number of upsert calls it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub plan: ReorderPlan,
    pub chunks_written: usize,
}

/// Computes the rows a move must write without touching any store
pub fn plan_reorder<R>(items: &[PipelineItem], event: &MoveEvent, resolver: &R) -> Result<ReorderPlan>
where
    R: TargetResolver + ?Sized,
{
    let active = items
        .iter()
        .find(|item| item.id == event.active_id)
        .ok_or_else(|| PipelineError::ItemNotFound(event.active_id.to_string()))?;

    let from = active.status.clone();
    let to = resolver
        .resolve_target_status(&event.over_id, items)
        .filter(Status::is_usable)
        .ok_or_else(|| PipelineError::UnresolvedTarget(event.over_id.clone()))?;

    let mut from_list = column_ids(items, &from);
    let old_index = from_list.iter().position(|id| id == &event.active_id);
    let drop_on_column = resolver.is_column_id(&event.over_id);

    // A drop on a column body, or on an id absent from the column, appends.
    let target_index = |list: &[ItemId]| -> usize {
        let over_index = if drop_on_column {
            None
        } else {
            list.iter().position(|id| id.as_str() == event.over_id)
        };
        over_index.unwrap_or(list.len())
    };

    let updates = if from == to {
        let Some(old_index) = old_index else {
            return Ok(ReorderPlan::Unchanged);
        };
        let new_index = target_index(&from_list);
        if new_index == old_index {
            tracing::debug!(item = %event.active_id, status = %from, "drop leaves order unchanged");
            return Ok(ReorderPlan::Unchanged);
        }

        move_within(&mut from_list, old_index, new_index);
        renumber(&from_list, &from)
    } else {
        let mut to_list = column_ids(items, &to);
        let new_index = target_index(&to_list).min(to_list.len());

        from_list.retain(|id| id != &event.active_id);
        to_list.insert(new_index, event.active_id.clone());

        let mut updates = renumber(&from_list, &from);
        updates.extend(renumber(&to_list, &to));
        updates
    };

    tracing::debug!(
        item = %event.active_id,
        from = %from,
        to = %to,
        rows = updates.len(),
        "planned reorder"
    );

    Ok(ReorderPlan::Moved {
        active_id: event.active_id.clone(),
        from,
        to,
        updates,
    })
}

/// Writes rows in chunks of `options.batch_size`, one upsert call at a time.
///
/// Stops at the first failing chunk. Chunks already written stay written.
/// Returns the number of chunks written.
pub async fn persist_updates<S>(
    store: &S,
    updates: &[PositionUpdate],
    options: &ReorderOptions,
) -> Result<usize>
where
    S: PipelineStore + ?Sized,
{
    if options.batch_size == 0 {
        return Err(PipelineError::Config(
            "batch_size must be greater than zero".to_string(),
        ));
    }

    let mut written = 0;
    for (index, chunk) in updates.chunks(options.batch_size).enumerate() {
        if let Err(err) = store.upsert(chunk, &options.conflict_key).await {
            tracing::error!(
                chunk = index,
                chunks_written = written,
                rows = ?chunk,
                error = %err,
                "failed to persist reorder chunk"
            );
            return Err(PipelineError::Persistence {
                chunk_index: index,
                chunks_written: written,
                source: Box::new(err),
            });
        }
        written += 1;
    }

    Ok(written)
}

/// Plans a move against `items` and persists the resulting rows
pub async fn handle_reorder<R, S>(
    items: &[PipelineItem],
    event: &MoveEvent,
    resolver: &R,
    store: &S,
    options: &ReorderOptions,
) -> Result<ReorderOutcome>
where
    R: TargetResolver + ?Sized,
    S: PipelineStore + ?Sized,
{
    let plan = plan_reorder(items, event, resolver)?;
    if plan.is_noop() {
        return Ok(ReorderOutcome {
            plan,
            chunks_written: 0,
        });
    }

    let chunks_written = persist_updates(store, plan.updates(), options).await?;
    tracing::info!(
        item = %event.active_id,
        rows = plan.updates().len(),
        chunks = chunks_written,
        "persisted reorder"
    );

    Ok(ReorderOutcome {
        plan,
        chunks_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Pipeline};
    use crate::storage::memory::MemoryStore;

    fn board() -> Pipeline {
        Pipeline::new("Test", vec![Column::for_status("X"), Column::for_status("Y")])
    }

    fn snapshot() -> Vec<PipelineItem> {
        vec![
            PipelineItem::new("a", "X", 0),
            PipelineItem::new("b", "X", 1),
            PipelineItem::new("c", "Y", 0),
        ]
    }

    fn ids<'a>(v: &[&'a ItemId]) -> Vec<&'a str> {
        v.iter().map(|i| i.as_str()).collect()
    }

    fn rows(updates: &[PositionUpdate]) -> Vec<(&str, &str, i64)> {
        updates
            .iter()
            .map(|u| (u.id.as_str(), u.status.as_str(), u.position))
            .collect()
    }

    fn column_of(n: usize, status: &str) -> Vec<PipelineItem> {
        (0..n)
            .map(|i| PipelineItem::new(format!("item-{i}").as_str(), status, i as i64))
            .collect()
    }

    #[tokio::test]
    async fn test_drop_on_column_moves_to_end() {
        let store = MemoryStore::with_items(snapshot());
        let outcome = handle_reorder(
            &snapshot(),
            &MoveEvent::new("a", "Y"),
            &board(),
            &store,
            &ReorderOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.chunks_written, 1);
        let calls = store.upsert_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            rows(&calls[0]),
            vec![("b", "X", 0), ("c", "Y", 0), ("a", "Y", 1)]
        );
    }

    #[test]
    fn test_drop_on_item_inserts_before_it() {
        let mut items = snapshot();
        items.push(PipelineItem::new("d", "Y", 1));

        let plan = plan_reorder(&items, &MoveEvent::new("a", "d"), &board()).unwrap();

        assert_eq!(ids(&plan.column(&Status::from("Y"))), vec!["c", "a", "d"]);
        assert_eq!(ids(&plan.column(&Status::from("X"))), vec!["b"]);
    }

    #[test]
    fn test_cross_column_conservation() {
        let items = snapshot();
        let x = Status::from("X");
        let y = Status::from("Y");
        let plan = plan_reorder(&items, &MoveEvent::new("b", "c"), &board()).unwrap();

        let from_after = plan.column(&x);
        let to_after = plan.column(&y);
        assert_eq!(from_after.len(), column_ids(&items, &x).len() - 1);
        assert_eq!(to_after.len(), column_ids(&items, &y).len() + 1);
        assert!(to_after.iter().any(|id| id.as_str() == "b"));
        assert!(!from_after.iter().any(|id| id.as_str() == "b"));
    }

    #[test]
    fn test_move_into_empty_column() {
        let pipeline = Pipeline::new(
            "Test",
            vec![Column::for_status("X"), Column::for_status("Empty")],
        );
        let plan = plan_reorder(&snapshot(), &MoveEvent::new("b", "Empty"), &pipeline).unwrap();

        assert_eq!(
            rows(plan.updates()),
            vec![("a", "X", 0), ("b", "Empty", 0)]
        );
    }

    #[test]
    fn test_same_column_drop_on_self_is_noop() {
        let plan = plan_reorder(&snapshot(), &MoveEvent::new("b", "b"), &board()).unwrap();
        assert!(plan.is_noop());
    }

    #[tokio::test]
    async fn test_noop_writes_nothing() {
        let store = MemoryStore::with_items(snapshot());
        let outcome = handle_reorder(
            &snapshot(),
            &MoveEvent::new("a", "a"),
            &board(),
            &store,
            &ReorderOptions::default(),
        )
        .await
        .unwrap();

        assert!(outcome.plan.is_noop());
        assert_eq!(outcome.chunks_written, 0);
        assert!(store.upsert_calls().await.is_empty());
    }

    #[test]
    fn test_same_column_moves_down_and_up() {
        let items = vec![
            PipelineItem::new("a", "X", 0),
            PipelineItem::new("b", "X", 1),
            PipelineItem::new("c", "X", 2),
        ];
        let x = Status::from("X");

        let down = plan_reorder(&items, &MoveEvent::new("a", "c"), &board()).unwrap();
        assert_eq!(ids(&down.column(&x)), vec!["b", "c", "a"]);

        let up = plan_reorder(&items, &MoveEvent::new("c", "a"), &board()).unwrap();
        assert_eq!(ids(&up.column(&x)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_same_column_renumbers_gapped_positions() {
        let items = vec![
            PipelineItem::new("a", "X", 10),
            PipelineItem::new("b", "X", 40),
            PipelineItem::new("c", "X", 90),
        ];

        let plan = plan_reorder(&items, &MoveEvent::new("c", "b"), &board()).unwrap();
        assert_eq!(
            rows(plan.updates()),
            vec![("a", "X", 0), ("c", "X", 1), ("b", "X", 2)]
        );
    }

    #[test]
    fn test_same_column_drop_on_own_column_sends_to_end() {
        let plan = plan_reorder(&snapshot(), &MoveEvent::new("a", "X"), &board()).unwrap();
        assert_eq!(ids(&plan.column(&Status::from("X"))), vec!["b", "a"]);
    }

    #[test]
    fn test_positions_are_contiguous_after_move() {
        let mut items = column_of(7, "X");
        items[2].position = Some(100.0);
        items[4].position = None;
        items.extend(column_of(3, "Y"));

        let plan = plan_reorder(&items, &MoveEvent::new("item-1", "Y"), &board()).unwrap();

        for status in ["X", "Y"] {
            let mut positions: Vec<i64> = plan
                .updates()
                .iter()
                .filter(|u| u.status.as_str() == status)
                .map(|u| u.position)
                .collect();
            positions.sort_unstable();
            let expected: Vec<i64> = (0..positions.len() as i64).collect();
            assert_eq!(positions, expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_active_id_fails_without_writes() {
        let store = MemoryStore::with_items(snapshot());
        let err = handle_reorder(
            &snapshot(),
            &MoveEvent::new("ghost", "Y"),
            &board(),
            &store,
            &ReorderOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::ItemNotFound(ref id) if id == "ghost"));
        assert!(err.is_input_error());
        assert!(store.upsert_calls().await.is_empty());
    }

    #[test]
    fn test_unresolved_target() {
        let err = plan_reorder(&snapshot(), &MoveEvent::new("a", "nowhere"), &board()).unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedTarget(ref id) if id == "nowhere"));
    }

    #[test]
    fn test_blank_target_status_is_unresolved() {
        let resolver = FnResolver::new(|_: &str| true, |_: &str, _: &[PipelineItem]| {
            Some(Status::from(" "))
        });
        let err = plan_reorder(&snapshot(), &MoveEvent::new("a", "col"), &resolver).unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedTarget(_)));
    }

    #[test]
    fn test_closure_resolver_with_stale_over_id_appends() {
        // Resolver claims an item target that the snapshot does not contain.
        let resolver = FnResolver::new(|_: &str| false, |_: &str, _: &[PipelineItem]| {
            Some(Status::from("Y"))
        });
        let plan = plan_reorder(&snapshot(), &MoveEvent::new("a", "gone"), &resolver).unwrap();
        assert_eq!(ids(&plan.column(&Status::from("Y"))), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_chunking_boundary_at_51_rows() {
        let items = column_of(51, "X");
        let store = MemoryStore::with_items(items.clone());

        let outcome = handle_reorder(
            &items,
            &MoveEvent::new("item-0", "item-50"),
            &board(),
            &store,
            &ReorderOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.chunks_written, 2);
        let calls = store.upsert_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 50);
        assert_eq!(calls[1].len(), 1);
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_remaining_and_keeps_earlier() {
        let items = column_of(120, "X");
        let store = MemoryStore::with_items(items.clone());
        store.fail_on_call(2).await;

        let err = handle_reorder(
            &items,
            &MoveEvent::new("item-119", "item-0"),
            &board(),
            &store,
            &ReorderOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            PipelineError::Persistence {
                chunk_index,
                chunks_written,
                ..
            } => {
                assert_eq!(chunk_index, 1);
                assert_eq!(chunks_written, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Only the first chunk landed; the third was never attempted.
        assert_eq!(store.upsert_calls().await.len(), 1);
        let stored = store.list_items().await.unwrap();
        let moved = stored.iter().find(|i| i.id.as_str() == "item-119").unwrap();
        assert_eq!(moved.position, Some(0.0));
        let untouched = stored.iter().find(|i| i.id.as_str() == "item-60").unwrap();
        assert_eq!(untouched.position, Some(60.0));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_rejected() {
        let store = MemoryStore::default();
        let options = ReorderOptions {
            batch_size: 0,
            ..ReorderOptions::default()
        };
        let updates = vec![PositionUpdate::new("a".into(), "X".into(), 0)];

        let err = persist_updates(&store, &updates, &options).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
