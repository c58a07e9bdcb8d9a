use crate::{
    domain::{PipelineItem, PositionUpdate},
    error::{PipelineError, Result},
    storage::{ensure_id_conflict_key, PipelineStore},
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    items: Vec<PipelineItem>,
    calls: Vec<Vec<PositionUpdate>>,
    attempts: usize,
    fail_on: Option<usize>,
}

/// In-memory items table, mainly for tests
///
/// Records every successful upsert call and can be told to reject a given
/// call to simulate a store-side failure.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn with_items(items: Vec<PipelineItem>) -> Self {
        Self {
            state: RwLock::new(State {
                items,
                ..State::default()
            }),
        }
    }

    /// Makes the `n`th upsert call (1-based) fail
    pub async fn fail_on_call(&self, n: usize) {
        self.state.write().await.fail_on = Some(n);
    }

    /// Rows of each upsert call that was applied, in call order
    pub async fn upsert_calls(&self) -> Vec<Vec<PositionUpdate>> {
        self.state.read().await.calls.clone()
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        true
    }

    async fn list_items(&self) -> Result<Vec<PipelineItem>> {
        Ok(self.state.read().await.items.clone())
    }

    async fn upsert(&self, rows: &[PositionUpdate], on_conflict: &str) -> Result<()> {
        ensure_id_conflict_key(on_conflict)?;

        let mut state = self.state.write().await;
        state.attempts += 1;
        if state.fail_on == Some(state.attempts) {
            return Err(PipelineError::Storage(format!(
                "simulated failure on upsert call {}",
                state.attempts
            )));
        }

        let now = Utc::now();
        for row in rows {
            match state.items.iter_mut().find(|i| i.id == row.id) {
                Some(item) => {
                    item.status = row.status.clone();
                    item.position = Some(row.position as f64);
                    item.updated_at = Some(now);
                }
                None => {
                    let mut item =
                        PipelineItem::new(row.id.clone(), row.status.clone(), row.position);
                    item.created_at = Some(now);
                    item.updated_at = Some(now);
                    state.items.push(item);
                }
            }
        }
        state.calls.push(rows.to_vec());
        Ok(())
    }
}
