use crate::{
    domain::{PipelineItem, PositionUpdate},
    error::{PipelineError, Result},
    storage::{ensure_id_conflict_key, PipelineStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use tokio::sync::Mutex;

fn storage_err(e: rusqlite::Error) -> PipelineError {
    PipelineError::Storage(e.to_string())
}

/// SQLite-backed items table
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `database_path`
    pub fn open(database_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(database_path).map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts a full item row, timestamps included
    pub async fn insert_item(&self, item: &PipelineItem) -> Result<()> {
        let conn = self.conn.lock().await;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO pipeline_items (id, status, position, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                item.id.as_str(),
                item.status.as_str(),
                item.position,
                item.title,
                now
            ],
        )
        .map_err(storage_err)?;
        Ok(())
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl PipelineStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pipeline_items (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                position INTEGER,
                title TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pipeline_items_status
                ON pipeline_items (status, position);",
        )
        .map_err(storage_err)
    }

    async fn is_initialized(&self) -> bool {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'pipeline_items'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false)
    }

    async fn list_items(&self) -> Result<Vec<PipelineItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, status, position, title, created_at, updated_at
                 FROM pipeline_items ORDER BY rowid",
            )
            .map_err(storage_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PipelineItem {
                    id: row.get::<_, String>(0)?.into(),
                    status: row.get::<_, String>(1)?.into(),
                    position: row.get(2)?,
                    title: row.get(3)?,
                    created_at: parse_timestamp(row.get(4)?),
                    updated_at: parse_timestamp(row.get(5)?),
                })
            })
            .map_err(storage_err)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage_err)
    }

    async fn upsert(&self, rows: &[PositionUpdate], on_conflict: &str) -> Result<()> {
        ensure_id_conflict_key(on_conflict)?;

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO pipeline_items (id, status, position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        status = excluded.status,
                        position = excluded.position,
                        updated_at = excluded.updated_at",
                )
                .map_err(storage_err)?;
            for row in rows {
                stmt.execute(params![row.id.as_str(), row.status.as_str(), row.position, now])
                    .map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)
    }
}
