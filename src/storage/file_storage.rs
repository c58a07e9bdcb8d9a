use crate::{
    domain::{PipelineItem, PositionUpdate},
    error::{PipelineError, Result},
    storage::{ensure_id_conflict_key, PipelineStore},
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// File-based items table stored as a JSON array
pub struct FileStore {
    root_path: PathBuf,
    // Guards every read and read-modify-write of the items file
    lock: Mutex<()>,
}

impl FileStore {
    const STORE_DIR: &'static str = ".pipeline";
    const ITEMS_FILE: &'static str = "items.json";
    const ITEMS_TMP_FILE: &'static str = "items.json.tmp";

    /// Creates a new FileStore for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::STORE_DIR),
            lock: Mutex::new(()),
        }
    }

    fn items_file(&self) -> PathBuf {
        self.root_path.join(Self::ITEMS_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_items(&self) -> Result<Vec<PipelineItem>> {
        let file_path = self.items_file();

        if !file_path.exists() {
            return Err(PipelineError::StoreNotInitialized);
        }

        let contents = fs::read_to_string(&file_path).await?;
        let items: Vec<PipelineItem> = serde_json::from_str(&contents)?;
        Ok(items)
    }

    async fn write_items(&self, items: &[PipelineItem]) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        // Replace the file in one rename so readers never see a partial write
        let json = serde_json::to_string_pretty(items)?;
        let tmp_path = self.root_path.join(Self::ITEMS_TMP_FILE);
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, self.items_file()).await?;
        Ok(())
    }

    /// Adds a new item at the end of its column
    pub async fn insert_item(&self, mut item: PipelineItem) -> Result<PipelineItem> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;

        if items.iter().any(|i| i.id == item.id) {
            return Err(PipelineError::Storage(format!(
                "item {} already exists",
                item.id
            )));
        }

        let next = items
            .iter()
            .filter(|i| i.status == item.status)
            .map(|i| i.effective_position().floor() as i64 + 1)
            .max()
            .unwrap_or(0);
        let now = Utc::now();
        item.position = Some(next as f64);
        item.created_at = Some(now);
        item.updated_at = Some(now);

        items.push(item.clone());
        self.write_items(&items).await?;
        Ok(item)
    }
}

#[async_trait]
impl PipelineStore for FileStore {
    async fn initialize(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.items_file().exists() {
            self.write_items(&[]).await?;
        }

        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.items_file().exists()
    }

    async fn list_items(&self) -> Result<Vec<PipelineItem>> {
        let _guard = self.lock.lock().await;
        self.read_items().await
    }

    async fn upsert(&self, rows: &[PositionUpdate], on_conflict: &str) -> Result<()> {
        ensure_id_conflict_key(on_conflict)?;

        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        let now = Utc::now();

        for row in rows {
            match items.iter_mut().find(|i| i.id == row.id) {
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
                    items.push(item);
                }
            }
        }

        self.write_items(&items).await
    }
}
