//! Dataset-catalog storage: current items plus named export snapshots.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbitdeck_core::{CatalogRow, OrbitResult, SnapshotName};
use tokio::sync::RwLock;

/// Source of catalog rows for CSV export.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Current catalog rows, ordered by dataset id.
    async fn current_rows(&self) -> OrbitResult<Vec<CatalogRow>>;

    /// Rows of a prior export in export order, or `None` if no snapshot has
    /// this name.
    async fn snapshot_rows(&self, name: &SnapshotName) -> OrbitResult<Option<Vec<CatalogRow>>>;

    /// Names of known snapshots, newest first.
    async fn list_snapshots(&self) -> OrbitResult<Vec<SnapshotName>>;
}

/// In-memory [`CatalogStore`].
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    items: RwLock<BTreeMap<String, CatalogRow>>,
    snapshots: RwLock<BTreeMap<SnapshotName, Vec<CatalogRow>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace current items by dataset id. A missing
    /// `updated_at` keeps the stored one.
    pub async fn upsert_items(&self, rows: impl IntoIterator<Item = CatalogRow>) {
        let mut items = self.items.write().await;
        for mut row in rows {
            if row.updated_at.is_none() {
                row.updated_at = items.get(&row.dataset_id).and_then(|old| old.updated_at.clone());
            }
            items.insert(row.dataset_id.clone(), row);
        }
    }

    /// Record a snapshot taken at `exported_at`. Rows without a stored
    /// `row_number` are numbered from 1 in the order given.
    pub async fn insert_snapshot(
        &self,
        name: SnapshotName,
        exported_at: DateTime<Utc>,
        rows: impl IntoIterator<Item = CatalogRow>,
    ) {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                row.exported_at = Some(exported_at);
                row.row_number.get_or_insert(index as i64 + 1);
                row
            })
            .collect();
        self.snapshots.write().await.insert(name, rows);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn current_rows(&self) -> OrbitResult<Vec<CatalogRow>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn snapshot_rows(&self, name: &SnapshotName) -> OrbitResult<Option<Vec<CatalogRow>>> {
        Ok(self.snapshots.read().await.get(name).cloned())
    }

    async fn list_snapshots(&self) -> OrbitResult<Vec<SnapshotName>> {
        Ok(self.snapshots.read().await.keys().rev().cloned().collect())
    }
}
