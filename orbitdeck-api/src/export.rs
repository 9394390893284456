//! Dataset catalog CSV export.

use std::sync::Arc;

use orbitdeck_core::{render_csv, OrbitError, SnapshotName};
use orbitdeck_storage::{CatalogStore, Clock};

use crate::error::{ApiError, ApiResult};

/// Rendered CSV document and the file name it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl ExportService {
    pub fn new(store: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Export a named prior snapshot, or the current catalog when `snapshot`
    /// is `None`.
    ///
    /// # Errors
    /// `INVALID_FORMAT` for a malformed snapshot name, `SNAPSHOT_NOT_FOUND`
    /// for an unknown one, and storage errors as reported by the store.
    pub async fn export(&self, snapshot: Option<&str>) -> ApiResult<CsvExport> {
        match snapshot {
            Some(raw) => {
                let name = SnapshotName::parse(raw).map_err(OrbitError::from)?;
                let rows = self
                    .store
                    .snapshot_rows(&name)
                    .await?
                    .ok_or_else(|| ApiError::snapshot_not_found(&name))?;
                let exported_at = rows
                    .iter()
                    .find_map(|row| row.exported_at)
                    .unwrap_or_else(|| self.clock.now());
                tracing::info!(snapshot = %name, rows = rows.len(), "exporting catalog snapshot");
                Ok(CsvExport {
                    filename: name.to_string(),
                    body: render_csv(&rows, exported_at),
                })
            }
            None => {
                let now = self.clock.now();
                let rows = self.store.current_rows().await?;
                tracing::info!(rows = rows.len(), "exporting current catalog");
                Ok(CsvExport {
                    filename: SnapshotName::for_export(now).to_string(),
                    body: render_csv(&rows, now),
                })
            }
        }
    }

    /// Prior snapshot names, newest first.
    pub async fn snapshots(&self) -> ApiResult<Vec<SnapshotName>> {
        Ok(self.store.list_snapshots().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::{TimeZone, Utc};
    use orbitdeck_storage::{InMemoryCatalogStore, ManualClock};

    const BOM: &[u8] = b"\xEF\xBB\xBF";

    fn service(store: Arc<InMemoryCatalogStore>) -> ExportService {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default();
        ExportService::new(store, Arc::new(ManualClock::new(start)))
    }

    #[tokio::test]
    async fn test_empty_catalog_exports_header_only() -> Result<(), String> {
        let export = service(Arc::new(InMemoryCatalogStore::new()))
            .export(None)
            .await
            .map_err(|e| e.message)?;

        assert_eq!(export.filename, "osdr_export_20240301_120000.csv");
        assert!(export.body.starts_with(BOM));
        let text = String::from_utf8(export.body[BOM.len()..].to_vec()).map_err(|e| e.to_string())?;
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("\"export_timestamp\",\"updated_at\""));
        assert!(text.ends_with("\"raw_json\"\r\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_name_errors() {
        let export = service(Arc::new(InMemoryCatalogStore::new()));

        let bad = export.export(Some("../../etc/passwd")).await;
        assert!(matches!(bad, Err(e) if e.code == ErrorCode::InvalidFormat));

        let missing = export.export(Some("osdr_export_20200101_000000.csv")).await;
        assert!(matches!(missing, Err(e) if e.code == ErrorCode::SnapshotNotFound));
    }
}
