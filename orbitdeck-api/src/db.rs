//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres, and the Postgres
//! implementations of [`CmsRepository`] and [`CatalogStore`]. The schema is
//! in `sql/schema.sql`.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use orbitdeck_core::{
    sanitize_html, CatalogRow, CmsPage, CmsPageUpdate, NewCmsPage, OrbitError, OrbitResult,
    SnapshotName, Slug, StorageError,
};
use orbitdeck_storage::{CatalogStore, CmsRepository};
use serde_json::Value as JsonValue;
use tokio_postgres::types::FromSql;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "iss_osdr".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("ORBITDECK_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("ORBITDECK_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("ORBITDECK_DB_NAME").unwrap_or_else(|_| "iss_osdr".to_string()),
            user: std::env::var("ORBITDECK_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("ORBITDECK_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("ORBITDECK_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("ORBITDECK_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration. No connection is
    /// opened until the first query.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                create: Some(self.timeout),
                recycle: Some(self.timeout),
            },
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// HEALTH
// ============================================================================

/// Connectivity check used by the health endpoint.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn health_check(&self) -> ApiResult<()>;
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

const CMS_COLUMNS: &str = "id, slug, title, body, is_active, created_at, updated_at";

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> OrbitResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            OrbitError::from(StorageError::Unavailable {
                reason: e.to_string(),
            })
        })
    }
}

#[async_trait]
impl DatabaseHealth for DbClient {
    async fn health_check(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn query_failed(err: tokio_postgres::Error) -> OrbitError {
    tracing::error!("Database error: {:?}", err);
    StorageError::QueryFailed {
        reason: err.to_string(),
    }
    .into()
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str, table: &str) -> OrbitResult<T> {
    row.try_get(name).map_err(|e| {
        StorageError::DecodeFailed {
            table: table.to_string(),
            reason: format!("{}: {}", name, e),
        }
        .into()
    })
}

/// Rows can be written to `cms_pages` by hand, so bodies are sanitized on
/// read as well as on write.
fn cms_page_from_row(row: &Row) -> OrbitResult<CmsPage> {
    let raw_slug: String = column(row, "slug", "cms_pages")?;
    let slug = Slug::parse(&raw_slug).map_err(|e| StorageError::DecodeFailed {
        table: "cms_pages".to_string(),
        reason: e.to_string(),
    })?;
    Ok(CmsPage {
        id: column(row, "id", "cms_pages")?,
        slug,
        title: column(row, "title", "cms_pages")?,
        body: sanitize_html(&column::<String>(row, "body", "cms_pages")?),
        is_active: column(row, "is_active", "cms_pages")?,
        created_at: column(row, "created_at", "cms_pages")?,
        updated_at: column(row, "updated_at", "cms_pages")?,
    })
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current item: typed columns win over whatever the raw document says.
fn catalog_item_from_row(row: &Row, index: usize) -> OrbitResult<CatalogRow> {
    let raw: JsonValue = column(row, "raw", "osdr_items")?;
    let mut item = CatalogRow::from_raw(&raw, index);
    item.dataset_id = column(row, "dataset_id", "osdr_items")?;
    if let Some(title) = column::<Option<String>>(row, "title", "osdr_items")? {
        item.title = title;
    }
    if let Some(organism) = column::<Option<String>>(row, "organism", "osdr_items")? {
        item.organism = organism;
    }
    if let Some(study_type) = column::<Option<String>>(row, "study_type", "osdr_items")? {
        item.study_type = study_type;
    }
    if let Some(status) = column::<Option<String>>(row, "status", "osdr_items")? {
        item.status = status;
    }
    if let Some(updated_at) = column::<Option<DateTime<Utc>>>(row, "updated_at", "osdr_items")? {
        item.updated_at = Some(rfc3339(updated_at));
    }
    Ok(item)
}

fn snapshot_row_from_row(row: &Row) -> OrbitResult<CatalogRow> {
    let text = |name: &str| -> OrbitResult<String> {
        Ok(column::<Option<String>>(row, name, "osdr_exports")?.unwrap_or_default())
    };
    Ok(CatalogRow {
        dataset_id: column(row, "dataset_id", "osdr_exports")?,
        title: text("title")?,
        organism: text("organism")?,
        study_type: text("study_type")?,
        status: text("status")?,
        updated_at: column::<Option<DateTime<Utc>>>(row, "updated_at", "osdr_exports")?.map(rfc3339),
        is_public: column(row, "is_public", "osdr_exports")?,
        sample_count: column(row, "sample_count", "osdr_exports")?,
        assay_count: column(row, "assay_count", "osdr_exports")?,
        raw: column(row, "raw_json", "osdr_exports")?,
        exported_at: Some(column(row, "export_timestamp", "osdr_exports")?),
        row_number: Some(column(row, "row_number", "osdr_exports")?),
    })
}

/// Run a storage operation and record its latency and outcome.
async fn timed<T, F>(operation: &'static str, fut: F) -> OrbitResult<T>
where
    F: Future<Output = OrbitResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    if let Some(metrics) = metrics() {
        metrics.record_db_operation(operation, result.is_ok(), start.elapsed().as_secs_f64());
    }
    result
}

// ============================================================================
// CMS PAGES
// ============================================================================

#[async_trait]
impl CmsRepository for DbClient {
    async fn find_active(&self, slug: &Slug) -> OrbitResult<Option<CmsPage>> {
        timed("cms_find_active", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "SELECT {} FROM cms_pages WHERE slug = $1 AND is_active = TRUE",
                CMS_COLUMNS
            );
            let row = conn
                .query_opt(sql.as_str(), &[&slug.as_str()])
                .await
                .map_err(query_failed)?;
            row.as_ref().map(cms_page_from_row).transpose()
        })
        .await
    }

    async fn list_active(&self) -> OrbitResult<Vec<CmsPage>> {
        timed("cms_list_active", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "SELECT {} FROM cms_pages WHERE is_active = TRUE ORDER BY title",
                CMS_COLUMNS
            );
            let rows = conn.query(sql.as_str(), &[]).await.map_err(query_failed)?;
            rows.iter().map(cms_page_from_row).collect()
        })
        .await
    }

    async fn create(&self, page: NewCmsPage) -> OrbitResult<CmsPage> {
        timed("cms_create", async {
            let conn = self.get_conn().await?;
            let body = sanitize_html(&page.body);
            let sql = format!(
                "INSERT INTO cms_pages (slug, title, body, is_active) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (slug) DO NOTHING RETURNING {}",
                CMS_COLUMNS
            );
            let row = conn
                .query_opt(
                    sql.as_str(),
                    &[&page.slug.as_str(), &page.title, &body, &page.is_active],
                )
                .await
                .map_err(query_failed)?;
            match row {
                Some(row) => cms_page_from_row(&row),
                None => Err(StorageError::DuplicateKey {
                    key: page.slug.to_string(),
                }
                .into()),
            }
        })
        .await
    }

    async fn update(&self, slug: &Slug, update: CmsPageUpdate) -> OrbitResult<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        timed("cms_update", async {
            let conn = self.get_conn().await?;
            let body = update.body.as_deref().map(sanitize_html);
            let changed = conn
                .execute(
                    "UPDATE cms_pages SET \
                         title = COALESCE($2, title), \
                         body = COALESCE($3, body), \
                         is_active = COALESCE($4, is_active), \
                         updated_at = now() \
                     WHERE slug = $1",
                    &[&slug.as_str(), &update.title, &body, &update.is_active],
                )
                .await
                .map_err(query_failed)?;
            Ok(changed > 0)
        })
        .await
    }
}

// ============================================================================
// DATASET CATALOG
// ============================================================================

#[async_trait]
impl CatalogStore for DbClient {
    async fn current_rows(&self) -> OrbitResult<Vec<CatalogRow>> {
        timed("catalog_current_rows", async {
            let conn = self.get_conn().await?;
            let rows = conn
                .query(
                    "SELECT dataset_id, title, organism, study_type, status, updated_at, raw \
                     FROM osdr_items ORDER BY dataset_id",
                    &[],
                )
                .await
                .map_err(query_failed)?;
            rows.iter()
                .enumerate()
                .map(|(i, row)| catalog_item_from_row(row, i))
                .collect()
        })
        .await
    }

    async fn snapshot_rows(&self, name: &SnapshotName) -> OrbitResult<Option<Vec<CatalogRow>>> {
        timed("catalog_snapshot_rows", async {
            let conn = self.get_conn().await?;
            let rows = conn
                .query(
                    "SELECT export_timestamp, updated_at, is_public, row_number, sample_count, \
                            assay_count, dataset_id, title, organism, study_type, status, raw_json \
                     FROM osdr_exports WHERE source_file = $1 ORDER BY row_number",
                    &[&name.as_str()],
                )
                .await
                .map_err(query_failed)?;
            if rows.is_empty() {
                return Ok(None);
            }
            rows.iter().map(snapshot_row_from_row).collect::<OrbitResult<Vec<_>>>().map(Some)
        })
        .await
    }

    async fn list_snapshots(&self) -> OrbitResult<Vec<SnapshotName>> {
        timed("catalog_list_snapshots", async {
            let conn = self.get_conn().await?;
            let rows = conn
                .query(
                    "SELECT source_file FROM osdr_exports \
                     GROUP BY source_file ORDER BY MAX(imported_at) DESC",
                    &[],
                )
                .await
                .map_err(query_failed)?;
            let mut names = Vec::with_capacity(rows.len());
            for row in &rows {
                let raw: String = column(row, "source_file", "osdr_exports")?;
                match SnapshotName::parse(&raw) {
                    Ok(name) => names.push(name),
                    Err(e) => tracing::debug!(error = %e, "skipping unexportable snapshot name"),
                }
            }
            Ok(names)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "iss_osdr");
        assert_eq!(config.max_size, 16);
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() -> Result<(), String> {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: Duration::from_millis(200),
            ..DbConfig::default()
        };
        let db = DbClient::from_config(&config).map_err(|e| e.message)?;
        assert_eq!(db.pool_size(), 0);
        assert!(db.health_check().await.is_err());
        Ok(())
    }
}
