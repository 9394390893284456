//! CMS page repository.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use orbitdeck_core::{
    sanitize_html, CmsPage, CmsPageUpdate, NewCmsPage, OrbitResult, Slug, StorageError,
};
use tokio::sync::RwLock;

/// Read-mostly access to CMS pages.
///
/// Lookups take a [`Slug`], so malformed slugs are rejected by
/// [`Slug::parse`] before any implementation is reached. Bodies are
/// sanitized on every write.
#[async_trait]
pub trait CmsRepository: Send + Sync {
    /// Active page with this slug, if any.
    async fn find_active(&self, slug: &Slug) -> OrbitResult<Option<CmsPage>>;

    /// Every active page, ordered by title.
    async fn list_active(&self) -> OrbitResult<Vec<CmsPage>>;

    /// Insert a page. Fails with [`StorageError::DuplicateKey`] if the slug
    /// is taken.
    async fn create(&self, page: NewCmsPage) -> OrbitResult<CmsPage>;

    /// Apply `update` to the page with this slug. Returns whether a page
    /// was changed.
    async fn update(&self, slug: &Slug, update: CmsPageUpdate) -> OrbitResult<bool>;
}

/// Parse `raw` and look up the active page. Returns `Ok(None)` for a
/// malformed slug without touching the repository.
pub async fn find_active_by_raw_slug<R>(repo: &R, raw: &str) -> OrbitResult<Option<CmsPage>>
where
    R: CmsRepository + ?Sized,
{
    match Slug::parse(raw) {
        Ok(slug) => repo.find_active(&slug).await,
        Err(e) => {
            tracing::debug!(error = %e, "rejected slug before lookup");
            Ok(None)
        }
    }
}

#[derive(Debug, Default)]
struct CmsTable {
    next_id: i64,
    pages: BTreeMap<Slug, CmsPage>,
}

/// In-memory [`CmsRepository`], used when no database is configured and in
/// tests.
#[derive(Debug, Default)]
pub struct InMemoryCmsRepository {
    table: RwLock<CmsTable>,
}

impl InMemoryCmsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CmsRepository for InMemoryCmsRepository {
    async fn find_active(&self, slug: &Slug) -> OrbitResult<Option<CmsPage>> {
        let table = self.table.read().await;
        Ok(table.pages.get(slug).filter(|p| p.is_active).cloned())
    }

    async fn list_active(&self) -> OrbitResult<Vec<CmsPage>> {
        let table = self.table.read().await;
        let mut pages: Vec<CmsPage> = table.pages.values().filter(|p| p.is_active).cloned().collect();
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn create(&self, page: NewCmsPage) -> OrbitResult<CmsPage> {
        let mut table = self.table.write().await;
        if table.pages.contains_key(&page.slug) {
            return Err(StorageError::DuplicateKey {
                key: page.slug.to_string(),
            }
            .into());
        }
        table.next_id += 1;
        let now = Utc::now();
        let stored = CmsPage {
            id: table.next_id,
            slug: page.slug.clone(),
            title: page.title,
            body: sanitize_html(&page.body),
            is_active: page.is_active,
            created_at: now,
            updated_at: now,
        };
        table.pages.insert(page.slug, stored.clone());
        Ok(stored)
    }

    async fn update(&self, slug: &Slug, update: CmsPageUpdate) -> OrbitResult<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let mut table = self.table.write().await;
        let Some(page) = table.pages.get_mut(slug) else {
            return Ok(false);
        };
        if let Some(title) = update.title {
            page.title = title;
        }
        if let Some(body) = update.body {
            page.body = sanitize_html(&body);
        }
        if let Some(is_active) = update.is_active {
            page.is_active = is_active;
        }
        page.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitdeck_core::OrbitError;

    fn new_page(slug: &str, title: &str, active: bool) -> OrbitResult<NewCmsPage> {
        Ok(NewCmsPage {
            slug: Slug::parse(slug)?,
            title: title.to_string(),
            body: "<p>hi</p><script>x()</script>".to_string(),
            is_active: active,
        })
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_finds_active() -> OrbitResult<()> {
        let repo = InMemoryCmsRepository::new();
        let created = repo.create(new_page("about", "About", true)?).await?;
        assert_eq!(created.id, 1);
        assert_eq!(created.body, "<p>hi</p>");

        let found = find_active_by_raw_slug(&repo, "about").await?;
        assert_eq!(found.map(|p| p.title), Some("About".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_and_malformed_are_not_found() -> OrbitResult<()> {
        let repo = InMemoryCmsRepository::new();
        repo.create(new_page("draft", "Draft", false)?).await?;
        assert!(find_active_by_raw_slug(&repo, "draft").await?.is_none());
        assert!(find_active_by_raw_slug(&repo, "../etc").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() -> OrbitResult<()> {
        let repo = InMemoryCmsRepository::new();
        repo.create(new_page("dup", "One", true)?).await?;
        let err = repo.create(new_page("dup", "Two", true)?).await;
        assert!(matches!(
            err,
            Err(OrbitError::Storage(StorageError::DuplicateKey { .. }))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_list_order() -> OrbitResult<()> {
        let repo = InMemoryCmsRepository::new();
        repo.create(new_page("b", "Zeta", true)?).await?;
        repo.create(new_page("a", "Alpha", true)?).await?;

        let slug = Slug::parse("b")?;
        let changed = repo
            .update(
                &slug,
                CmsPageUpdate {
                    title: Some("Beta".to_string()),
                    body: Some("<div>x</div>".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert!(changed);
        assert!(!repo.update(&Slug::parse("missing")?, CmsPageUpdate { is_active: Some(true), ..Default::default() }).await?);
        assert!(!repo.update(&slug, CmsPageUpdate::default()).await?);

        let titles: Vec<String> = repo.list_active().await?.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
        let page = repo.find_active(&slug).await?;
        assert_eq!(page.map(|p| p.body), Some("x".to_string()));
        Ok(())
    }
}
