//! CMS page routes.
//!
//! Slugs are validated before any storage access. Storage failures render
//! an inline error panel instead of failing the page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use orbitdeck_core::{sanitize_html, CmsPage};
use orbitdeck_storage::{find_active_by_raw_slug, CmsRepository};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /page/{slug} - Rendered CMS page
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/page/{slug}",
    tag = "CMS",
    params(("slug" = String, Path, description = "Lowercase letters, digits and '-'")),
    responses(
        (status = 200, description = "HTML page or inline error panel", content_type = "text/html"),
        (status = 404, description = "Malformed, missing or inactive slug", body = ApiError),
    ),
))]
pub async fn show(
    State(repo): State<Arc<dyn CmsRepository>>,
    Path(slug): Path<String>,
) -> Response {
    match find_active_by_raw_slug(repo.as_ref(), &slug).await {
        Ok(Some(page)) => Html(render_page(&page)).into_response(),
        Ok(None) => ApiError::page_not_found(&slug).into_response(),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "failed to load CMS page");
            Html(render_error_panel("This page is temporarily unavailable.")).into_response()
        }
    }
}

/// GET /page - Index of active pages
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/page",
    tag = "CMS",
    responses(
        (status = 200, description = "HTML list of pages or inline error panel", content_type = "text/html"),
    ),
))]
pub async fn index(State(repo): State<Arc<dyn CmsRepository>>) -> Html<String> {
    match repo.list_active().await {
        Ok(pages) => Html(render_index(&pages)),
        Err(e) => {
            tracing::error!(error = %e, "failed to list CMS pages");
            Html(render_error_panel("The page list is temporarily unavailable."))
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(title: &str, main: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}\n</main>\n</body>\n</html>\n",
        escape_html(title),
        main
    )
}

/// The body goes through the allow-list again whatever repository it came
/// from.
fn render_page(page: &CmsPage) -> String {
    let main = format!(
        "<article>\n<h1>{}</h1>\n{}\n</article>",
        escape_html(&page.title),
        sanitize_html(&page.body)
    );
    document(&page.title, &main)
}

fn render_index(pages: &[CmsPage]) -> String {
    let items: String = pages
        .iter()
        .map(|p| {
            format!(
                "<li><a href=\"/page/{}\">{}</a></li>\n",
                p.slug,
                escape_html(&p.title)
            )
        })
        .collect();
    document("Pages", &format!("<h1>Pages</h1>\n<ul>\n{}</ul>", items))
}

fn render_error_panel(message: &str) -> String {
    document(
        "Unavailable",
        &format!("<div class=\"alert alert-danger\" role=\"alert\">{}</div>", escape_html(message)),
    )
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/:slug", get(show))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orbitdeck_core::Slug;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_page_escapes_title_only() -> Result<(), String> {
        let page = CmsPage {
            id: 1,
            slug: Slug::parse("about").map_err(|e| e.to_string())?,
            title: "<About>".to_string(),
            body: "<p>Hello <strong>crew</strong></p>".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let html = render_page(&page);
        assert!(html.contains("<title>&lt;About&gt;</title>"));
        assert!(html.contains("<p>Hello <strong>crew</strong></p>"));
        Ok(())
    }

    #[test]
    fn test_render_page_sanitizes_unsanitized_body() -> Result<(), String> {
        let page = CmsPage {
            id: 2,
            slug: Slug::parse("raw").map_err(|e| e.to_string())?,
            title: "Raw".to_string(),
            body: "<p>ok</p><script>x()</script><img src=x onerror=alert(1)".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let html = render_page(&page);
        assert!(html.contains("<p>ok</p>\n</article>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror"));
        Ok(())
    }
}
