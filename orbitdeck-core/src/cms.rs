//! CMS page model, slug validation and the HTML allow-list sanitizer.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Tags that survive sanitization. Everything else is stripped, keeping its
/// inner text.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "a", "b", "i", "strong", "em", "br", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote", "code", "pre",
];

/// A validated page slug: non-empty, `[a-z0-9-]` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let valid = !raw.is_empty()
            && raw
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidSlug {
                slug: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CMS page as read from storage. `body` is always sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CmsPage {
    pub id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub slug: Slug,
    pub title: String,
    pub body: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a page. The body is sanitized by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCmsPage {
    pub slug: Slug,
    pub title: String,
    pub body: String,
    pub is_active: bool,
}

/// Partial update of a page. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmsPageUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub is_active: Option<bool>,
}

impl CmsPageUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.is_active.is_none()
    }
}

// ============================================================================
// SANITIZER
// ============================================================================

static DROP_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("static sanitizer regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)([^>]*)(?:>|$)")
        .expect("static sanitizer regex")
});

static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("static sanitizer regex")
});

/// Restrict HTML to [`ALLOWED_TAGS`].
///
/// Attributes are dropped except `href` on `<a>`, which must be relative or
/// use `http`, `https` or `mailto`. `script` and `style` elements and
/// comments disappear with their content. A tag left open at the end of the
/// input is treated as closed there, and any other `<` in text is escaped.
/// The output is stable under a second pass.
pub fn sanitize_html(html: &str) -> String {
    let without_blocks = DROP_BLOCKS.replace_all(html, "");
    let mut out = String::with_capacity(without_blocks.len());
    let mut last = 0;
    for caps in TAG.captures_iter(&without_blocks) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(&mut out, &without_blocks[last..whole.start()]);
        out.push_str(&rewrite_tag(&caps));
        last = whole.end();
    }
    push_text(&mut out, &without_blocks[last..]);
    out
}

fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn rewrite_tag(caps: &Captures<'_>) -> String {
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return String::new();
    }
    if closing {
        return format!("</{}>", name);
    }
    if name == "a" {
        if let Some(href) = safe_href(&caps[3]) {
            return format!("<a href=\"{}\">", escape_attr(&href));
        }
    }
    format!("<{}>", name)
}

fn safe_href(attrs: &str) -> Option<String> {
    let caps = HREF.captures(attrs)?;
    let value = unescape_attr(
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))?
            .as_str()
            .trim(),
    );
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let relative = compact.starts_with('/')
        || compact.starts_with('#')
        || compact.starts_with('?')
        || compact.starts_with('.');
    let allowed_scheme = ["http://", "https://", "mailto:"]
        .iter()
        .any(|prefix| compact.starts_with(prefix));
    let schemeless = !compact.contains(':') && !compact.contains('&');
    if relative || allowed_scheme || schemeless {
        Some(value)
    } else {
        None
    }
}

/// Undo [`escape_attr`] so a sanitized href survives another pass unchanged.
fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
