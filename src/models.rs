//! Data models for scraped stubs and persisted articles.
//!
//! Two shapes flow through the pipeline:
//! - [`ArticleStub`]: what a source fetcher extracts from a listing page,
//!   before anything touches the database
//! - [`StoredArticle`]: a row of the `articles` table, including the lazily
//!   populated Portuguese translation fields

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A minimal extracted record produced by a source fetcher.
///
/// Stubs carry whatever the listing page exposes. Only `url` and `title` are
/// guaranteed; everything else depends on the outlet's markup. The outlet
/// itself (source id, display name, original language) is attached at
/// persistence time, not here.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleStub {
    /// Absolute article URL with the query string stripped.
    pub url: String,
    /// Headline as shown on the listing page.
    pub title: String,
    /// Excerpt or teaser paragraph, when the listing shows one.
    pub summary: Option<String>,
    /// Section or category label (e.g. "DIPLOMACY", "China-Biz").
    pub category: Option<String>,
    /// Byline author, when the listing shows one.
    pub author: Option<String>,
    /// Publication timestamp in UTC, when the listing exposes it.
    pub published_at: Option<DateTime<Utc>>,
}

impl ArticleStub {
    /// Stub with only the required fields set.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: None,
            category: None,
            author: None,
            published_at: None,
        }
    }
}

/// A persisted article as read back from the `articles` table.
///
/// The `(source, url)` pair is the unique identifier: re-collecting the same
/// URL updates the row in place. `title_pt`/`summary_pt` start out `NULL`
/// and are filled by a later translation pass, so a failed translation call
/// at collection time is retried on the next run.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredArticle {
    pub id: i64,
    /// Source identifier (e.g. "globaltimes").
    pub source: String,
    pub url: String,
    pub title: String,
    /// Portuguese title; `None` until the translation pass has seen this row.
    pub title_pt: Option<String>,
    pub summary: Option<String>,
    pub summary_pt: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    /// ISO 639-1 code of the original text ("en" for all current outlets).
    pub language: String,
    pub published_at: Option<DateTime<Utc>>,
    /// When this row was last collected; drives the 24-hour digest window.
    pub collected_at: DateTime<Utc>,
}

impl StoredArticle {
    /// Title to display: the translation when present, the original otherwise.
    pub fn display_title(&self) -> &str {
        self.title_pt.as_deref().unwrap_or(&self.title)
    }

    /// Summary to display, preferring the translation.
    pub fn display_summary(&self) -> Option<&str> {
        self.summary_pt.as_deref().or(self.summary.as_deref())
    }

    /// Whether the translation pass still owes this row work.
    pub fn needs_translation(&self) -> bool {
        self.title_pt.is_none() || (self.summary.is_some() && self.summary_pt.is_none())
    }

    /// Uppercased language code for the digest badge ("EN", "ZH", "PT").
    pub fn language_badge(&self) -> String {
        self.language.to_uppercase()
    }
}
