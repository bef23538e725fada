//! SQLite-backed article store.
//!
//! One database file holds two tables: `articles`, keyed by `(source, url)`,
//! and `runs`, a small bookkeeping table recording each pipeline execution.
//! The process is single-instance, so the pool is capped at one connection
//! and no locking discipline is needed on top of SQLite's own.
//!
//! Timestamps are stored as UTC text via sqlx's chrono encoding; every bound
//! value uses the same encoding, so range comparisons in SQL are
//! chronologically correct.

use crate::models::{ArticleStub, StoredArticle};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        url TEXT NOT NULL,
        title TEXT NOT NULL,
        title_pt TEXT,
        summary TEXT,
        summary_pt TEXT,
        category TEXT,
        author TEXT,
        language TEXT NOT NULL DEFAULT 'en',
        published_at TEXT,
        collected_at TEXT NOT NULL,
        UNIQUE(source, url)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source)",
    "CREATE INDEX IF NOT EXISTS idx_articles_collected_at ON articles(collected_at)",
    "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at)",
    r#"
    CREATE TABLE IF NOT EXISTS runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ran_at TEXT NOT NULL,
        articles_upserted INTEGER NOT NULL DEFAULT 0,
        sources_ok INTEGER NOT NULL DEFAULT 0,
        sources_failed INTEGER NOT NULL DEFAULT 0
    )
    "#,
];

/// A row of the `runs` bookkeeping table.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct RunRecord {
    pub id: i64,
    pub ran_at: DateTime<Utc>,
    pub articles_upserted: i64,
    pub sources_ok: i64,
    pub sources_failed: i64,
}

/// Handle to the article database.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) a file-backed database and apply the schema.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::connect(options).await
    }

    /// Open an in-memory database; used by tests and throwaway runs.
    pub async fn open_in_memory() -> Result<Self, Box<dyn Error>> {
        Self::connect(SqliteConnectOptions::new().in_memory(true)).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, Box<dyn Error>> {
        // Single connection: the tool is single-process and an in-memory
        // database must not be split across pooled connections.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!("Article store ready");
        Ok(Self { pool })
    }

    /// Insert or update a batch of stubs for one source, stamping every row
    /// with `collected_at`.
    ///
    /// Idempotent on `(source, url)`: a re-collected URL updates the existing
    /// row. Translated fields survive the update when the original text is
    /// unchanged and are cleared otherwise, which re-queues the row for the
    /// next translation pass.
    #[instrument(level = "info", skip_all, fields(%source, count = stubs.len()))]
    pub async fn upsert_batch(
        &self,
        source: &str,
        language: &str,
        collected_at: DateTime<Utc>,
        stubs: &[ArticleStub],
    ) -> Result<usize, Box<dyn Error>> {
        let mut tx = self.pool.begin().await?;
        for stub in stubs {
            sqlx::query(
                r#"
                INSERT INTO articles
                    (source, url, title, summary, category, author, language,
                     published_at, collected_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(source, url) DO UPDATE SET
                    title_pt = CASE WHEN excluded.title = articles.title
                                    THEN articles.title_pt ELSE NULL END,
                    summary_pt = CASE WHEN excluded.summary IS articles.summary
                                      THEN articles.summary_pt ELSE NULL END,
                    title = excluded.title,
                    summary = excluded.summary,
                    category = excluded.category,
                    author = excluded.author,
                    language = excluded.language,
                    published_at = excluded.published_at,
                    collected_at = excluded.collected_at
                "#,
            )
            .bind(source)
            .bind(&stub.url)
            .bind(&stub.title)
            .bind(&stub.summary)
            .bind(&stub.category)
            .bind(&stub.author)
            .bind(language)
            .bind(stub.published_at)
            .bind(collected_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!(count = stubs.len(), "Upserted batch");
        Ok(stubs.len())
    }

    /// Articles with `collected_at >= cutoff` (boundary inclusive), newest
    /// first within each source's recency order.
    pub async fn query_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<StoredArticle>, Box<dyn Error>> {
        let rows = sqlx::query_as::<_, StoredArticle>(
            r#"
            SELECT * FROM articles
            WHERE collected_at >= ?
            ORDER BY collected_at DESC, published_at DESC NULLS LAST, id DESC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Articles the translation pass still owes work: no Portuguese title,
    /// or a summary without its translation.
    pub async fn query_missing_translation(&self) -> Result<Vec<StoredArticle>, Box<dyn Error>> {
        let rows = sqlx::query_as::<_, StoredArticle>(
            r#"
            SELECT * FROM articles
            WHERE title_pt IS NULL
               OR (summary IS NOT NULL AND summary_pt IS NULL)
            ORDER BY collected_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Persist the Portuguese fields for one article.
    pub async fn set_translation(
        &self,
        id: i64,
        title_pt: &str,
        summary_pt: Option<&str>,
    ) -> Result<(), Box<dyn Error>> {
        sqlx::query("UPDATE articles SET title_pt = ?, summary_pt = ? WHERE id = ?")
            .bind(title_pt)
            .bind(summary_pt)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent `collected_at` for one source, if it ever produced rows.
    pub async fn last_collected(
        &self,
        source: &str,
    ) -> Result<Option<DateTime<Utc>>, Box<dyn Error>> {
        let row = sqlx::query("SELECT MAX(collected_at) AS latest FROM articles WHERE source = ?")
            .bind(source)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("latest")?)
    }

    /// Append a row to the `runs` bookkeeping table.
    pub async fn record_run(
        &self,
        ran_at: DateTime<Utc>,
        articles_upserted: usize,
        sources_ok: usize,
        sources_failed: usize,
    ) -> Result<(), Box<dyn Error>> {
        sqlx::query(
            r#"
            INSERT INTO runs (ran_at, articles_upserted, sources_ok, sources_failed)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(ran_at)
        .bind(articles_upserted as i64)
        .bind(sources_ok as i64)
        .bind(sources_failed as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent bookkeeping row, if any run completed before.
    pub async fn last_run(&self) -> Result<Option<RunRecord>, Box<dyn Error>> {
        let row = sqlx::query_as::<_, RunRecord>(
            "SELECT * FROM runs ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Recent rows for inspection, optionally filtered by source, newest
    /// publication first.
    pub async fn list_recent(
        &self,
        source: Option<&str>,
        limit: i64,
    ) -> Result<Vec<StoredArticle>, Box<dyn Error>> {
        let rows = match source {
            Some(source) => {
                sqlx::query_as::<_, StoredArticle>(
                    r#"
                    SELECT * FROM articles WHERE source = ?
                    ORDER BY published_at DESC NULLS LAST, id DESC LIMIT ?
                    "#,
                )
                .bind(source)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StoredArticle>(
                    r#"
                    SELECT * FROM articles
                    ORDER BY published_at DESC NULLS LAST, id DESC LIMIT ?
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}
