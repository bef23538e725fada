//! Portuguese translation of titles and summaries (EN/ZH → PT).
//!
//! The remote call sits behind the [`Translate`] trait so the pass can be
//! exercised with a stub in tests. The production implementation,
//! [`GoogleTranslator`], calls the public Google translation endpoint once
//! per text; there is no batching and no retry.
//!
//! Translation is strictly best-effort: any API failure falls open to the
//! original text, which is persisted as the "translation" so the digest
//! always has something to show and the run never aborts over a quota or a
//! network hiccup.

use crate::models::StoredArticle;
use crate::scrapers::client;
use crate::store::Store;
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Everything is translated into Portuguese.
pub const TARGET_LANGUAGE: &str = "pt";

/// Courtesy pause between consecutive remote calls, the same rate-limit
/// hygiene the fetchers get from their shared timeout.
const CALL_DELAY: Duration = Duration::from_millis(200);

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// A translation backend: source text plus its language in, Portuguese out.
pub trait Translate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
    ) -> Result<String, Box<dyn Error>>;
}

/// Client for the keyless `translate_a/single` Google endpoint.
#[derive(Debug, Default)]
pub struct GoogleTranslator;

impl GoogleTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl Translate for GoogleTranslator {
    #[instrument(level = "debug", skip_all, fields(%source_language, chars = text.len()))]
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
    ) -> Result<String, Box<dyn Error>> {
        let response = client()
            .get(ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", TARGET_LANGUAGE),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_segments(&body).ok_or_else(|| {
            format!(
                "unexpected translation response: {}",
                truncate_for_log(&body, 200)
            )
            .into()
        })
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The body is a nested array; element 0 is the segment list and each
/// segment's element 0 is the translated text.
pub fn parse_segments(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let segments = value.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            out.push_str(piece);
        }
    }
    let out = out.trim().to_string();
    (!out.is_empty()).then_some(out)
}

/// Counters reported by one translation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Articles whose fields were translated by the backend.
    pub translated: usize,
    /// Articles already in Portuguese, copied through without a remote call.
    pub passed_through: usize,
    /// Articles where at least one call failed and the original text was
    /// stored instead.
    pub failed: usize,
}

/// Translate every article the store still owes a Portuguese rendition.
///
/// Storage errors abort; translation errors never do.
#[instrument(level = "info", skip_all)]
pub async fn translate_missing<T: Translate>(
    store: &Store,
    translator: &T,
) -> Result<TranslationOutcome, Box<dyn Error>> {
    let pending = store.query_missing_translation().await?;
    info!(count = pending.len(), "Articles awaiting translation");

    let mut outcome = TranslationOutcome::default();
    for article in &pending {
        if article.language == TARGET_LANGUAGE {
            // Already Portuguese: the original is its own translation.
            store
                .set_translation(article.id, &article.title, article.summary.as_deref())
                .await?;
            outcome.passed_through += 1;
            continue;
        }

        let mut failed = false;
        let title_pt = translate_or_fall_open(translator, article, &article.title, &mut failed).await;
        let summary_pt = match &article.summary {
            Some(summary) => {
                Some(translate_or_fall_open(translator, article, summary, &mut failed).await)
            }
            None => None,
        };

        store
            .set_translation(article.id, &title_pt, summary_pt.as_deref())
            .await?;
        if failed {
            outcome.failed += 1;
        } else {
            outcome.translated += 1;
        }
        debug!(id = article.id, failed, "Stored translation");
        sleep(CALL_DELAY).await;
    }

    info!(
        translated = outcome.translated,
        passed_through = outcome.passed_through,
        failed = outcome.failed,
        "Translation pass complete"
    );
    Ok(outcome)
}

/// One remote call; on error, log and return the original text unchanged.
async fn translate_or_fall_open<T: Translate>(
    translator: &T,
    article: &StoredArticle,
    text: &str,
    failed: &mut bool,
) -> String {
    match translator.translate(text, &article.language).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(
                id = article.id,
                source = %article.source,
                error = %e,
                text = %truncate_for_log(text, 80),
                "Translation failed; keeping original text"
            );
            *failed = true;
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStub;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Prefixes every input so tests can tell a translation happened.
    struct EchoTranslator {
        calls: AtomicUsize,
    }

    impl EchoTranslator {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }
    }

    impl Translate for EchoTranslator {
        async fn translate(
            &self,
            text: &str,
            _source_language: &str,
        ) -> Result<String, Box<dyn Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[pt] {text}"))
        }
    }

    /// Simulates an unreachable or quota-limited service.
    struct BrokenTranslator;

    impl Translate for BrokenTranslator {
        async fn translate(
            &self,
            _text: &str,
            _source_language: &str,
        ) -> Result<String, Box<dyn Error>> {
            Err("quota exceeded".into())
        }
    }

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let mut with_summary = ArticleStub::new("https://e.com/a", "Exports rise");
        with_summary.summary = Some("Exports rose sharply.".to_string());
        let bare = ArticleStub::new("https://e.com/b", "Yuan steadies");
        let collected = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
        store
            .upsert_batch("xinhua_chinabiz", "en", collected, &[with_summary, bare])
            .await
            .unwrap();
        store
    }

    #[test]
    fn parse_segments_joins_translated_pieces() {
        let body = r#"[[["Olá, ","Hello, ",null,null,10],["mundo","world",null,null,10]],null,"en"]"#;
        assert_eq!(parse_segments(body), Some("Olá, mundo".to_string()));
    }

    #[test]
    fn parse_segments_rejects_malformed_bodies() {
        assert_eq!(parse_segments("<html>captcha</html>"), None);
        assert_eq!(parse_segments("[]"), None);
        assert_eq!(parse_segments(r#"[[]]"#), None);
    }

    #[tokio::test]
    async fn successful_pass_persists_translations() {
        let store = seeded_store().await;
        let translator = EchoTranslator::new();

        let outcome = translate_missing(&store, &translator).await.unwrap();
        assert_eq!(outcome.translated, 2);
        assert_eq!(outcome.failed, 0);
        // Title + summary for the first article, title only for the second.
        assert_eq!(translator.calls.load(Ordering::SeqCst), 3);

        let rows = store.list_recent(None, 10).await.unwrap();
        let a = rows.iter().find(|r| r.title == "Exports rise").unwrap();
        assert_eq!(a.title_pt.as_deref(), Some("[pt] Exports rise"));
        assert_eq!(a.summary_pt.as_deref(), Some("[pt] Exports rose sharply."));
        assert_ne!(a.title_pt, Some(a.title.clone()));

        assert!(store.query_missing_translation().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn broken_service_falls_open_to_originals() {
        let store = seeded_store().await;

        let outcome = translate_missing(&store, &BrokenTranslator).await.unwrap();
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.translated, 0);

        let rows = store.list_recent(None, 10).await.unwrap();
        let a = rows.iter().find(|r| r.title == "Exports rise").unwrap();
        assert_eq!(a.title_pt.as_deref(), Some("Exports rise"));
        assert_eq!(a.summary_pt.as_deref(), Some("Exports rose sharply."));

        // Fail-open fills the fields, so nothing is re-queued this run.
        assert!(store.query_missing_translation().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn portuguese_originals_pass_through_without_calls() {
        let store = Store::open_in_memory().await.unwrap();
        let stub = ArticleStub::new("https://e.com/pt", "Notícia em português");
        let collected = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
        store.upsert_batch("scmp_china", "pt", collected, &[stub]).await.unwrap();

        let translator = EchoTranslator::new();
        let outcome = translate_missing(&store, &translator).await.unwrap();
        assert_eq!(outcome.passed_through, 1);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);

        let rows = store.list_recent(None, 10).await.unwrap();
        assert_eq!(rows[0].title_pt.as_deref(), Some("Notícia em português"));
    }
}
