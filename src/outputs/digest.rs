//! Trailing-24-hour HTML digest.
//!
//! `build_digest` computes the cutoff, pulls everything collected inside the
//! window, and groups it by outlet in the fixed collection order. Rendering
//! is plain string assembly over an inline stylesheet; the page is fully
//! self-contained and readable offline. All timestamps are shown in
//! Brasília time.

use crate::models::StoredArticle;
use crate::scrapers::Outlet;
use crate::store::{RunRecord, Store};
use crate::utils::{fmt_brasilia, fmt_brasilia_relative, truncate_chars};
use chrono::{DateTime, Duration, Utc};
use html_escape::encode_text;
use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum characters of a summary shown on a card.
const SUMMARY_MAX_CHARS: usize = 320;

/// One outlet's slice of the digest window.
#[derive(Debug)]
pub struct DigestSection {
    pub outlet: Outlet,
    pub articles: Vec<StoredArticle>,
    /// When this outlet last produced rows, window or not; shown as the
    /// section's freshness line.
    pub last_collected: Option<DateTime<Utc>>,
}

/// Query the store and render the digest for the trailing `hours` window.
#[instrument(level = "info", skip_all, fields(hours))]
pub async fn build_digest(
    store: &Store,
    now: DateTime<Utc>,
    hours: i64,
) -> Result<String, Box<dyn Error>> {
    let cutoff = now - Duration::hours(hours);
    let rows = store.query_since(cutoff).await?;

    let mut sections = Vec::with_capacity(Outlet::ALL.len());
    for outlet in Outlet::ALL {
        let articles: Vec<StoredArticle> = rows
            .iter()
            .filter(|r| r.source == outlet.id())
            .cloned()
            .collect();
        let last_collected = store.last_collected(outlet.id()).await?;
        sections.push(DigestSection { outlet, articles, last_collected });
    }

    let last_run = store.last_run().await?;
    let total: usize = sections.iter().map(|s| s.articles.len()).sum();
    info!(total, hours, "Digest window assembled");

    Ok(render_digest(&sections, hours, now, last_run.as_ref()))
}

/// Overwrite the digest file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_digest(path: impl AsRef<Path>, html: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path.as_ref(), html).await?;
    info!("Digest written");
    Ok(())
}

/// Render the full HTML document. Pure: everything shown comes from the
/// arguments, so tests can pin the output.
pub fn render_digest(
    sections: &[DigestSection],
    hours: i64,
    generated_at: DateTime<Utc>,
    last_run: Option<&RunRecord>,
) -> String {
    let total: usize = sections.iter().map(|s| s.articles.len()).sum();
    let generated_str = fmt_brasilia(generated_at);
    let source_names = sections
        .iter()
        .map(|s| s.outlet.display_name())
        .collect::<Vec<_>>()
        .join(", ");

    let mut page = String::with_capacity(16 * 1024);
    page.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n");
    page.push_str("  <meta charset=\"UTF-8\">\n");
    page.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    page.push_str("  <title>Newsflow China — Visão diária</title>\n");
    page.push_str(STYLE);
    page.push_str("</head>\n<body>\n  <div class=\"wrap\">\n");

    // Header with totals, window, and data freshness.
    page.push_str("    <header class=\"header\">\n      <h1>Newsflow China</h1>\n");
    page.push_str(
        "      <p class=\"sub\">Tradução automática para português (EN/ZH → PT)</p>\n",
    );
    let _ = writeln!(
        page,
        "      <div class=\"stats\">\n        <span class=\"stat\">{total} notícias no total</span>\n        <span class=\"stat\">Janela: últimas {hours} h</span>\n      </div>"
    );
    page.push_str("      <div class=\"meta-bar\">\n");
    let _ = writeln!(
        page,
        "        <span><strong>Fontes:</strong> {}</span>",
        encode_text(&source_names)
    );
    if let Some(run) = last_run {
        let _ = writeln!(
            page,
            "        <span><strong>Última coleta:</strong> {} (Brasília)</span>",
            encode_text(&fmt_brasilia(run.ran_at))
        );
    }
    let _ = writeln!(
        page,
        "        <span><strong>Relatório gerado em:</strong> {} (Brasília)</span>",
        encode_text(&generated_str)
    );
    page.push_str("      </div>\n    </header>\n");

    for section in sections {
        render_section(&mut page, section, hours, generated_at);
    }

    let _ = writeln!(
        page,
        "    <footer class=\"footer\">\n      Newsflow China · Atualizado em {} (Brasília) · Fontes: {}\n    </footer>",
        encode_text(&generated_str),
        encode_text(&source_names)
    );
    page.push_str("  </div>\n</body>\n</html>\n");
    page
}

fn render_section(
    page: &mut String,
    section: &DigestSection,
    hours: i64,
    generated_at: DateTime<Utc>,
) {
    let name = encode_text(section.outlet.display_name());
    let _ = writeln!(
        page,
        "    <section class=\"source-section\" aria-label=\"{name}\">\n      <h2 class=\"section-title\">{name}</h2>"
    );
    let freshness = section
        .last_collected
        .map(|dt| fmt_brasilia(dt))
        .unwrap_or_else(|| "—".to_string());
    let _ = writeln!(
        page,
        "      <p class=\"section-desc\">Última atualização: {} · Últimas {hours} horas</p>",
        encode_text(&freshness)
    );

    if section.articles.is_empty() {
        page.push_str(
            "      <p class=\"empty\">Nenhuma notícia coletada na janela.</p>\n",
        );
    }
    for article in &section.articles {
        render_card(page, article, generated_at);
    }
    page.push_str("    </section>\n");
}

fn render_card(page: &mut String, article: &StoredArticle, generated_at: DateTime<Utc>) {
    let title = encode_text(article.display_title());
    let url = encode_text(&article.url);

    let shown_time = article.published_at.unwrap_or(article.collected_at);
    let time_str = fmt_brasilia_relative(shown_time, generated_at);
    let meta = [
        Some(time_str.as_str()),
        article.author.as_deref(),
        article.category.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" · ");

    let _ = writeln!(
        page,
        "      <article class=\"card\">\n        <h3><a href=\"{url}\" target=\"_blank\" rel=\"noopener\">{title}</a></h3>"
    );
    let _ = writeln!(
        page,
        "        <p class=\"meta\"><span>{}</span> <span class=\"badge\">{}</span></p>",
        encode_text(&meta),
        encode_text(&article.language_badge())
    );
    if let Some(summary) = article.display_summary() {
        let _ = writeln!(
            page,
            "        <p class=\"summary\">{}</p>",
            encode_text(&truncate_chars(summary, SUMMARY_MAX_CHARS))
        );
    }
    page.push_str("      </article>\n");
}

/// Inline stylesheet; the page must stand alone as a local file.
const STYLE: &str = r#"  <style>
    :root {
      --bg: #fafafa; --surface: #ffffff; --text: #1a1a1a; --text-muted: #5c5c5c;
      --border: #e5e5e5; --accent: #0d47a1; --accent-soft: #e3f2fd;
      --radius: 8px; --shadow: 0 1px 3px rgba(0,0,0,.06);
    }
    * { box-sizing: border-box; }
    body {
      margin: 0; padding: 0; font-size: 15px; line-height: 1.5;
      font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
      color: var(--text); background: var(--bg); min-height: 100vh;
    }
    .wrap { max-width: 720px; margin: 0 auto; padding: 24px 20px 48px; }
    .header {
      background: var(--surface); border-radius: var(--radius); padding: 24px 28px;
      margin-bottom: 24px; box-shadow: var(--shadow); border: 1px solid var(--border);
    }
    .header h1 { font-family: Georgia, serif; font-size: 1.75rem; font-weight: 400; margin: 0 0 8px 0; }
    .header .sub { font-size: .8125rem; color: var(--accent); font-weight: 500; margin-bottom: 16px; }
    .stats { display: flex; gap: 16px; margin-top: 12px; flex-wrap: wrap; }
    .stat {
      background: var(--accent-soft); color: var(--accent); padding: 6px 12px;
      border-radius: 6px; font-size: .8125rem; font-weight: 500;
    }
    .meta-bar {
      display: flex; flex-wrap: wrap; gap: 20px 24px; font-size: .8125rem;
      color: var(--text-muted); padding-top: 16px; border-top: 1px solid var(--border);
    }
    .meta-bar strong { color: var(--text); font-weight: 500; }
    .source-section { margin-top: 32px; }
    .section-title { font-family: Georgia, serif; font-size: 1.125rem; font-weight: 400; margin: 28px 0 12px 0; }
    .section-desc { font-size: .8125rem; color: var(--text-muted); margin: 0 0 16px 0; }
    .empty { font-size: .875rem; color: var(--text-muted); font-style: italic; }
    .card {
      background: var(--surface); border-radius: var(--radius); padding: 18px 20px;
      margin-bottom: 12px; box-shadow: var(--shadow); border: 1px solid var(--border);
    }
    .card:hover { border-color: #ccc; box-shadow: 0 2px 8px rgba(0,0,0,.08); }
    .card h3 { font-size: 1rem; font-weight: 600; margin: 0 0 8px 0; line-height: 1.35; }
    .card h3 a { color: var(--text); text-decoration: none; }
    .card h3 a:hover { color: var(--accent); text-decoration: underline; }
    .card .meta { font-size: .75rem; color: var(--text-muted); margin-bottom: 8px; }
    .badge {
      background: var(--accent-soft); color: var(--accent); border-radius: 4px;
      padding: 1px 6px; font-size: .6875rem; font-weight: 600; letter-spacing: .02em;
    }
    .summary { font-size: .875rem; color: var(--text-muted); margin: 0; line-height: 1.45; }
    .footer {
      margin-top: 40px; padding-top: 20px; border-top: 1px solid var(--border);
      font-size: .75rem; color: var(--text-muted); text-align: center;
    }
    @media (max-width: 600px) {
      .wrap { padding: 16px 14px 32px; }
      .header { padding: 20px 18px; }
      .card { padding: 14px 16px; }
    }
  </style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStub;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap()
    }

    async fn seed(
        store: &Store,
        source: &str,
        url: &str,
        title: &str,
        collected_at: DateTime<Utc>,
    ) {
        store
            .upsert_batch(source, "en", collected_at, &[ArticleStub::new(url, title)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn digest_keeps_only_the_trailing_window() {
        let store = Store::open_in_memory().await.unwrap();
        // Two Global Times articles 1 h old, one SCMP article 30 h old.
        seed(&store, "globaltimes", "https://gt.cn/1", "GT first story", now() - Duration::hours(1)).await;
        seed(&store, "globaltimes", "https://gt.cn/2", "GT second story", now() - Duration::hours(1)).await;
        seed(&store, "scmp_china", "https://scmp.com/1", "SCMP old story", now() - Duration::hours(30)).await;

        let html = build_digest(&store, now(), 24).await.unwrap();

        assert!(html.contains("GT first story"));
        assert!(html.contains("GT second story"));
        assert!(!html.contains("SCMP old story"));
        assert!(html.contains("2 notícias no total"));
    }

    #[tokio::test]
    async fn articles_land_under_their_source_heading() {
        let store = Store::open_in_memory().await.unwrap();
        // 25-hour spread across two sources; only the ≤24 h subset renders.
        seed(&store, "globaltimes", "https://gt.cn/a", "GT fresh", now() - Duration::hours(2)).await;
        seed(&store, "xinhua_chinabiz", "https://xh.cn/a", "Xinhua fresh", now() - Duration::hours(23)).await;
        seed(&store, "xinhua_chinabiz", "https://xh.cn/b", "Xinhua stale", now() - Duration::hours(25)).await;

        let html = build_digest(&store, now(), 24).await.unwrap();

        // The outlet names also appear in the header's "Fontes:" line, so
        // anchor on the section headings themselves.
        let gt_section = html
            .find("<h2 class=\"section-title\">Global Times — China</h2>")
            .expect("Global Times heading");
        let xh_section = html
            .find("<h2 class=\"section-title\">Xinhua China-Biz</h2>")
            .expect("Xinhua heading");
        let gt_pos = html.find("GT fresh").unwrap();
        let xh_pos = html.find("Xinhua fresh").unwrap();

        // Each card sits after its own heading and before the next one.
        assert!(gt_section < gt_pos && gt_pos < xh_section);
        assert!(xh_section < xh_pos);
        assert!(!html.contains("Xinhua stale"));
    }

    #[tokio::test]
    async fn window_boundary_is_inclusive() {
        let store = Store::open_in_memory().await.unwrap();
        seed(&store, "globaltimes", "https://gt.cn/edge", "Edge story", now() - Duration::hours(24)).await;
        let html = build_digest(&store, now(), 24).await.unwrap();
        assert!(html.contains("Edge story"));
    }

    #[tokio::test]
    async fn empty_sources_render_a_placeholder() {
        let store = Store::open_in_memory().await.unwrap();
        let html = build_digest(&store, now(), 24).await.unwrap();
        for outlet in Outlet::ALL {
            assert!(html.contains(outlet.display_name()));
        }
        assert!(html.contains("Nenhuma notícia coletada na janela."));
        assert!(html.contains("0 notícias no total"));
    }

    #[tokio::test]
    async fn titles_and_urls_are_escaped() {
        let store = Store::open_in_memory().await.unwrap();
        let mut stub = ArticleStub::new(
            "https://gt.cn/x?a=1&b=2",
            "Tariffs <script>alert('x')</script> & more",
        );
        stub.summary = Some("Summary with <b>markup</b>".to_string());
        store
            .upsert_batch("globaltimes", "en", now(), &[stub])
            .await
            .unwrap();

        let html = build_digest(&store, now(), 24).await.unwrap();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("Summary with <b>"));
    }

    #[tokio::test]
    async fn card_shows_translation_badge_and_meta() {
        let store = Store::open_in_memory().await.unwrap();
        let mut stub = ArticleStub::new("https://gt.cn/m", "Meta story");
        stub.author = Some("Liu Caiyu".to_string());
        stub.category = Some("DIPLOMACY".to_string());
        stub.published_at = Some(now() - Duration::hours(3));
        store.upsert_batch("globaltimes", "en", now(), &[stub]).await.unwrap();

        let id = store.query_since(now() - Duration::hours(1)).await.unwrap()[0].id;
        store
            .set_translation(id, "História traduzida", None)
            .await
            .unwrap();

        let html = build_digest(&store, now(), 24).await.unwrap();
        assert!(html.contains("História traduzida"));
        assert!(!html.contains(">Meta story<"), "original title is replaced");
        assert!(html.contains("Liu Caiyu · DIPLOMACY"));
        assert!(html.contains("class=\"badge\">EN</span>"));
        // published_at 3 h ago, same Brasília day: time-only display.
        assert!(html.contains("06:00"));
    }

    #[tokio::test]
    async fn long_summaries_are_truncated() {
        let store = Store::open_in_memory().await.unwrap();
        let mut stub = ArticleStub::new("https://gt.cn/long", "Long story");
        stub.summary = Some("x".repeat(400));
        store.upsert_batch("globaltimes", "en", now(), &[stub]).await.unwrap();

        let html = build_digest(&store, now(), 24).await.unwrap();
        assert!(html.contains(&format!("{}…", "x".repeat(320))));
        assert!(!html.contains(&"x".repeat(321)));
    }

    #[tokio::test]
    async fn write_digest_overwrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newsflow_diario.html");

        write_digest(&path, "<html>first</html>").await.unwrap();
        write_digest(&path, "<html>second</html>").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "<html>second</html>");
    }
}
