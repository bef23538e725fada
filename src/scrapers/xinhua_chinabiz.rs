//! Xinhua English — China-Biz list scraper.
//!
//! Listing page: <https://english.news.cn/list/china-business.htm>
//!
//! The list is flat: each entry is an `<a target="_blank">` with the headline
//! and a `<span class="time">` in the same document order, so titles and
//! timestamps are paired by index. There is no excerpt or byline on this page.

use crate::models::ArticleStub;
use crate::scrapers::{fetch_page, normalize_url, text_of};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

const LIST_URL: &str = "https://english.news.cn/list/china-business.htm";
const CATEGORY: &str = "China-Biz";

/// Fetch the China-Biz list and extract article stubs.
#[instrument(level = "info")]
pub async fn collect() -> Result<Vec<ArticleStub>, Box<dyn Error>> {
    let html = fetch_page(LIST_URL).await?;
    Ok(parse_list(&html))
}

/// Parse a `2026-02-18 16:20:00` (or minute-precision) timestamp.
pub fn parse_published_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(text.get(..19).unwrap_or(text), "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text.get(..16).unwrap_or(text), "%Y-%m-%d %H:%M")
        })
        .ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Extract stubs by pairing headline links with `span.time` entries.
pub fn parse_list(html: &str) -> Vec<ArticleStub> {
    let document = Html::parse_document(html);
    let base = Url::parse(LIST_URL).expect("static base url");

    let sel_link = Selector::parse(r#"a[target="_blank"][href]"#).unwrap();
    let sel_time = Selector::parse("span.time").unwrap();

    let links: Vec<_> = document
        .select(&sel_link)
        .filter(|a| {
            let text = text_of(*a);
            !text.is_empty() && text != "More"
        })
        .collect();
    let times: Vec<String> = document.select(&sel_time).map(text_of).collect();

    let mut stubs = Vec::new();
    for (i, a) in links.iter().enumerate() {
        let title = text_of(*a);
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Some(url) = normalize_url(&base, href) else {
            continue;
        };
        stubs.push(ArticleStub {
            url,
            title,
            summary: None,
            category: Some(CATEGORY.to_string()),
            author: None,
            published_at: times.get(i).and_then(|t| parse_published_time(t)),
        });
    }

    let stubs: Vec<ArticleStub> = stubs.into_iter().unique_by(|s| s.url.clone()).collect();
    info!(count = stubs.len(), "Xinhua China-Biz: parsed listing");
    stubs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_second_and_minute_precision() {
        assert_eq!(
            parse_published_time("2026-02-18 16:20:00"),
            Some(Utc.with_ymd_and_hms(2026, 2, 18, 16, 20, 0).unwrap())
        );
        // A trailing fraction is ignored by the 19-char cut.
        assert_eq!(
            parse_published_time("2026-02-18 16:20:00.123"),
            Some(Utc.with_ymd_and_hms(2026, 2, 18, 16, 20, 0).unwrap())
        );
        assert_eq!(
            parse_published_time("2026-02-18 16:20"),
            Some(Utc.with_ymd_and_hms(2026, 2, 18, 16, 20, 0).unwrap())
        );
        assert_eq!(parse_published_time("garbage"), None);
        assert_eq!(parse_published_time(""), None);
    }

    const FIXTURE: &str = r#"
    <html><body>
      <ul>
        <li>
          <a target="_blank" href="/20260218/abc123/c.html">China's exports rise</a>
          <span class="time">2026-02-18 16:20:00</span>
        </li>
        <li>
          <a target="_blank" href="/20260218/def456/c.html">Yuan steadies</a>
          <span class="time">2026-02-18 15:01:00</span>
        </li>
        <li><a target="_blank" href="/list/china-business-2.htm">More</a></li>
      </ul>
    </body></html>
    "#;

    #[test]
    fn pairs_titles_with_times_and_skips_more() {
        let stubs = parse_list(FIXTURE);
        assert_eq!(stubs.len(), 2);

        assert_eq!(stubs[0].title, "China's exports rise");
        assert_eq!(stubs[0].url, "https://english.news.cn/20260218/abc123/c.html");
        assert_eq!(stubs[0].category.as_deref(), Some("China-Biz"));
        assert_eq!(
            stubs[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 2, 18, 16, 20, 0).unwrap())
        );

        assert_eq!(stubs[1].title, "Yuan steadies");
        assert_eq!(
            stubs[1].published_at,
            Some(Utc.with_ymd_and_hms(2026, 2, 18, 15, 1, 0).unwrap())
        );
    }

    #[test]
    fn missing_time_leaves_published_at_empty() {
        let html = r#"<a target="_blank" href="/20260218/ghi/c.html">Untimed story</a>"#;
        let stubs = parse_list(html);
        assert_eq!(stubs.len(), 1);
        assert!(stubs[0].published_at.is_none());
    }
}
