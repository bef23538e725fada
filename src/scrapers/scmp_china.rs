//! South China Morning Post — China section scraper.
//!
//! Listing page: <https://www.scmp.com/news/china>
//!
//! SCMP marks its components with `data-qa` attributes. Headlines are
//! `span[data-qa="ContentHeadline-Headline"]` wrapped in the article link;
//! timestamps are separate `time[data-qa=...]` elements in the same document
//! order, so the two lists are paired by index. The `<time>` element carries
//! an ISO `datetime` attribute when the story is older; fresh stories only
//! show relative text ("2 hours ago"), which is resolved against the
//! collection time.

use crate::models::ArticleStub;
use crate::scrapers::{fetch_page, normalize_url, text_of};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

const LIST_URL: &str = "https://www.scmp.com/news/china";
const BASE_URL: &str = "https://www.scmp.com";

/// Fetch the SCMP China page and extract article stubs.
#[instrument(level = "info")]
pub async fn collect() -> Result<Vec<ArticleStub>, Box<dyn Error>> {
    let html = fetch_page(LIST_URL).await?;
    Ok(parse_china_page(&html, Utc::now()))
}

/// Parse the ISO `datetime` attribute, e.g. `2026-02-18T19:12:50.000Z`.
pub fn parse_datetime_attr(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value.get(..19).unwrap_or(value), "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

/// Resolve relative display text ("1 hour ago", "45 minutes ago",
/// "2 days ago") against the collection time.
pub fn parse_relative_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static RELATIVE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+)\s*(minute|hour|day)s?\s+ago$").unwrap());

    let text = text.trim().to_lowercase();
    let caps = RELATIVE.captures(&text)?;
    let n: i64 = caps[1].parse().ok()?;
    let delta = match &caps[2] {
        "minute" => Duration::minutes(n),
        "hour" => Duration::hours(n),
        _ => Duration::days(n),
    };
    Some(now - delta)
}

/// Nearest `<a>` ancestor of a headline span.
fn ancestor_link<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut node = el.parent();
    while let Some(n) = node {
        if let Some(parent) = ElementRef::wrap(n) {
            if parent.value().name() == "a" {
                return Some(parent);
            }
        }
        node = n.parent();
    }
    None
}

/// Extract stubs by pairing headline spans with time elements.
pub fn parse_china_page(html: &str, now: DateTime<Utc>) -> Vec<ArticleStub> {
    let document = Html::parse_document(html);
    let base = Url::parse(BASE_URL).expect("static base url");

    let sel_headline = Selector::parse(r#"span[data-qa="ContentHeadline-Headline"]"#).unwrap();
    let sel_time = Selector::parse(
        r#"time[data-qa="ContentActionBar-handleRenderDisplayDateTime-time"]"#,
    )
    .unwrap();
    let sel_summary = Selector::parse(r#"h3[data-qa="ContentSummary-ContainerWithTag"]"#).unwrap();
    let sel_category = Selector::parse(r#"a[data-qa="BaseLink-renderAnchor-StyledAnchor"]"#).unwrap();

    let headlines: Vec<_> = document.select(&sel_headline).collect();
    let times: Vec<_> = document.select(&sel_time).collect();

    let mut stubs = Vec::new();
    for (span, time_el) in headlines.iter().zip(times.iter()) {
        let title = text_of(*span);
        if title.is_empty() {
            continue;
        }
        let Some(link) = ancestor_link(*span) else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(url) = normalize_url(&base, href) else {
            continue;
        };

        let published_at = match time_el.value().attr("datetime") {
            Some(attr) => parse_datetime_attr(attr),
            None => parse_relative_time(&text_of(*time_el), now),
        };

        // Excerpt and category live in the same container as the link.
        let container = link.parent().and_then(ElementRef::wrap);
        let summary = container
            .and_then(|c| c.select(&sel_summary).next())
            .map(text_of)
            .filter(|s| !s.is_empty());
        let category = container
            .and_then(|c| c.select(&sel_category).next())
            .map(text_of)
            .filter(|c| !c.is_empty())
            .or_else(|| Some("China".to_string()));

        stubs.push(ArticleStub {
            url,
            title,
            summary,
            category,
            author: None,
            published_at,
        });
    }

    let stubs: Vec<ArticleStub> = stubs.into_iter().unique_by(|s| s.url.clone()).collect();
    info!(count = stubs.len(), "SCMP China: parsed listing");
    stubs
}
