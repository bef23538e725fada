//! Global Times — China section scraper.
//!
//! Listing page: <https://www.globaltimes.cn/china/index.html>
//!
//! The page mixes several block layouts. Feature blocks (`china_article_form1`
//! through `form3`), category columns inside `china_content` (`form4` and
//! `mid_elem` under a running `column_title`), a short `content_bottom` list,
//! and the dated "MORE" list (`list_content`), whose entries carry a
//! `source_time` byline of the form `By Author | 2026/2/18 21:38:48`.
//! Only the MORE list exposes timestamps on the listing itself; the other
//! blocks produce stubs without `published_at`.

use crate::models::ArticleStub;
use crate::scrapers::{fetch_page, normalize_url, text_of};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

const CHINA_INDEX_URL: &str = "https://www.globaltimes.cn/china/index.html";
const BASE_URL: &str = "https://www.globaltimes.cn";

/// Fetch the China index page and extract article stubs from every section.
#[instrument(level = "info")]
pub async fn collect() -> Result<Vec<ArticleStub>, Box<dyn Error>> {
    let html = fetch_page(CHINA_INDEX_URL).await?;
    Ok(parse_china_index(&html))
}

/// Title link inside a block: the styled anchor class when present, any
/// `/page/` link otherwise.
fn title_link<'a>(el: ElementRef<'a>, class_sel: &Selector) -> Option<ElementRef<'a>> {
    static ANY_PAGE_LINK: Lazy<Selector> =
        Lazy::new(|| Selector::parse(r#"a[href*="/page/"]"#).unwrap());
    el.select(class_sel)
        .next()
        .or_else(|| el.select(&ANY_PAGE_LINK).next())
}

/// Parse a `source_time` byline: `By Author | 2026/2/18 21:38:48`.
///
/// Either half may be missing; timestamps are taken as UTC the way the rest
/// of the pipeline stores them.
pub fn parse_source_time(text: &str) -> (Option<String>, Option<DateTime<Utc>>) {
    static SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*").unwrap());

    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }
    let mut parts = SPLIT.splitn(text, 2);

    let author = parts.next().map(str::trim).and_then(|mut a| {
        // Some bylines stutter: "By By Global Times".
        while a.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("by ")) {
            a = a[3..].trim_start();
        }
        (!a.is_empty()).then(|| a.to_string())
    });

    let published_at = parts.next().map(str::trim).and_then(|date_str| {
        NaiveDateTime::parse_from_str(date_str, "%Y/%m/%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(date_str, "%Y/%m/%d %H:%M"))
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    });

    (author, published_at)
}

/// Extract stubs from every visible section of the China index page.
pub fn parse_china_index(html: &str) -> Vec<ArticleStub> {
    let document = Html::parse_document(html);
    let base = Url::parse(BASE_URL).expect("static base url");

    let sel_form1 = Selector::parse("div.china_article_form1").unwrap();
    let sel_form2 = Selector::parse("div.china_article_form2").unwrap();
    let sel_form3 = Selector::parse("div.china_article_form3").unwrap();
    let sel_title_ml = Selector::parse("a.new_title_ml").unwrap();
    let sel_title_ms = Selector::parse("a.new_title_ms").unwrap();
    let sel_title_ss = Selector::parse("a.new_title_ss").unwrap();
    let sel_p = Selector::parse("p").unwrap();
    let sel_form2_desc = Selector::parse("div.form2_desc p").unwrap();
    let sel_china_content = Selector::parse("div.china_content").unwrap();
    let sel_div = Selector::parse("div").unwrap();
    let sel_a = Selector::parse("a").unwrap();
    let sel_mid_title_a = Selector::parse("div.mid_title a").unwrap();
    let sel_mid_desc = Selector::parse("div.mid_desc").unwrap();
    let sel_content_bottom_li = Selector::parse("div.content_bottom li").unwrap();
    let sel_list_li = Selector::parse("div.list_content li").unwrap();
    let sel_list_info = Selector::parse("div.list_info").unwrap();
    let sel_source_time = Selector::parse("div.source_time").unwrap();

    let mut stubs: Vec<ArticleStub> = Vec::new();

    let push = |stubs: &mut Vec<ArticleStub>,
                link: ElementRef<'_>,
                title: String,
                summary: Option<String>,
                category: Option<&str>,
                author: Option<String>,
                published_at: Option<DateTime<Utc>>| {
        let Some(href) = link.value().attr("href") else {
            return;
        };
        let Some(url) = normalize_url(&base, href) else {
            return;
        };
        if title.is_empty() {
            return;
        }
        stubs.push(ArticleStub {
            url,
            title,
            summary: summary.filter(|s| !s.is_empty()),
            category: category.map(|c| c.to_string()),
            author,
            published_at,
        });
    };

    // Feature blocks at the top of the page.
    for form1 in document.select(&sel_form1) {
        if let Some(link) = title_link(form1, &sel_title_ml) {
            let summary = form1.select(&sel_p).next().map(text_of);
            push(&mut stubs, link, text_of(link), summary, None, None, None);
        }
    }
    for form2 in document.select(&sel_form2) {
        if let Some(link) = title_link(form2, &sel_title_ms) {
            let summary = form2.select(&sel_form2_desc).next().map(text_of);
            push(&mut stubs, link, text_of(link), summary, None, None, None);
        }
    }
    for form3 in document.select(&sel_form3) {
        if let Some(link) = title_link(form3, &sel_title_ms) {
            let summary = form3.select(&sel_p).next().map(text_of);
            push(&mut stubs, link, text_of(link), summary, None, None, None);
        }
    }

    // Category columns: a `column_title` div names the section for the
    // form4/mid_elem blocks that follow it in document order.
    if let Some(china_content) = document.select(&sel_china_content).next() {
        let mut current_category: Option<String> = None;
        for elem in china_content.select(&sel_div) {
            let classes: Vec<&str> = elem.value().classes().collect();
            if classes.contains(&"column_title") {
                if let Some(a) = elem.select(&sel_a).next() {
                    current_category = Some(text_of(a));
                }
            } else if classes.contains(&"china_article_form4") {
                if let Some(link) = title_link(elem, &sel_title_ms) {
                    let mut title = text_of(link);
                    if title.is_empty() {
                        title = link.value().attr("title").unwrap_or("").trim().to_string();
                    }
                    let summary = elem.select(&sel_p).next().map(text_of);
                    push(
                        &mut stubs,
                        link,
                        title,
                        summary,
                        current_category.as_deref(),
                        None,
                        None,
                    );
                }
            } else if classes.contains(&"mid_elem") {
                if let Some(link) = title_link(elem, &sel_mid_title_a) {
                    let summary = elem.select(&sel_mid_desc).next().map(text_of);
                    push(
                        &mut stubs,
                        link,
                        text_of(link),
                        summary,
                        current_category.as_deref(),
                        None,
                        None,
                    );
                }
            }
        }
    }

    // Short list of secondary headlines.
    for li in document.select(&sel_content_bottom_li) {
        if let Some(link) = title_link(li, &sel_title_ss) {
            push(&mut stubs, link, text_of(link), None, None, None, None);
        }
    }

    // The dated "MORE" list, the only section with bylines and timestamps.
    for li in document.select(&sel_list_li) {
        let Some(info) = li.select(&sel_list_info).next() else {
            continue;
        };
        let Some(link) = title_link(info, &sel_title_ms) else {
            continue;
        };
        let summary = info.select(&sel_p).next().map(text_of);
        let (author, published_at) = info
            .select(&sel_source_time)
            .next()
            .map(|st| parse_source_time(&text_of(st)))
            .unwrap_or((None, None));
        push(
            &mut stubs,
            link,
            text_of(link),
            summary,
            None,
            author,
            published_at,
        );
    }

    let stubs: Vec<ArticleStub> = stubs.into_iter().unique_by(|s| s.url.clone()).collect();
    info!(count = stubs.len(), "Global Times China: parsed listing");
    stubs
}
