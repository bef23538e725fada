//! Source fetchers for the monitored China news outlets.
//!
//! Each outlet lives in its own submodule and follows the same two-step
//! pattern: one HTTP GET against a fixed listing URL, then selector-based
//! extraction of article stubs from the returned markup. The selectors are
//! tied to each site's current layout, so one outlet breaking (layout drift,
//! network error, non-2xx status) must never affect its siblings — callers
//! treat a failed [`Outlet::collect`] as "zero stubs this run" and move on.
//!
//! | Outlet | Module | Listing page |
//! |--------|--------|--------------|
//! | Global Times — China | [`globaltimes`] | globaltimes.cn/china/index.html |
//! | Xinhua China-Biz | [`xinhua_chinabiz`] | english.news.cn/list/china-business.htm |
//! | SCMP — China | [`scmp_china`] | scmp.com/news/china |

pub mod globaltimes;
pub mod scmp_china;
pub mod xinhua_chinabiz;

use crate::models::ArticleStub;
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::ElementRef;
use std::error::Error;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Browser-like User-Agent; the default reqwest UA gets blocked by at least
/// Global Times.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static HTTP: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
        .expect("reqwest client")
});

/// Shared HTTP client used by every fetcher.
pub fn client() -> &'static Client {
    &HTTP
}

/// GET a listing page and return its body, failing on non-2xx status.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_page(url: &str) -> Result<String, Box<dyn Error>> {
    let response = client().get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Text content of an element with all runs of whitespace collapsed to a
/// single space.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().join(" ")
}

/// Resolve `href` against `base` and strip the query string.
///
/// Returns `None` for empty or unparseable links so callers can skip them
/// without special-casing.
pub fn normalize_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// The fixed set of monitored outlets.
///
/// One variant per source keeps the brittle per-site selector logic behind a
/// single `collect` surface: the orchestrator iterates [`Outlet::ALL`] and
/// never needs to know how any individual page is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlet {
    GlobalTimes,
    XinhuaChinaBiz,
    ScmpChina,
}

impl Outlet {
    /// Collection order; also the section order of the rendered digest.
    pub const ALL: [Outlet; 3] = [Outlet::GlobalTimes, Outlet::XinhuaChinaBiz, Outlet::ScmpChina];

    /// Stable identifier used as the `source` column in the store.
    pub fn id(&self) -> &'static str {
        match self {
            Outlet::GlobalTimes => "globaltimes",
            Outlet::XinhuaChinaBiz => "xinhua_chinabiz",
            Outlet::ScmpChina => "scmp_china",
        }
    }

    /// Human-readable name shown as a digest section heading.
    pub fn display_name(&self) -> &'static str {
        match self {
            Outlet::GlobalTimes => "Global Times — China",
            Outlet::XinhuaChinaBiz => "Xinhua China-Biz",
            Outlet::ScmpChina => "SCMP — China",
        }
    }

    /// ISO 639-1 code of the outlet's publication language.
    pub fn language(&self) -> &'static str {
        // All three outlets publish in English.
        "en"
    }

    /// Fetch the outlet's listing page and extract article stubs.
    pub async fn collect(&self) -> Result<Vec<ArticleStub>, Box<dyn Error>> {
        match self {
            Outlet::GlobalTimes => globaltimes::collect().await,
            Outlet::XinhuaChinaBiz => xinhua_chinabiz::collect().await,
            Outlet::ScmpChina => scmp_china::collect().await,
        }
    }

    /// Look an outlet up by its stable id.
    pub fn from_id(id: &str) -> Option<Outlet> {
        Outlet::ALL.into_iter().find(|o| o.id() == id)
    }
}
