//! Google Books API client
//!
//! Looks up one volume per candidate book, trying ISBN-13, then ISBN-10,
//! then a title+author relevance search. An empty result set is a miss, not
//! an error. HTTP 429 is retried with exponential backoff and degrades to a
//! miss once retries are exhausted; any other non-200 response aborts the
//! current record's enrichment.
//!
//! # API Reference
//! - Endpoint: https://www.googleapis.com/books/v1/volumes
//! - 200 = success (possibly empty), 429 = rate limited, other = hard failure

use bookdash_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Google Books volumes endpoint
const GOOGLE_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Default timeout for Google Books API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header for outbound requests
const USER_AGENT: &str = "BookDash/0.1.0";

/// Attempts per query tier when the service answers 429
const MAX_RATE_LIMIT_ATTEMPTS: u32 = 3;

/// Base backoff delay after a 429; doubles per attempt
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Result of a successful volume lookup
#[derive(Debug, Clone)]
pub struct VolumeMatch {
    pub google_books_id: String,
    pub google_books_link: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub published_date: Option<String>,
    pub year_published: Option<i64>,
    pub page_count: Option<i64>,
    pub categories: Option<Vec<String>>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

/// Google Books volumes response
#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "selfLink")]
    self_link: Option<String>,
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    published_date: Option<String>,
    page_count: Option<i64>,
    categories: Option<Vec<String>>,
    description: Option<String>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    id_type: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
}

/// Google Books API client
///
/// Owns its HTTP client; constructed once per sync run and passed into the
/// orchestrator (no ambient global session).
pub struct GoogleBooksClient {
    http_client: reqwest::Client,
    base_url: String,
    retry_base_delay: Duration,
}

impl GoogleBooksClient {
    /// Create a client against the production Google Books endpoint
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_BOOKS_API_URL)
    }

    /// Create a client against an alternate endpoint (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    /// Override the 429 backoff base delay (shortened in tests)
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Look up a volume for one book.
    ///
    /// Tiers are tried in strict priority order: ISBN-13 exact, ISBN-10
    /// exact, then title+author relevance search. The first tier returning
    /// results wins; `Ok(None)` means all tiers missed.
    pub async fn lookup(
        &self,
        title: &str,
        author: &str,
        isbn_10: Option<&str>,
        isbn_13: Option<&str>,
    ) -> Result<Option<VolumeMatch>> {
        if let Some(isbn) = isbn_13 {
            if let Some(found) = self.query(&format!("isbn:{}", isbn)).await? {
                debug!("Matched '{}' by ISBN-13 {}", title, isbn);
                return Ok(Some(found));
            }
        }

        if let Some(isbn) = isbn_10 {
            if let Some(found) = self.query(&format!("isbn:{}", isbn)).await? {
                debug!("Matched '{}' by ISBN-10 {}", title, isbn);
                return Ok(Some(found));
            }
        }

        let found = self
            .query(&format!("intitle:{}+inauthor:{}", title, author))
            .await?;
        if found.is_none() {
            warn!("No Google Books results for '{}' by {}", title, author);
        }
        Ok(found)
    }

    /// Run one query tier, retrying the same query on 429.
    ///
    /// Exhausting the retry budget degrades to a miss so the caller can fall
    /// through to the next tier.
    async fn query(&self, q: &str) -> Result<Option<VolumeMatch>> {
        for attempt in 1..=MAX_RATE_LIMIT_ATTEMPTS {
            let response = self
                .http_client
                .get(&self.base_url)
                .query(&[("q", q), ("maxResults", "5"), ("orderBy", "relevance")])
                .send()
                .await
                .map_err(|e| Error::Transport(format!("Google Books request failed: {}", e)))?;

            let status = response.status();

            if status.as_u16() == 429 {
                if attempt == MAX_RATE_LIMIT_ATTEMPTS {
                    warn!(
                        "Rate limit retries exhausted for query '{}' after {} attempts",
                        q, attempt
                    );
                    return Ok(None);
                }
                let delay = self.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(
                    "Rate limited on query '{}' (attempt {}); backing off {:?}",
                    q, attempt, delay
                );
                sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(Error::Transport(format!(
                    "Google Books returned status {} for query '{}'",
                    status, q
                )));
            }

            let body: VolumesResponse = response
                .json()
                .await
                .map_err(|e| Error::Transport(format!("Google Books response unreadable: {}", e)))?;

            let first = match body.items.and_then(|mut items| {
                if items.is_empty() {
                    None
                } else {
                    Some(items.remove(0))
                }
            }) {
                Some(volume) => volume,
                None => return Ok(None),
            };

            return Ok(Some(volume_to_match(first)));
        }

        unreachable!("retry loop returns on every branch")
    }
}

impl Default for GoogleBooksClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw volume into the enrichment result
fn volume_to_match(volume: Volume) -> VolumeMatch {
    let info = volume.volume_info.unwrap_or_default();

    let mut isbn_10 = None;
    let mut isbn_13 = None;
    for identifier in info.industry_identifiers.unwrap_or_default() {
        match identifier.id_type.as_str() {
            "ISBN_10" => isbn_10 = Some(identifier.identifier),
            "ISBN_13" => isbn_13 = Some(identifier.identifier),
            _ => {}
        }
    }

    let (published_date, year_published) = parse_published_date(info.published_date.as_deref());
    let genre = info
        .categories
        .as_ref()
        .and_then(|categories| categories.first().cloned());
    let (small_thumbnail, thumbnail) = match info.image_links {
        Some(links) => (links.small_thumbnail, links.thumbnail),
        None => (None, None),
    };

    VolumeMatch {
        google_books_id: volume.id,
        google_books_link: volume.self_link,
        title: info.title,
        authors: info.authors,
        published_date,
        year_published,
        page_count: info.page_count,
        categories: info.categories,
        genre,
        description: info.description,
        isbn_10,
        isbn_13,
        small_thumbnail,
        thumbnail,
    }
}

/// Derive the publication year from Google's variable-precision date.
///
/// Accepted forms: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`. Anything else yields an
/// absent published date.
fn parse_published_date(raw: Option<&str>) -> (Option<String>, Option<i64>) {
    let raw = match raw {
        Some(raw) => raw,
        None => return (None, None),
    };

    let year = match raw.len() {
        4 => raw.parse::<i64>().ok(),
        7 | 10 => raw.get(..4).and_then(|y| y.parse::<i64>().ok()).filter(|_| {
            chrono::NaiveDate::parse_from_str(
                &if raw.len() == 7 {
                    format!("{}-01", raw)
                } else {
                    raw.to_string()
                },
                "%Y-%m-%d",
            )
            .is_ok()
        }),
        _ => None,
    };

    match year {
        Some(year) => (Some(raw.to_string()), Some(year)),
        None => (None, None),
    }
}
