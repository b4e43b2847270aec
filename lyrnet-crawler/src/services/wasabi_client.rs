//! WASABI song index API client
//!
//! Three read-only endpoints:
//! - `song_all/<start>/?project=<fields>`: one page of songs from `start`
//! - `song/id/<id>/`: a single song
//! - `album/id/<id>/`: a single album
//!
//! The server answers throttled requests with a plain-text body instead of
//! JSON. Such replies are retried indefinitely after a fixed wait; requests
//! are also paced client-side so throttling stays the exception.

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::{Map, Value};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

/// Body returned instead of data when the server throttles a client
pub const RATE_LIMIT_BODY: &str = "Too many requests, please try again later.";

/// One JSON object from the API
pub type Document = Map<String, Value>;

/// Song index access; mocked in tests
#[async_trait]
pub trait SongApi: Send + Sync {
    /// Songs starting at index `start`, projected onto `fields`
    async fn song_batch(&self, start: u64, fields: &[&str]) -> Result<Vec<Document>, CrawlError>;

    /// Song by id; `None` when the reply holds no document
    async fn song(&self, id: &str) -> Result<Option<Document>, CrawlError>;

    /// Album by id; `None` when the reply holds no document
    async fn album(&self, id: &str) -> Result<Option<Document>, CrawlError>;
}

/// Field as text: missing and null become "", strings are taken verbatim,
/// anything else is rendered as JSON
pub fn field_text(document: &Document, field: &str) -> String {
    match document.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse a reply holding either one object or an array of objects
pub fn parse_documents(body: &str, request: &str) -> Result<Vec<Document>, CrawlError> {
    let response_err = |message: String| CrawlError::Response {
        request: request.to_string(),
        message,
    };

    match serde_json::from_str::<Value>(body).map_err(|e| response_err(e.to_string()))? {
        Value::Object(doc) => Ok(vec![doc]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(doc) => Ok(doc),
                other => Err(response_err(format!("expected object, got {}", other))),
            })
            .collect(),
        other => Err(response_err(format!("expected object or array, got {}", other))),
    }
}

/// Repeat `fetch` while it returns the rate-limit body, waiting `backoff`
/// between attempts
pub async fn fetch_with_backoff<F, Fut>(mut fetch: F, backoff: Duration) -> Result<String, CrawlError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, CrawlError>>,
{
    let mut attempts = 0u32;
    loop {
        let body = fetch().await?;
        if body != RATE_LIMIT_BODY {
            return Ok(body);
        }
        attempts += 1;
        tracing::warn!(attempts, "Rate limited by API; retrying in {:?}", backoff);
        tokio::time::sleep(backoff).await;
    }
}

/// HTTP client for the public API
pub struct WasabiClient {
    client: Client,
    base_url: String,
    backoff: Duration,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl WasabiClient {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            backoff: config.rate_limit_backoff,
            rate_limiter,
        })
    }

    pub fn song_batch_url(&self, start: u64, fields: &[&str]) -> String {
        format!("{}/song_all/{}/?project={}", self.base_url, start, fields.join(","))
    }

    pub fn song_url(&self, id: &str) -> String {
        format!("{}/song/id/{}/", self.base_url, id)
    }

    pub fn album_url(&self, id: &str) -> String {
        format!("{}/album/id/{}/", self.base_url, id)
    }

    async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        fetch_with_backoff(
            move || async move {
                self.rate_limiter.until_ready().await;
                tracing::debug!("GET {}", url);

                let response = self.client.get(url).send().await?;
                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() && body != RATE_LIMIT_BODY {
                    return Err(CrawlError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Ok(body)
            },
            self.backoff,
        )
        .await
    }

    async fn get_first(&self, url: &str) -> Result<Option<Document>, CrawlError> {
        let body = self.get_text(url).await?;
        Ok(parse_documents(&body, url)?.into_iter().next())
    }
}

#[async_trait]
impl SongApi for WasabiClient {
    async fn song_batch(&self, start: u64, fields: &[&str]) -> Result<Vec<Document>, CrawlError> {
        let url = self.song_batch_url(start, fields);
        let body = self.get_text(&url).await?;
        parse_documents(&body, &url)
    }

    async fn song(&self, id: &str) -> Result<Option<Document>, CrawlError> {
        self.get_first(&self.song_url(id)).await
    }

    async fn album(&self, id: &str) -> Result<Option<Document>, CrawlError> {
        self.get_first(&self.album_url(id)).await
    }
}
