//! Recent-news digest used as context for the main news section.
//!
//! [`DigestBuilder`] clamps the requested lookback to what the search
//! service accepts, keeps the first [`MAX_DIGEST_ITEMS`] results in the
//! order the service returned them, and formats them into one prompt-ready
//! string.

use std::fmt;
use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{NewsletterError, Result};
use crate::models::{NewsDigest, NewsItem};

/// The service's free tier rejects ranges older than this.
pub const MAX_LOOKBACK_DAYS: i64 = 7;

pub const MAX_DIGEST_ITEMS: usize = 5;

/// Newest first, so truncation keeps the most recent items.
const SORT_BY: &str = "publishedAt";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub language: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub page_size: usize,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<NewsItem>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: NewsApiSource,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

/// Client for the NewsAPI `everything` endpoint.
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NewsletterError::config("news API key is empty"));
        }

        let client = Client::builder()
            .user_agent(concat!("aidt-weekly/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NewsletterError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, request: &SearchRequest) -> Result<Url> {
        let from = request.from.format("%Y-%m-%dT%H:%M:%S").to_string();
        let to = request.to.format("%Y-%m-%dT%H:%M:%S").to_string();
        let page_size = request.page_size.to_string();

        Url::parse_with_params(
            &format!("{}/everything", self.base_url),
            &[
                ("q", request.query.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("sortBy", SORT_BY),
                ("language", request.language.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| NewsletterError::config(format!("invalid news API base URL: {e}")))
    }
}

#[async_trait]
impl SearchClient for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(query = %request.query, language = %request.language))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<NewsItem>> {
        let url = self.endpoint(request)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsletterError::digest(None, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsletterError::digest(Some(status.as_u16()), e.to_string()))?;

        parse_news_response(status.as_u16(), &body)
    }
}

/// Turn a raw NewsAPI reply into items, or a `DigestFetch` error.
fn parse_news_response(status: u16, body: &str) -> Result<Vec<NewsItem>> {
    let parsed: std::result::Result<NewsApiResponse, _> = serde_json::from_str(body);

    let success = (200..300).contains(&status);
    match parsed {
        Ok(resp) if success && resp.status == "ok" => Ok(resp
            .articles
            .into_iter()
            .filter_map(|article| {
                Some(NewsItem {
                    title: article.title?,
                    url: article.url?,
                    published_at: article.published_at.unwrap_or_default(),
                    description: article.description.filter(|d| !d.trim().is_empty()),
                    source: article.source.name.unwrap_or_else(|| "unknown".to_string()),
                })
            })
            .collect()),
        Ok(resp) => Err(NewsletterError::digest(
            Some(status),
            resp.message.unwrap_or_else(|| format!("service status '{}'", resp.status)),
        )),
        Err(_) if !success => Err(NewsletterError::digest(Some(status), body.trim().to_string())),
        Err(e) => Err(NewsletterError::digest(
            Some(status),
            format!("malformed response: {e}"),
        )),
    }
}

/// Clamp a requested lookback into `0..=MAX_LOOKBACK_DAYS`.
pub fn effective_lookback_days(requested: i64) -> i64 {
    requested.clamp(0, MAX_LOOKBACK_DAYS)
}

pub struct DigestBuilder<'a> {
    client: &'a dyn SearchClient,
}

impl<'a> DigestBuilder<'a> {
    pub fn new(client: &'a dyn SearchClient) -> Self {
        Self { client }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn build_digest(
        &self,
        query: &str,
        language: &str,
        max_lookback_days: i64,
    ) -> Result<NewsDigest> {
        let lookback = effective_lookback_days(max_lookback_days);
        if lookback != max_lookback_days {
            warn!(
                requested = max_lookback_days,
                effective = lookback,
                "Lookback clamped to service limit"
            );
        }

        let to = Utc::now();
        let from = to - Duration::days(lookback);
        let request = SearchRequest {
            query: query.to_string(),
            language: language.to_string(),
            from,
            to,
            page_size: MAX_DIGEST_ITEMS,
        };

        let mut items = self.client.search(&request).await?;
        debug!(returned = items.len(), "Search returned items");
        items.truncate(MAX_DIGEST_ITEMS);

        if items.is_empty() {
            return Err(NewsletterError::digest(
                None,
                format!("no articles for '{query}' in the last {lookback} days"),
            ));
        }

        info!(count = items.len(), "News digest built");
        Ok(NewsDigest {
            query: request.query,
            language: request.language,
            from,
            to,
            items,
        })
    }
}

impl NewsDigest {
    /// Records joined in order, ready to drop into a prompt.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "{}. {}", i + 1, item.title);
            let _ = writeln!(out, "   게시일: {}", format_published(&item.published_at));
            let _ = writeln!(
                out,
                "   요약: {}",
                item.description.as_deref().unwrap_or("(요약 없음)")
            );
            let _ = writeln!(out, "   출처: {}", item.source);
            let _ = writeln!(out, "   링크: {}", item.url);
        }
        out
    }
}

fn format_published(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%Y년 %m월 %d일 %H:%M")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}
