// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// Fallback source name when a provider omits one.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// One article as normalized by a source adapter, before persistence.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub url: String,
    /// Provider publication time; `None` when missing or unparsable.
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub description: Option<String>,
}

/// One entry from a full feed (no keyword filtering at the adapter).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Keyword-query adapter: one outbound search per keyword.
#[async_trait::async_trait]
pub trait KeywordProvider: Send + Sync {
    async fn fetch(&self, keyword: &str) -> Result<Vec<RawArticle>, FetchError>;
    fn name(&self) -> &'static str;
}

/// Full-feed adapter: returns the feed's current item list unfiltered.
/// Filtering for "new" happens downstream in the dedup layer.
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>, FetchError>;
    fn name(&self) -> &'static str;
}
