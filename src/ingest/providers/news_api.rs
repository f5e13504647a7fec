// src/ingest/providers/news_api.rs
use metrics::counter;
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::parse_published;
use crate::ingest::types::{KeywordProvider, RawArticle, UNKNOWN_SOURCE};

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<SearchArticle>,
}

#[derive(Debug, Deserialize)]
struct SearchArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<SearchSource>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSource {
    name: Option<String>,
}

/// Keyword-search adapter for the NewsAPI `everything` endpoint.
pub struct NewsApiProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        endpoint: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl NewsApiProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                endpoint: endpoint.into(),
                api_key: api_key.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Serve a canned JSON body instead of going over the wire (tests).
    pub fn from_fixture_str(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    fn map_response(body: &str) -> Result<Vec<RawArticle>, FetchError> {
        let resp: SearchResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

        let mut out = Vec::with_capacity(resp.articles.len());
        for a in resp.articles {
            let Some(url) = a.url.filter(|u| !u.trim().is_empty()) else {
                continue;
            };
            out.push(RawArticle {
                title: a.title.unwrap_or_default(),
                url,
                published_at: a.published_at.as_deref().and_then(parse_published),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                description: a.description,
            });
        }

        counter!("poll_articles_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait::async_trait]
impl KeywordProvider for NewsApiProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<RawArticle>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Self::map_response(body),

            Mode::Http {
                endpoint,
                api_key,
                client,
            } => {
                let resp = client
                    .get(endpoint)
                    .header("Authorization", api_key)
                    .query(&[
                        ("q", keyword),
                        ("sortBy", "publishedAt"),
                        ("language", "en"),
                        ("pageSize", "10"),
                    ])
                    .send()
                    .await?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }

                let body = resp.text().await?;
                Self::map_response(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
