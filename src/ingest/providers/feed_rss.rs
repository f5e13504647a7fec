// src/ingest/providers/feed_rss.rs
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::types::{FeedItem, FeedProvider};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Full-feed RSS adapter: returns the feed's current items newest-first, as
/// published. No keyword and no "new" filtering here.
pub struct FeedRssProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl FeedRssProvider {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_fixture_str(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<FeedItem>, FetchError> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss =
            from_str(&xml_clean).map_err(|e| FetchError::Decode(format!("rss xml: {e}")))?;

        let items = rss
            .channel
            .item
            .into_iter()
            .map(|it| FeedItem {
                title: it.title.unwrap_or_default().trim().to_string(),
                link: it.link.unwrap_or_default().trim().to_string(),
                description: it.description.unwrap_or_default().trim().to_string(),
            })
            .collect();
        Ok(items)
    }
}

#[async_trait::async_trait]
impl FeedProvider for FeedRssProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(xml) => Self::parse_items_from_str(xml),

            Mode::Http { url, client } => {
                let resp = client.get(url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                let body = resp.text().await?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "feed-rss"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
