// src/config.rs
//! Environment-driven configuration, read once at process start. A missing
//! required setting fails startup; there is no runtime reconfiguration.

use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};

use crate::ingest::providers::news_api::DEFAULT_ENDPOINT;

/// Default keyword list when `NEWS_KEYWORDS` is unset; also the keyword set
/// newly created subscribers start with.
pub const DEFAULT_KEYWORDS: &[&str] = &["OpenAI", "China", "Stock Market", "SpaceX", "Trump"];

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_FEED_URL: &str = "https://trumpstruth.org/feed";
const DEFAULT_NEWS_POLL_SECS: u64 = 300;
const DEFAULT_NEWS_GRACE_SECS: u64 = 60;
const DEFAULT_FEED_POLL_SECS: u64 = 15;
const DEFAULT_FEED_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy)]
pub struct JobTiming {
    pub interval_secs: u64,
    pub misfire_grace_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub keywords: Vec<String>,
    pub news_api_key: String,
    pub news_api_url: String,
    pub news_poll: JobTiming,
    pub feed_url: String,
    pub feed_poll: JobTiming,
    /// Recipient for full-feed alerts; when unset, new items are logged.
    pub alert_recipient: Option<String>,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("parsing BIND_ADDR")?;

        let keywords = match optional("NEWS_KEYWORDS") {
            Some(raw) => parse_keywords(&raw)?,
            None => DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            bind_addr,
            keywords,
            news_api_key: required("NEWS_API_KEY")?,
            news_api_url: optional("NEWS_API_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            news_poll: JobTiming {
                interval_secs: secs("NEWS_POLL_INTERVAL_SECS", DEFAULT_NEWS_POLL_SECS)?,
                misfire_grace_secs: secs("NEWS_MISFIRE_GRACE_SECS", DEFAULT_NEWS_GRACE_SECS)?,
            },
            feed_url: optional("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            feed_poll: JobTiming {
                interval_secs: secs("FEED_POLL_INTERVAL_SECS", DEFAULT_FEED_POLL_SECS)?,
                misfire_grace_secs: secs("FEED_MISFIRE_GRACE_SECS", DEFAULT_FEED_GRACE_SECS)?,
            },
            alert_recipient: optional("ALERT_EMAIL_TO"),
            smtp: SmtpConfig {
                host: required("SMTP_HOST")?,
                user: required("SMTP_USER")?,
                pass: required("SMTP_PASS")?,
                from: required("NOTIFY_EMAIL_FROM")?,
            },
        })
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| anyhow!("{name} environment variable not set"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secs(name: &str, default: u64) -> Result<u64> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("parsing {name}")),
        None => Ok(default),
    }
}

fn parse_keywords(raw: &str) -> Result<Vec<String>> {
    let keywords: Vec<String> = raw
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(anyhow!("NEWS_KEYWORDS is set but contains no keywords"));
    }
    Ok(keywords)
}
