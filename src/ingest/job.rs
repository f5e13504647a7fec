// src/ingest/job.rs
//! The poll-merge-fanout job and the full-feed alert job. One call to
//! `run_once` is one cycle; the scheduler owns the cadence and catches
//! whatever a cycle returns.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics::{counter, gauge};

use crate::error::CycleError;
use crate::ingest::dedup::SeenLinks;
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{FeedItem, FeedProvider, KeywordProvider};
use crate::notify::{digest_html, feed_item_html, Notifier};
use crate::scheduler::PollJob;
use crate::store::{Article, ArticleStore, SubscriberStore};

pub const NEWS_JOB_ID: &str = "news_poll";
pub const FEED_JOB_ID: &str = "feed_rss_poll";

const NEWS_SUBJECT: &str = "NewsDrop Update";
const FEED_SUBJECT: &str = "Feed Alert (Unconfirmed)";

/// What one keyword-poll cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewsCycleReport {
    pub fetched: usize,
    pub inserted: usize,
    pub fetch_failures: usize,
    pub digests_sent: usize,
    pub digest_failures: usize,
}

/// Polls every configured keyword, dedupes against prior state, persists new
/// articles as one unit of work, and sends one digest per matched subscriber.
pub struct NewsPollJob {
    providers: Vec<Box<dyn KeywordProvider>>,
    keywords: Vec<String>,
    articles: Arc<dyn ArticleStore>,
    subscribers: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    subject: String,
}

impl NewsPollJob {
    pub fn new(
        providers: Vec<Box<dyn KeywordProvider>>,
        keywords: Vec<String>,
        articles: Arc<dyn ArticleStore>,
        subscribers: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            providers,
            keywords,
            articles,
            subscribers,
            notifier,
            subject: NEWS_SUBJECT.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub async fn run_once(&self) -> Result<NewsCycleReport, CycleError> {
        ensure_metrics_described();
        let mut report = NewsCycleReport::default();

        let mut batch = self.articles.begin().await?;
        // In-cycle witness: the durable check alone can't catch the same url
        // returned twice before this cycle's batch commits.
        let mut seen_this_run: HashSet<String> = HashSet::new();
        let mut fanout: BTreeMap<String, Vec<Article>> = BTreeMap::new();

        for keyword in &self.keywords {
            let mut new_for_keyword: Vec<Article> = Vec::new();

            for provider in &self.providers {
                let raw = match provider.fetch(keyword).await {
                    Ok(v) => v,
                    Err(e) => {
                        report.fetch_failures += 1;
                        counter!("poll_fetch_errors_total").increment(1);
                        tracing::warn!(
                            error = %e,
                            provider = provider.name(),
                            keyword = %keyword,
                            "fetch failed; continuing with remaining keywords"
                        );
                        continue;
                    }
                };
                report.fetched += raw.len();

                for article in raw {
                    let url = article.url.trim().to_string();
                    if url.is_empty() {
                        continue;
                    }
                    if seen_this_run.contains(&url) {
                        counter!("poll_dedup_total").increment(1);
                        continue;
                    }
                    match batch.exists_by_url(&url).await {
                        Ok(true) => {
                            counter!("poll_dedup_total").increment(1);
                            continue;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            batch.rollback().await;
                            return Err(e.into());
                        }
                    }
                    seen_this_run.insert(url.clone());

                    let now = Utc::now();
                    let row = Article {
                        title: article.title,
                        url,
                        published_at: article.published_at.unwrap_or(now),
                        source: article.source,
                        keyword: keyword.clone(),
                        inserted_at: now,
                    };
                    batch.stage(row.clone());
                    new_for_keyword.push(row);
                }
            }

            if new_for_keyword.is_empty() {
                continue;
            }

            let matching = match self.subscribers.find_by_keyword(keyword).await {
                Ok(v) => v,
                Err(e) => {
                    batch.rollback().await;
                    return Err(e.into());
                }
            };
            for sub in matching {
                fanout
                    .entry(sub.email)
                    .or_default()
                    .extend(new_for_keyword.iter().cloned());
            }
        }

        // Commit everything staged this cycle before any notification goes
        // out; a failed commit means nobody gets alerted about ghost rows.
        report.inserted = batch.commit().await?;
        counter!("poll_articles_inserted_total").increment(report.inserted as u64);

        for (email, articles) in fanout {
            if articles.is_empty() {
                continue;
            }
            let body = digest_html(&articles);
            match self.notifier.send(&email, &self.subject, &body).await {
                Ok(()) => {
                    report.digests_sent += 1;
                    counter!("notify_sent_total").increment(1);
                }
                Err(e) => {
                    report.digest_failures += 1;
                    counter!("notify_errors_total").increment(1);
                    tracing::warn!(error = %e, subscriber = %email, "digest delivery failed");
                }
            }
        }

        counter!("poll_cycles_total").increment(1);
        gauge!("poll_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(report)
    }
}

#[async_trait::async_trait]
impl PollJob for NewsPollJob {
    fn id(&self) -> &'static str {
        NEWS_JOB_ID
    }

    async fn run_cycle(&self) -> Result<(), CycleError> {
        let report = self.run_once().await?;
        tracing::info!(
            fetched = report.fetched,
            inserted = report.inserted,
            digests = report.digests_sent,
            fetch_failures = report.fetch_failures,
            "news poll cycle finished"
        );
        Ok(())
    }
}

/// What one full-feed cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCycleOutcome {
    /// First cycle after start: everything marked seen, zero alerts.
    Primed { seen: usize },
    NoNew,
    /// No recipient configured; new items were logged instead.
    Logged { new_items: usize },
    Alerted {
        new_items: usize,
        sent: usize,
        failures: usize,
    },
}

/// Polls one full feed, primes on the first cycle, and afterwards alerts a
/// single configured recipient once per newly seen item, oldest first.
pub struct FeedAlertJob {
    provider: Box<dyn FeedProvider>,
    notifier: Arc<dyn Notifier>,
    recipient: Option<String>,
    subject: String,
    // Process-lifetime state; only ever touched by the single-flight job
    // body, and never held across an await.
    seen: Mutex<SeenLinks>,
}

impl FeedAlertJob {
    pub fn new(
        provider: Box<dyn FeedProvider>,
        notifier: Arc<dyn Notifier>,
        recipient: Option<String>,
    ) -> Self {
        Self {
            provider,
            notifier,
            recipient,
            subject: FEED_SUBJECT.to_string(),
            seen: Mutex::new(SeenLinks::new()),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub async fn run_once(&self) -> Result<FeedCycleOutcome, CycleError> {
        ensure_metrics_described();

        let mut items = self.provider.fetch_latest().await?;
        // Oldest new item surfaces first.
        items.reverse();

        let new_items: Vec<FeedItem> = {
            let mut seen = self.seen.lock().expect("seen lock poisoned");
            if !seen.is_primed() {
                let n = seen.prime(items.into_iter().map(|it| it.link));
                tracing::info!(seen = n, "feed primed; suppressing first-cycle alerts");
                return Ok(FeedCycleOutcome::Primed { seen: n });
            }
            items
                .into_iter()
                .filter(|it| !it.link.is_empty())
                .filter(|it| seen.observe(&it.link))
                .collect()
        };

        if new_items.is_empty() {
            return Ok(FeedCycleOutcome::NoNew);
        }

        let Some(to) = self.recipient.as_deref() else {
            for it in &new_items {
                tracing::info!(title = %it.title, link = %it.link, "feed alert (no recipient configured)");
            }
            return Ok(FeedCycleOutcome::Logged {
                new_items: new_items.len(),
            });
        };

        let mut sent = 0usize;
        let mut failures = 0usize;
        for it in &new_items {
            let body = feed_item_html(it);
            match self.notifier.send(to, &self.subject, &body).await {
                Ok(()) => {
                    sent += 1;
                    counter!("feed_alerts_total").increment(1);
                }
                Err(e) => {
                    failures += 1;
                    counter!("notify_errors_total").increment(1);
                    tracing::warn!(error = %e, link = %it.link, "feed alert delivery failed");
                }
            }
        }

        Ok(FeedCycleOutcome::Alerted {
            new_items: new_items.len(),
            sent,
            failures,
        })
    }
}

#[async_trait::async_trait]
impl PollJob for FeedAlertJob {
    fn id(&self) -> &'static str {
        FEED_JOB_ID
    }

    async fn run_cycle(&self) -> Result<(), CycleError> {
        match self.run_once().await? {
            FeedCycleOutcome::Primed { seen } => {
                tracing::info!(seen, "feed poll cycle primed");
            }
            FeedCycleOutcome::NoNew => {
                tracing::debug!("feed poll cycle: no new items");
            }
            FeedCycleOutcome::Logged { new_items } => {
                tracing::info!(new_items, "feed poll cycle logged items");
            }
            FeedCycleOutcome::Alerted {
                new_items,
                sent,
                failures,
            } => {
                tracing::info!(new_items, sent, failures, "feed poll cycle alerted");
            }
        }
        Ok(())
    }
}
