// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use newsdrop::error::{FetchError, NotifyError, StoreError};
use newsdrop::ingest::types::{FeedItem, FeedProvider, KeywordProvider, RawArticle};
use newsdrop::notify::Notifier;
use newsdrop::store::memory::MemoryStore;
use newsdrop::store::{Article, ArticleBatch, ArticleStore, Subscriber};

pub fn raw(title: &str, url: &str) -> RawArticle {
    RawArticle {
        title: title.to_string(),
        url: url.to_string(),
        published_at: None,
        source: "Example Wire".into(),
        description: None,
    }
}

pub fn feed_item(title: &str, link: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: link.to_string(),
        description: format!("description of {title}"),
    }
}

pub fn subscriber(email: &str, keywords: &[&str]) -> Subscriber {
    Subscriber {
        email: email.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Keyword provider scripted per keyword; unknown keywords return nothing,
/// keywords in `failing` return a fetch error.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: HashMap<String, Vec<RawArticle>>,
    failing: HashSet<String>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(mut self, keyword: &str, articles: Vec<RawArticle>) -> Self {
        self.responses.insert(keyword.to_string(), articles);
        self
    }

    pub fn with_failure(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }
}

#[async_trait::async_trait]
impl KeywordProvider for ScriptedProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<RawArticle>, FetchError> {
        if self.failing.contains(keyword) {
            return Err(FetchError::Status(500));
        }
        Ok(self.responses.get(keyword).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Feed provider returning one scripted result per call; the last entry
/// repeats once the script is exhausted.
pub struct ScriptedFeed {
    script: Mutex<Vec<Result<Vec<FeedItem>, u16>>>,
}

impl ScriptedFeed {
    pub fn new(script: Vec<Result<Vec<FeedItem>, u16>>) -> Self {
        assert!(!script.is_empty());
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait::async_trait]
impl FeedProvider for ScriptedFeed {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>, FetchError> {
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop().unwrap()
        } else {
            script.last().cloned().unwrap()
        };
        next.map_err(FetchError::Status)
    }

    fn name(&self) -> &'static str {
        "scripted-feed"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notification sink that records instead of delivering; recipients in
/// `fail_for` get a delivery error.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMail>>,
    fail_for: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.fail_for.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent_mails(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        if self.fail_for.lock().unwrap().contains(to) {
            return Err(NotifyError::Delivery(format!("scripted failure for {to}")));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Article store whose batches stage normally but always fail at commit.
pub struct FailingCommitStore {
    pub inner: MemoryStore,
}

impl FailingCommitStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
        }
    }
}

struct FailingBatch {
    delegate: Box<dyn ArticleBatch>,
}

#[async_trait::async_trait]
impl ArticleStore for FailingCommitStore {
    async fn begin(&self) -> Result<Box<dyn ArticleBatch>, StoreError> {
        Ok(Box::new(FailingBatch {
            delegate: self.inner.begin().await?,
        }))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Article>, StoreError> {
        self.inner.recent(limit).await
    }
}

#[async_trait::async_trait]
impl ArticleBatch for FailingBatch {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        self.delegate.exists_by_url(url).await
    }

    fn stage(&mut self, article: Article) {
        self.delegate.stage(article);
    }

    fn staged(&self) -> usize {
        self.delegate.staged()
    }

    async fn commit(self: Box<Self>) -> Result<usize, StoreError> {
        self.delegate.rollback().await;
        Err(StoreError::Commit("scripted commit failure".into()))
    }

    async fn rollback(self: Box<Self>) {
        self.delegate.rollback().await;
    }
}
