// src/store/memory.rs
//! In-process backing for the store traits. The serving layer and the poll
//! job share one instance; a database-backed implementation plugs in behind
//! the same traits without touching the job.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::StoreError;
use crate::store::{Article, ArticleBatch, ArticleStore, Subscriber, SubscriberStore};

#[derive(Debug, Default)]
struct Tables {
    articles: Vec<Article>,
    urls: HashSet<String>,
    subscribers: BTreeMap<String, Subscriber>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn article_count(&self) -> usize {
        self.tables.read().expect("store lock poisoned").articles.len()
    }
}

struct MemoryBatch {
    tables: Arc<RwLock<Tables>>,
    staged: Vec<Article>,
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn ArticleBatch>, StoreError> {
        Ok(Box::new(MemoryBatch {
            tables: Arc::clone(&self.tables),
            staged: Vec::new(),
        }))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Article>, StoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.articles.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait::async_trait]
impl ArticleBatch for MemoryBatch {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.urls.contains(url))
    }

    fn stage(&mut self, article: Article) {
        self.staged.push(article);
    }

    fn staged(&self) -> usize {
        self.staged.len()
    }

    async fn commit(self: Box<Self>) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");
        let mut inserted = 0usize;
        for article in self.staged {
            // url uniqueness holds even if a row raced in since staging
            if tables.urls.insert(article.url.clone()) {
                tables.articles.push(article);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn rollback(self: Box<Self>) {
        // staged rows are dropped with the batch
    }
}

#[async_trait::async_trait]
impl SubscriberStore for MemoryStore {
    async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<Subscriber>, StoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .subscribers
            .values()
            .filter(|s| s.wants(keyword))
            .cloned()
            .collect())
    }

    async fn insert(&self, sub: Subscriber) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");
        if tables.subscribers.contains_key(&sub.email) {
            return Ok(false);
        }
        tables.subscribers.insert(sub.email.clone(), sub);
        Ok(true)
    }

    async fn remove(&self, email: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");
        Ok(tables.subscribers.remove(email).is_some())
    }

    async fn all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.subscribers.values().cloned().collect())
    }
}
