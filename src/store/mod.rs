// src/store/mod.rs
pub mod memory;

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Persisted article row. `url` is globally unique; rows are never mutated
/// after insert and never deleted here (retention is out of scope).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    /// The query that first produced this article.
    pub keyword: String,
    pub inserted_at: DateTime<Utc>,
}

/// A user's keyword interest set. Managed by the serving layer; the poll job
/// only reads. An empty keyword set is tolerated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    pub email: String,
    pub keywords: Vec<String>,
}

impl Subscriber {
    pub fn wants(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

/// Durable article boundary. One unit of work covers a full poll cycle so a
/// crash mid-cycle leaves either none or all of that cycle's rows persisted.
#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ArticleBatch>, StoreError>;
    /// Most recently inserted articles, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Article>, StoreError>;
}

/// One cycle's unit of work. `exists_by_url` sees committed state only; the
/// job keeps its own in-cycle seen set on top, since two occurrences inside
/// the same uncommitted batch would otherwise both pass the existence check.
#[async_trait::async_trait]
pub trait ArticleBatch: Send + Sync {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError>;
    fn stage(&mut self, article: Article);
    fn staged(&self) -> usize;
    /// All-or-nothing. Returns how many rows became durably visible.
    async fn commit(self: Box<Self>) -> Result<usize, StoreError>;
    /// Discard everything staged in this batch.
    async fn rollback(self: Box<Self>);
}

#[async_trait::async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<Subscriber>, StoreError>;
    /// Returns false when the email is already registered.
    async fn insert(&self, sub: Subscriber) -> Result<bool, StoreError>;
    /// Returns false when the email was not registered.
    async fn remove(&self, email: &str) -> Result<bool, StoreError>;
    async fn all(&self) -> Result<Vec<Subscriber>, StoreError>;
}
