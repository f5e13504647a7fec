// src/ingest/providers/mod.rs
pub mod feed_rss;
pub mod news_api;
