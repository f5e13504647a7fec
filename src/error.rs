// src/error.rs
use thiserror::Error;

/// Adapter-level failure: the outbound request or its decoding went wrong.
/// A fetch failure is always signaled as an error, never as an empty result,
/// so callers can tell "no articles" apart from "fetch failed".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failure inside the durable article/subscriber boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("commit failed: {0}")]
    Commit(String),
}

/// Delivery failure for one recipient. Logged per subscriber; other
/// subscribers in the same cycle are unaffected.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("building message: {0}")]
    Build(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// What one job cycle surfaces to the scheduler. The scheduler logs it and
/// keeps triggering future cycles.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
