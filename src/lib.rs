// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod scheduler;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::ingest::job::{FeedAlertJob, FeedCycleOutcome, NewsCycleReport, NewsPollJob};
pub use crate::notify::Notifier;
pub use crate::scheduler::{PollJob, Scheduler};
