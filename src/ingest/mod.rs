// src/ingest/mod.rs
pub mod dedup;
pub mod job;
pub mod providers;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_cycles_total", "Completed poll-merge-fanout cycles.");
        describe_counter!(
            "poll_articles_fetched_total",
            "Articles returned by keyword providers."
        );
        describe_counter!(
            "poll_articles_inserted_total",
            "New articles persisted after dedup."
        );
        describe_counter!(
            "poll_dedup_total",
            "Articles skipped as already seen (in-cycle or durable)."
        );
        describe_counter!("poll_fetch_errors_total", "Provider fetch failures.");
        describe_counter!("notify_sent_total", "Digest emails delivered.");
        describe_counter!("notify_errors_total", "Digest email delivery failures.");
        describe_counter!("feed_alerts_total", "Feed items alerted on.");
        describe_gauge!("poll_last_run_ts", "Unix ts when a poll cycle last ran.");
    });
}

/// Parse a provider timestamp: ISO-8601 with an optional trailing `Z` UTC
/// suffix, which is stripped before the naive parse. Missing or unparsable
/// input yields `None`; callers fall back to ingestion time.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim().trim_end_matches('Z');
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}
