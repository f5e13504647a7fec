// src/ingest/dedup.rs
use std::collections::HashSet;

/// Process-lifetime dedup witness for feed sources that have no persistent
/// identity table. The set resets on restart; the priming pass keeps a
/// restart from replaying the whole feed history as "new" alerts.
#[derive(Debug, Default)]
pub struct SeenLinks {
    seen: HashSet<String>,
    primed: bool,
}

impl SeenLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the first-cycle priming pass has run.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Mark every current feed link as seen without alerting. Returns how
    /// many links were recorded. Empty links are ignored.
    pub fn prime<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        for link in links {
            let link = link.trim().to_string();
            if !link.is_empty() {
                self.seen.insert(link);
            }
        }
        self.primed = true;
        self.seen.len()
    }

    /// Returns true when `link` has not been seen before, marking it seen.
    pub fn observe(&mut self, link: &str) -> bool {
        self.seen.insert(link.trim().to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
