//! Time-limited cache for loaded rows.
//!
//! The pipeline itself is stateless; a `RowCache` is owned by whoever wants
//! to avoid reloading (the dashboard) and wraps the load call. A zero TTL
//! disables caching without changing results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::DerivedRow;

struct Entry {
    loaded_at: Instant,
    rows: Arc<Vec<DerivedRow>>,
}

/// Holds the last loaded dataset until it is older than `ttl` or explicitly
/// invalidated.
pub struct RowCache {
    ttl: Duration,
    entry: Option<Entry>,
}

impl RowCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached rows, or call `load` and cache its result.
    pub fn get_or_load<F>(&mut self, load: F) -> Arc<Vec<DerivedRow>>
    where
        F: FnOnce() -> Vec<DerivedRow>,
    {
        self.get_or_load_at(Instant::now(), load)
    }

    /// Same as [`get_or_load`](Self::get_or_load) with an explicit clock reading.
    pub fn get_or_load_at<F>(&mut self, now: Instant, load: F) -> Arc<Vec<DerivedRow>>
    where
        F: FnOnce() -> Vec<DerivedRow>,
    {
        if let Some(entry) = &self.entry {
            if !self.expired(entry, now) {
                return Arc::clone(&entry.rows);
            }
        }

        let rows = Arc::new(load());
        log::debug!("Cached {} derived rows for {:?}", rows.len(), self.ttl);
        self.entry = Some(Entry {
            loaded_at: now,
            rows: Arc::clone(&rows),
        });
        rows
    }

    /// Check whether the next access would reload.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    pub fn is_stale_at(&self, now: Instant) -> bool {
        match &self.entry {
            None => true,
            Some(entry) => self.expired(entry, now),
        }
    }

    /// Drop the cached dataset so the next access reloads.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    fn expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.loaded_at) >= self.ttl
    }
}
