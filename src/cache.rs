//! Read-through memoization of record ranges.
//!
//! [`CachedSource`] wraps any [`RecordSource`] and remembers each fetched
//! `(offset, limit)` range until [`CachedSource::invalidate`] is called.
//! The server reads through it so repeated searches do not touch SQLite
//! until a revalidation request arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::CharacterRecord;
use crate::store::RecordSource;

/// Tag reported by revalidation responses.
pub const CACHE_TAG: &str = "characters";

type RangeKey = (usize, usize);

/// Memoizing wrapper around a record source.
pub struct CachedSource {
    inner: Arc<dyn RecordSource>,
    ranges: RwLock<HashMap<RangeKey, Arc<Vec<CharacterRecord>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss counters and current entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn RecordSource>) -> Self {
        Self {
            inner,
            ranges: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drop every memoized range; returns how many were dropped.
    pub fn invalidate(&self) -> Result<usize> {
        let mut ranges = self
            .ranges
            .write()
            .map_err(|_| anyhow!("record cache lock poisoned"))?;
        let dropped = ranges.len();
        ranges.clear();
        tracing::info!(tag = CACHE_TAG, dropped, "record cache invalidated");
        Ok(dropped)
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.ranges.read().map(|r| r.len()).unwrap_or(0);
        CacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: RangeKey) -> Result<Option<Arc<Vec<CharacterRecord>>>> {
        let ranges = self
            .ranges
            .read()
            .map_err(|_| anyhow!("record cache lock poisoned"))?;
        Ok(ranges.get(&key).cloned())
    }
}

#[async_trait]
impl RecordSource for CachedSource {
    async fn fetch_range(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>> {
        let key = (offset, limit);
        if let Some(hit) = self.lookup(key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit.as_ref().clone());
        }

        // Fetch outside the lock; concurrent misses on one range both read through.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let fresh = Arc::new(self.inner.fetch_range(offset, limit).await?);
        self.ranges
            .write()
            .map_err(|_| anyhow!("record cache lock poisoned"))?
            .insert(key, fresh.clone());
        Ok(fresh.as_ref().clone())
    }
}
