//! In-memory [`RecordSource`] for tests and embedding.
//!
//! Records are kept in catalog order behind a `std::sync::RwLock`. A fetch
//! counter lets callers observe how often the source was actually read.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::CharacterRecord;

use super::RecordSource;

/// In-memory record source.
pub struct InMemoryStore {
    records: RwLock<Vec<CharacterRecord>>,
    fetches: AtomicUsize,
}

impl InMemoryStore {
    /// Build a store from records; they are put into catalog order.
    pub fn new(mut records: Vec<CharacterRecord>) -> Self {
        sort_catalog_order(&mut records);
        Self {
            records: RwLock::new(records),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the record with the same character number, or append.
    pub fn upsert(&self, record: CharacterRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        let existing = record
            .character_no
            .and_then(|no| records.iter().position(|r| r.character_no == Some(no)));
        match existing {
            Some(pos) => records[pos] = record,
            None => records.push(record),
        }
        sort_catalog_order(&mut records);
        Ok(())
    }

    /// Number of `fetch_range` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Ascending number, missing numbers last; stable so insertion order breaks ties.
fn sort_catalog_order(records: &mut [CharacterRecord]) {
    records.sort_by_key(|r| (r.character_no.is_none(), r.character_no));
}

#[async_trait]
impl RecordSource for InMemoryStore {
    async fn fetch_range(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(records.iter().skip(offset).take(limit).cloned().collect())
    }
}
