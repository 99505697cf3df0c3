//! Record sources for the search service.
//!
//! The [`RecordSource`] trait is the narrow read interface the search path
//! depends on: fetch a contiguous range of records in catalog order. The
//! full dataset is assembled by [`load_all`], a plain paged-fetch loop that
//! stops at the first short page.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::CharacterRecord;

/// Ordered, range-addressable source of catalog records.
///
/// Catalog order is ascending character number, records without a number
/// last, ties in insertion order.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Return up to `limit` records starting at `offset`.
    async fn fetch_range(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>>;
}

/// Read every record from `source`, `chunk_size` at a time.
///
/// A `chunk_size` of zero is treated as one.
pub async fn load_all(source: &dyn RecordSource, chunk_size: usize) -> Result<Vec<CharacterRecord>> {
    let chunk_size = chunk_size.max(1);
    let mut all = Vec::new();
    let mut offset = 0;
    loop {
        let chunk = source.fetch_range(offset, chunk_size).await?;
        let len = chunk.len();
        all.extend(chunk);
        if len < chunk_size {
            break;
        }
        offset += chunk_size;
    }
    tracing::debug!(records = all.len(), chunk_size, "loaded all records");
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryStore;
    use super::*;

    fn numbered(n: i64) -> CharacterRecord {
        CharacterRecord {
            character_no: Some(n),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_all_crosses_chunk_boundaries() {
        let store = InMemoryStore::new((1..=7).map(numbered).collect());
        let all = load_all(&store, 3).await.unwrap();
        let numbers: Vec<i64> = all.iter().filter_map(|r| r.character_no).collect();
        assert_eq!(numbers, (1..=7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_load_all_exact_multiple_issues_trailing_empty_fetch() {
        let store = InMemoryStore::new((1..=6).map(numbered).collect());
        let all = load_all(&store, 3).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(store.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_load_all_empty_and_zero_chunk() {
        let store = InMemoryStore::new(Vec::new());
        assert!(load_all(&store, 0).await.unwrap().is_empty());

        let store = InMemoryStore::new((1..=2).map(numbered).collect());
        assert_eq!(load_all(&store, 0).await.unwrap().len(), 2);
    }
}
