//! Name search with fixed-size paging.
//!
//! A query matches a record when, after both sides drop every half-width
//! (U+0020) and full-width (U+3000) space, it is a substring of the joined
//! full name, the joined full-name reading, the joined nickname, or the
//! joined nickname reading. An empty query matches everything.
//!
//! [`search`] never fails: an out-of-range or non-finite page is clamped
//! into `1..=total_pages`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{Config, SearchConfig};
use crate::metrics::{rank_by_metric, MetricKey};
use crate::models::CharacterRecord;
use crate::store::sqlite::SqliteStore;
use crate::store::{load_all, RecordSource};

/// Records per page.
pub const PAGE_SIZE: usize = 50;

/// One page of search results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub records: Vec<CharacterRecord>,
    pub total_match_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl SearchResponse {
    /// Append `next` to this result set.
    ///
    /// Rows of `next` whose character number is already present are dropped;
    /// rows without a number are always kept. Paging metadata is taken from
    /// `next`.
    pub fn append(self, next: SearchResponse) -> SearchResponse {
        let mut seen: HashSet<i64> = self.records.iter().filter_map(|r| r.character_no).collect();
        let mut records = self.records;
        for record in next.records {
            match record.character_no {
                Some(no) if !seen.insert(no) => continue,
                _ => records.push(record),
            }
        }
        SearchResponse { records, ..next }
    }

    /// Drop every row carrying `character_no`. Counts are left as they were.
    pub fn remove(&mut self, character_no: i64) {
        self.records.retain(|r| r.character_no != Some(character_no));
    }

    /// Reorder the rows on this page by `key`.
    pub fn sort_by_metric(&mut self, key: MetricKey) {
        self.records = rank_by_metric(&self.records, key);
    }
}

/// Remove every half-width and full-width space.
pub fn normalize_query(value: &str) -> String {
    value.chars().filter(|c| !matches!(*c, ' ' | '\u{3000}')).collect()
}

/// Does `record` match an already normalized, non-empty query?
pub fn record_matches(record: &CharacterRecord, normalized_query: &str) -> bool {
    [
        record.full_name_text(),
        record.full_name_reading(),
        record.nickname_text(),
        record.nickname_reading(),
    ]
    .iter()
    .any(|target| normalize_query(target).contains(normalized_query))
}

/// Clamp a requested page into `1..=total_pages`; non-finite input means page 1.
pub fn clamp_page(page: f64, total_pages: usize) -> usize {
    if !page.is_finite() {
        return 1;
    }
    let page = page.trunc();
    if page < 1.0 {
        1
    } else if page >= total_pages as f64 {
        total_pages
    } else {
        page as usize
    }
}

/// Filter `records` by `raw_query` and return page `page` with the default page size.
pub fn search(raw_query: &str, page: f64, records: &[CharacterRecord]) -> SearchResponse {
    search_with_page_size(raw_query, page, records, PAGE_SIZE)
}

/// [`search`] with an explicit page size (zero is treated as one).
pub fn search_with_page_size(
    raw_query: &str,
    page: f64,
    records: &[CharacterRecord],
    page_size: usize,
) -> SearchResponse {
    let page_size = page_size.max(1);
    let query = normalize_query(raw_query);

    let filtered: Vec<&CharacterRecord> = if query.is_empty() {
        records.iter().collect()
    } else {
        records.iter().filter(|r| record_matches(r, &query)).collect()
    };

    let total_match_count = filtered.len();
    let total_pages = total_match_count.div_ceil(page_size).max(1);
    let current_page = clamp_page(page, total_pages);

    let records = filtered
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    SearchResponse {
        records,
        total_match_count,
        total_pages,
        current_page,
    }
}

/// Load the full dataset from `source`, search it, and optionally rank the page.
pub async fn search_source(
    source: &dyn RecordSource,
    settings: &SearchConfig,
    raw_query: &str,
    page: f64,
    sort: Option<MetricKey>,
) -> Result<SearchResponse> {
    let all = load_all(source, settings.chunk_size).await?;
    let mut response = search_with_page_size(raw_query, page, &all, settings.page_size);
    if let Some(key) = sort {
        response.sort_by_metric(key);
    }
    tracing::debug!(
        query = raw_query,
        matches = response.total_match_count,
        page = response.current_page,
        "search"
    );
    Ok(response)
}

/// Placeholder for an undefined metric in listings.
pub fn format_metric(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// CLI entry point for `chara search`.
///
/// Several queries are merged with [`SearchResponse::append`]; numbers in
/// `exclude` are dropped from the listing with [`SearchResponse::remove`].
pub async fn run_search(
    config: &Config,
    queries: &[String],
    page: f64,
    sort: Option<MetricKey>,
    exclude: &[i64],
) -> Result<()> {
    let store = SqliteStore::open(&config.db).await?;

    let mut combined: Option<SearchResponse> = None;
    let mut footers = Vec::new();
    let empty = [String::new()];
    let queries = if queries.is_empty() { &empty[..] } else { queries };
    for query in queries {
        let next = search_source(&store, &config.search, query, page, None).await?;
        footers.push((query.as_str(), page_footer(&next)));
        combined = Some(match combined {
            Some(prev) => prev.append(next),
            None => next,
        });
    }
    store.close().await;

    let mut response = match combined {
        Some(r) => r,
        None => return Ok(()),
    };
    for no in exclude {
        response.remove(*no);
    }
    if let Some(key) = sort {
        response.sort_by_metric(key);
    }

    if response.records.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, record) in response.records.iter().enumerate() {
        let number = record
            .character_no
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| "#-".to_string());
        println!(
            "{}. {} {} ({})",
            i + 1,
            number,
            record.full_name_text(),
            record.full_name_reading()
        );
        let metrics: Vec<String> = MetricKey::ALL
            .iter()
            .map(|k| format!("{} {}", k, format_metric(record.metric(*k))))
            .collect();
        println!("    {}", metrics.join("  "));
    }
    println!();
    // append keeps the last query's counts; report each query separately
    if footers.len() == 1 {
        println!("{}", page_footer(&response));
    } else {
        for (query, footer) in &footers {
            println!("{}: {}", query, footer);
        }
    }

    Ok(())
}

fn page_footer(response: &SearchResponse) -> String {
    format!(
        "page {} / {} ({} matches)",
        response.current_page, response.total_pages, response.total_match_count
    )
}
