//! Import of scraped character sheets.
//!
//! The scraper writes a JSON array of [`CharacterDetail`] items, every field
//! a string. Import turns each into a [`CharacterRecord`]: stat strings are
//! parsed leniently, katakana-only names get a derived hiragana reading,
//! and the row is upserted into SQLite. A content hash lets re-imports skip
//! unchanged rows.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::{CharacterDetail, CharacterRecord, Stats};
use crate::reading::derive_reading;
use crate::store::sqlite::{SqliteStore, UpsertOutcome};

/// Counts reported at the end of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub fetched: u64,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl ImportSummary {
    pub fn upserted(&self) -> u64 {
        self.inserted + self.updated
    }
}

/// Parse the leading integer of `value`, the way the catalog's numbers are
/// read: optional surrounding whitespace, optional sign, then digits. Any
/// trailing text is ignored. No digits means no value; digits beyond the
/// range of `i64` saturate to its bounds.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, rest) = match trimmed.chars().next() {
        Some('-') => (-1, &trimmed[1..]),
        Some('+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<i64>() {
        Ok(n) => Some(n * sign),
        Err(_) if sign < 0 => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Normalize one scraped item.
pub fn to_record(detail: CharacterDetail) -> CharacterRecord {
    CharacterRecord {
        character_no: parse_leading_int(&detail.character_no),
        stats: Stats {
            kick: parse_leading_int(&detail.kick),
            control: parse_leading_int(&detail.control),
            technique: parse_leading_int(&detail.technique),
            pressure: parse_leading_int(&detail.pressure),
            physical: parse_leading_int(&detail.physical),
            agility: parse_leading_int(&detail.agility),
            intelligence: parse_leading_int(&detail.intelligence),
        },
        nickname: detail.nickname.into_iter().map(derive_reading).collect(),
        full_name: detail.full_name.into_iter().map(derive_reading).collect(),
        detail_url: detail.detail_url,
        image_url: detail.image_url,
        works: detail.works,
        description: detail.description,
        position: detail.position,
        element: detail.element,
        generation: detail.generation,
        school_year: detail.school_year,
        gender: detail.gender,
        character_role: detail.character_role,
        fetched_at: detail.fetched_at,
    }
}

/// SHA-256 over the record's JSON form.
pub fn content_hash(record: &CharacterRecord) -> Result<String> {
    let json = serde_json::to_vec(record)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Read a scraper output file.
pub fn read_details(path: &Path) -> Result<Vec<CharacterDetail>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))
}

/// Normalize and upsert every item into `store`.
pub async fn import_details(
    store: &SqliteStore,
    details: Vec<CharacterDetail>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for detail in details {
        summary.fetched += 1;
        let record = to_record(detail);
        let hash = content_hash(&record)?;
        match store.upsert(&record, &hash).await? {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
            UpsertOutcome::Unchanged => summary.unchanged += 1,
        }
        tracing::debug!(
            character_no = ?record.character_no,
            url = %record.detail_url,
            "imported"
        );
    }
    Ok(summary)
}

/// CLI entry point for `chara import`.
pub async fn run_import(config: &Config, path: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let path = match path.or_else(|| config.import.path.clone()) {
        Some(p) => p,
        None => bail!("No import file given. Pass a path or set [import].path in config."),
    };

    let details = read_details(&path)?;
    tracing::info!(path = %path.display(), items = details.len(), "import file read");

    if dry_run {
        let records: Vec<CharacterRecord> = details.into_iter().map(to_record).collect();
        let numbered = records.iter().filter(|r| r.character_no.is_some()).count();
        let complete = records.iter().filter(|r| r.stats.is_complete()).count();
        println!("import {} (dry-run)", path.display());
        println!("  items found: {}", records.len());
        println!("  with character number: {}", numbered);
        println!("  with complete stats: {}", complete);
        return Ok(());
    }

    let store = SqliteStore::open(&config.db).await?;
    let summary = import_details(&store, details).await?;
    store.close().await;

    println!("import {}", path.display());
    println!("  fetched: {} items", summary.fetched);
    println!("  upserted: {}", summary.upserted());
    println!("  unchanged: {}", summary.unchanged);
    println!("ok");

    Ok(())
}
