//! Single-record retrieval by character number.
//!
//! Used by both the `chara get` CLI command and `GET /characters/{no}`.

use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::metrics::MetricKey;
use crate::models::CharacterRecord;
use crate::search::format_metric;
use crate::store::sqlite::SqliteStore;

/// A record together with all of its derived metrics.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterResponse {
    #[serde(flatten)]
    pub record: CharacterRecord,
    /// Keyed by metric name; `null` when undefined.
    pub metrics: BTreeMap<&'static str, Option<i64>>,
}

impl CharacterResponse {
    pub fn new(record: CharacterRecord) -> Self {
        let metrics = MetricKey::ALL
            .iter()
            .map(|k| (k.as_str(), record.metric(*k)))
            .collect();
        Self { record, metrics }
    }
}

/// Fetch one record, failing with `character not found` when absent.
pub async fn get_character(store: &SqliteStore, character_no: i64) -> Result<CharacterResponse> {
    match store.get_by_no(character_no).await? {
        Some(record) => Ok(CharacterResponse::new(record)),
        None => bail!("character not found: {}", character_no),
    }
}

/// CLI entry point for `chara get`.
pub async fn run_get(config: &Config, character_no: i64) -> Result<()> {
    let store = SqliteStore::open(&config.db).await?;
    let result = get_character(&store, character_no).await;
    store.close().await;
    let CharacterResponse { record, .. } = result?;

    let names = |parts: &[crate::models::NamePart]| {
        parts
            .iter()
            .map(|p| format!("{} ({})", p.name, p.ruby))
            .collect::<Vec<_>>()
            .join(" ")
    };

    println!("--- Character #{} ---", character_no);
    println!("name:      {}", names(&record.full_name));
    if !record.nickname.is_empty() {
        println!("nickname:  {}", names(&record.nickname));
    }
    println!("position:  {}", record.position);
    println!("element:   {}", record.element);
    println!("gender:    {}", record.gender);
    println!("role:      {}", record.character_role);
    println!("works:     {}", record.works);
    println!("url:       {}", record.detail_url);
    println!("fetched:   {}", record.fetched_at);
    println!();
    println!("--- Stats ---");
    let s = &record.stats;
    for (label, value) in [
        ("kick", s.kick),
        ("control", s.control),
        ("technique", s.technique),
        ("pressure", s.pressure),
        ("physical", s.physical),
        ("agility", s.agility),
        ("intelligence", s.intelligence),
    ] {
        println!("{:<13}{}", label, format_metric(value));
    }
    println!();
    println!("--- Metrics ---");
    for key in MetricKey::ALL {
        println!("{:<13}{}", key.as_str(), format_metric(record.metric(key)));
    }
    if !record.description.is_empty() {
        println!();
        println!("--- Description ---");
        println!("{}", record.description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stats;

    #[test]
    fn test_response_carries_all_metrics() {
        let record = CharacterRecord {
            character_no: Some(4),
            stats: Stats {
                kick: Some(10),
                control: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };
        let resp = CharacterResponse::new(record);
        assert_eq!(resp.metrics.len(), 8);
        assert_eq!(resp.metrics["shootAT"], Some(15));
        assert_eq!(resp.metrics["KP"], None);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["character_no"], 4);
        assert_eq!(json["metrics"]["shootAT"], 15);
        assert!(json["metrics"]["totalStatus"].is_null());
    }
}
