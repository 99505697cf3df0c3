//! Core data models used throughout the character catalog.
//!
//! [`CharacterDetail`] is the raw, all-strings shape produced by the external
//! scraper. [`CharacterRecord`] is the normalized row stored in SQLite and
//! handed to the metric engine and the search service.

use serde::{Deserialize, Serialize};

/// One `{display text, phonetic reading}` pair of a name group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NamePart {
    /// Display text (kanji, katakana, or latin).
    pub name: String,
    /// Phonetic reading (hiragana).
    pub ruby: String,
}

/// The seven base attributes. `None` means the catalog did not publish a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub kick: Option<i64>,
    pub control: Option<i64>,
    pub technique: Option<i64>,
    pub pressure: Option<i64>,
    pub physical: Option<i64>,
    pub agility: Option<i64>,
    pub intelligence: Option<i64>,
}

impl Stats {
    /// True when every stat field carries a value.
    pub fn is_complete(&self) -> bool {
        self.kick.is_some()
            && self.control.is_some()
            && self.technique.is_some()
            && self.pressure.is_some()
            && self.physical.is_some()
            && self.agility.is_some()
            && self.intelligence.is_some()
    }
}

/// Normalized catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CharacterRecord {
    pub character_no: Option<i64>,
    pub detail_url: String,
    pub nickname: Vec<NamePart>,
    pub full_name: Vec<NamePart>,
    pub image_url: String,
    pub works: String,
    pub description: String,
    pub position: String,
    pub element: String,
    #[serde(flatten)]
    pub stats: Stats,
    pub generation: String,
    pub school_year: String,
    pub gender: String,
    pub character_role: String,
    pub fetched_at: String,
}

impl CharacterRecord {
    /// All full-name display texts joined in order.
    pub fn full_name_text(&self) -> String {
        join_names(&self.full_name)
    }

    /// All full-name readings joined in order.
    pub fn full_name_reading(&self) -> String {
        join_rubies(&self.full_name)
    }

    /// All nickname display texts joined in order.
    pub fn nickname_text(&self) -> String {
        join_names(&self.nickname)
    }

    /// All nickname readings joined in order.
    pub fn nickname_reading(&self) -> String {
        join_rubies(&self.nickname)
    }
}

fn join_names(parts: &[NamePart]) -> String {
    parts.iter().map(|p| p.name.as_str()).collect()
}

fn join_rubies(parts: &[NamePart]) -> String {
    parts.iter().map(|p| p.ruby.as_str()).collect()
}

/// Raw item produced by the scraper, before normalization.
///
/// Every scalar is kept as the text found on the detail page; see
/// [`crate::ingest`] for how it becomes a [`CharacterRecord`].
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterDetail {
    pub detail_url: String,
    pub character_no: String,
    pub nickname: Vec<NamePart>,
    pub full_name: Vec<NamePart>,
    pub image_url: String,
    pub works: String,
    pub description: String,
    pub position: String,
    pub element: String,
    pub kick: String,
    pub control: String,
    pub technique: String,
    pub pressure: String,
    pub physical: String,
    pub agility: String,
    pub intelligence: String,
    pub generation: String,
    pub school_year: String,
    pub gender: String,
    pub character_role: String,
    pub fetched_at: String,
}
