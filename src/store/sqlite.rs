//! SQLite-backed [`RecordSource`] and write path.
//!
//! Records live in the `characters` table created by
//! [`crate::migrate`]. Rows are identified by character number; rows
//! without a number are identified by their detail URL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::DbConfig;
use crate::db;
use crate::models::{CharacterRecord, NamePart, Stats};

use super::RecordSource;

const SELECT_COLUMNS: &str = "character_no, detail_url, nickname, full_name, image_url, works, \
     description, position, element, kick, control, technique, pressure, physical, agility, \
     intelligence, generation, school_year, gender, character_role, fetched_at";

/// Result of writing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// SQLite record store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database named in `[db]`.
    pub async fn open(db: &DbConfig) -> Result<Self> {
        Ok(Self::new(db::connect(db).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Look up one record by character number.
    pub async fn get_by_no(&self, character_no: i64) -> Result<Option<CharacterRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM characters WHERE character_no = ?",
            SELECT_COLUMNS
        ))
        .bind(character_no)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Insert or update `record`, skipping the write when `content_hash`
    /// matches what is already stored.
    pub async fn upsert(&self, record: &CharacterRecord, content_hash: &str) -> Result<UpsertOutcome> {
        let existing: Option<(i64, String)> = match record.character_no {
            Some(no) => {
                sqlx::query_as("SELECT id, content_hash FROM characters WHERE character_no = ?")
                    .bind(no)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, content_hash FROM characters \
                     WHERE character_no IS NULL AND detail_url = ? ORDER BY id LIMIT 1",
                )
                .bind(&record.detail_url)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let nickname = serde_json::to_string(&record.nickname)?;
        let full_name = serde_json::to_string(&record.full_name)?;
        let now = chrono::Utc::now().timestamp();

        match existing {
            Some((_, ref hash)) if hash == content_hash => Ok(UpsertOutcome::Unchanged),
            Some((id, _)) => {
                sqlx::query(
                    r#"
                    UPDATE characters SET
                        detail_url = ?, nickname = ?, full_name = ?, image_url = ?, works = ?,
                        description = ?, position = ?, element = ?, kick = ?, control = ?,
                        technique = ?, pressure = ?, physical = ?, agility = ?, intelligence = ?,
                        generation = ?, school_year = ?, gender = ?, character_role = ?,
                        fetched_at = ?, content_hash = ?, imported_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&record.detail_url)
                .bind(&nickname)
                .bind(&full_name)
                .bind(&record.image_url)
                .bind(&record.works)
                .bind(&record.description)
                .bind(&record.position)
                .bind(&record.element)
                .bind(record.stats.kick)
                .bind(record.stats.control)
                .bind(record.stats.technique)
                .bind(record.stats.pressure)
                .bind(record.stats.physical)
                .bind(record.stats.agility)
                .bind(record.stats.intelligence)
                .bind(&record.generation)
                .bind(&record.school_year)
                .bind(&record.gender)
                .bind(&record.character_role)
                .bind(&record.fetched_at)
                .bind(content_hash)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO characters (
                        character_no, detail_url, nickname, full_name, image_url, works,
                        description, position, element, kick, control, technique, pressure,
                        physical, agility, intelligence, generation, school_year, gender,
                        character_role, fetched_at, content_hash, imported_at
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(record.character_no)
                .bind(&record.detail_url)
                .bind(&nickname)
                .bind(&full_name)
                .bind(&record.image_url)
                .bind(&record.works)
                .bind(&record.description)
                .bind(&record.position)
                .bind(&record.element)
                .bind(record.stats.kick)
                .bind(record.stats.control)
                .bind(record.stats.technique)
                .bind(record.stats.pressure)
                .bind(record.stats.physical)
                .bind(record.stats.agility)
                .bind(record.stats.intelligence)
                .bind(&record.generation)
                .bind(&record.school_year)
                .bind(&record.gender)
                .bind(&record.character_role)
                .bind(&record.fetched_at)
                .bind(content_hash)
                .bind(now)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

#[async_trait]
impl RecordSource for SqliteStore {
    async fn fetch_range(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM characters \
             ORDER BY character_no IS NULL, character_no ASC, id ASC \
             LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

fn parse_names(raw: &str, column: &str) -> Result<Vec<NamePart>> {
    serde_json::from_str(raw).with_context(|| format!("Malformed {} column: {}", column, raw))
}

fn row_to_record(row: &SqliteRow) -> Result<CharacterRecord> {
    let nickname: String = row.get("nickname");
    let full_name: String = row.get("full_name");

    Ok(CharacterRecord {
        character_no: row.get("character_no"),
        detail_url: row.get("detail_url"),
        nickname: parse_names(&nickname, "nickname")?,
        full_name: parse_names(&full_name, "full_name")?,
        image_url: row.get("image_url"),
        works: row.get("works"),
        description: row.get("description"),
        position: row.get("position"),
        element: row.get("element"),
        stats: Stats {
            kick: row.get("kick"),
            control: row.get("control"),
            technique: row.get("technique"),
            pressure: row.get("pressure"),
            physical: row.get("physical"),
            agility: row.get("agility"),
            intelligence: row.get("intelligence"),
        },
        generation: row.get("generation"),
        school_year: row.get("school_year"),
        gender: row.get("gender"),
        character_role: row.get("character_role"),
        fetched_at: row.get("fetched_at"),
    })
}
