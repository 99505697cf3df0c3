//! Schema creation for the `characters` table.
//!
//! Every statement is `IF NOT EXISTS`, so `chara init` can run any number
//! of times.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an already open pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Name groups are stored as JSON arrays of {name, ruby}.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            character_no INTEGER UNIQUE,
            detail_url TEXT NOT NULL,
            nickname TEXT NOT NULL DEFAULT '[]',
            full_name TEXT NOT NULL DEFAULT '[]',
            image_url TEXT NOT NULL DEFAULT '',
            works TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            position TEXT NOT NULL DEFAULT '',
            element TEXT NOT NULL DEFAULT '',
            kick INTEGER,
            control INTEGER,
            technique INTEGER,
            pressure INTEGER,
            physical INTEGER,
            agility INTEGER,
            intelligence INTEGER,
            generation TEXT NOT NULL DEFAULT '',
            school_year TEXT NOT NULL DEFAULT '',
            gender TEXT NOT NULL DEFAULT '',
            character_role TEXT NOT NULL DEFAULT '',
            fetched_at TEXT NOT NULL DEFAULT '',
            content_hash TEXT NOT NULL,
            imported_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_characters_detail_url ON characters(detail_url)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_characters_position ON characters(position)")
        .execute(pool)
        .await?;

    Ok(())
}
