//! Database statistics overview.
//!
//! Gives a quick summary of what has been imported: record counts, how many
//! rows carry a complete stat line, and a per-position breakdown. Used by
//! `chara stats`.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::store::sqlite::SqliteStore;

/// Per-position breakdown.
struct PositionStats {
    position: String,
    count: i64,
    complete: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db).await?;
    let pool = store.pool();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM characters")
        .fetch_one(pool)
        .await?;

    let unnumbered: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM characters WHERE character_no IS NULL")
            .fetch_one(pool)
            .await?;

    let complete: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM characters WHERE {}",
        COMPLETE_CONDITION
    ))
    .fetch_one(pool)
    .await?;

    let last_import: Option<i64> = sqlx::query_scalar("SELECT MAX(imported_at) FROM characters")
        .fetch_one(pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Character DB Stats");
    println!("==================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Characters:  {}", total);
    println!("  Unnumbered:  {}", unnumbered);
    println!(
        "  Full stats:  {} / {} ({}%)",
        complete,
        total,
        if total > 0 { (complete * 100) / total } else { 0 }
    );
    println!(
        "  Last import: {}",
        last_import
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );

    let rows = sqlx::query(&format!(
        r#"
        SELECT
            position,
            COUNT(*) AS count,
            SUM(CASE WHEN {} THEN 1 ELSE 0 END) AS complete
        FROM characters
        GROUP BY position
        ORDER BY count DESC, position ASC
        "#,
        COMPLETE_CONDITION
    ))
    .fetch_all(pool)
    .await?;

    let positions: Vec<PositionStats> = rows
        .iter()
        .map(|row| PositionStats {
            position: row.get("position"),
            count: row.get("count"),
            complete: row.get("complete"),
        })
        .collect();

    if !positions.is_empty() {
        println!();
        println!("  By position:");
        println!("  {:<16} {:>8} {:>11}", "POSITION", "COUNT", "FULL STATS");
        println!("  {}", "-".repeat(37));
        for p in &positions {
            let label = if p.position.is_empty() {
                "(none)"
            } else {
                p.position.as_str()
            };
            println!("  {:<16} {:>8} {:>11}", label, p.count, p.complete);
        }
    }

    println!();

    store.close().await;
    Ok(())
}

const COMPLETE_CONDITION: &str = "kick IS NOT NULL AND control IS NOT NULL \
     AND technique IS NOT NULL AND pressure IS NOT NULL AND physical IS NOT NULL \
     AND agility IS NOT NULL AND intelligence IS NOT NULL";

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now ("3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
