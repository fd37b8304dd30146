//! Mood store schema
//!
//! The applied version lives in SQLite's `user_version` header field, so
//! no bookkeeping table is needed.

use crate::config::{MAX_MOOD, MIN_MOOD};
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "mood entries",
    sql: include_str!("migrations/001_initial_schema.sql"),
}];

const MOOD_COLUMNS: [&str; 4] = ["date", "start_of_work", "end_of_work", "last_modified"];
const RATED_COLUMNS: [&str; 2] = ["start_of_work", "end_of_work"];

/// Apply pending migrations and verify the mood table. Returns the schema version.
pub async fn migrate(pool: &SqlitePool) -> Result<i64> {
    let mut version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    let latest = MIGRATIONS.last().map_or(0, |m| m.version);

    if version > latest {
        return Err(AppError::Schema(format!(
            "database is at version {}, this build supports up to {}",
            version, latest
        )));
    }

    let current = version;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            "Applying migration: {}",
            migration.description
        );

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        // PRAGMA takes no bound parameters
        sqlx::query(&format!("PRAGMA user_version = {}", migration.version))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        version = migration.version;
    }

    verify_mood_table(pool).await?;
    Ok(version)
}

/// The mood range is enforced by the table itself; refuse a store without it.
async fn verify_mood_table(pool: &SqlitePool) -> Result<()> {
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('mood_entries')")
            .fetch_all(pool)
            .await?;

    if let Some(missing) = MOOD_COLUMNS
        .into_iter()
        .find(|c| !columns.iter().any(|name| name == c))
    {
        return Err(AppError::Schema(format!(
            "mood_entries has no {} column",
            missing
        )));
    }

    let ddl: String = sqlx::query_scalar(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'mood_entries'",
    )
    .fetch_one(pool)
    .await?;

    for column in RATED_COLUMNS {
        let check = format!(
            "{} IS NULL OR {} BETWEEN {} AND {}",
            column, column, MIN_MOOD, MAX_MOOD
        );
        if !ddl.contains(&check) {
            return Err(AppError::Schema(format!(
                "mood_entries.{} is not range checked",
                column
            )));
        }
    }

    Ok(())
}
