//! SQLite-backed ingredient store.
//!
//! Each user's set is stored as one row per ingredient. Adds run as
//! `INSERT … ON CONFLICT DO NOTHING` inside a transaction, so concurrent adds
//! for the same user never overwrite each other.

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use kondate_core::{
    config::MemoryConfig,
    error::KondateError,
    ingredients::{normalize_key, IngredientSet},
    shellexpand,
    traits::IngredientStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Persistent ingredient store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store, running migrations on first use.
    pub async fn new(config: &MemoryConfig) -> Result<Self, KondateError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KondateError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| KondateError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| KondateError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Ingredient store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, KondateError> {
        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KondateError::Memory(format!("pragma failed: {e}")))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KondateError::Memory(format!("pragma failed: {e}")))?;

        Ok((page_count * page_size) as u64)
    }

    /// Number of users with at least one stored ingredient.
    pub async fn user_count(&self) -> Result<i64, KondateError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT user_id) FROM ingredients")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KondateError::Memory(format!("count failed: {e}")))?;
        Ok(count)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), KondateError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| KondateError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[(
            "001_ingredients",
            include_str!("../../migrations/001_ingredients.sql"),
        )];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        KondateError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| KondateError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    KondateError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, Sqlite>, KondateError> {
        self.pool
            .begin()
            .await
            .map_err(|e| KondateError::Memory(format!("failed to begin transaction: {e}")))
    }
}

async fn select_set<'e, E>(executor: E, user_id: &str) -> Result<IngredientSet, KondateError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT display FROM ingredients WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(executor)
            .await
            .map_err(|e| KondateError::Memory(format!("query failed: {e}")))?;

    Ok(IngredientSet::from_items(rows.into_iter().map(|(d,)| d)))
}

#[async_trait]
impl IngredientStore for Store {
    async fn add(&self, user_id: &str, items: &[String]) -> Result<IngredientSet, KondateError> {
        let incoming = IngredientSet::from_items(items);
        if incoming.is_empty() {
            return self.list(user_id).await;
        }

        let mut tx = self.begin().await?;
        let mut inserted = 0u64;
        for item in incoming.items() {
            let result = sqlx::query(
                "INSERT INTO ingredients (user_id, name_key, display) VALUES (?, ?, ?) \
                 ON CONFLICT(user_id, name_key) DO NOTHING",
            )
            .bind(user_id)
            .bind(normalize_key(item))
            .bind(item)
            .execute(&mut *tx)
            .await
            .map_err(|e| KondateError::Memory(format!("insert ingredient failed: {e}")))?;
            inserted += result.rows_affected();
        }
        let set = select_set(&mut *tx, user_id).await?;
        tx.commit()
            .await
            .map_err(|e| KondateError::Memory(format!("commit failed: {e}")))?;

        debug!(user_id, inserted, total = set.len(), "ingredients added");
        Ok(set)
    }

    async fn list(&self, user_id: &str) -> Result<IngredientSet, KondateError> {
        select_set(&self.pool, user_id).await
    }

    async fn clear(&self, user_id: &str) -> Result<(), KondateError> {
        let result = sqlx::query("DELETE FROM ingredients WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| KondateError::Memory(format!("delete failed: {e}")))?;

        debug!(user_id, removed = result.rows_affected(), "ingredients cleared");
        Ok(())
    }
}
