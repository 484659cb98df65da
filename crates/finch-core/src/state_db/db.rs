//! SQLite-backed state database.
//!
//! Handles connection and migrations. Prefs and job descriptor CRUD live in
//! `prefs` and `jobs`.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

use crate::config;

/// File name of the database under the state dir.
pub const STATE_DB_FILE_NAME: &str = "state.db";

/// Percent-encode a path for a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}?mode=rwc", out)
}

/// Handle to the state database: `~/.local/state/finch/state.db`.
#[derive(Clone)]
pub struct StateDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl StateDb {
    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(config::state_dir()?.join(STATE_DB_FILE_NAME)).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&path_to_sqlite_uri(path))
            .await?;
        let db = StateDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // `prefs` only ever holds set values; an absent row means unset.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prefs (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // At most one row per job id: scheduling replaces the row.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_jobs (
                job_id INTEGER PRIMARY KEY,
                network TEXT NOT NULL,
                requires_charging INTEGER NOT NULL,
                extras_json TEXT NOT NULL,
                not_before INTEGER,
                scheduled_at INTEGER NOT NULL,
                generation INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<StateDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = StateDb { pool };
    db.migrate().await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_uri_escapes_special_chars() {
        let uri = path_to_sqlite_uri(Path::new("/tmp/my state#1/state.db"));
        assert_eq!(uri, "sqlite:///tmp/my%20state%231/state.db?mode=rwc");
    }
}
