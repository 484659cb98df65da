//! Metrics preferences: read a snapshot, commit a snapshot atomically.

use anyhow::{Context, Result};
use sqlx::Row;

use super::db::StateDb;
use super::types::{MetricsPrefs, PREF_LAST_ENQUEUE_TIME};

impl StateDb {
    /// Read the current metrics snapshot. Unknown keys are ignored.
    pub async fn read_metrics(&self) -> Result<MetricsPrefs> {
        let rows = sqlx::query(r#"SELECT key, value FROM prefs"#)
            .fetch_all(&self.pool)
            .await
            .context("read metrics prefs")?;

        let mut metrics = MetricsPrefs::default();
        for row in rows {
            let key: String = row.get("key");
            let value: i64 = row.get("value");
            metrics.set(&key, Some(value));
        }
        Ok(metrics)
    }

    /// Replace every metrics key with `metrics` in one transaction: set fields are
    /// upserted, unset fields are deleted.
    pub async fn write_metrics(&self, metrics: &MetricsPrefs) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in metrics.entries() {
            match value {
                Some(v) => {
                    sqlx::query(
                        r#"
                        INSERT INTO prefs (key, value) VALUES (?1, ?2)
                        ON CONFLICT(key) DO UPDATE SET value = excluded.value
                        "#,
                    )
                    .bind(key)
                    .bind(v)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(r#"DELETE FROM prefs WHERE key = ?1"#)
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await.context("commit metrics prefs")?;
        Ok(())
    }

    /// Record when the fetch job was last enqueued, leaving other keys alone.
    pub async fn set_last_enqueue_time(&self, at_millis: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prefs (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(PREF_LAST_ENQUEUE_TIME)
        .bind(at_millis)
        .execute(&self.pool)
        .await
        .context("write last enqueue time")?;
        Ok(())
    }
}
