//! Descriptor write operations: put (replace), remove, take-ready.

use anyhow::Result;
use sqlx::Row;

use super::super::db::StateDb;
use super::super::types::{JobDescriptor, JobId};
use super::{descriptor_from_row, SELECT_COLUMNS};

impl StateDb {
    /// Insert or replace the descriptor for its job id. Assigns `scheduled_at = now`
    /// and a generation one above the replaced row's (1 for a fresh row).
    /// Returns the stored descriptor.
    pub async fn put_pending_job(&self, desc: &JobDescriptor, now: i64) -> Result<JobDescriptor> {
        let extras_json = serde_json::to_string(&desc.extras)?;
        let mut tx = self.pool.begin().await?;
        let previous: Option<i64> =
            sqlx::query(r#"SELECT generation FROM pending_jobs WHERE job_id = ?1"#)
                .bind(desc.job_id)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get("generation"));
        let generation = previous.unwrap_or(0) + 1;

        sqlx::query(
            r#"
            INSERT INTO pending_jobs (
                job_id, network, requires_charging, extras_json,
                not_before, scheduled_at, generation
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(job_id) DO UPDATE SET
                network = excluded.network,
                requires_charging = excluded.requires_charging,
                extras_json = excluded.extras_json,
                not_before = excluded.not_before,
                scheduled_at = excluded.scheduled_at,
                generation = excluded.generation
            "#,
        )
        .bind(desc.job_id)
        .bind(desc.network.as_str())
        .bind(desc.requires_charging as i64)
        .bind(extras_json)
        .bind(desc.not_before)
        .bind(now)
        .bind(generation)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(JobDescriptor {
            generation,
            scheduled_at: now,
            ..desc.clone()
        })
    }

    /// Remove the descriptor for `job_id`. Returns true if one existed.
    pub async fn remove_pending_job(&self, job_id: JobId) -> Result<bool> {
        let r = sqlx::query(r#"DELETE FROM pending_jobs WHERE job_id = ?1"#)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }

    /// Atomically remove and return the descriptor if it is ready at `now`.
    /// Used on activation so two runners never start the same job.
    pub async fn take_ready_job(&self, job_id: JobId, now: i64) -> Result<Option<JobDescriptor>> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM pending_jobs \
             WHERE job_id = ?1 AND (not_before IS NULL OR not_before <= ?2)"
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let desc = descriptor_from_row(&row)?;
        sqlx::query(r#"DELETE FROM pending_jobs WHERE job_id = ?1"#)
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(desc))
    }
}
