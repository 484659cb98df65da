//! Descriptor read operations.

use anyhow::Result;

use super::super::db::StateDb;
use super::super::types::{JobDescriptor, JobId};
use super::{descriptor_from_row, SELECT_COLUMNS};

impl StateDb {
    /// Pending descriptor for `job_id`, if any.
    pub async fn get_pending_job(&self, job_id: JobId) -> Result<Option<JobDescriptor>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM pending_jobs WHERE job_id = ?1");
        let row = sqlx::query(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(descriptor_from_row).transpose()
    }
}
