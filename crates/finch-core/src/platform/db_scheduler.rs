//! Persistent job scheduler over the state DB.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::clock::Clock;
use crate::state_db::{JobDescriptor, JobId, StateDb};

use super::JobScheduler;

pub struct DbJobScheduler {
    db: StateDb,
    clock: Arc<dyn Clock>,
}

impl DbJobScheduler {
    pub fn new(db: StateDb, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl JobScheduler for DbJobScheduler {
    async fn schedule(&self, desc: JobDescriptor) -> Result<JobDescriptor> {
        self.db.put_pending_job(&desc, self.clock.now_millis()).await
    }

    async fn get_pending(&self, job_id: JobId) -> Result<Option<JobDescriptor>> {
        self.db.get_pending_job(job_id).await
    }

    async fn cancel(&self, job_id: JobId) -> Result<bool> {
        self.db.remove_pending_job(job_id).await
    }

    async fn take_ready(&self, job_id: JobId, now: i64) -> Result<Option<JobDescriptor>> {
        self.db.take_ready_job(job_id, now).await
    }
}
