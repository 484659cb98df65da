//! In-process job scheduler: one slot per job id, nothing persisted.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::state_db::{JobDescriptor, JobId};

use super::JobScheduler;

pub struct InMemoryJobScheduler {
    slots: Mutex<HashMap<JobId, JobDescriptor>>,
    next_generation: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl InMemoryJobScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_generation: AtomicI64::new(1),
            clock,
        }
    }

    /// Drop every pending descriptor.
    pub fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    pub fn pending_count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

#[async_trait]
impl JobScheduler for InMemoryJobScheduler {
    async fn schedule(&self, mut desc: JobDescriptor) -> Result<JobDescriptor> {
        desc.generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        desc.scheduled_at = self.clock.now_millis();
        self.slots.lock().unwrap().insert(desc.job_id, desc.clone());
        Ok(desc)
    }

    async fn get_pending(&self, job_id: JobId) -> Result<Option<JobDescriptor>> {
        Ok(self.slots.lock().unwrap().get(&job_id).cloned())
    }

    async fn cancel(&self, job_id: JobId) -> Result<bool> {
        Ok(self.slots.lock().unwrap().remove(&job_id).is_some())
    }

    async fn take_ready(&self, job_id: JobId, now: i64) -> Result<Option<JobDescriptor>> {
        let mut slots = self.slots.lock().unwrap();
        let ready = slots.get(&job_id).is_some_and(|d| d.is_ready(now));
        Ok(if ready { slots.remove(&job_id) } else { None })
    }
}
