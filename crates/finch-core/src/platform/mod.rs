//! Stand-in for the OS job service.
//!
//! The fetch scheduler only sees the `JobScheduler` trait. `DbJobScheduler`
//! keeps descriptors in the state DB so they survive restarts; `JobRunner`
//! activates a ready descriptor when device conditions hold, and reschedules
//! it with backoff when the activation asks for it.

mod backoff;
mod conditions;
mod control;
mod db_scheduler;
mod memory;
mod runner;

use anyhow::Result;
use async_trait::async_trait;

use crate::state_db::{JobDescriptor, JobId};

pub use backoff::BackoffPolicy;
pub use conditions::{AlwaysCharging, DeviceConditions, SysfsPower};
pub use control::JobControl;
pub use db_scheduler::DbJobScheduler;
pub use memory::InMemoryJobScheduler;
pub use runner::{JobRunner, RunResult};

/// Minimal platform job scheduler surface.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Submit a descriptor, replacing any pending one with the same job id.
    /// Returns the descriptor as stored (with platform-assigned fields).
    async fn schedule(&self, desc: JobDescriptor) -> Result<JobDescriptor>;

    /// Pending descriptor for `job_id`, if any.
    async fn get_pending(&self, job_id: JobId) -> Result<Option<JobDescriptor>>;

    /// Drop the pending descriptor. Returns true if one existed.
    async fn cancel(&self, job_id: JobId) -> Result<bool>;

    /// Activation: remove and return the descriptor if it is ready at `now`.
    async fn take_ready(&self, job_id: JobId, now: i64) -> Result<Option<JobDescriptor>>;
}
