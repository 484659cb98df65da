//! Stop signals for running activations and for the runner loop itself.
//!
//! The runner registers each activation and races it against the returned
//! notifier. `request_stop` (e.g. from `finch cancel` while a job runs) wakes
//! the runner, which drops the activation and reports `on_stop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Notify;

use crate::state_db::JobId;

#[derive(Default)]
pub struct JobControl {
    running: RwLock<HashMap<JobId, Arc<Notify>>>,
    shutdown: Notify,
    shutting_down: AtomicBool,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running activation; the notifier fires on `request_stop`.
    pub fn register(&self, job_id: JobId) -> Arc<Notify> {
        let stop = Arc::new(Notify::new());
        self.running.write().unwrap().insert(job_id, Arc::clone(&stop));
        stop
    }

    pub fn unregister(&self, job_id: JobId) {
        self.running.write().unwrap().remove(&job_id);
    }

    pub fn is_running(&self, job_id: JobId) -> bool {
        self.running.read().unwrap().contains_key(&job_id)
    }

    /// Ask a running activation to stop. Returns false if none is registered.
    pub fn request_stop(&self, job_id: JobId) -> bool {
        match self.running.read().unwrap().get(&job_id) {
            Some(stop) => {
                // notify_one stores a permit, so a stop issued before the runner
                // starts waiting is not lost.
                stop.notify_one();
                true
            }
            None => false,
        }
    }

    /// Stop the runner loop and every running activation.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        for stop in self.running.read().unwrap().values() {
            stop.notify_one();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Resolves once `shutdown` has been called.
    pub async fn wait_shutdown(&self) {
        let notified = self.shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_shutting_down() {
            return;
        }
        notified.await;
    }
}
