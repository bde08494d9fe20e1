//! FIFO queue of pending jobs.
//!
//! Submission pushes to the tail, the worker pops from the head. Both sides
//! take the same short-lived lock, and a job leaves the queue the moment it
//! is popped, so concurrent drains never see the same job twice.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

use crate::models::{Job, JobId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job {0} is already queued")]
    Duplicate(JobId),
}

#[derive(Default)]
struct Pending {
    jobs: VecDeque<Job>,
    /// Ids of everything in `jobs`
    ids: HashSet<JobId>,
}

pub struct JobQueue {
    pending: Mutex<Pending>,
    /// Signalled on every push; wakes the worker without polling
    enqueued: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            enqueued: Notify::new(),
        }
    }

    // Poisoning is ignored: every critical section is a single push or pop
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a job and wake the worker. Never waits on processing.
    pub fn push(&self, job: Job) -> Result<JobId, QueueError> {
        let id = job.id;
        {
            let mut pending = self.lock();
            if !pending.ids.insert(id) {
                return Err(QueueError::Duplicate(id));
            }
            pending.jobs.push_back(job);
        }
        self.enqueued.notify_one();
        Ok(id)
    }

    /// Remove and return the oldest job
    pub fn pop(&self) -> Option<Job> {
        let mut pending = self.lock();
        let job = pending.jobs.pop_front()?;
        pending.ids.remove(&job.id);
        Some(job)
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.lock().ids.contains(job_id)
    }

    /// Wait until a push happens. A push made while nobody was waiting is
    /// remembered, so the next call returns immediately.
    pub async fn notified(&self) {
        self.enqueued.notified().await;
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
