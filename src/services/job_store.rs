use crate::models::{JobId, JobOutcome, JobStatus};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Outcome already recorded for job {0}")]
    AlreadyRecorded(JobId),
}

/// Totals of recorded outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OutcomeCounts {
    pub completed: usize,
    pub failed: usize,
}

/// Trait for terminal job outcome storage
///
/// Only the worker writes, once per job. Lookups return `None` both for ids
/// that were never submitted and for jobs that have not finished yet.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Store the terminal outcome of a job. A second write for the same id
    /// is rejected and the first outcome is kept.
    async fn record(&self, job_id: JobId, outcome: JobOutcome) -> Result<(), StoreError>;

    /// Find the outcome of a finished job
    async fn lookup(&self, job_id: &JobId) -> Option<JobOutcome>;

    /// Count recorded outcomes by status
    async fn counts(&self) -> OutcomeCounts;
}

/// In-memory outcome storage, lost on restart
pub struct InMemoryJobStore {
    outcomes: Arc<RwLock<HashMap<JobId, JobOutcome>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn record(&self, job_id: JobId, outcome: JobOutcome) -> Result<(), StoreError> {
        let mut outcomes = self.outcomes.write().await;
        if outcomes.contains_key(&job_id) {
            return Err(StoreError::AlreadyRecorded(job_id));
        }
        outcomes.insert(job_id, outcome);
        Ok(())
    }

    async fn lookup(&self, job_id: &JobId) -> Option<JobOutcome> {
        let outcomes = self.outcomes.read().await;
        outcomes.get(job_id).cloned()
    }

    async fn counts(&self) -> OutcomeCounts {
        let outcomes = self.outcomes.read().await;
        outcomes
            .values()
            .fold(OutcomeCounts::default(), |mut counts, outcome| {
                match outcome.status() {
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                    JobStatus::Pending | JobStatus::Running => {}
                }
                counts
            })
    }
}
