//! Background worker draining the job queue.
//!
//! One worker processes jobs strictly in FIFO order, one at a time. It sleeps
//! until the queue signals a push or the poll interval elapses, whichever
//! comes first, and stops once the shutdown channel flips to `true`.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::TransformError;
use crate::models::Job;
use crate::services::{ImageTransformer, JobQueue, JobStore};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub struct Worker {
    queue: Arc<JobQueue>,
    store: Arc<dyn JobStore>,
    transformer: Arc<ImageTransformer>,
    poll_interval: Duration,
    job_timeout: Option<Duration>,
}

impl Worker {
    pub fn new(
        queue: Arc<JobQueue>,
        store: Arc<dyn JobStore>,
        transformer: Arc<ImageTransformer>,
    ) -> Self {
        Self {
            queue,
            store,
            transformer,
            poll_interval: DEFAULT_POLL_INTERVAL,
            job_timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound each conversion. `None` lets a job run as long as it needs.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Process queued jobs until the queue is empty. Returns how many ran.
    ///
    /// Each job is removed from the queue before it is processed, so
    /// overlapping calls never handle the same job twice.
    pub async fn drain(&self) -> usize {
        let mut processed = 0;
        while let Some(job) = self.queue.pop() {
            self.process(job).await;
            processed += 1;
        }
        processed
    }

    async fn process(&self, mut job: Job) {
        if !job.start() {
            tracing::warn!(job_id = %job.id, status = ?job.status, "Skipping job that is not pending");
            return;
        }

        tracing::debug!(
            job_id = %job.id,
            source = %job.source_path.display(),
            colors = job.palette.len(),
            blend = job.blend,
            queued_ms = (Utc::now() - job.submitted_at).num_milliseconds().max(0),
            "Processing job"
        );
        let started = Instant::now();

        let result = match self.run_transform(&job).await {
            Ok(output_path) => {
                tracing::info!(
                    job_id = %job.id,
                    output = %output_path.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                );
                Ok(output_path)
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job failed"
                );
                Err(e.to_string())
            }
        };

        let outcome = job.finish(result);
        if let Err(e) = self.store.record(job.id, outcome).await {
            tracing::error!(job_id = %job.id, error = %e, "Failed to record job outcome");
        }
    }

    /// Run the conversion on the blocking pool. Returns only once the
    /// blocking task has finished, even after a timeout, so the next job
    /// never overlaps with this one.
    async fn run_transform(&self, job: &Job) -> Result<PathBuf, TransformError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut task = {
            let transformer = self.transformer.clone();
            let job = job.clone();
            let cancelled = cancelled.clone();
            tokio::task::spawn_blocking(move || transformer.transform(&job, &cancelled))
        };

        let joined = match self.job_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancelled.store(true, Ordering::Release);
                    tracing::warn!(
                        job_id = %job.id,
                        limit_ms = limit.as_millis() as u64,
                        "Job exceeded time limit, waiting for it to stop"
                    );
                    match task.await {
                        Ok(Err(TransformError::Cancelled)) => {
                            return Err(TransformError::Timeout { limit })
                        }
                        // Finished or failed on its own before seeing the flag
                        other => other,
                    }
                }
            },
            None => task.await,
        };

        joined.map_err(|e| TransformError::Task(e.to_string()))?
    }

    /// Worker loop. Runs until `shutdown` becomes `true` or its sender is
    /// dropped. A job already in progress is finished first.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            job_timeout = ?self.job_timeout,
            "Worker started"
        );

        loop {
            while !*shutdown.borrow() {
                let Some(job) = self.queue.pop() else {
                    break;
                };
                self.process(job).await;
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.queue.notified() => {}
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(pending = self.queue.len(), "Worker stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
