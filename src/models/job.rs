use chrono::{DateTime, Utc};
use palette_remap::Palette;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Job identifier (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name of the converted image for this job
    pub fn output_file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a job: `Pending -> Running -> Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A queued conversion request
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Uploaded source image, consumed by the worker
    pub source_path: PathBuf,
    pub palette: Palette,
    pub blend: bool,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, source_path: impl Into<PathBuf>, palette: Palette, blend: bool) -> Self {
        Self {
            id,
            source_path: source_path.into(),
            palette,
            blend,
            status: JobStatus::Pending,
            submitted_at: Utc::now(),
        }
    }

    /// Move a pending job to `Running`. Returns `false` if it was not pending.
    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Running;
        true
    }

    /// Move a running job to its terminal state and build the outcome to record.
    pub fn finish(&mut self, result: Result<PathBuf, String>) -> JobOutcome {
        debug_assert_eq!(self.status, JobStatus::Running);
        match result {
            Ok(output_path) => {
                self.status = JobStatus::Completed;
                JobOutcome::Completed { output_path }
            }
            Err(error) => {
                self.status = JobStatus::Failed;
                JobOutcome::Failed { error }
            }
        }
    }
}

/// Terminal result of a job, as kept in the result store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { output_path: PathBuf },
    Failed { error: String },
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            JobOutcome::Completed { output_path } => Some(output_path),
            JobOutcome::Failed { .. } => None,
        }
    }
}
