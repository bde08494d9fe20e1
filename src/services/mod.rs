pub mod job_queue;
pub mod job_store;
pub mod transformer;
pub mod worker;

pub use job_queue::{JobQueue, QueueError};
pub use job_store::{InMemoryJobStore, JobStore, OutcomeCounts, StoreError};
pub use transformer::ImageTransformer;
pub use worker::Worker;
