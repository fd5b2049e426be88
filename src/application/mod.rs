pub mod job_worker;
pub mod output_locator;
pub mod relay;

pub use job_worker::{JobWorker, WorkerState};
