pub mod error;
pub mod model;

pub use error::{AppError, Result};
pub use model::{Job, JobPhase, ProgressMessage};
