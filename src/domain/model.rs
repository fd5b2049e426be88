use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Queued,
    Downloading,
    Postprocessing,
    Finished,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Finished | JobPhase::Failed)
    }
}

/// One user-initiated request to turn a video URL into an MP3 file
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub source_url: String,
    pub output_directory: PathBuf,
    /// 0.0 to 100.0
    pub progress_percent: f32,
    pub phase: JobPhase,
}

impl Job {
    pub fn new(source_url: String, output_directory: PathBuf) -> Self {
        Self {
            source_url,
            output_directory,
            progress_percent: 0.0,
            phase: JobPhase::Queued,
        }
    }

    /// Fold a relayed message into the job's transient state
    pub fn apply(&mut self, message: &ProgressMessage) {
        match message {
            ProgressMessage::Downloading { percent, .. } => {
                self.progress_percent = percent.clamp(0.0, 100.0);
                self.phase = JobPhase::Downloading;
            }
            ProgressMessage::Postprocessing { .. } => {
                self.phase = JobPhase::Postprocessing;
            }
            ProgressMessage::Finished { .. } => {
                self.progress_percent = 100.0;
                self.phase = JobPhase::Finished;
            }
            ProgressMessage::Error { .. } => {
                self.progress_percent = 0.0;
                self.phase = JobPhase::Failed;
            }
        }
    }
}

/// Status update sent from the worker thread to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Downloading { percent: f32, label: String },
    Postprocessing { label: String },
    Finished { path: PathBuf },
    Error { message: String },
}

impl ProgressMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressMessage::Finished { .. } | ProgressMessage::Error { .. }
        )
    }
}
