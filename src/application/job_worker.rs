use std::path::Path;
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::output_locator::locate_output;
use super::relay::{ProgressRelay, ProgressSender};
use crate::domain::{AppError, Job, JobPhase, ProgressMessage, Result};
use crate::engine::{AudioEngine, EngineEvent, FetchRequest};
use crate::utils::describe_source;

pub const CONVERTING_LABEL: &str = "Converting to MP3...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Finished,
    Failed,
}

/// Runs at most one job at a time on a background thread and relays its
/// progress back to the UI.
pub struct JobWorker<E> {
    engine: E,
    relay: ProgressRelay,
    job: Option<Job>,
    handle: Option<JoinHandle<()>>,
}

impl<E: AudioEngine + Clone> JobWorker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            relay: ProgressRelay::new(),
            job: None,
            handle: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        match self.job.as_ref().map(|job| job.phase) {
            None => WorkerState::Idle,
            Some(JobPhase::Finished) => WorkerState::Finished,
            Some(JobPhase::Failed) => WorkerState::Failed,
            Some(_) => WorkerState::Running,
        }
    }

    /// True from `start` until the terminal message is acknowledged
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Validate the request and spawn the worker thread. Nothing changes
    /// when this returns an error.
    pub fn start(&mut self, url: &str, output_directory: &Path) -> Result<()> {
        if self.job.is_some() {
            return Err(AppError::JobInProgress);
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::EmptyUrl);
        }
        if !output_directory.is_dir() {
            return Err(AppError::InvalidDirectory(output_directory.to_path_buf()));
        }

        let request = FetchRequest {
            url: url.to_string(),
            output_directory: output_directory.to_path_buf(),
        };
        let engine = self.engine.clone();
        let sender = self.relay.sender();

        let handle = thread::Builder::new()
            .name("mp3-job".to_string())
            .spawn(move || run_job(&engine, &request, &sender))
            .map_err(|e| AppError::Io(format!("could not spawn worker thread: {e}")))?;

        info!(
            source = %describe_source(url),
            output = %output_directory.display(),
            "job started"
        );
        self.job = Some(Job::new(url.to_string(), output_directory.to_path_buf()));
        self.handle = Some(handle);
        Ok(())
    }

    /// Drain the relay and fold the messages into the current job
    pub fn poll(&mut self) -> Vec<ProgressMessage> {
        // Checked before draining so a thread that exited has already
        // queued everything it will ever send.
        let worker_exited = self.handle.as_ref().is_some_and(JoinHandle::is_finished);
        let mut messages = self.relay.drain();

        if let Some(job) = self.job.as_mut() {
            for message in &messages {
                job.apply(message);
            }

            if worker_exited && !job.phase.is_terminal() {
                error!("worker thread exited without reporting a result");
                let lost = ProgressMessage::Error {
                    message: "The download worker stopped unexpectedly.".to_string(),
                };
                job.apply(&lost);
                messages.push(lost);
            }
        }

        messages
    }

    /// Forget a finished or failed job and return to idle
    pub fn acknowledge(&mut self) -> Option<Job> {
        if !self.job.as_ref().is_some_and(|job| job.phase.is_terminal()) {
            return None;
        }

        if let Some(handle) = self.handle.take() {
            // The thread sends its terminal message last; if it has not
            // returned yet it is left to finish on its own.
            if handle.is_finished() && handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }

        self.job.take()
    }
}

/// Map raw engine progress to what the UI shows. Download `finished` and
/// `error` records are dropped: the worker sends the single terminal
/// message itself once the engine returns.
pub fn progress_message_for(event: &EngineEvent) -> Option<ProgressMessage> {
    match event {
        EngineEvent::Download(record) if record.status == "downloading" => {
            Some(ProgressMessage::Downloading {
                percent: record.percent(),
                label: record.label(),
            })
        }
        EngineEvent::Download(record) if record.status == "error" => {
            warn!("engine reported a download error");
            None
        }
        EngineEvent::Postprocess(record) if record.status == "started" => {
            Some(ProgressMessage::Postprocessing {
                label: CONVERTING_LABEL.to_string(),
            })
        }
        _ => None,
    }
}

fn run_job<E: AudioEngine>(engine: &E, request: &FetchRequest, sender: &ProgressSender) {
    let result = engine
        .fetch(request, |event| {
            if let Some(message) = progress_message_for(&event) {
                sender.send(message);
            }
        })
        .and_then(|outcome| locate_output(&request.output_directory, &outcome));

    let message = match result {
        Ok(path) => {
            info!(path = %path.display(), "job finished");
            ProgressMessage::Finished { path }
        }
        Err(e) => {
            error!(error = %e, "job failed");
            ProgressMessage::Error {
                message: e.to_string(),
            }
        }
    };

    if !sender.send(message) {
        warn!("UI went away before the job result could be delivered");
    }
}
