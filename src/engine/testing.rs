//! Scripted engine used by worker and app tests.

use std::fs;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use super::models::{EngineEvent, FetchOutcome, FetchRequest, PostprocessRecord, ProgressRecord};
use super::AudioEngine;
use crate::domain::{AppError, Result};
use crate::utils::restrict_filename;

#[derive(Clone)]
pub enum Script {
    /// Emit progress, write `<title>.mp3`, report its path
    Succeed { title: String },
    /// Like `Succeed` but without reporting a final path
    SucceedUnreported { title: String },
    /// Download completes, then conversion fails
    FailDuringTranscode,
    /// Block until the gate receives a value, then succeed
    Gated {
        title: String,
        gate: Arc<Mutex<Receiver<()>>>,
    },
    /// Emit `count` progress events as fast as possible, then succeed
    Burst { title: String, count: usize },
    Panic,
}

#[derive(Clone)]
pub struct FakeEngine {
    script: Script,
}

impl FakeEngine {
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    pub fn succeeding(title: &str) -> Self {
        Self::new(Script::Succeed {
            title: title.to_string(),
        })
    }
}

pub fn downloading(downloaded: f64, total: f64) -> EngineEvent {
    EngineEvent::Download(ProgressRecord {
        status: "downloading".to_string(),
        downloaded_bytes: Some(downloaded),
        total_bytes: Some(total),
        total_bytes_estimate: None,
        percent_str: Some(format!("{:.1}%", downloaded / total * 100.0)),
    })
}

fn postprocess_started() -> EngineEvent {
    EngineEvent::Postprocess(PostprocessRecord {
        status: "started".to_string(),
        postprocessor: Some("ExtractAudio".to_string()),
    })
}

fn write_mp3(request: &FetchRequest, title: &str, report: bool) -> Result<FetchOutcome> {
    let stem = restrict_filename(title);
    let path = request.output_directory.join(format!("{stem}.mp3"));
    fs::write(&path, b"ID3").map_err(|e| AppError::Io(e.to_string()))?;
    Ok(FetchOutcome {
        title: Some(title.to_string()),
        expected_path: Some(request.output_directory.join(format!("{stem}.webm"))),
        reported_path: report.then_some(path),
    })
}

impl AudioEngine for FakeEngine {
    fn fetch<F>(&self, request: &FetchRequest, mut on_event: F) -> Result<FetchOutcome>
    where
        F: FnMut(EngineEvent),
    {
        match &self.script {
            Script::Succeed { title } | Script::SucceedUnreported { title } => {
                for step in 0..=4 {
                    on_event(downloading(f64::from(step) * 25.0, 100.0));
                }
                on_event(postprocess_started());
                let report = matches!(self.script, Script::Succeed { .. });
                write_mp3(request, title, report)
            }
            Script::FailDuringTranscode => {
                on_event(downloading(100.0, 100.0));
                on_event(postprocess_started());
                Err(AppError::EngineFailed {
                    code: Some(1),
                    detail: "ERROR: Postprocessing: audio conversion failed".to_string(),
                })
            }
            Script::Gated { title, gate } => {
                on_event(downloading(10.0, 100.0));
                if let Ok(rx) = gate.lock() {
                    let _ = rx.recv();
                }
                write_mp3(request, title, true)
            }
            Script::Burst { title, count } => {
                for i in 0..*count {
                    on_event(downloading(i as f64, *count as f64));
                }
                write_mp3(request, title, true)
            }
            Script::Panic => panic!("engine blew up"),
        }
    }
}
