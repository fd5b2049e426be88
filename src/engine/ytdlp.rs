use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use tracing::{debug, info, warn};

use super::models::{
    EngineConfig, EngineEvent, FetchOutcome, FetchRequest, PostprocessRecord, ProgressRecord,
};
use super::AudioEngine;
use crate::domain::{AppError, Result};
use crate::utils::describe_source;

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

const PROGRESS_MARKER: &str = "MP3DL_PROGRESS";
const POSTPROCESS_MARKER: &str = "MP3DL_POSTPROCESS";
const TITLE_MARKER: &str = "MP3DL_TITLE";
const EXPECTED_MARKER: &str = "MP3DL_EXPECTED";
const FILE_MARKER: &str = "MP3DL_FILE";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// One machine-readable line of yt-dlp output
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLine {
    Event(EngineEvent),
    Title(String),
    Expected(PathBuf),
    Output(PathBuf),
}

/// Parse a line printed through our progress templates or `--print` markers.
/// Anything else (warnings, ffmpeg chatter) yields `None`.
pub fn parse_line(line: &str) -> Option<EngineLine> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        return match serde_json::from_str::<ProgressRecord>(rest.trim()) {
            Ok(record) => Some(EngineLine::Event(EngineEvent::Download(record))),
            Err(e) => {
                debug!(error = %e, "unparsable download progress line");
                None
            }
        };
    }
    if let Some(rest) = line.strip_prefix(POSTPROCESS_MARKER) {
        return match serde_json::from_str::<PostprocessRecord>(rest.trim()) {
            Ok(record) => Some(EngineLine::Event(EngineEvent::Postprocess(record))),
            Err(e) => {
                debug!(error = %e, "unparsable postprocess progress line");
                None
            }
        };
    }

    let marked = |marker: &str| {
        line.strip_prefix(marker)
            .map(str::trim)
            .filter(|rest| !rest.is_empty() && *rest != "NA")
            .map(str::to_string)
    };

    if let Some(title) = marked(TITLE_MARKER) {
        Some(EngineLine::Title(title))
    } else if let Some(path) = marked(EXPECTED_MARKER) {
        Some(EngineLine::Expected(PathBuf::from(path)))
    } else {
        marked(FILE_MARKER).map(|path| EngineLine::Output(PathBuf::from(path)))
    }
}

/// Runs the `yt-dlp` executable, which in turn drives ffmpeg for extraction
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    config: EngineConfig,
}

impl YtDlpEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let template = request.output_directory.join(OUTPUT_TEMPLATE);

        let mut args: Vec<String> = vec![
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
            "--restrict-filenames".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "--progress-template".to_string(),
            format!("download:{PROGRESS_MARKER} %(progress)j"),
            "--progress-template".to_string(),
            format!("postprocess:{POSTPROCESS_MARKER} %(progress)j"),
            "--print".to_string(),
            format!("before_dl:{TITLE_MARKER} %(title)s"),
            "--print".to_string(),
            format!("before_dl:{EXPECTED_MARKER} %(filename)s"),
            "--print".to_string(),
            format!("after_move:{FILE_MARKER} %(filepath)s"),
        ];

        if let Some(location) = &self.config.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().into_owned());
        }

        args.push("--".to_string());
        args.push(request.url.clone());
        args
    }
}

impl AudioEngine for YtDlpEngine {
    fn fetch<F>(&self, request: &FetchRequest, mut on_event: F) -> Result<FetchOutcome>
    where
        F: FnMut(EngineEvent),
    {
        let program = &self.config.program;
        info!(
            program = %program.display(),
            source = %describe_source(&request.url),
            output = %request.output_directory.display(),
            "starting yt-dlp"
        );

        let mut command = Command::new(program);
        command
            .args(self.build_args(request))
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command
            .spawn()
            .map_err(|e| AppError::EngineSpawn(format!("{}: {}", program.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::EngineSpawn("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::EngineSpawn("stderr was not captured".to_string()))?;

        // `--print` sends yt-dlp's screen output (and our progress lines) to
        // stderr, so both pipes are read and merged in arrival order.
        let (line_tx, line_rx) = mpsc::channel::<String>();
        let (outcome, failure_detail) = thread::scope(|scope| {
            let stdout_tx = line_tx.clone();
            scope.spawn(move || forward_lines(stdout, stdout_tx));
            scope.spawn(move || forward_lines(stderr, line_tx));

            let mut outcome = FetchOutcome::default();
            let mut last_error: Option<String> = None;
            let mut last_line: Option<String> = None;

            for line in line_rx {
                match parse_line(&line) {
                    Some(EngineLine::Event(event)) => on_event(event),
                    Some(EngineLine::Title(title)) => outcome.title = Some(title),
                    Some(EngineLine::Expected(path)) => outcome.expected_path = Some(path),
                    Some(EngineLine::Output(path)) => outcome.reported_path = Some(path),
                    None => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(line = trimmed, "yt-dlp");
                        if trimmed.starts_with("ERROR:") {
                            last_error = Some(trimmed.to_string());
                        }
                        last_line = Some(trimmed.to_string());
                    }
                }
            }

            (outcome, last_error.or(last_line))
        });

        let status = child
            .wait()
            .map_err(|e| AppError::Io(format!("waiting for yt-dlp: {e}")))?;

        if !status.success() {
            return Err(AppError::EngineFailed {
                code: status.code(),
                detail: failure_detail.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(outcome)
    }
}

fn forward_lines(reader: impl Read, tx: Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to read yt-dlp output");
                break;
            }
        }
    }
}
