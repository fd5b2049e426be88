pub mod models;
pub mod tools;
pub mod ytdlp;

#[cfg(test)]
pub mod testing;

pub use models::{EngineConfig, EngineEvent, FetchOutcome, FetchRequest};
pub use ytdlp::YtDlpEngine;

use std::path::Path;

use crate::domain::Result;

/// External fetch/transcode engine. Called once per job from the worker
/// thread; `on_event` receives progress as it happens.
pub trait AudioEngine: Send + 'static {
    fn fetch<F>(&self, request: &FetchRequest, on_event: F) -> Result<FetchOutcome>
    where
        F: FnMut(EngineEvent);
}

impl EngineConfig {
    /// Resolve yt-dlp and ffmpeg relative to the application directory
    pub fn discover(app_dir: &Path) -> Self {
        Self {
            program: tools::locate_ytdlp(app_dir),
            ffmpeg_location: tools::locate_ffmpeg(app_dir),
            ..Self::default()
        }
    }
}
