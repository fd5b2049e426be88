use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Please enter the URL of a YouTube video.")]
    EmptyUrl,

    #[error("Please choose a valid output folder ({}).", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("A download is already in progress")]
    JobInProgress,

    #[error("Could not read the configuration file: {0}")]
    ConfigRead(String),

    #[error("Could not parse the configuration file: {0}")]
    ConfigFormat(String),

    #[error("Could not write the configuration file: {0}")]
    ConfigWrite(String),

    #[error("Could not start yt-dlp: {0}")]
    EngineSpawn(String),

    #[error("yt-dlp failed (code={code:?}): {detail}")]
    EngineFailed { code: Option<i32>, detail: String },

    #[error("MP3 file not found after download and conversion.")]
    OutputMissing,

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Validation errors are raised before any job starts
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::EmptyUrl | AppError::InvalidDirectory(_) | AppError::JobInProgress
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
