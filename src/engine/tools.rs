use std::path::{Path, PathBuf};

use tracing::{info, warn};

const FFMPEG_BIN_DIR: &str = "ffmpeg_bin";
const YTDLP_BIN_DIR: &str = "yt-dlp";

fn executable_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

/// Directory next to the executable where a bundled ffmpeg is expected
pub fn bundled_ffmpeg_dir(app_dir: &Path) -> PathBuf {
    app_dir.join(FFMPEG_BIN_DIR)
}

/// Bundled ffmpeg directory if it actually contains the binary.
/// A missing binary is only a warning: yt-dlp will search PATH instead.
pub fn locate_ffmpeg(app_dir: &Path) -> Option<PathBuf> {
    let dir = bundled_ffmpeg_dir(app_dir);
    if dir.join(executable_name("ffmpeg")).is_file() {
        info!(path = %dir.display(), "using bundled ffmpeg");
        Some(dir)
    } else {
        warn!(
            path = %dir.display(),
            "ffmpeg not found in bundled folder, yt-dlp will look for it on PATH"
        );
        None
    }
}

/// Bundled yt-dlp if present, otherwise the bare name for a PATH lookup
pub fn locate_ytdlp(app_dir: &Path) -> PathBuf {
    let bundled = app_dir.join(YTDLP_BIN_DIR).join(executable_name("yt-dlp"));
    if bundled.is_file() {
        info!(path = %bundled.display(), "using bundled yt-dlp");
        bundled
    } else {
        PathBuf::from(executable_name("yt-dlp"))
    }
}
