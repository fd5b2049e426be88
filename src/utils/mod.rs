use std::path::{Path, PathBuf};

use url::Url;

/// Directory holding the running executable, or the working directory
/// when that cannot be determined
pub fn application_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// True when `path` is an existing directory we can create files in
pub fn is_writable_dir(path: &Path) -> bool {
    path.is_dir()
        && tempfile::Builder::new()
            .prefix(".mp3dl-probe")
            .tempfile_in(path)
            .is_ok()
}

/// Approximate the ASCII-only names yt-dlp produces with `--restrict-filenames`
pub fn restrict_filename(filename: &str) -> String {
    let mut restricted = String::with_capacity(filename.len());
    for c in filename.chars() {
        let mapped = match c {
            c if c.is_ascii_alphanumeric() => c,
            '-' | '.' => c,
            _ => '_',
        };
        if mapped == '_' && restricted.ends_with('_') {
            continue;
        }
        restricted.push(mapped);
    }
    restricted.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Host part of a source URL, safe to put in log lines
pub fn describe_source(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => url
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.scheme().to_string()),
        Err(_) => "<unparsed url>".to_string(),
    }
}
