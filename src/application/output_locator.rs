use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{AppError, Result};
use crate::engine::FetchOutcome;
use crate::utils::restrict_filename;

const AUDIO_EXTENSION: &str = "mp3";

/// Find the MP3 a finished engine run produced in `output_directory`.
///
/// The path yt-dlp reports after moving the file is trusted first. Then the
/// planned filename with an `.mp3` extension. As a last resort the folder is
/// scanned for an MP3 whose name contains the video title.
pub fn locate_output(output_directory: &Path, outcome: &FetchOutcome) -> Result<PathBuf> {
    if let Some(reported) = &outcome.reported_path {
        let reported = absolutize(output_directory, reported);
        if reported.is_file() {
            return Ok(reported);
        }
        warn!(path = %reported.display(), "reported output file does not exist");
    }

    if let Some(expected) = &outcome.expected_path {
        let expected = absolutize(output_directory, expected).with_extension(AUDIO_EXTENSION);
        if expected.is_file() {
            return Ok(expected);
        }
        debug!(path = %expected.display(), "expected output file does not exist");
    }

    if let Some(title) = outcome.title.as_deref() {
        if let Some(found) = scan_for_title(output_directory, title) {
            warn!(path = %found.display(), "located output by scanning the folder");
            return Ok(found);
        }
    }

    Err(AppError::OutputMissing)
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn scan_for_title(dir: &Path, title: &str) -> Option<PathBuf> {
    let restricted = restrict_filename(title);
    let needles: Vec<&str> = [title.trim(), restricted.as_str()]
        .into_iter()
        .filter(|needle| !needle.is_empty())
        .collect();
    if needles.is_empty() {
        return None;
    }

    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION))
        })
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| needles.iter().any(|needle| name.contains(needle)))
        })
        .collect();

    matches.sort();
    matches.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"ID3").unwrap();
    }

    #[test]
    fn test_reported_path_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        let reported = dir.path().join("Reported.mp3");
        let expected = dir.path().join("Expected.webm");
        touch(&reported);
        touch(&expected.with_extension("mp3"));

        let outcome = FetchOutcome {
            title: Some("Expected".to_string()),
            expected_path: Some(expected),
            reported_path: Some(reported.clone()),
        };
        assert_eq!(locate_output(dir.path(), &outcome).unwrap(), reported);
    }

    #[test]
    fn test_relative_reported_path_is_resolved_against_folder() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Song.mp3"));

        let outcome = FetchOutcome {
            reported_path: Some(PathBuf::from("Song.mp3")),
            ..FetchOutcome::default()
        };
        assert_eq!(
            locate_output(dir.path(), &outcome).unwrap(),
            dir.path().join("Song.mp3")
        );
    }

    #[test]
    fn test_expected_path_with_mp3_extension() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("Some_Title.webm");
        touch(&expected.with_extension("mp3"));

        let outcome = FetchOutcome {
            title: Some("Some Title".to_string()),
            expected_path: Some(expected.clone()),
            reported_path: Some(dir.path().join("missing.mp3")),
        };
        assert_eq!(
            locate_output(dir.path(), &outcome).unwrap(),
            expected.with_extension("mp3")
        );
    }

    #[test]
    fn test_scan_matches_raw_or_restricted_title() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Some_Title.m4a"));
        touch(&dir.path().join("Unrelated.mp3"));
        touch(&dir.path().join("Some_Title.mp3"));

        let outcome = FetchOutcome {
            title: Some("Some Title".to_string()),
            ..FetchOutcome::default()
        };
        assert_eq!(
            locate_output(dir.path(), &outcome).unwrap(),
            dir.path().join("Some_Title.mp3")
        );
    }

    #[test]
    fn test_nothing_found_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Unrelated.mp3"));

        let outcome = FetchOutcome {
            title: Some("Some Title".to_string()),
            expected_path: Some(dir.path().join("Some_Title.webm")),
            reported_path: None,
        };
        assert!(matches!(
            locate_output(dir.path(), &outcome),
            Err(AppError::OutputMissing)
        ));
        assert!(matches!(
            locate_output(dir.path(), &FetchOutcome::default()),
            Err(AppError::OutputMissing)
        ));
    }
}
