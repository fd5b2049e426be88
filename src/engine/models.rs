use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").ok());

/// What to fetch and where to put it
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub output_directory: PathBuf,
}

/// What yt-dlp told us about the file it produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub title: Option<String>,
    /// Filename yt-dlp planned before post-processing (original extension)
    pub expected_path: Option<PathBuf>,
    /// Final path after the audio was extracted and moved into place
    pub reported_path: Option<PathBuf>,
}

/// Download progress record, printed by yt-dlp as `%(progress)j`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProgressRecord {
    #[serde(default)]
    pub status: String,
    pub downloaded_bytes: Option<f64>,
    pub total_bytes: Option<f64>,
    pub total_bytes_estimate: Option<f64>,
    #[serde(rename = "_percent_str")]
    pub percent_str: Option<String>,
}

impl ProgressRecord {
    /// 0.0 to 100.0; falls back to the size estimate, then to zero
    pub fn percent(&self) -> f32 {
        let downloaded = self.downloaded_bytes.filter(|d| *d > 0.0);
        let total = self
            .total_bytes
            .filter(|t| *t > 0.0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0));

        match (downloaded, total) {
            (Some(downloaded), Some(total)) => ((downloaded / total) * 100.0).clamp(0.0, 100.0) as f32,
            _ => 0.0,
        }
    }

    /// Human-readable percent string, "N/A" when yt-dlp had none
    pub fn label(&self) -> String {
        let raw = self.percent_str.as_deref().unwrap_or_default();
        let cleaned = match ANSI_ESCAPE.as_ref() {
            Some(re) => re.replace_all(raw, "").trim().to_string(),
            None => raw.trim().to_string(),
        };

        if cleaned.is_empty() || cleaned == "NA" {
            "N/A".to_string()
        } else {
            cleaned
        }
    }
}

/// Post-processor hook record (`started` / `processing` / `finished`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PostprocessRecord {
    #[serde(default)]
    pub status: String,
    pub postprocessor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Download(ProgressRecord),
    Postprocess(PostprocessRecord),
}

/// Configuration for the yt-dlp engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub program: PathBuf,
    /// Directory holding a bundled ffmpeg; `None` lets yt-dlp search PATH
    pub ffmpeg_location: Option<PathBuf>,
    pub audio_format: String,
    pub audio_quality: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(downloaded: Option<f64>, total: Option<f64>, estimate: Option<f64>) -> ProgressRecord {
        ProgressRecord {
            status: "downloading".to_string(),
            downloaded_bytes: downloaded,
            total_bytes: total,
            total_bytes_estimate: estimate,
            percent_str: None,
        }
    }

    #[test]
    fn test_percent_prefers_total_bytes() {
        let r = record(Some(250.0), Some(1000.0), Some(500.0));
        assert_eq!(r.percent(), 25.0);
    }

    #[test]
    fn test_percent_falls_back_to_estimate() {
        assert_eq!(record(Some(250.0), None, Some(500.0)).percent(), 50.0);
        assert_eq!(record(Some(250.0), Some(0.0), Some(500.0)).percent(), 50.0);
    }

    #[test]
    fn test_percent_unknown_is_zero() {
        assert_eq!(record(Some(250.0), None, None).percent(), 0.0);
        assert_eq!(record(None, Some(1000.0), None).percent(), 0.0);
        assert_eq!(record(Some(0.0), Some(1000.0), None).percent(), 0.0);
    }

    #[test]
    fn test_label_strips_color_codes() {
        let mut r = record(None, None, None);
        assert_eq!(r.label(), "N/A");

        r.percent_str = Some("\u{1b}[0;94m 42.0%\u{1b}[0m".to_string());
        assert_eq!(r.label(), "42.0%");

        r.percent_str = Some("NA".to_string());
        assert_eq!(r.label(), "N/A");
    }

    #[test]
    fn test_deserialize_progress_json() {
        let json = r#"{"status": "downloading", "downloaded_bytes": 1024, "total_bytes": null,
            "total_bytes_estimate": 4096.0, "_percent_str": " 25.0%", "speed": 12.5, "eta": 3}"#;
        let r: ProgressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.status, "downloading");
        assert_eq!(r.downloaded_bytes, Some(1024.0));
        assert_eq!(r.total_bytes, None);
        assert_eq!(r.percent(), 25.0);
        assert_eq!(r.label(), "25.0%");
    }
}
