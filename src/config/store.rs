use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{AppError, Result};
use crate::utils::{application_dir, is_writable_dir};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_DOWNLOAD_SUBDIR: &str = "YouTube_MP3_Downloads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_directory: PathBuf,
}

/// On-disk layout: a single `[Settings]` section
#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(rename = "Settings", default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    download_path: Option<String>,
}

/// Result of [`ConfigStore::load`]. `warning` carries a persistence failure
/// that should be shown to the user; the settings are usable either way.
#[derive(Debug)]
pub struct LoadOutcome {
    pub settings: Settings,
    pub warning: Option<AppError>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    file_path: PathBuf,
    home_dir: Option<PathBuf>,
    app_dir: PathBuf,
    temp_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(file_path: PathBuf, home_dir: Option<PathBuf>, app_dir: PathBuf) -> Self {
        Self {
            file_path,
            home_dir,
            app_dir,
            temp_dir: std::env::temp_dir(),
        }
    }

    #[cfg(test)]
    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Settings file next to the executable, defaults under the user's home
    pub fn from_environment() -> Self {
        let app_dir = application_dir();
        Self::new(app_dir.join(CONFIG_FILE_NAME), dirs::home_dir(), app_dir)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> LoadOutcome {
        match self.read_saved_directory() {
            Ok(Some(saved)) if is_writable_dir(&saved) => {
                info!(path = %saved.display(), "loaded download path");
                return LoadOutcome {
                    settings: Settings {
                        output_directory: saved,
                    },
                    warning: None,
                };
            }
            Ok(Some(saved)) => {
                warn!(path = %saved.display(), "saved download path is not a writable directory");
            }
            Ok(None) => debug!(file = %self.file_path.display(), "no saved download path"),
            Err(e) => warn!(error = %e, "ignoring unreadable configuration"),
        }

        let settings = self.default_settings();
        let unusable = (!is_writable_dir(&settings.output_directory))
            .then(|| AppError::InvalidDirectory(settings.output_directory.clone()));
        let warning = unusable.or(self.save(&settings).err());
        LoadOutcome { settings, warning }
    }

    /// Overwrite the stored download path
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let file = ConfigFile {
            settings: SettingsSection {
                download_path: Some(settings.output_directory.to_string_lossy().into_owned()),
            },
        };
        let body =
            toml::to_string_pretty(&file).map_err(|e| AppError::ConfigWrite(e.to_string()))?;

        fs::write(&self.file_path, body).map_err(|e| {
            warn!(file = %self.file_path.display(), error = %e, "failed to save configuration");
            AppError::ConfigWrite(format!("{}: {}", self.file_path.display(), e))
        })?;

        info!(path = %settings.output_directory.display(), "saved download path");
        Ok(())
    }

    pub fn default_settings(&self) -> Settings {
        Settings {
            output_directory: self.default_directory(),
        }
    }

    /// `<home>/YouTube_MP3_Downloads`, then the same folder next to the
    /// executable, then under the system temp dir.
    pub fn default_directory(&self) -> PathBuf {
        let candidates = self
            .home_dir
            .iter()
            .chain(iter::once(&self.app_dir))
            .chain(iter::once(&self.temp_dir))
            .map(|base| base.join(DEFAULT_DOWNLOAD_SUBDIR));

        for candidate in candidates {
            match fs::create_dir_all(&candidate) {
                Ok(()) if is_writable_dir(&candidate) => return candidate,
                Ok(()) => warn!(path = %candidate.display(), "default folder is not writable"),
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "cannot create default folder")
                }
            }
        }

        if !is_writable_dir(&self.temp_dir) {
            warn!(path = %self.temp_dir.display(), "no writable default folder available");
        }
        self.temp_dir.clone()
    }

    fn read_saved_directory(&self) -> Result<Option<PathBuf>> {
        let body = match fs::read_to_string(&self.file_path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::ConfigRead(format!(
                    "{}: {}",
                    self.file_path.display(),
                    e
                )))
            }
        };

        let file: ConfigFile =
            toml::from_str(&body).map_err(|e| AppError::ConfigFormat(e.to_string()))?;

        Ok(file
            .settings
            .download_path
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from))
    }
}
