use std::path::Path;

use iced::{
    widget::{button, column, progress_bar, row, text, text_input, Space},
    Alignment, Element, Length,
};

use crate::domain::ProgressMessage;

const URL_PLACEHOLDER: &str = "e.g. https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const FOOTER_TEXT: &str = "© 2026 YouTube MP3 Downloader";

/// Progress shown while ffmpeg converts; yt-dlp reports no percentage then
pub const POSTPROCESS_PROGRESS: f32 = 0.95;

/// Main view state
pub struct DownloadView {
    pub source_url: String,
    pub output_directory: String,
    /// 0.0 to 1.0
    pub progress: f32,
    pub status_message: String,
    pub is_downloading: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            output_directory: String::new(),
            progress: 0.0,
            status_message: "Ready.".to_string(),
            is_downloading: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.source_url = url;
            }
            DownloadMessage::BrowsePressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn set_output_directory(&mut self, dir: &Path) {
        self.output_directory = dir.display().to_string();
    }

    pub fn begin_job(&mut self) {
        self.is_downloading = true;
        self.progress = 0.0;
        self.status_message = "Initializing download...".to_string();
    }

    pub fn apply_progress(&mut self, message: &ProgressMessage) {
        match message {
            ProgressMessage::Downloading { percent, label } => {
                self.progress = (percent / 100.0).clamp(0.0, 1.0);
                self.status_message = format!("Downloading... {}", label);
            }
            ProgressMessage::Postprocessing { label } => {
                self.progress = POSTPROCESS_PROGRESS;
                self.status_message = label.clone();
            }
            ProgressMessage::Finished { path } => {
                self.progress = 1.0;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.status_message = format!("Download finished: {}", name);
                self.source_url.clear();
            }
            ProgressMessage::Error { .. } => {
                self.progress = 0.0;
                self.status_message = "An error occurred.".to_string();
            }
        }

        if message.is_terminal() {
            self.is_downloading = false;
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let idle = !self.is_downloading;

        let url_row = row![
            text("YouTube URL:").size(14),
            text_input(URL_PLACEHOLDER, &self.source_url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding(10)
                .width(Length::Fill),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        // No on_input: the folder is only changed through the picker
        let folder_row = row![
            text("Output folder:").size(14),
            text_input("", &self.output_directory)
                .padding(10)
                .width(Length::Fill),
            button("Browse")
                .on_press_maybe(idle.then_some(DownloadMessage::BrowsePressed))
                .padding([10, 20]),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        column![
            text("YouTube MP3 Downloader").size(24),
            Space::new().height(Length::Fixed(10.0)),
            url_row,
            folder_row,
            Space::new().height(Length::Fixed(10.0)),
            button(text("Download MP3").size(16))
                .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            progress_bar(0.0..=1.0, self.progress),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fill),
            text(FOOTER_TEXT).size(10),
        ]
        .padding(20)
        .spacing(10)
        .align_x(Alignment::Center)
        .into()
    }
}
