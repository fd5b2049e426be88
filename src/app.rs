use std::path::PathBuf;
use std::time::Duration;

use iced::{Subscription, Task};
use rfd::{MessageButtons, MessageLevel};
use tracing::{info, warn};

use crate::application::{JobWorker, WorkerState};
use crate::config::{ConfigStore, Settings};
use crate::domain::{AppError, ProgressMessage};
use crate::engine::{AudioEngine, EngineConfig, YtDlpEngine};
use crate::ui::{DownloadMessage, DownloadView};
use crate::utils::application_dir;

/// How often the UI drains the progress relay
pub const RELAY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct DownloadApp<E = YtDlpEngine> {
    view: DownloadView,
    config: ConfigStore,
    settings: Settings,
    worker: JobWorker<E>,
}

impl DownloadApp {
    pub fn boot() -> (Self, Task<Message>) {
        let config = ConfigStore::from_environment();
        let engine = YtDlpEngine::new(EngineConfig::discover(&application_dir()));
        Self::with_parts(config, JobWorker::new(engine))
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Timer tick: drain queued worker progress
    Tick,
    /// Result of the folder picker; `None` when cancelled
    FolderSelected(Option<PathBuf>),
    DialogClosed,
}

impl<E: AudioEngine + Clone> DownloadApp<E> {
    pub fn with_parts(config: ConfigStore, worker: JobWorker<E>) -> (Self, Task<Message>) {
        info!(file = %config.file_path().display(), "loading configuration");
        let loaded = config.load();

        let mut view = DownloadView::default();
        view.set_output_directory(&loaded.settings.output_directory);

        let task = match loaded.warning {
            Some(err @ AppError::InvalidDirectory(_)) => {
                show_dialog(MessageLevel::Warning, "Warning", err.to_string())
            }
            Some(err) => show_dialog(MessageLevel::Error, "Write error", err.to_string()),
            None => Task::none(),
        };

        let app = Self {
            view,
            config,
            settings: loaded.settings,
            worker,
        };
        (app, task)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UiMessage(ui_msg) => {
                self.view.update(ui_msg.clone());

                match ui_msg {
                    DownloadMessage::DownloadPressed => return self.start_download(),
                    DownloadMessage::BrowsePressed => return self.pick_folder(),
                    DownloadMessage::UrlChanged(_) => {}
                }
            }
            Message::Tick => return self.drain_progress(),
            Message::FolderSelected(Some(dir)) => {
                return self.change_output_directory(Settings {
                    output_directory: dir,
                });
            }
            Message::FolderSelected(None) | Message::DialogClosed => {}
        }
        Task::none()
    }

    fn start_download(&mut self) -> Task<Message> {
        // The trigger is disabled while a job runs
        if self.worker.is_busy() {
            return Task::none();
        }

        match self
            .worker
            .start(&self.view.source_url, &self.settings.output_directory)
        {
            Ok(()) => {
                self.view.begin_job();
                Task::none()
            }
            Err(err @ AppError::InvalidDirectory(_)) => {
                warn!(error = %err, "output folder vanished, falling back to default");
                let warning = show_dialog(MessageLevel::Warning, "Warning", err.to_string());
                let reset = self.change_output_directory(self.config.default_settings());
                Task::batch([warning, reset])
            }
            Err(err) if err.is_validation() => {
                show_dialog(MessageLevel::Warning, "Warning", err.to_string())
            }
            Err(err) => show_dialog(MessageLevel::Error, "Error", err.to_string()),
        }
    }

    fn pick_folder(&self) -> Task<Message> {
        if self.worker.is_busy() {
            return Task::none();
        }

        let start_dir = self.settings.output_directory.clone();
        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_title("Choose output folder")
                    .set_directory(&start_dir)
                    .pick_folder()
                    .await
                    .map(|handle| handle.path().to_path_buf())
            },
            Message::FolderSelected,
        )
    }

    /// Adopt and persist a new output folder. A failed write is reported but
    /// the new folder stays in effect.
    fn change_output_directory(&mut self, settings: Settings) -> Task<Message> {
        info!(path = %settings.output_directory.display(), "output folder changed");
        self.view.set_output_directory(&settings.output_directory);
        self.settings = settings;

        match self.config.save(&self.settings) {
            Ok(()) => Task::none(),
            Err(err) => show_dialog(MessageLevel::Error, "Write error", err.to_string()),
        }
    }

    fn drain_progress(&mut self) -> Task<Message> {
        let messages = self.worker.poll();
        if messages.is_empty() {
            return Task::none();
        }

        let mut dialogs = Vec::new();
        for message in &messages {
            self.view.apply_progress(message);

            match message {
                ProgressMessage::Finished { .. } => {
                    let folder = self
                        .worker
                        .job()
                        .map(|job| job.output_directory.clone())
                        .unwrap_or_else(|| self.settings.output_directory.clone());
                    dialogs.push(show_dialog(
                        MessageLevel::Info,
                        "Success",
                        format!(
                            "The MP3 file was downloaded successfully!\nSaved in: {}",
                            folder.display()
                        ),
                    ));
                }
                ProgressMessage::Error { message } => dialogs.push(show_dialog(
                    MessageLevel::Error,
                    "Error",
                    format!("An error occurred while downloading: {}", message),
                )),
                ProgressMessage::Downloading { .. } | ProgressMessage::Postprocessing { .. } => {}
            }
        }

        if matches!(
            self.worker.state(),
            WorkerState::Finished | WorkerState::Failed
        ) {
            if let Some(job) = self.worker.acknowledge() {
                info!(phase = ?job.phase, "job acknowledged");
            }
        }

        Task::batch(dialogs)
    }
}

fn show_dialog(level: MessageLevel, title: &str, description: String) -> Task<Message> {
    let title = title.to_string();
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(level)
                .set_title(&title)
                .set_description(&description)
                .set_buttons(MessageButtons::Ok)
                .show()
                .await
        },
        |_| Message::DialogClosed,
    )
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    app.update(message)
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

/// Drains the relay for the lifetime of the window, job or no job
pub fn subscription(_app: &DownloadApp) -> Subscription<Message> {
    iced::time::every(RELAY_POLL_INTERVAL).map(|_| Message::Tick)
}
