mod app;
mod application;
mod config;
mod domain;
mod engine;
mod logging;
mod ui;
mod utils;

use iced::{window, Size};

fn main() -> iced::Result {
    logging::init_tracing();

    let icon_data = include_bytes!("../assets/icon.png");

    let icon = match image::load_from_memory(icon_data) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            window::icon::from_rgba(rgba.into_raw(), width, height).ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode window icon");
            None
        }
    };

    iced::application(app::DownloadApp::boot, app::update, app::view)
        .title("YouTube MP3 Downloader")
        .subscription(app::subscription)
        .window(window::Settings {
            size: Size::new(600.0, 480.0),
            resizable: false,
            icon,
            ..Default::default()
        })
        .run()
}
