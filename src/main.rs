#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
//! SpeechLab - speech model endpoint test bench

mod app;
mod toasts;
mod widgets;

use app::SpeechLabApp;
use eframe::egui;
use speechlab::AppSettings;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = AppSettings::load();
    log::info!("Starting SpeechLab, default endpoint {}", settings.default_endpoint);

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([720.0, 860.0])
        .with_min_inner_size([520.0, 480.0])
        .with_title("🎙️ SpeechLab");

    if settings.always_on_top {
        viewport = viewport.with_always_on_top();
    }

    eframe::run_native(
        "SpeechLab",
        eframe::NativeOptions {
            viewport,
            ..Default::default()
        },
        Box::new(|cc| Ok(Box::new(SpeechLabApp::new(cc, settings)?))),
    )
}
