#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod error;
mod io;
mod model;
mod ui;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::io::api::ApiClient;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_gantt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load();
    let api = ApiClient::new(&config).context("failed to build HTTP client")?;
    tracing::info!(base_url = %config.base_url, "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Диаграмма Ганта"),
        ..Default::default()
    };

    eframe::run_native(
        "taskboard-gantt",
        options,
        Box::new(move |cc| Ok(Box::new(app::GanttApp::new(cc, config, api)?))),
    )
    .map_err(|e| anyhow::anyhow!("UI event loop failed: {e}"))
}
