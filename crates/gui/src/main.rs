//! pdf-recolor desktop shell
//!
//! Pick a PDF, choose a scheme, check the first page, convert in the
//! background. An optional path argument is opened on start.

mod app;
mod dialog;
mod worker;

use std::path::PathBuf;

use anyhow::anyhow;
use eframe::{egui, NativeOptions};
use recolor::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::RecolorApp;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config not loaded; using defaults");
            Config::default()
        }
    };
    let initial = std::env::args_os().nth(1).map(PathBuf::from);
    let app = RecolorApp::new(config, initial)?;

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "PDF Color Scheme Converter",
        native_options,
        Box::new(|_cc| Box::new(app)),
    )
    .map_err(|e| anyhow!("GUI error: {e}"))?;

    Ok(())
}
