#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use coloring_canvas::{ColoringApp, EngineConfig};

/// Environment variable naming an optional JSON engine config
const CONFIG_ENV: &str = "COLORING_CANVAS_CONFIG";

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // Usage: coloring_canvas [line-art image]
    let background = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_config();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Coloring Canvas",
        native_options,
        Box::new(move |cc| Ok(Box::new(ColoringApp::new(cc, config, background)))),
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> EngineConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return EngineConfig::default();
    };
    match EngineConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Ignoring config {}: {}", PathBuf::from(path).display(), err);
            EngineConfig::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
