//! GUI module - runner window around the pipeline child process

mod app;
mod control_panel;
mod log_view;
mod runner;

pub use app::RunnerApp;
pub use control_panel::{ControlPanel, ControlPanelAction, InputKind};
pub use log_view::LogView;
pub use runner::{command_args, working_dir, PipelineProcess, RunEvent};

use eframe::egui;

/// Open the runner window and block until it closes.
pub fn launch() -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 640.0])
            .with_min_inner_size([900.0, 560.0])
            .with_title("Fiber Analyzer Runner"),
        ..Default::default()
    };

    eframe::run_native(
        "Fiber Analyzer Runner",
        options,
        Box::new(|cc| Ok(Box::new(RunnerApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("runner window failed: {}", e))
}
