//! Fiber Analyzer Runner
//! Main window: input selection, the child pipeline run and its live log.

use super::runner::{working_dir, PipelineProcess, RunEvent};
use crate::config::PipelineConfig;
use crate::gui::{ControlPanel, ControlPanelAction, InputKind, LogView};
use egui::SidePanel;
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use std::path::{Path, PathBuf};
use std::time::Duration;

const REPAINT_INTERVAL: Duration = Duration::from_millis(50);

fn warn_dialog(title: &str, description: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn error_dialog(title: &str, description: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Absolute form of the trimmed path text, if it names an existing file.
///
/// The child runs in another directory, so relative input paths are resolved
/// against this process's directory first.
fn existing_file(text: &str) -> Option<PathBuf> {
    let text = text.trim();
    let path = Path::new(text);
    if text.is_empty() || !path.is_file() {
        return None;
    }
    std::path::absolute(path).ok()
}

/// Main application window.
pub struct RunnerApp {
    control_panel: ControlPanel,
    log_view: LogView,
    process: Option<PipelineProcess>,
}

impl RunnerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            control_panel: ControlPanel::new(),
            log_view: LogView::new(),
            process: None,
        }
    }

    fn handle_browse(&mut self, kind: InputKind) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title(format!("Select {}", kind.label()))
            .add_filter("Excel", &["xlsx", "xls"])
            .add_filter("All", &["*"])
            .pick_file()
        {
            *self.control_panel.path_mut(kind) = path.to_string_lossy().to_string();
        }
    }

    fn start_run(&mut self) {
        if self.process.is_some() {
            return;
        }
        let Some(ab) = existing_file(&self.control_panel.ab_path) else {
            warn_dialog("Check input", "Check the ab.xlsx path.");
            return;
        };
        let Some(alls) = existing_file(&self.control_panel.alls_path) else {
            warn_dialog("Check input", "Check the alls.xlsx path.");
            return;
        };

        self.log_view.clear();
        if let Ok(exe) = std::env::current_exe() {
            self.log_view.push(format!("Executable: {}", exe.display()));
        }
        self.log_view.push(format!("Input ab:   {}", ab.display()));
        self.log_view.push(format!("Input alls: {}", alls.display()));
        self.log_view.push("");

        match PipelineProcess::spawn(&ab, &alls) {
            Ok(process) => {
                self.process = Some(process);
                self.control_panel.running = true;
                self.control_panel.set_status("Running...");
            }
            Err(e) => {
                tracing::error!("Failed to start pipeline: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
                error_dialog("Run error", &e.to_string());
            }
        }
    }

    fn stop_run(&mut self) {
        if let Some(process) = &self.process {
            process.stop();
            self.control_panel.set_status("Stop requested");
        }
    }

    /// Drain events from the running child
    fn check_process(&mut self) {
        let Some(process) = &self.process else {
            return;
        };

        let mut finished = false;
        for event in process.poll() {
            match event {
                RunEvent::Line(line) => self.log_view.push(line),
                RunEvent::Exited(code) => {
                    let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                    self.log_view.push("");
                    self.log_view
                        .push(format!("=== process exited (code={}) ===", code));
                    self.control_panel
                        .set_status(&format!("Finished (code={})", code));
                    finished = true;
                }
            }
        }

        if finished {
            self.process = None;
            self.control_panel.running = false;
        }
    }

    /// Open `grouped_by_col4` beside ab.xlsx, or the folder itself before a run.
    fn open_output_folder(&mut self) {
        let ab = PathBuf::from(self.control_panel.ab_path.trim());
        let base = working_dir(&ab);
        let output = base.join(PipelineConfig::default().out_grouped_by_col4);
        let target = if output.is_dir() { output } else { base };

        if let Err(e) = open::that(&target) {
            tracing::warn!("Could not open {}: {}", target.display(), e);
            self.control_panel
                .set_status(&format!("Open failed: {}", target.display()));
        }
    }
}

impl eframe::App for RunnerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_process();

        if self.process.is_some() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("inputs").show(ctx, |ui| {
            actions.push(self.control_panel.show_inputs(ui));
            ui.add_space(5.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.control_panel.show_status(ui);
        });

        SidePanel::right("actions")
            .resizable(false)
            .min_width(170.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                actions.push(self.control_panel.show_actions(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.log_view.show(ui);
        });

        for action in actions {
            match action {
                ControlPanelAction::Browse(kind) => self.handle_browse(kind),
                ControlPanelAction::Run => self.start_run(),
                ControlPanelAction::Stop => self.stop_run(),
                ControlPanelAction::OpenOutput => self.open_output_folder(),
                ControlPanelAction::None => {}
            }
        }
    }
}
