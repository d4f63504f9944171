//! Control Panel Widget
//! Input paths, run controls and the status line.

use egui::{Color32, RichText};

/// Which input a path field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Ab,
    Alls,
}

impl InputKind {
    pub fn label(self) -> &'static str {
        match self {
            InputKind::Ab => "ab.xlsx",
            InputKind::Alls => "alls.xlsx",
        }
    }
}

/// Path fields, run/stop buttons and status text.
pub struct ControlPanel {
    pub ab_path: String,
    pub alls_path: String,
    pub status: String,
    pub running: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            ab_path: String::new(),
            alls_path: String::new(),
            status: "Idle".to_string(),
            running: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_mut(&mut self, kind: InputKind) -> &mut String {
        match kind {
            InputKind::Ab => &mut self.ab_path,
            InputKind::Alls => &mut self.alls_path,
        }
    }

    fn path_row(&mut self, ui: &mut egui::Ui, kind: InputKind, action: &mut ControlPanelAction) {
        let label_width = 80.0;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new(kind.label()));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!self.running, egui::Button::new("📂 Browse..."))
                    .clicked()
                {
                    *action = ControlPanelAction::Browse(kind);
                }
                ui.add_enabled(
                    !self.running,
                    egui::TextEdit::singleline(self.path_mut(kind)).desired_width(f32::INFINITY),
                );
            });
        });
    }

    /// Draw the input section
    pub fn show_inputs(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.add_space(5.0);
        ui.label(RichText::new("📁 Input Files").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                self.path_row(ui, InputKind::Ab, &mut action);
                ui.add_space(5.0);
                self.path_row(ui, InputKind::Alls, &mut action);
            });

        action
    }

    /// Draw the run controls
    pub fn show_actions(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let size = egui::vec2(150.0, 30.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!self.running, |ui| {
                let run = egui::Button::new(RichText::new("▶ Run").size(16.0)).min_size(size);
                if ui.add(run).clicked() {
                    action = ControlPanelAction::Run;
                }
            });

            ui.add_space(6.0);

            ui.add_enabled_ui(self.running, |ui| {
                let stop = egui::Button::new(RichText::new("■ Stop").size(14.0)).min_size(size);
                if ui.add(stop).clicked() {
                    action = ControlPanelAction::Stop;
                }
            });

            ui.add_space(15.0);

            let open = egui::Button::new(RichText::new("📂 Open output folder").size(12.0))
                .min_size(size);
            if ui.add(open).clicked() {
                action = ControlPanelAction::OpenOutput;
            }
        });

        action
    }

    /// Draw the status line
    pub fn show_status(&self, ui: &mut egui::Ui) {
        let status_color = if self.status.contains("Error") || self.status.contains("failed") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Finished") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by the control panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlPanelAction {
    None,
    Browse(InputKind),
    Run,
    Stop,
    OpenOutput,
}
