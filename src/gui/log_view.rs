//! Log View Widget
//! Scrolling monospace view of the child's console output.

use egui::{RichText, ScrollArea, TextStyle};

/// Keeps the newest lines once this many are held.
const MAX_LINES: usize = 20_000;

#[derive(Default)]
pub struct LogView {
    lines: Vec<String>,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Draw the log, following new output while scrolled to the bottom
    pub fn show(&self, ui: &mut egui::Ui) {
        if self.lines.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No output yet").size(16.0));
            });
            return;
        }

        let row_height = ui.text_style_height(&TextStyle::Monospace);
        ScrollArea::both()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show_rows(ui, row_height, self.lines.len(), |ui, rows| {
                for line in &self.lines[rows] {
                    ui.label(RichText::new(line).monospace());
                }
            });
    }
}
