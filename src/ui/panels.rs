use egui::{Context, RichText};

use crate::ui::theme::{ACCENT_ON, OVERLAY_FILL, TEXT_MUTED};

const KEY_HINT: &str = "LMB drag orbit | RMB drag zoom | Esc quit";

/// Status readout anchored to the bottom-left corner.
pub fn draw_status_overlay(ctx: &Context, lines: &[String]) {
    egui::Area::new(egui::Id::new("status_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(OVERLAY_FILL)
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    for line in lines {
                        let text = RichText::new(line).monospace();
                        if line.ends_with(": on") {
                            ui.label(text.color(ACCENT_ON));
                        } else {
                            ui.label(text);
                        }
                    }
                    ui.add_space(4.0);
                    ui.label(RichText::new(KEY_HINT).small().color(TEXT_MUTED));
                });
        });
}
