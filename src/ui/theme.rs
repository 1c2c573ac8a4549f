use egui::{Color32, FontFamily, FontId, Style, TextStyle, Visuals};

pub const OVERLAY_FILL: Color32 = Color32::from_black_alpha(180);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(220, 220, 225);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(107, 107, 112);
pub const ACCENT_ON: Color32 = Color32::from_rgb(46, 172, 35);

pub const OVERLAY_FONT_SIZE: f32 = 12.0;

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style {
        visuals: Visuals {
            override_text_color: Some(TEXT_PRIMARY),
            ..Visuals::dark()
        },
        ..Style::default()
    };

    style.spacing.item_spacing = egui::vec2(8.0, 2.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(10.0, FontFamily::Monospace)),
        (TextStyle::Body, FontId::new(OVERLAY_FONT_SIZE, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(OVERLAY_FONT_SIZE, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(OVERLAY_FONT_SIZE, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
