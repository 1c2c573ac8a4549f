pub mod panels;
pub mod state;
pub mod theme;

pub use panels::draw_status_overlay;
pub use state::{Action, Effect, RenderState, StatusDisplay};
pub use theme::apply_theme;
