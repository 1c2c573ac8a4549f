use crate::error::MeshError;
use crate::math::mesh::GridResolution;
use crate::math::surface::ShapeKind;

pub const MIN_TESSELLATION: u32 = 2;
pub const MAX_TESSELLATION: u32 = 10;
pub const MIN_SHININESS: f32 = 10.0;
pub const MAX_SHININESS: f32 = 120.0;
const SHININESS_STEP: f32 = 10.0;
const ROTATION_SPEED: f32 = 25.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LightingModel {
    Phong = 0,
    BlinnPhong = 1,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BumpMode {
    None = 0,
    NormalsOnly = 1,
    Displacement = 2,
}

impl BumpMode {
    fn next(self) -> Self {
        match self {
            BumpMode::None => BumpMode::NormalsOnly,
            BumpMode::NormalsOnly => BumpMode::Displacement,
            BumpMode::Displacement => BumpMode::None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusDisplay {
    Overlay,
    Console,
}

/// A user request coming from the keyboard.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    ToggleShaders,
    ToggleLighting,
    ToggleFlatShading,
    ToggleWireframe,
    ToggleNormals,
    ToggleLightingModel,
    TogglePerPixelLighting,
    ToggleLocalViewer,
    TogglePositionalLight,
    ToggleAnimation,
    ToggleStatusDisplay,
    CycleBumps,
    CycleShape,
    IncreaseTessellation,
    DecreaseTessellation,
    IncreaseShininess,
    DecreaseShininess,
}

/// What the caller has to do after an action was applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    /// The mesh must be released and built again.
    Rebuild,
    /// Only uniforms or pipeline selection changed.
    Redraw,
}

/// Every render-mode toggle, owned by the app and read by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub shaders: bool,
    pub lighting: bool,
    pub flat_shading: bool,
    pub wireframe: bool,
    pub normals: bool,
    pub lighting_model: LightingModel,
    pub per_pixel_lighting: bool,
    pub local_viewer: bool,
    pub positional_light: bool,
    pub animation: bool,
    pub status_display: StatusDisplay,
    pub bumps: BumpMode,
    pub shape: ShapeKind,
    pub tessellation: u32,
    pub shininess: f32,
    /// Degrees around the vertical axis, advanced while animating.
    pub rotation: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            shaders: false,
            lighting: true,
            flat_shading: false,
            wireframe: false,
            normals: false,
            lighting_model: LightingModel::Phong,
            per_pixel_lighting: false,
            local_viewer: false,
            positional_light: false,
            animation: false,
            status_display: StatusDisplay::Overlay,
            bumps: BumpMode::None,
            shape: ShapeKind::Sphere,
            tessellation: MIN_TESSELLATION,
            shininess: 50.0,
            rotation: 0.0,
        }
    }
}

impl RenderState {
    pub fn apply(&mut self, action: Action) -> Effect {
        match action {
            Action::ToggleShaders => {
                self.shaders = !self.shaders;
                return Effect::Rebuild;
            }
            Action::CycleShape => {
                self.shape = self.shape.next();
                return Effect::Rebuild;
            }
            Action::IncreaseTessellation => {
                if self.tessellation < MAX_TESSELLATION {
                    self.tessellation += 1;
                    return Effect::Rebuild;
                }
            }
            Action::DecreaseTessellation => {
                if self.tessellation > MIN_TESSELLATION {
                    self.tessellation -= 1;
                    return Effect::Rebuild;
                }
            }
            Action::ToggleLighting => self.lighting = !self.lighting,
            Action::ToggleFlatShading => self.flat_shading = !self.flat_shading,
            Action::ToggleWireframe => self.wireframe = !self.wireframe,
            Action::ToggleNormals => self.normals = !self.normals,
            Action::ToggleLightingModel => {
                self.lighting_model = match self.lighting_model {
                    LightingModel::Phong => LightingModel::BlinnPhong,
                    LightingModel::BlinnPhong => LightingModel::Phong,
                };
            }
            Action::TogglePerPixelLighting => self.per_pixel_lighting = !self.per_pixel_lighting,
            Action::ToggleLocalViewer => self.local_viewer = !self.local_viewer,
            Action::TogglePositionalLight => self.positional_light = !self.positional_light,
            Action::ToggleAnimation => self.animation = !self.animation,
            Action::ToggleStatusDisplay => {
                self.status_display = match self.status_display {
                    StatusDisplay::Overlay => StatusDisplay::Console,
                    StatusDisplay::Console => StatusDisplay::Overlay,
                };
            }
            Action::CycleBumps => self.bumps = self.bumps.next(),
            Action::IncreaseShininess => {
                if self.shininess < MAX_SHININESS {
                    self.shininess += SHININESS_STEP;
                }
            }
            Action::DecreaseShininess => {
                if self.shininess > MIN_SHININESS {
                    self.shininess -= SHININESS_STEP;
                }
            }
        }
        Effect::Redraw
    }

    pub fn resolution(&self) -> Result<GridResolution, MeshError> {
        GridResolution::from_tessellation(self.tessellation)
    }

    pub fn advance_animation(&mut self, dt: f32) {
        if !self.animation {
            return;
        }
        self.rotation += dt * ROTATION_SPEED;
        if self.rotation > 360.0 {
            self.rotation -= 360.0;
        }
    }

    /// Labelled readout, one entry per line, with the toggle key in brackets.
    pub fn status_lines(&self, fps: u32) -> Vec<String> {
        vec![
            format!("Shaders (s): {}", on_off(self.shaders)),
            format!("FR: {fps}"),
            format!("Lighting (l): {}", on_off(self.lighting)),
            format!(
                "Light Position (d): {}",
                if self.positional_light { "positional" } else { "directional" }
            ),
            format!(
                "Viewer Position (v): {}",
                if self.local_viewer { "local" } else { "infinite" }
            ),
            format!("Wireframe/Fill (w): {}", if self.wireframe { "wireframe" } else { "fill" }),
            format!("Lighting Model (m): {:?}", self.lighting_model),
            format!(
                "Vertex/Pixel Lighting (p): {}",
                if self.per_pixel_lighting { "pixel" } else { "vertex" }
            ),
            format!("Animation (a): {}", on_off(self.animation)),
            format!("Normals (n): {}", on_off(self.normals)),
            format!("Shape (g): {}", self.shape.name()),
            format!("Bumps (b): {:?}", self.bumps),
            format!(
                "Flat/Smooth Shading (f): {}",
                if self.flat_shading { "flat" } else { "smooth" }
            ),
            format!("Tessellation (T/t): {}", self.tessellation),
            format!("Shininess (H/h): {:.0}", self.shininess),
        ]
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_affecting_actions_request_rebuild() {
        let mut state = RenderState::default();
        assert_eq!(state.apply(Action::ToggleShaders), Effect::Rebuild);
        assert_eq!(state.apply(Action::CycleShape), Effect::Rebuild);
        assert_eq!(state.apply(Action::IncreaseTessellation), Effect::Rebuild);
        assert_eq!(state.apply(Action::ToggleWireframe), Effect::Redraw);
        assert_eq!(state.apply(Action::CycleBumps), Effect::Redraw);
        assert!(state.shaders);
        assert_eq!(state.shape, ShapeKind::Torus);
        assert_eq!(state.tessellation, MIN_TESSELLATION + 1);
    }

    #[test]
    fn tessellation_stops_at_bounds_without_rebuild() {
        let mut state = RenderState::default();
        assert_eq!(state.apply(Action::DecreaseTessellation), Effect::Redraw);
        assert_eq!(state.tessellation, MIN_TESSELLATION);

        state.tessellation = MAX_TESSELLATION;
        assert_eq!(state.apply(Action::IncreaseTessellation), Effect::Redraw);
        assert_eq!(state.tessellation, MAX_TESSELLATION);
    }

    #[test]
    fn shininess_moves_in_steps_within_bounds() {
        let mut state = RenderState::default();
        for _ in 0..20 {
            state.apply(Action::IncreaseShininess);
        }
        assert_eq!(state.shininess, MAX_SHININESS);
        for _ in 0..20 {
            state.apply(Action::DecreaseShininess);
        }
        assert_eq!(state.shininess, MIN_SHININESS);
    }

    #[test]
    fn bumps_cycle_through_all_modes() {
        let mut state = RenderState::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            state.apply(Action::CycleBumps);
            seen.push(state.bumps);
        }
        assert_eq!(
            seen,
            vec![BumpMode::NormalsOnly, BumpMode::Displacement, BumpMode::None]
        );
    }

    #[test]
    fn animation_wraps_rotation() {
        let mut state = RenderState::default();
        state.advance_animation(1.0);
        assert_eq!(state.rotation, 0.0);

        state.apply(Action::ToggleAnimation);
        state.rotation = 350.0;
        state.advance_animation(1.0);
        assert!((state.rotation - 15.0).abs() < 1e-4);
    }

    #[test]
    fn resolution_follows_tessellation() {
        let state = RenderState {
            tessellation: 3,
            ..RenderState::default()
        };
        let resolution = state.resolution().unwrap();
        assert_eq!((resolution.count_u(), resolution.count_v()), (9, 9));
    }

    #[test]
    fn status_lists_every_toggle() {
        let state = RenderState::default();
        let lines = state.status_lines(60);
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "Shaders (s): off");
        assert_eq!(lines[1], "FR: 60");
        assert_eq!(lines[10], "Shape (g): Sphere");
        assert_eq!(lines[14], "Shininess (H/h): 50");
    }
}
