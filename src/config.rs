use std::num::NonZeroUsize;

use crate::math::mesh::{DEFAULT_NORMAL_LENGTH, MeshConfig, MeshVariant, UvDomain};
use crate::math::surface::{ShapeDimensions, ShapeKind};
use crate::ui::state::{MAX_TESSELLATION, MIN_TESSELLATION, RenderState, StatusDisplay};

/// Interactive parametric surface viewer
///
/// Keys: s shaders, g shape, t/T tessellation, l lighting, w wireframe,
/// f flat shading, n normals, b bumps, m lighting model, p per-pixel,
/// v local viewer, d light type, a animation, h/H shininess, o status, Esc quit.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Args {
    /// Shape shown at startup.
    #[arg(long, value_enum, default_value_t = ShapeKind::Sphere)]
    pub shape: ShapeKind,

    /// Tessellation level; each axis gets 2^level + 1 samples.
    #[arg(short, long, default_value_t = MIN_TESSELLATION,
          value_parser = clap::value_parser!(u32).range(1..=MAX_TESSELLATION as i64))]
    pub tessellation: u32,

    /// Start with the programmable pipeline.
    #[arg(long)]
    pub shaders: bool,

    /// Sphere radius.
    #[arg(long, default_value_t = 1.0, value_parser = positive_float)]
    pub radius: f32,

    /// Torus major radius (center to tube center).
    #[arg(long, default_value_t = 1.0, value_parser = positive_float)]
    pub major_radius: f32,

    /// Torus minor radius (tube radius).
    #[arg(long, default_value_t = 0.5, value_parser = positive_float)]
    pub minor_radius: f32,

    /// Length of the normal-visualisation segments.
    #[arg(long, default_value_t = DEFAULT_NORMAL_LENGTH, value_parser = positive_float)]
    pub normal_length: f32,

    /// Threads used to sample the surface grid (defaults to available cores).
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    /// Log the status readout to the console instead of drawing it on screen.
    #[arg(long)]
    pub console: bool,

    /// Sync presentation to the display refresh rate.
    #[arg(long)]
    pub vsync: bool,
}

fn positive_float(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("expected a positive number, got {value}"))
    }
}

impl Args {
    pub fn render_state(&self) -> RenderState {
        RenderState {
            shaders: self.shaders,
            shape: self.shape,
            tessellation: self.tessellation,
            status_display: if self.console {
                StatusDisplay::Console
            } else {
                StatusDisplay::Overlay
            },
            ..RenderState::default()
        }
    }

    pub fn dimensions(&self) -> ShapeDimensions {
        ShapeDimensions {
            radius: self.radius,
            major_radius: self.major_radius,
            minor_radius: self.minor_radius,
        }
    }

    /// Build settings for the given pipeline; only the variant changes at runtime.
    pub fn mesh_config(&self, shaders: bool) -> MeshConfig {
        let workers = self
            .workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get);

        MeshConfig {
            variant: if shaders {
                MeshVariant::ShaderDriven
            } else {
                MeshVariant::CpuLit
            },
            normal_length: self.normal_length,
            domain: UvDomain::default(),
            workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_match_the_demo() {
        let args = Args::try_parse_from(["surface3d"]).unwrap();
        let state = args.render_state();
        assert_eq!(state.shape, ShapeKind::Sphere);
        assert_eq!(state.tessellation, MIN_TESSELLATION);
        assert!(!state.shaders);
        assert_eq!(args.dimensions(), ShapeDimensions::default());

        let config = args.mesh_config(false);
        assert_eq!(config.variant, MeshVariant::CpuLit);
        assert_eq!(config.normal_length, DEFAULT_NORMAL_LENGTH);
        assert!(config.workers >= 1);
    }

    #[test]
    fn overrides_flow_into_state_and_config() {
        let args = Args::try_parse_from([
            "surface3d",
            "--shape",
            "torus",
            "-t",
            "5",
            "--shaders",
            "--minor-radius",
            "0.25",
            "--workers",
            "3",
            "--console",
        ])
        .unwrap();

        let state = args.render_state();
        assert_eq!(state.shape, ShapeKind::Torus);
        assert_eq!(state.tessellation, 5);
        assert!(state.shaders);
        assert_eq!(state.status_display, StatusDisplay::Console);
        assert_eq!(args.dimensions().minor_radius, 0.25);

        let config = args.mesh_config(state.shaders);
        assert_eq!(config.variant, MeshVariant::ShaderDriven);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Args::try_parse_from(["surface3d", "--radius", "0"]).is_err());
        assert!(Args::try_parse_from(["surface3d", "--radius", "-1.5"]).is_err());
        assert!(Args::try_parse_from(["surface3d", "-t", "11"]).is_err());
        assert!(Args::try_parse_from(["surface3d", "-t", "0"]).is_err());
        assert!(Args::try_parse_from(["surface3d", "--workers", "0"]).is_err());
    }
}
