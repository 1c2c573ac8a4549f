use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// The three surface families the demo can tessellate.
///
/// The discriminant is the shape id the programmable pipeline switches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ShapeKind {
    Sphere = 0,
    Torus = 1,
    Grid = 2,
}

impl ShapeKind {
    pub fn next(self) -> Self {
        match self {
            ShapeKind::Sphere => ShapeKind::Torus,
            ShapeKind::Torus => ShapeKind::Grid,
            ShapeKind::Grid => ShapeKind::Sphere,
        }
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Torus => "Torus",
            ShapeKind::Grid => "Grid",
        }
    }
}

/// Shape-specific parameters, one variant per surface family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceParams {
    Grid,
    Sphere { radius: f32 },
    Torus { major_radius: f32, minor_radius: f32 },
}

impl SurfaceParams {
    pub fn kind(&self) -> ShapeKind {
        match self {
            SurfaceParams::Grid => ShapeKind::Grid,
            SurfaceParams::Sphere { .. } => ShapeKind::Sphere,
            SurfaceParams::Torus { .. } => ShapeKind::Torus,
        }
    }

    /// Evaluates the surface at `(u, v)` in the unit square.
    pub fn evaluate(&self, u: f32, v: f32) -> ParametricSample {
        match *self {
            SurfaceParams::Grid => grid(u, v),
            SurfaceParams::Sphere { radius } => sphere(u, v, radius),
            SurfaceParams::Torus {
                major_radius,
                minor_radius,
            } => torus(u, v, major_radius, minor_radius),
        }
    }
}

/// Radii for every shape, from which the active shape's params are picked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeDimensions {
    pub radius: f32,
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Default for ShapeDimensions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            major_radius: 1.0,
            minor_radius: 0.5,
        }
    }
}

impl ShapeDimensions {
    pub fn params_for(&self, kind: ShapeKind) -> SurfaceParams {
        match kind {
            ShapeKind::Grid => SurfaceParams::Grid,
            ShapeKind::Sphere => SurfaceParams::Sphere {
                radius: self.radius,
            },
            ShapeKind::Torus => SurfaceParams::Torus {
                major_radius: self.major_radius,
                minor_radius: self.minor_radius,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParametricSample {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Flat plane spanning [-1, 1] x [-1, 1] at z = 0.
pub fn grid(u: f32, v: f32) -> ParametricSample {
    ParametricSample {
        position: Vec3::new((u - 0.5) * 2.0, (v - 0.5) * 2.0, 0.0),
        normal: Vec3::Z,
    }
}

/// `u` sweeps longitude over [0, 2pi), `v` sweeps colatitude over [0, pi].
pub fn sphere(u: f32, v: f32, radius: f32) -> ParametricSample {
    let theta = u * TAU;
    let phi = v * PI;

    let normal = Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos());

    ParametricSample {
        position: normal * radius,
        normal,
    }
}

/// `u` sweeps the major circle, `v` the tube cross-section, both over [0, 2pi).
pub fn torus(u: f32, v: f32, major_radius: f32, minor_radius: f32) -> ParametricSample {
    let theta = u * TAU;
    let phi = v * TAU;

    let normal = Vec3::new(theta.cos() * phi.cos(), theta.sin() * phi.cos(), phi.sin());
    let ring = major_radius + minor_radius * phi.cos();

    ParametricSample {
        position: Vec3::new(ring * theta.cos(), ring * theta.sin(), minor_radius * phi.sin()),
        normal,
    }
}
