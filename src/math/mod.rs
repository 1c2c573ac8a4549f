pub mod mesh;
pub mod surface;

pub use surface::ShapeDimensions;
