pub mod camera;
pub mod gpu;
pub mod mesh;

pub use camera::Camera;
pub use gpu::{GpuState, SceneUniforms};
pub use mesh::{GpuMesh, Mesh, WgpuBackend};
