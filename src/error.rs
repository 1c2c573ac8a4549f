use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while building or uploading a surface mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("grid resolution {count_u}x{count_v} is below the 2x2 minimum")]
    InvalidResolution { count_u: usize, count_v: usize },

    #[error("{count} vertices do not fit in 32-bit indices")]
    TooManyVertices { count: usize },

    #[error("failed to allocate staging array: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("buffer '{label}' needs {size} bytes, device limit is {limit}")]
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("failed to upload buffer '{label}': {message}")]
    Upload {
        label: &'static str,
        message: String,
    },

    #[error("a grid sampling worker panicked")]
    WorkerPanicked,
}

/// Errors raised while bringing up the window surface and GPU device.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Anything that ends the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("out of GPU memory while presenting")]
    SurfaceOutOfMemory,
}
