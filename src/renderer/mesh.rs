use crate::error::MeshError;
use crate::math::mesh::{
    GridResolution, LineVertex, LitVertex, MeshConfig, MeshData, MeshVariant, UvVertex,
    build_mesh_data,
};
use crate::math::surface::SurfaceParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferRole {
    Vertex,
    Index,
}

/// A flat array handed to the graphics layer for upload.
pub struct BufferRequest<'a> {
    pub label: &'static str,
    pub role: BufferRole,
    pub contents: &'a [u8],
    pub element_count: u32,
    pub stride: u64,
}

/// Graphics layer that turns byte arrays into opaque buffer handles.
pub trait BufferBackend {
    type Handle;

    fn create_buffer(&mut self, request: &BufferRequest<'_>) -> Result<Self::Handle, MeshError>;

    fn destroy_buffer(&mut self, handle: Self::Handle);
}

/// Uploaded surface, drawn as one indexed triangle strip.
///
/// Immutable once built; a different shape, resolution or variant means
/// releasing this one and building another.
pub struct Mesh<H> {
    vertex_buffer: Option<H>,
    index_buffer: Option<H>,
    normal_buffer: Option<H>,
    element_count: u32,
    vertex_count: u32,
    normal_vertex_count: u32,
    variant: MeshVariant,
}

pub type GpuMesh = Mesh<wgpu::Buffer>;

impl<H> Mesh<H> {
    pub fn build<B>(
        backend: &mut B,
        params: &SurfaceParams,
        resolution: GridResolution,
        config: &MeshConfig,
    ) -> Result<Self, MeshError>
    where
        B: BufferBackend<Handle = H>,
    {
        let data = build_mesh_data(params, resolution, config)?;
        let mut mesh = Self {
            vertex_buffer: None,
            index_buffer: None,
            normal_buffer: None,
            element_count: 0,
            vertex_count: 0,
            normal_vertex_count: 0,
            variant: config.variant,
        };

        // Staging arrays drop at the end of this call.
        if let Err(e) = mesh.upload(backend, &data) {
            mesh.release(backend);
            return Err(e);
        }

        log::debug!(
            "built {:?} mesh for {:?}: {} elements",
            mesh.variant,
            params.kind(),
            mesh.element_count
        );
        Ok(mesh)
    }

    fn upload<B>(&mut self, backend: &mut B, data: &MeshData) -> Result<(), MeshError>
    where
        B: BufferBackend<Handle = H>,
    {
        let vertex_count = data.vertex_count() as u32;

        match data {
            MeshData::Lit(lit) => {
                self.vertex_buffer = Some(backend.create_buffer(&BufferRequest {
                    label: "Surface Vertex Buffer",
                    role: BufferRole::Vertex,
                    contents: bytemuck::cast_slice(&lit.vertices),
                    element_count: vertex_count,
                    stride: std::mem::size_of::<LitVertex>() as u64,
                })?);
                self.normal_buffer = Some(backend.create_buffer(&BufferRequest {
                    label: "Surface Normal Line Buffer",
                    role: BufferRole::Vertex,
                    contents: bytemuck::cast_slice(&lit.normal_lines),
                    element_count: lit.normal_lines.len() as u32,
                    stride: std::mem::size_of::<LineVertex>() as u64,
                })?);
                self.normal_vertex_count = lit.normal_lines.len() as u32;
            }
            MeshData::Uv(uv) => {
                self.vertex_buffer = Some(backend.create_buffer(&BufferRequest {
                    label: "Surface UV Buffer",
                    role: BufferRole::Vertex,
                    contents: bytemuck::cast_slice(&uv.vertices),
                    element_count: vertex_count,
                    stride: std::mem::size_of::<UvVertex>() as u64,
                })?);
            }
        }

        let indices = data.indices();
        self.index_buffer = Some(backend.create_buffer(&BufferRequest {
            label: "Surface Index Buffer",
            role: BufferRole::Index,
            contents: bytemuck::cast_slice(indices),
            element_count: indices.len() as u32,
            stride: std::mem::size_of::<u32>() as u64,
        })?);

        self.vertex_count = vertex_count;
        self.element_count = indices.len() as u32;
        Ok(())
    }

    /// Frees every buffer and zeroes the counts. Safe to call repeatedly.
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: BufferBackend<Handle = H>,
    {
        for handle in [
            self.vertex_buffer.take(),
            self.normal_buffer.take(),
            self.index_buffer.take(),
        ]
        .into_iter()
        .flatten()
        {
            backend.destroy_buffer(handle);
        }

        self.element_count = 0;
        self.vertex_count = 0;
        self.normal_vertex_count = 0;
    }

    pub fn is_released(&self) -> bool {
        self.vertex_buffer.is_none() && self.index_buffer.is_none() && self.normal_buffer.is_none()
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn normal_vertex_count(&self) -> u32 {
        self.normal_vertex_count
    }

    pub fn variant(&self) -> MeshVariant {
        self.variant
    }

    pub fn vertex_buffer(&self) -> Option<&H> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&H> {
        self.index_buffer.as_ref()
    }

    pub fn normal_buffer(&self) -> Option<&H> {
        self.normal_buffer.as_ref()
    }
}

/// Uploads through a `wgpu::Device`, surfacing out-of-memory and validation
/// failures as `MeshError::Upload`.
pub struct WgpuBackend<'a> {
    device: &'a wgpu::Device,
}

impl<'a> WgpuBackend<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }
}

impl BufferBackend for WgpuBackend<'_> {
    type Handle = wgpu::Buffer;

    fn create_buffer(&mut self, request: &BufferRequest<'_>) -> Result<wgpu::Buffer, MeshError> {
        use wgpu::util::DeviceExt;

        let size = request.contents.len() as u64;
        let limit = self.device.limits().max_buffer_size;
        if size > limit {
            return Err(MeshError::BufferTooLarge {
                label: request.label,
                size,
                limit,
            });
        }

        let usage = match request.role {
            BufferRole::Vertex => wgpu::BufferUsages::VERTEX,
            BufferRole::Index => wgpu::BufferUsages::INDEX,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(request.label),
                contents: request.contents,
                usage,
            });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(e) => {
                buffer.destroy();
                Err(MeshError::Upload {
                    label: request.label,
                    message: e.to_string(),
                })
            }
            None => Ok(buffer),
        }
    }

    fn destroy_buffer(&mut self, handle: wgpu::Buffer) {
        handle.destroy();
    }
}

pub fn lit_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LitVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

pub fn uv_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<UvVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}

pub fn line_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}
