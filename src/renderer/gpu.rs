use std::sync::Arc;

use glam::Mat4;
use winit::window::Window;

use crate::error::GpuError;
use crate::math::mesh::MeshVariant;
use crate::math::surface::ShapeDimensions;
use crate::renderer::camera::Camera;
use crate::renderer::mesh::{GpuMesh, line_vertex_layout, lit_vertex_layout, uv_vertex_layout};
use crate::ui::state::RenderState;

const LIGHT_POSITION: [f32; 3] = [2.0, 2.0, 2.0];
const MATERIAL_AMBIENT: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const MATERIAL_DIFFUSE: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const MATERIAL_SPECULAR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Mirrors `Scene` in shaders.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub light_position: [f32; 4],
    pub material_ambient: [f32; 4],
    pub material_diffuse: [f32; 4],
    pub material_specular: [f32; 4],
    pub dimensions: [f32; 4],
    pub shininess: f32,
    pub lighting: u32,
    pub flat_shading: u32,
    pub lighting_model: u32,
    pub per_pixel: u32,
    pub local_viewer: u32,
    pub bumps: u32,
    pub shape: u32,
    pub normal_view: u32,
    pub _pad: [u32; 3],
}

impl SceneUniforms {
    pub fn new(
        camera: &Camera,
        state: &RenderState,
        dimensions: &ShapeDimensions,
        normal_length: f32,
    ) -> Self {
        let [x, y, z] = LIGHT_POSITION;
        let w = if state.positional_light { 1.0 } else { 0.0 };

        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            model: Mat4::from_rotation_y(state.rotation.to_radians()).to_cols_array_2d(),
            camera_pos: camera.position().extend(1.0).to_array(),
            light_position: [x, y, z, w],
            material_ambient: MATERIAL_AMBIENT,
            material_diffuse: MATERIAL_DIFFUSE,
            material_specular: MATERIAL_SPECULAR,
            dimensions: [
                dimensions.radius,
                dimensions.major_radius,
                dimensions.minor_radius,
                normal_length,
            ],
            shininess: state.shininess,
            lighting: state.lighting as u32,
            flat_shading: state.flat_shading as u32,
            lighting_model: state.lighting_model as u32,
            per_pixel: state.per_pixel_lighting as u32,
            local_viewer: state.local_viewer as u32,
            bumps: state.bumps as u32,
            shape: state.shape.id(),
            // The shader-driven mesh has no line buffer, so normals show as colour.
            normal_view: (state.shaders && state.normals) as u32,
            _pad: [0; 3],
        }
    }
}

struct SurfacePipelines {
    fill: wgpu::RenderPipeline,
    line: Option<wgpu::RenderPipeline>,
}

impl SurfacePipelines {
    fn select(&self, wireframe: bool) -> &wgpu::RenderPipeline {
        match (&self.line, wireframe) {
            (Some(line), true) => line,
            _ => &self.fill,
        }
    }
}

struct PipelineFactory<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineFactory<'_> {
    fn create(
        &self,
        label: &str,
        entry_points: (&str, &str),
        buffers: &[wgpu::VertexBufferLayout<'_>],
        primitive: wgpu::PrimitiveState,
    ) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader,
                    entry_point: Some(entry_points.0),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.shader,
                    entry_point: Some(entry_points.1),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive,
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn surface(
        &self,
        label: &str,
        entry_points: (&str, &str),
        buffer: wgpu::VertexBufferLayout<'_>,
        wireframe: bool,
    ) -> SurfacePipelines {
        let buffers = [buffer];
        let fill = self.create(
            label,
            entry_points,
            &buffers,
            strip_primitive(wgpu::PolygonMode::Fill),
        );
        let line = wireframe.then(|| {
            self.create(
                &format!("{label} (Wireframe)"),
                entry_points,
                &buffers,
                strip_primitive(wgpu::PolygonMode::Line),
            )
        });
        SurfacePipelines { fill, line }
    }
}

fn strip_primitive(polygon_mode: wgpu::PolygonMode) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleStrip,
        strip_index_format: Some(wgpu::IndexFormat::Uint32),
        cull_mode: None,
        polygon_mode,
        ..Default::default()
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    fixed: SurfacePipelines,
    programmable: SurfacePipelines,
    normal_lines: wgpu::RenderPipeline,

    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,

    depth_texture: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let wireframe = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        if !wireframe {
            log::warn!("adapter lacks POLYGON_MODE_LINE, wireframe will render filled");
        }
        let required_features = if wireframe {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let factory = PipelineFactory {
            device: &device,
            layout: &pipeline_layout,
            shader: &shader,
            format: config.format,
        };

        let fixed = factory.surface(
            "Fixed Surface Pipeline",
            ("vs_fixed", "fs_fixed"),
            lit_vertex_layout(),
            wireframe,
        );
        let programmable = factory.surface(
            "Programmable Surface Pipeline",
            ("vs_param", "fs_param"),
            uv_vertex_layout(),
            wireframe,
        );
        let normal_lines = factory.create(
            "Normal Line Pipeline",
            ("vs_lines", "fs_lines"),
            &[line_vertex_layout()],
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
        );

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            fixed,
            programmable,
            normal_lines,
            scene_buffer,
            scene_bind_group,
            depth_texture,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn update_scene(&self, uniforms: &SceneUniforms) {
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    pub fn render(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        mesh: Option<&GpuMesh>,
        state: &RenderState,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Surface Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(mesh) = mesh else { return };
        let (Some(vertices), Some(indices)) = (mesh.vertex_buffer(), mesh.index_buffer()) else {
            return;
        };

        let pipelines = match mesh.variant() {
            MeshVariant::CpuLit => &self.fixed,
            MeshVariant::ShaderDriven => &self.programmable,
        };

        render_pass.set_pipeline(pipelines.select(state.wireframe));
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertices.slice(..));
        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.element_count(), 0, 0..1);

        if let Some(lines) = mesh.normal_buffer().filter(|_| state.normals) {
            render_pass.set_pipeline(&self.normal_lines);
            render_pass.set_vertex_buffer(0, lines.slice(..));
            render_pass.draw(0..mesh.normal_vertex_count(), 0..1);
        }
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}
