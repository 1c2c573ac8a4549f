use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod config;
mod error;
mod math;
mod renderer;
mod ui;

use config::Args;
use error::{AppError, MeshError};
use math::ShapeDimensions;
use renderer::{Camera, GpuMesh, GpuState, Mesh, SceneUniforms, WgpuBackend};
use ui::{Action, Effect, RenderState, StatusDisplay, apply_theme, draw_status_overlay};

#[derive(Default)]
struct InputState {
    shift: bool,
    orbiting: bool,
    zooming: bool,
}

fn action_for_key(key: KeyCode, shift: bool) -> Option<Action> {
    let action = match key {
        KeyCode::KeyA => Action::ToggleAnimation,
        KeyCode::KeyF => Action::ToggleFlatShading,
        KeyCode::KeyO => Action::ToggleStatusDisplay,
        KeyCode::KeyS => Action::ToggleShaders,
        KeyCode::KeyL => Action::ToggleLighting,
        KeyCode::KeyN => Action::ToggleNormals,
        KeyCode::KeyW => Action::ToggleWireframe,
        KeyCode::KeyT if shift => Action::IncreaseTessellation,
        KeyCode::KeyT => Action::DecreaseTessellation,
        KeyCode::KeyH if shift => Action::IncreaseShininess,
        KeyCode::KeyH => Action::DecreaseShininess,
        KeyCode::KeyV => Action::ToggleLocalViewer,
        KeyCode::KeyD => Action::TogglePositionalLight,
        KeyCode::KeyB => Action::CycleBumps,
        KeyCode::KeyM => Action::ToggleLightingModel,
        KeyCode::KeyP => Action::TogglePerPixelLighting,
        KeyCode::KeyG => Action::CycleShape,
        _ => return None,
    };
    Some(action)
}

struct App {
    args: Args,
    dimensions: ShapeDimensions,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    camera: Camera,
    state: RenderState,
    mesh: Option<GpuMesh>,
    input: InputState,

    last_frame: Instant,
    frame_count: u32,
    fps_timer: Instant,
    fps: u32,

    fatal: Option<AppError>,
}

impl App {
    fn new(args: Args) -> Self {
        Self {
            dimensions: args.dimensions(),
            state: args.render_state(),
            args,

            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            camera: Camera::default(),
            mesh: None,
            input: InputState::default(),

            last_frame: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0,

            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title("Parametric Surfaces")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = pollster::block_on(GpuState::new(window.clone(), self.args.vsync))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height as f32);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);

        self.rebuild_mesh()?;
        Ok(())
    }

    fn rebuild_mesh(&mut self) -> Result<(), MeshError> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        let mut backend = WgpuBackend::new(&gpu.device);

        if let Some(mut old) = self.mesh.take() {
            old.release(&mut backend);
        }

        let resolution = self.state.resolution()?;
        let params = self.dimensions.params_for(self.state.shape);
        let config = self.args.mesh_config(self.state.shaders);

        let mesh = Mesh::build(&mut backend, &params, resolution, &config)?;
        log::info!(
            "{} mesh at tessellation {} ({}x{} samples, {} indices)",
            self.state.shape.name(),
            self.state.tessellation,
            resolution.count_u(),
            resolution.count_v(),
            mesh.element_count()
        );
        self.mesh = Some(mesh);
        Ok(())
    }

    fn release_mesh(&mut self) {
        if let (Some(gpu), Some(mut mesh)) = (&self.gpu, self.mesh.take()) {
            mesh.release(&mut WgpuBackend::new(&gpu.device));
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop, error: Option<AppError>) {
        if let Some(e) = error {
            log::error!("{e}");
            self.fatal = Some(e);
        }
        self.release_mesh();
        event_loop.exit();
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, action: Action) {
        if self.state.apply(action) == Effect::Rebuild {
            if let Err(e) = self.rebuild_mesh() {
                self.shutdown(event_loop, Some(e.into()));
            }
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.state.advance_animation(dt);

        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = (self.frame_count as f32 / elapsed).round() as u32;
            self.frame_count = 0;
            self.fps_timer = Instant::now();

            if self.state.status_display == StatusDisplay::Console {
                log::info!("{}", self.state.status_lines(self.fps).join(" | "));
            }
        }
    }

    fn render(&mut self) -> Result<(), AppError> {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(window);
        let overlay = (self.state.status_display == StatusDisplay::Overlay)
            .then(|| self.state.status_lines(self.fps));

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(lines) = &overlay {
                draw_status_overlay(ctx, lines);
            }
        });

        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return Ok(());
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(AppError::SurfaceOutOfMemory);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring the next frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let normal_length = self.args.normal_length;
        gpu.update_scene(&SceneUniforms::new(
            &self.camera,
            &self.state,
            &self.dimensions,
            normal_length,
        ));

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render(&view, &mut encoder, self.mesh.as_ref(), &self.state);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.shutdown(event_loop, Some(e));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop, None),

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera.set_aspect(size.width as f32, size.height as f32);
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.shift = modifiers.state().shift_key();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                if key == KeyCode::Escape {
                    self.shutdown(event_loop, None);
                } else if let Some(action) = action_for_key(key, self.input.shift) {
                    self.apply(event_loop, action);
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.input.orbiting = pressed,
                    MouseButton::Right => self.input.zooming = pressed,
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    self.shutdown(event_loop, Some(e));
                }
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            let delta = Vec2::new(delta.0 as f32, delta.1 as f32);
            if self.input.orbiting {
                self.camera.process_orbit(delta);
            }
            if self.input.zooming {
                self.camera.process_zoom(delta.y);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::builder()
        .filter_module("surface3d", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    log::debug!("{args:?}");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
