use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::{Vec2, Vec3};

mod config;
mod error;
mod math;
mod renderer;
mod ui;

use config::{Args, ScenePreset};
use error::Result;
use renderer::{
    Camera, CameraMode, CameraSource, FrameOrchestrator, GpuState, InstanceLayout, MeshCapacity,
    PipelineBuilder, SurfacePipelines,
};
use ui::{PlotStats, SurfaceParams, UiState, apply_theme, draw_help_overlay, draw_side_panel};

#[derive(Default)]
struct InputState {
    forward: f32,
    right: f32,
    up: f32,
    mouse_captured: bool,
    mouse_delta: Vec2,
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    orchestrator: Option<FrameOrchestrator<wgpu::Buffer>>,
    pipelines: Option<SurfacePipelines>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    args: Args,
    params: SurfaceParams,
    layout: InstanceLayout,
    capacity: MeshCapacity,
    max_grid: usize,
    home_eye: Vec3,

    camera: Camera,
    ui_state: UiState,
    input: InputState,

    started: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    last_frame_time: Instant,
}

impl App {
    fn new(args: Args, preset: ScenePreset) -> Self {
        let ui_state = UiState {
            vsync_enabled: args.vsync,
            ..Default::default()
        };

        Self {
            window: None,
            gpu: None,
            orchestrator: None,
            pipelines: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            params: preset.params,
            layout: preset.layout,
            capacity: preset.capacity,
            max_grid: preset.max_grid,
            home_eye: preset.eye,

            camera: Camera::orbiting(preset.eye, Vec3::ZERO),
            ui_state,
            input: InputState::default(),

            started: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,

            last_frame_time: Instant::now(),
            args,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.args.msaa,
            self.args.vsync,
        ))?;

        let orchestrator =
            FrameOrchestrator::new(&gpu.context, &self.params, self.layout, self.capacity)?;
        let pipelines =
            PipelineBuilder::new(&gpu.context.device, gpu.config.format, gpu.sample_count)
                .build(orchestrator.resources())?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.context.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.orchestrator = Some(orchestrator);
        self.pipelines = Some(pipelines);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        self.started = Instant::now();
        Ok(())
    }

    /// Returns false once the renderer hit an error it cannot draw past.
    fn update(&mut self) -> bool {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        self.camera.set_mode(self.ui_state.camera_mode);
        self.camera
            .process_keyboard(self.input.forward, self.input.right, self.input.up, dt);

        if self.input.mouse_captured {
            self.camera.process_mouse_movement(self.input.mouse_delta);
        }
        self.input.mouse_delta = Vec2::ZERO;

        let (Some(gpu), Some(orchestrator)) = (&self.gpu, &mut self.orchestrator) else {
            return true;
        };

        let edited = self.params.is_changed();
        let report = orchestrator.tick(
            &gpu.context,
            &mut self.camera,
            &mut self.params,
            gpu.aspect(),
            self.started.elapsed().as_secs_f32(),
        );

        if let Some(err) = &report.error {
            if !err.is_recoverable() {
                log::error!("renderer stopped: {err}");
                return false;
            }
        }

        if edited {
            self.ui_state.last_error = report.error.as_ref().map(ToString::to_string);
            if let Some(window) = &self.window {
                window.set_title(&format!("surfplot - {}", orchestrator.current().family));
            }
        } else if let Some(err) = report.error {
            self.ui_state.last_error = Some(err.to_string());
        }
        true
    }

    fn stats(&self) -> PlotStats {
        let Some(orchestrator) = &self.orchestrator else {
            return PlotStats::default();
        };
        let resources = orchestrator.resources();
        PlotStats {
            fps: self.fps,
            vertices: orchestrator.current().vertex_count(),
            triangles: resources.surface_index_count() as usize / 3,
            edges: resources.wireframe_index_count() as usize / 2,
            instances: resources.instance_count() as usize,
            max_grid: self.max_grid,
        }
    }

    fn render(&mut self) {
        if self.ui_state.fps_cap_enabled {
            let frame_duration = Duration::from_secs_f64(1.0 / self.ui_state.fps_cap as f64);
            let elapsed = self.last_frame_time.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
        self.last_frame_time = Instant::now();

        let stats = self.stats();
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);
        let camera_mode = self.camera.mode;
        let eye = self.camera.eye().to_array();

        let mut actions = ui::UiActions::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = draw_side_panel(ctx, &mut self.ui_state, &mut self.params, &stats);
            draw_help_overlay(ctx, camera_mode, eye);
        });

        if actions.reset_camera {
            self.camera = Camera::orbiting(self.home_eye, Vec3::ZERO);
            self.ui_state.camera_mode = CameraMode::Orbital;
        }

        let Some(gpu) = &mut self.gpu else { return };
        let (Some(orchestrator), Some(pipelines)) = (&self.orchestrator, &self.pipelines) else {
            return;
        };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if actions.vsync_toggled {
            gpu.set_vsync(self.ui_state.vsync_enabled);
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let device = &gpu.context.device;
        let queue = &gpu.context.queue;

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, id, &delta);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Main Encoder"),
        });

        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);

        gpu.render_plot(&view, &mut encoder, orchestrator, pipelines, self.params.plot_mode);

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

        queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let value = if pressed { 1.0 } else { 0.0 };

        match key {
            KeyCode::KeyW | KeyCode::KeyZ => self.input.forward = value,
            KeyCode::KeyS => self.input.forward = -value,
            KeyCode::KeyA | KeyCode::KeyQ => self.input.right = -value,
            KeyCode::KeyD => self.input.right = value,
            KeyCode::Space => self.input.up = value,
            KeyCode::ShiftLeft | KeyCode::ControlLeft => self.input.up = -value,
            KeyCode::Tab if pressed => {
                self.ui_state.camera_mode = match self.ui_state.camera_mode {
                    CameraMode::Orbital => CameraMode::Free,
                    CameraMode::Free => CameraMode::Orbital,
                };
            }
            KeyCode::Escape if pressed => {
                self.input.mouse_captured = false;
                if let Some(window) = &self.window {
                    let _ = window.set_cursor_grab(winit::window::CursorGrabMode::None);
                    window.set_cursor_visible(true);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(format!("surfplot - {}", self.params.family))
            .with_inner_size(PhysicalSize::new(1600, 900));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        if let Err(err) = self.init_gpu(window) {
            log::error!("failed to initialize renderer: {err}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state == ElementState::Pressed);
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.input.mouse_captured = state == ElementState::Pressed;

                if let Some(window) = &self.window {
                    if self.input.mouse_captured {
                        let _ = window.set_cursor_grab(winit::window::CursorGrabMode::Confined);
                        window.set_cursor_visible(false);
                    } else {
                        let _ = window.set_cursor_grab(winit::window::CursorGrabMode::None);
                        window.set_cursor_visible(true);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.process_scroll(scroll);
            }

            WindowEvent::RedrawRequested => {
                if !self.update() {
                    event_loop.exit();
                    return;
                }
                self.render();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.mouse_captured {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    )
    .init();

    let args = Args::parse();
    let preset = match args.preset() {
        Ok(preset) => preset,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(2);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args, preset);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("event loop terminated: {err}");
    }
}
