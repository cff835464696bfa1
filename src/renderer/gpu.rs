use std::sync::Arc;

use crate::error::{PlotError, Result};
use crate::renderer::device::WgpuContext;
use crate::renderer::frame::{DrawTarget, FrameOrchestrator, MeshPass, PlotMode};
use crate::renderer::pipeline::{DEPTH_FORMAT, SurfacePipelines};
use crate::renderer::resources::MeshResources;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

fn init_error(label: &str, reason: impl ToString) -> PlotError {
    PlotError::DeviceResourceCreationFailed {
        label: label.to_string(),
        reason: reason.to_string(),
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub context: WgpuContext,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub sample_count: u32,

    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl GpuState {
    pub async fn new(
        window: Arc<winit::window::Window>,
        sample_count: u32,
        vsync: bool,
    ) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| init_error("Window Surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| init_error("Adapter", "no compatible adapter"))?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Plot Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| init_error("Device", e))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or_else(|| init_error("Window Surface", "no supported formats"))?;

        let flags = adapter.get_texture_format_features(surface_format).flags;
        let sample_count = if sample_count > 1 && !flags.sample_count_supported(sample_count) {
            log::warn!("{sample_count}x MSAA unsupported for {surface_format:?}, rendering without");
            1
        } else {
            sample_count.max(1)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_attachment(&device, &config, DEPTH_FORMAT, sample_count, "Depth Texture");
        let msaa_view = (sample_count > 1).then(|| {
            create_attachment(&device, &config, config.format, sample_count, "MSAA Color Texture")
        });

        Ok(Self {
            surface,
            context: WgpuContext::new(device, queue),
            config,
            size,
            sample_count,
            depth_view,
            msaa_view,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            let device = &self.context.device;
            self.surface.configure(device, &self.config);
            self.depth_view = create_attachment(
                device,
                &self.config,
                DEPTH_FORMAT,
                self.sample_count,
                "Depth Texture",
            );
            if self.sample_count > 1 {
                self.msaa_view = Some(create_attachment(
                    device,
                    &self.config,
                    self.config.format,
                    self.sample_count,
                    "MSAA Color Texture",
                ));
            }
        }
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        self.surface.configure(&self.context.device, &self.config);
    }

    /// Clears the frame and draws the plotted surface according to `mode`.
    pub fn render_plot(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        orchestrator: &FrameOrchestrator<wgpu::Buffer>,
        pipelines: &SurfacePipelines,
        mode: PlotMode,
    ) {
        let (target, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(view)),
            None => (view, None),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Plot Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut pass = PlotPass {
            pass: &mut render_pass,
            pipelines,
            resources: orchestrator.resources(),
        };
        orchestrator.draw(&mut pass, mode);
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn create_attachment(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    format: wgpu::TextureFormat,
    sample_count: u32,
    label: &str,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: config.width.max(1),
        height: config.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

struct PlotPass<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    pipelines: &'a SurfacePipelines,
    resources: &'a MeshResources<wgpu::Buffer>,
}

impl DrawTarget for PlotPass<'_, '_> {
    fn draw_mesh(&mut self, pass: MeshPass, index_count: u32, instance_count: u32) {
        let (colors, indices) = match pass {
            MeshPass::Surface => (&self.resources.surface_colors, &self.resources.surface_indices),
            MeshPass::Wireframe => (
                &self.resources.wireframe_colors,
                &self.resources.wireframe_indices,
            ),
        };

        self.pass.set_pipeline(self.pipelines.pipeline(pass));
        self.pass
            .set_bind_group(0, &self.pipelines.transform_bind_group, &[]);
        self.pass
            .set_bind_group(1, &self.pipelines.lighting_bind_group, &[]);
        self.pass.set_vertex_buffer(0, self.resources.positions.slice(..));
        self.pass.set_vertex_buffer(1, self.resources.normals.slice(..));
        self.pass.set_vertex_buffer(2, colors.slice(..));
        self.pass
            .set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        self.pass.draw_indexed(0..index_count, 0, 0..instance_count);
    }
}
