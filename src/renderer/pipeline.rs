use crate::error::{PlotError, Result};
use crate::renderer::frame::MeshPass;
use crate::renderer::resources::MeshResources;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

fn float3_stream(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Position, normal and color each come from their own buffer.
pub fn vertex_streams() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        float3_stream(&POSITION_ATTRIBUTES),
        float3_stream(&NORMAL_ATTRIBUTES),
        float3_stream(&COLOR_ATTRIBUTES),
    ]
}

fn buffer_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    ty: wgpu::BufferBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct SurfacePipelines {
    pub surface: wgpu::RenderPipeline,
    pub wireframe: wgpu::RenderPipeline,
    pub transform_bind_group: wgpu::BindGroup,
    pub lighting_bind_group: wgpu::BindGroup,
}

impl SurfacePipelines {
    pub fn pipeline(&self, pass: MeshPass) -> &wgpu::RenderPipeline {
        match pass {
            MeshPass::Surface => &self.surface,
            MeshPass::Wireframe => &self.wireframe,
        }
    }
}

pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(device: &'a wgpu::Device, format: wgpu::TextureFormat, sample_count: u32) -> Self {
        Self {
            device,
            format,
            sample_count,
        }
    }

    pub fn build(&self, resources: &MeshResources<wgpu::Buffer>) -> Result<SurfacePipelines> {
        let device = self.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transform Bind Group Layout"),
            entries: &[
                buffer_entry(0, wgpu::ShaderStages::VERTEX, wgpu::BufferBindingType::Uniform),
                buffer_entry(
                    1,
                    wgpu::ShaderStages::VERTEX,
                    wgpu::BufferBindingType::Storage { read_only: true },
                ),
            ],
        });

        let lighting_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Bind Group Layout"),
            entries: &[
                buffer_entry(0, wgpu::ShaderStages::FRAGMENT, wgpu::BufferBindingType::Uniform),
                buffer_entry(1, wgpu::ShaderStages::FRAGMENT, wgpu::BufferBindingType::Uniform),
            ],
        });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &transform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: resources.camera.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: resources.instances.as_entire_binding(),
                },
            ],
        });

        let lighting_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Bind Group"),
            layout: &lighting_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: resources.light.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: resources.material.as_entire_binding(),
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[&transform_layout, &lighting_layout],
            push_constant_ranges: &[],
        });

        let surface = self.create_pipeline(
            "Surface Render Pipeline",
            &layout,
            &shader,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let wireframe = self.create_pipeline(
            "Wireframe Render Pipeline",
            &layout,
            &shader,
            wgpu::PrimitiveTopology::LineList,
        );

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PlotError::DeviceResourceCreationFailed {
                label: "Surface Pipelines".to_string(),
                reason: err.to_string(),
            });
        }

        log::debug!(
            "built surface pipelines ({:?}, {}x MSAA)",
            self.format,
            self.sample_count
        );

        Ok(SurfacePipelines {
            surface,
            wireframe,
            transform_bind_group,
            lighting_bind_group,
        })
    }

    fn create_pipeline(
        &self,
        label: &str,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &vertex_streams(),
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: self.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_streams_are_separate_float3_buffers() {
        let streams = vertex_streams();
        for (location, stream) in streams.iter().enumerate() {
            assert_eq!(stream.array_stride, 12);
            assert_eq!(stream.step_mode, wgpu::VertexStepMode::Vertex);
            assert_eq!(stream.attributes.len(), 1);
            assert_eq!(stream.attributes[0].shader_location, location as u32);
            assert_eq!(stream.attributes[0].offset, 0);
            assert_eq!(stream.attributes[0].format, wgpu::VertexFormat::Float32x3);
        }
    }

    #[test]
    fn shader_declares_bound_groups() {
        let source = include_str!("shaders.wgsl");
        assert!(source.contains("@group(0) @binding(0) var<uniform> view_projection"));
        assert!(source.contains("@group(0) @binding(1) var<storage, read> instances"));
        assert!(source.contains("@group(1) @binding(0) var<uniform> light"));
        assert!(source.contains("@group(1) @binding(1) var<uniform> material"));
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
    }
}
