//! A single triangle-strip-of-four-vertices pipeline shared by every tile.
//!
//! No vertex buffer is bound; `vs_main` in every shader module (built-in or
//! transpiled, see [`crate::default_shader`] and [`crate::transpile`])
//! generates its four corners from `@builtin(vertex_index)` alone.

use std::sync::Arc;

/// Wraps the `wgpu::RenderPipeline` built from one shader module against a
/// fixed bind-group layout and output format.
pub struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
}

impl QuadPipeline {
    /// Compiles `wgsl_source` and builds a pipeline drawing into
    /// `target_format` with the given uniform bind-group layout at group 0.
    ///
    /// `wgpu::Device::create_shader_module` itself never returns `Err` -
    /// compile errors surface asynchronously through the device's error
    /// scope - so this brackets both the shader module and the pipeline in
    /// a validation error scope and blocks on popping it, returning the
    /// driver's message as `Err` rather than letting it become an
    /// uncaptured device-lost error later.
    pub fn new(
        device: &Arc<wgpu::Device>,
        target_format: wgpu::TextureFormat,
        bind_group_layout: &wgpu::BindGroupLayout,
        wgsl_source: &str,
        label: &str,
    ) -> Result<Self, String> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(wgsl_source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label}-layout")),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(error.to_string());
        }

        Ok(Self { pipeline })
    }

    /// Binds the pipeline and issues the four-vertex strip draw against the
    /// given render pass. Caller owns the pass's color attachment and bind
    /// group bindings.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, bind_group: &'a wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..4, 0..1);
    }
}
