//! The generator and mask tiles: own a render target, a per-shader-name
//! compiled-pipeline cache, and the load-then-fall-back-on-failure pipeline
//! described in `SPEC_FULL.md` §4.4 step 1-4.

use std::collections::HashMap;
use std::sync::Arc;

use swiftvj_core::{AudioState, ShaderDisplayState, ShaderUniforms};

use crate::quad::QuadPipeline;
use crate::transpile::transpile_glsl_to_wgsl;
use crate::uniform_buffer::UniformBuffer;
use crate::TILE_FORMAT;

/// Builds a compiled pipeline for `source`, falling back to
/// `fallback_source` and recording the error string if the best-effort
/// transpile rejects the source outright, or if the transpile succeeds but
/// wgpu's own validation rejects the generated WGSL module. The fallback is
/// always one of the built-in sources (`SPEC_FULL.md` §4.4 step 4), which
/// are hand-authored and assumed to always pass GPU validation.
fn load_pipeline(
    device: &Arc<wgpu::Device>,
    bind_group_layout: &wgpu::BindGroupLayout,
    glsl_source: &str,
    fallback_source: &str,
    label: &str,
) -> (QuadPipeline, Option<String>) {
    let fall_back = |reason: String| {
        let pipeline = QuadPipeline::new(device, TILE_FORMAT, bind_group_layout, fallback_source, label)
            .expect("built-in fallback shader source is always valid WGSL");
        (pipeline, Some(reason))
    };

    match transpile_glsl_to_wgsl(glsl_source) {
        Ok(wgsl) => match QuadPipeline::new(device, TILE_FORMAT, bind_group_layout, &wgsl, label) {
            Ok(pipeline) => (pipeline, None),
            Err(gpu_error) => {
                tracing::warn!(shader = label, error = %gpu_error, "shader failed GPU validation, falling back to default");
                fall_back(gpu_error)
            }
        },
        Err(e) => {
            tracing::warn!(shader = label, error = %e, "shader transpile failed, falling back to default");
            fall_back(e.to_string())
        }
    }
}

/// Shared render-target, uniform-buffer, and per-name pipeline cache behind
/// [`ShaderTile`] and [`MaskTile`]: both follow the identical
/// read -> transform -> compile -> cache -> fallback contract described in
/// `SPEC_FULL.md` §4.4, differing only in which built-in source backs the
/// reserved `"__default__"` key.
struct TileBase {
    device: Arc<wgpu::Device>,
    uniforms: UniformBuffer,
    pipelines: HashMap<String, QuadPipeline>,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    resolution: [f32; 2],
    default_source: fn() -> String,
}

/// Reserved pipeline-cache key for the built-in fallback shader, compiled
/// lazily the first time no named shader is selected or loaded.
const DEFAULT_KEY: &str = "__default__";

impl TileBase {
    fn new(device: Arc<wgpu::Device>, width: u32, height: u32, label: &str, default_source: fn() -> String) -> Self {
        let uniforms = UniformBuffer::new(&device, &format!("{label}-uniforms"));
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TILE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            device,
            uniforms,
            pipelines: HashMap::new(),
            target,
            target_view,
            resolution: [width as f32, height as f32],
            default_source,
        }
    }

    fn target(&self) -> &wgpu::Texture {
        &self.target
    }

    /// Whether `name` already has a compiled pipeline cached - a selection
    /// by an already-loaded name must not re-read or re-compile anything
    /// (`SPEC_FULL.md` §8, Testable Property 10).
    fn is_cached(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    fn ensure_loaded(&mut self, name: &str, source: &str, label: &str) -> Option<String> {
        if self.pipelines.contains_key(name) {
            return None;
        }
        let (pipeline, error) = load_pipeline(&self.device, self.uniforms.bind_group_layout(), source, &(self.default_source)(), label);
        self.pipelines.insert(name.to_string(), pipeline);
        error
    }

    fn render(&mut self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue, audio: &AudioState, state: &ShaderDisplayState, pass_label: &str) {
        let uniforms = ShaderUniforms::from_state(audio, state, self.resolution);
        self.uniforms.write(queue, &uniforms);

        let key = match &state.current {
            Some(name) if self.pipelines.contains_key(name) => name.clone(),
            _ => {
                if !self.pipelines.contains_key(DEFAULT_KEY) {
                    let pipeline = QuadPipeline::new(
                        &self.device,
                        TILE_FORMAT,
                        self.uniforms.bind_group_layout(),
                        &(self.default_source)(),
                        DEFAULT_KEY,
                    )
                    .expect("built-in fallback shader source is always valid WGSL");
                    self.pipelines.insert(DEFAULT_KEY.to_string(), pipeline);
                }
                DEFAULT_KEY.to_string()
            }
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass_label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::BLACK), store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.pipelines.get(&key).expect("pipeline cached above").draw(&mut pass, self.uniforms.bind_group());
    }
}

/// Generator tile: renders the currently selected library shader (or the
/// built-in default) into its own BGRA8 render target.
pub struct ShaderTile {
    base: TileBase,
}

impl ShaderTile {
    /// Allocates the tile's render target and uniform buffer. No shader is
    /// loaded yet; [`ShaderTile::render`] draws the built-in default until
    /// [`ShaderTile::ensure_loaded`] successfully caches a named pipeline.
    pub fn new(device: Arc<wgpu::Device>, width: u32, height: u32, label: &str) -> Self {
        Self { base: TileBase::new(device, width, height, label, crate::default_shader::default_shader_source) }
    }

    /// The BGRA8 render target other tiles (e.g. the io surface publisher)
    /// read from after a frame is drawn.
    pub fn target(&self) -> &wgpu::Texture {
        self.base.target()
    }

    /// Whether `name` already has a compiled pipeline cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.base.is_cached(name)
    }

    /// Compiles and caches `source` under `name` if it is not already
    /// cached. Returns the compile error string on failure (the tile still
    /// renders using the built-in default for this and every subsequent
    /// frame until a different shader is selected).
    pub fn ensure_loaded(&mut self, name: &str, source: &str) -> Option<String> {
        self.base.ensure_loaded(name, source, name)
    }

    /// Writes this frame's uniform block and issues the draw, using the
    /// cached pipeline for `state.current` if loaded, else the built-in
    /// default (compiled lazily and cached under the reserved `"__default__"`
    /// key).
    pub fn render(&mut self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue, audio: &AudioState, state: &ShaderDisplayState) {
        self.base.render(encoder, queue, audio, state, "shader-tile-pass");
    }
}

/// Mask tile: identical render contract to [`ShaderTile`] but defaults to
/// [`crate::default_shader::default_mask_source`] instead of the
/// generator's plasma fallback.
pub struct MaskTile {
    base: TileBase,
}

impl MaskTile {
    /// Allocates the tile's render target and uniform buffer.
    pub fn new(device: Arc<wgpu::Device>, width: u32, height: u32, label: &str) -> Self {
        Self { base: TileBase::new(device, width, height, label, crate::default_shader::default_mask_source) }
    }

    /// The BGRA8 render target.
    pub fn target(&self) -> &wgpu::Texture {
        self.base.target()
    }

    /// Whether `name` already has a compiled pipeline cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.base.is_cached(name)
    }

    /// Compiles and caches `source` under `name`, mirroring
    /// [`ShaderTile::ensure_loaded`].
    pub fn ensure_loaded(&mut self, name: &str, source: &str) -> Option<String> {
        self.base.ensure_loaded(name, source, name)
    }

    /// Writes this frame's uniform block and draws, falling back to the
    /// built-in default mask under the reserved `"__default__"` key.
    pub fn render(&mut self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue, audio: &AudioState, state: &ShaderDisplayState) {
        self.base.render(encoder, queue, audio, state, "mask-tile-pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_device() -> Arc<wgpu::Device> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor { backends: wgpu::Backends::all(), ..Default::default() });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("test environment must expose a GPU adapter");
        let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("swiftvj-render test device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .expect("test adapter must create a device");
        Arc::new(device)
    }

    #[test]
    fn ensure_loaded_is_a_no_op_once_a_name_is_cached() {
        let device = test_device();
        let mut tile = ShaderTile::new(device, 64, 64, "test-shader");
        let source = "vec3 mainImage(vec2 uv) { return vec3(uv.x, uv.y, 0.0); }";

        assert!(!tile.is_cached("library-shader"));
        let first = tile.ensure_loaded("library-shader", source);
        assert!(first.is_none());
        assert!(tile.is_cached("library-shader"));

        // A second call with the same name must hit the cache branch and
        // never touch `load_pipeline`/`transpile_glsl_to_wgsl` again; we
        // can't observe that directly from here, so this only asserts the
        // outward no-op contract `ensure_loaded` promises. The file-read
        // side of Testable Property 10 is covered at the engine layer via
        // `ShaderTile::is_cached`, which `RenderEngine::on_shader_change`
        // checks before reading from disk at all.
        let second = tile.ensure_loaded("library-shader", "vec3 mainImage(vec2 uv) { return vec3(1.0); }");
        assert!(second.is_none());
    }

    #[test]
    fn shader_failure_falls_back_without_panicking() {
        let device = test_device();
        let mut tile = ShaderTile::new(device, 64, 64, "test-shader");
        let error = tile.ensure_loaded("broken", "not a valid shader source at all");
        assert!(error.is_some());
        assert!(tile.is_cached("broken"), "a failed load still caches the fallback pipeline under the requested name");
    }
}
