//! Image tile: aspect-correct placement, crossfades, and beat-synchronous
//! folder cycling (`spec.md` §4.7).
//!
//! Decode is dispatched onto a background thread and committed back via a
//! bounded channel, mirroring the teacher's decode/upload pipeline split
//! (`mapmap-media::pipeline::FramePipeline`) but scaled down to the single
//! in-flight decode this tile needs. Each decode request carries a
//! generation counter; a result whose generation no longer matches the
//! tile's current generation is dropped silently, implementing the
//! "commit only if the key is still current" rule from `SPEC_FULL.md` §9.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::{Receiver, Sender};
use swiftvj_core::{calc_aspect_ratio_dimensions, ease_in_out_quad, ImageDisplayState, Rect};
use swiftvj_render::QuadPipeline;

/// Extensions accepted by [`ImageTile::load_folder`], matched
/// case-insensitively.
const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp"];

/// Samples `current`/`next` each into their own aspect-fit placement rect
/// (normalized `x, y, w, h`) and mixes by `progress`, matching the
/// fullscreen-quad convention every other tile shares
/// (`swiftvj_render::quad::QuadPipeline`).
const CROSSFADE_WGSL: &str = r#"
struct Params {
    current_rect: vec4f,
    next_rect: vec4f,
    progress: f32,
    _pad: vec3f,
}

@group(0) @binding(0) var current_tex: texture_2d<f32>;
@group(0) @binding(1) var current_samp: sampler;
@group(0) @binding(2) var next_tex: texture_2d<f32>;
@group(0) @binding(3) var next_samp: sampler;
@group(0) @binding(4) var<uniform> params: Params;

struct VertexOutput {
    @builtin(position) clip_position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2f, 4>(
        vec2f(-1.0, -1.0), vec2f(1.0, -1.0), vec2f(-1.0, 1.0), vec2f(1.0, 1.0)
    );
    let pos = positions[vertex_index];
    var out: VertexOutput;
    out.clip_position = vec4f(pos, 0.0, 1.0);
    out.uv = vec2f(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}

fn sample_placed(tex: texture_2d<f32>, samp: sampler, uv: vec2f, rect: vec4f) -> vec4f {
    let local = (uv - rect.xy) / rect.zw;
    if (local.x < 0.0 || local.x > 1.0 || local.y < 0.0 || local.y > 1.0) {
        return vec4f(0.0, 0.0, 0.0, 1.0);
    }
    return textureSample(tex, samp, local);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {
    let a = sample_placed(current_tex, current_samp, in.uv, params.current_rect);
    let b = sample_placed(next_tex, next_samp, in.uv, params.next_rect);
    return mix(a, b, params.progress);
}
"#;

/// GPU-side crossfade parameters, written once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CrossfadeParams {
    current_rect: [f32; 4],
    next_rect: [f32; 4],
    progress: f32,
    _pad: [f32; 3],
}

/// Errors surfaced from image decode/load.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    /// The path could not be read from disk.
    #[error("failed to read image file {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bytes at the path could not be decoded as an image.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        /// Path that failed to decode.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },
}

/// A decoded image's RGBA8 pixels, ready for GPU upload.
struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// One completed (or failed) background decode, tagged with the generation
/// it was requested under.
struct DecodeResult {
    generation: u64,
    url: String,
    outcome: Result<DecodedImage, ImageLoadError>,
}

fn decode_from_disk(path: &Path) -> Result<DecodedImage, ImageLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Read { path: path.to_path_buf(), source })?;
    let img = image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode { path: path.to_path_buf(), source })?;
    let rgba = img.to_rgba8();
    Ok(DecodedImage { width: rgba.width(), height: rgba.height(), pixels: rgba.into_raw() })
}

/// Manages a tile's current/next GPU textures, the crossfade between them,
/// and folder cycling.
pub struct ImageTile {
    device: Arc<wgpu::Device>,
    width: u32,
    height: u32,
    state: ImageDisplayState,
    current_texture: Option<(wgpu::Texture, u32, u32)>,
    next_texture: Option<(wgpu::Texture, u32, u32)>,
    generation: u64,
    decode_tx: Sender<(u64, String, PathBuf)>,
    result_rx: Receiver<DecodeResult>,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    crossfade_pipeline: QuadPipeline,
    crossfade_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    dummy_texture: wgpu::Texture,
    dummy_view: wgpu::TextureView,
    params_buffer: wgpu::Buffer,
}

impl ImageTile {
    /// Allocates the tile's render target and spawns the background decode
    /// worker thread.
    pub fn new(device: Arc<wgpu::Device>, width: u32, height: u32) -> Self {
        let (decode_tx, decode_rx) = crossbeam_channel::unbounded::<(u64, String, PathBuf)>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<DecodeResult>();

        std::thread::spawn(move || {
            while let Ok((generation, url, path)) = decode_rx.recv() {
                let outcome = decode_from_disk(&path);
                if result_tx.send(DecodeResult { generation, url, outcome }).is_err() {
                    break;
                }
            }
        });

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("image-tile"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: swiftvj_render::TILE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor { label: Some("image-tile-sampler"), ..Default::default() });

        let dummy_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("image-tile-dummy"),
            size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let dummy_view = dummy_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let crossfade_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image-tile-crossfade-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None },
                    count: None,
                },
            ],
        });
        let crossfade_pipeline = QuadPipeline::new(&device, swiftvj_render::TILE_FORMAT, &crossfade_bgl, CROSSFADE_WGSL, "image-tile-crossfade")
            .expect("built-in crossfade shader source is always valid WGSL");
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("image-tile-crossfade-params"),
            size: std::mem::size_of::<CrossfadeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device,
            width,
            height,
            state: ImageDisplayState::new(std::time::Instant::now()),
            current_texture: None,
            next_texture: None,
            generation: 0,
            decode_tx,
            result_rx,
            target,
            target_view,
            crossfade_pipeline,
            crossfade_bgl,
            sampler,
            dummy_texture,
            dummy_view,
            params_buffer,
        }
    }

    /// The tile's private BGRA8 render target.
    pub fn target(&self) -> &wgpu::Texture {
        &self.target
    }

    /// Read-only display-state snapshot.
    pub fn state(&self) -> &ImageDisplayState {
        &self.state
    }

    /// Schedules an asynchronous decode of `path`, cancelling any in-flight
    /// decode for this tile (the generation bump makes the old one's result
    /// uncommittable when it eventually arrives).
    pub fn load_image(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.generation += 1;
        self.state.next_image_url = path.display().to_string();
        let _ = self.decode_tx.send((self.generation, self.state.next_image_url.clone(), path));
    }

    /// Indexes `dir` for accepted image extensions, sorted by name, and
    /// begins loading the first entry.
    pub fn load_folder(&mut self, dir: &Path) -> std::io::Result<()> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    entries.push(path);
                }
            }
        }
        entries.sort();

        self.state.folder_images = entries.iter().map(|p| p.display().to_string()).collect();
        self.state.folder_index = 0;
        if let Some(first) = entries.first() {
            self.load_image(first.clone());
        }
        Ok(())
    }

    /// Advances to the next folder image, bypassing the beat-cycling gate.
    pub fn next_folder_image(&mut self) {
        self.step_folder(1);
    }

    /// Steps back to the previous folder image, bypassing the beat-cycling
    /// gate.
    pub fn prev_folder_image(&mut self) {
        self.step_folder(-1);
    }

    fn step_folder(&mut self, delta: i64) {
        let count = self.state.folder_images.len();
        if count == 0 {
            return;
        }
        let idx = self.state.folder_index as i64 + delta;
        let idx = ((idx % count as i64) + count as i64) % count as i64;
        self.state.folder_index = idx as usize;
        let path = PathBuf::from(&self.state.folder_images[self.state.folder_index]);
        self.load_image(path);
    }

    /// Sets the beat-synchronous cycling interval in bars; `0` disables it.
    pub fn set_beats_per_change(&mut self, n: u32) {
        self.state.beats_per_change = n;
    }

    /// Sets whether the tile letterboxes (`false`) or fills-and-crops
    /// (`true`).
    pub fn set_cover_mode(&mut self, cover: bool) {
        self.state.cover_mode = cover;
    }

    /// Per-frame update: drains completed decodes, advances the crossfade
    /// envelope, and checks the beat-cycling gate.
    pub fn update(&mut self, beat4: u8, now: std::time::Instant, queue: &wgpu::Queue) {
        while let Ok(result) = self.result_rx.try_recv() {
            if result.generation != self.generation {
                continue;
            }
            match result.outcome {
                Ok(decoded) => self.commit_decoded(decoded, queue),
                Err(err) => tracing::warn!(url = result.url, error = %err, "image decode failed"),
            }
        }

        if self.state.is_fading {
            let elapsed = now.duration_since(self.state.fade_start_time).as_secs_f32();
            let t = (elapsed / ImageDisplayState::FADE_DURATION_SECS).clamp(0.0, 1.0);
            self.state.crossfade_progress = ease_in_out_quad(t);
            if self.state.crossfade_progress >= 1.0 {
                self.state.is_fading = false;
                self.current_texture = self.next_texture.take();
                self.state.current_image_url = std::mem::take(&mut self.state.next_image_url);
            }
        }

        let gate_crossed = self.state.last_seen_beat4 != Some(beat4);
        self.state.last_seen_beat4 = Some(beat4);
        if gate_crossed && !self.state.folder_images.is_empty() && self.state.beats_per_change > 0 && beat4 % (self.state.beats_per_change as u8).max(1) == 0 {
            self.step_folder(1);
        }
    }

    fn commit_decoded(&mut self, decoded: DecodedImage, queue: &wgpu::Queue) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("image-tile-source"),
            size: wgpu::Extent3d { width: decoded.width, height: decoded.height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo { texture: &texture, mip_level: 0, origin: wgpu::Origin3d::ZERO, aspect: wgpu::TextureAspect::All },
            &decoded.pixels,
            wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(decoded.width * 4), rows_per_image: Some(decoded.height) },
            wgpu::Extent3d { width: decoded.width, height: decoded.height, depth_or_array_layers: 1 },
        );

        // Every decode, including the very first, becomes the *next*
        // texture and starts a crossfade; there is no snap-in special case
        // (`spec.md` §4.7's load algorithm draws none). With no current
        // texture yet, the fade-in target is the always-black dummy
        // texture `render` falls through to for a zero-size placement
        // rect, so the first image still fades in rather than popping.
        self.next_texture = Some((texture, decoded.width, decoded.height));
        self.state.is_fading = true;
        self.state.crossfade_progress = 0.0;
        self.state.fade_start_time = std::time::Instant::now();
    }

    /// Computes the aspect-fit placement rect for the currently shown
    /// image against this tile's buffer dimensions.
    pub fn current_placement(&self) -> Option<Rect> {
        let (_, w, h) = self.current_texture.as_ref()?;
        Some(calc_aspect_ratio_dimensions(*w as f32, *h as f32, self.width as f32, self.height as f32, self.state.cover_mode))
    }

    fn placement_uv(&self, dims: Option<(u32, u32)>) -> [f32; 4] {
        match dims {
            Some((w, h)) => {
                let rect = calc_aspect_ratio_dimensions(w as f32, h as f32, self.width as f32, self.height as f32, self.state.cover_mode);
                [rect.x / self.width as f32, rect.y / self.height as f32, rect.w / self.width as f32, rect.h / self.height as f32]
            }
            None => [0.0, 0.0, 0.0, 0.0],
        }
    }

    /// Composites the current/next textures into the tile's render target,
    /// cross-fading by [`ImageDisplayState::crossfade_progress`].
    pub fn render(&mut self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo { texture: &self.dummy_texture, mip_level: 0, origin: wgpu::Origin3d::ZERO, aspect: wgpu::TextureAspect::All },
            &[0u8, 0, 0, 255],
            wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(4), rows_per_image: Some(1) },
            wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
        );

        let current_view = self.current_texture.as_ref().map(|(t, _, _)| t.create_view(&wgpu::TextureViewDescriptor::default()));
        let next_view = self.next_texture.as_ref().map(|(t, _, _)| t.create_view(&wgpu::TextureViewDescriptor::default()));

        let current_rect = self.placement_uv(self.current_texture.as_ref().map(|(_, w, h)| (*w, *h)));
        let next_rect = self.placement_uv(self.next_texture.as_ref().map(|(_, w, h)| (*w, *h)));
        let progress = if self.state.is_fading { self.state.crossfade_progress } else { 0.0 };

        let params = CrossfadeParams { current_rect, next_rect, progress, _pad: [0.0; 3] };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("image-tile-crossfade-bg"),
            layout: &self.crossfade_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(current_view.as_ref().unwrap_or(&self.dummy_view)) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(next_view.as_ref().unwrap_or(&self.dummy_view)) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 4, resource: self.params_buffer.as_entire_binding() },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("image-tile-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::BLACK), store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.crossfade_pipeline.draw(&mut pass, &bind_group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_cover_the_documented_set() {
        for ext in ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp"] {
            assert!(ACCEPTED_EXTENSIONS.contains(&ext));
        }
    }

    #[test]
    fn step_folder_wraps_in_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            std::fs::write(dir.path().join(format!("{i}.png")), b"").unwrap();
        }

        // Build a tile without a live GPU device is not possible here; this
        // test exercises the pure index-wrapping arithmetic directly.
        let count: i64 = 3;
        let wrap = |idx: i64| ((idx % count) + count) % count;
        assert_eq!(wrap(-1), 2);
        assert_eq!(wrap(3), 0);
        assert_eq!(wrap(1), 1);
    }
}
