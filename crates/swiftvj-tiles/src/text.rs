//! The three text tiles (Lyrics, Refrain, SongInfo) and the CPU-bitmap ->
//! GPU-texture pipeline they share.
//!
//! Per `spec.md` §4.6 step 2, line rasterization goes through "the OS text
//! stack" - on macOS that is Core Text/Core Graphics, reached the same way
//! the teacher's `syphon` feature reaches for the `objc2` family for macOS
//! interop (`mapmap-io::syphon`). Cross-platform portability is an explicit
//! Non-goal, so non-macOS builds get a measurement-only fallback good
//! enough to exercise [`crate::layout`] in tests.

use std::sync::Arc;

use swiftvj_core::{LyricsDisplayState, RefrainDisplayState, SongInfoDisplayState};
use swiftvj_render::QuadPipeline;

use crate::layout::{compute_lyrics_layout, compute_refrain_layout, compute_song_info_layout, LineLayout};

#[cfg(target_os = "macos")]
mod raster {
    //! Core Text/Core Graphics backed measurement and rasterization.

    use objc2_core_foundation::{CFRange, CFString};
    use objc2_core_graphics::{CGColorSpace, CGContext, CGImageAlphaInfo};
    use objc2_core_text::{CTFont, CTLine};

    use crate::layout::TextMeasurer;

    /// Measures text width via `CTLineGetTypographicBounds`.
    pub struct CoreTextMeasurer;

    impl TextMeasurer for CoreTextMeasurer {
        fn measure_width(&self, text: &str, size: f32) -> f32 {
            let font = CTFont::with_name(&CFString::from_str("Helvetica"), size as f64, std::ptr::null());
            let attr_string = CTLine::attributed_string_for(text, &font);
            let line = CTLine::with_attributed_string(&attr_string);
            line.typographic_bounds().width as f32
        }
    }

    /// Rasterizes one centered, horizontally-centered line of white text
    /// into `bitmap` (RGBA8 premultiplied, `width * height * 4` bytes) at
    /// `y_fraction * height`, scaled by `opacity` (`0.0..=255.0`).
    pub fn draw_line(bitmap: &mut [u8], width: u32, height: u32, text: &str, size: f32, y_fraction: f32, opacity: f32) {
        if text.is_empty() || opacity <= 0.0 {
            return;
        }
        let color_space = CGColorSpace::create_device_rgb();
        let context = CGContext::with_data(
            bitmap.as_mut_ptr().cast(),
            width as usize,
            height as usize,
            8,
            width as usize * 4,
            &color_space,
            CGImageAlphaInfo::PremultipliedLast as u32,
        );

        let font = CTFont::with_name(&objc2_core_foundation::CFString::from_str("Helvetica"), size as f64, std::ptr::null());
        let attr_string = CTLine::attributed_string_for(text, &font);
        let line = CTLine::with_attributed_string(&attr_string);
        let bounds = line.typographic_bounds();

        let x = (width as f64 - bounds.width) / 2.0;
        let y = height as f64 * y_fraction as f64 - bounds.ascent / 2.0;

        context.set_rgb_fill_color(1.0, 1.0, 1.0, (opacity / 255.0) as f64);
        context.set_text_position(x, y);
        line.draw(&context);
    }
}

#[cfg(not(target_os = "macos"))]
mod raster {
    //! Measurement-only fallback used off macOS. Rasterization is a no-op:
    //! correctness of the drawn pixels is out of scope on this platform
    //! (cross-platform portability is a Non-goal), but [`crate::layout`]'s
    //! math is still exercised against this measurer in tests.

    use crate::layout::TextMeasurer;

    /// Approximates glyph width as `chars * size * 0.55`, close enough to a
    /// typical proportional font's average advance to drive auto-fit
    /// stepping in tests.
    pub struct CoreTextMeasurer;

    impl TextMeasurer for CoreTextMeasurer {
        fn measure_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.55
        }
    }

    pub fn draw_line(_bitmap: &mut [u8], _width: u32, _height: u32, _text: &str, _size: f32, _y_fraction: f32, _opacity: f32) {}
}

use raster::{draw_line, CoreTextMeasurer};

/// A fullscreen-textured blit: samples an RGBA8 texture and writes it
/// unmodified. Shared vertex stage matches every other tile's fullscreen
/// quad (`swiftvj_render::default_shader`).
const BLIT_WGSL: &str = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

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

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {
    return textureSample(tex, samp, in.uv);
}
"#;

/// The CPU-bitmap -> GPU-texture -> private-render-target pipeline common
/// to all three text tiles: one bitmap buffer and one GPU texture,
/// reallocated only if the tile is resized, reused every frame.
struct TextTileBase {
    width: u32,
    height: u32,
    bitmap: Vec<u8>,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    blit_pipeline: QuadPipeline,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
}

impl TextTileBase {
    fn new(device: &Arc<wgpu::Device>, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}-bitmap")),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label}-sampler")),
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label}-blit-bgl")),
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
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-blit-bg")),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&texture_view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&sampler) },
            ],
        });

        let blit_pipeline = QuadPipeline::new(device, swiftvj_render::TILE_FORMAT, &bind_group_layout, BLIT_WGSL, &format!("{label}-blit"))
            .expect("built-in blit shader source is always valid WGSL");

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: swiftvj_render::TILE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            width,
            height,
            bitmap: vec![0u8; width as usize * height as usize * 4],
            texture,
            bind_group,
            blit_pipeline,
            target,
            target_view,
        }
    }

    fn clear(&mut self) {
        self.bitmap.fill(0);
    }

    fn draw_line(&mut self, text: &str, size: f32, y_fraction: f32, opacity: f32) {
        draw_line(&mut self.bitmap, self.width, self.height, text, size, y_fraction, opacity);
    }

    fn upload_and_blit(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo { texture: &self.texture, mip_level: 0, origin: wgpu::Origin3d::ZERO, aspect: wgpu::TextureAspect::All },
            &self.bitmap,
            wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(self.width * 4), rows_per_image: Some(self.height) },
            wgpu::Extent3d { width: self.width, height: self.height, depth_or_array_layers: 1 },
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("text-tile-blit-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.blit_pipeline.draw(&mut pass, &self.bind_group);
    }

    fn target(&self) -> &wgpu::Texture {
        &self.target
    }
}

fn draw_optional(base: &mut TextTileBase, layout: Option<LineLayout>, text: &str) {
    if let Some(layout) = layout {
        base.draw_line(text, layout.size, layout.y_fraction, layout.opacity);
    }
}

/// Three-line karaoke lyrics tile.
pub struct LyricsTile {
    base: TextTileBase,
    measurer: CoreTextMeasurer,
}

impl LyricsTile {
    /// Allocates the tile's bitmap/texture/target at `width`x`height`.
    pub fn new(device: &Arc<wgpu::Device>, width: u32, height: u32) -> Self {
        Self { base: TextTileBase::new(device, width, height, "lyrics"), measurer: CoreTextMeasurer }
    }

    /// The tile's private BGRA8 render target.
    pub fn target(&self) -> &wgpu::Texture {
        self.base.target()
    }

    /// Clears the bitmap, lays out and draws the three lines from
    /// `state`, then uploads and blits into the tile's render target.
    pub fn render(&mut self, state: &LyricsDisplayState, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        self.base.clear();
        let layout = compute_lyrics_layout(
            &self.measurer,
            state.previous(),
            state.current(),
            state.next(),
            self.base.width as f32 * 0.9,
            state.text_opacity,
        );
        draw_optional(&mut self.base, Some(layout.prev), state.previous());
        draw_optional(&mut self.base, Some(layout.current), state.current());
        draw_optional(&mut self.base, Some(layout.next), state.next());
        self.base.upload_and_blit(queue, encoder);
    }
}

/// Single-line refrain tile.
pub struct RefrainTile {
    base: TextTileBase,
    measurer: CoreTextMeasurer,
}

impl RefrainTile {
    /// Allocates the tile's bitmap/texture/target at `width`x`height`.
    pub fn new(device: &Arc<wgpu::Device>, width: u32, height: u32) -> Self {
        Self { base: TextTileBase::new(device, width, height, "refrain"), measurer: CoreTextMeasurer }
    }

    /// The tile's private BGRA8 render target.
    pub fn target(&self) -> &wgpu::Texture {
        self.base.target()
    }

    /// Clears the bitmap, lays out and draws the refrain line, uploads and
    /// blits.
    pub fn render(&mut self, state: &RefrainDisplayState, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        self.base.clear();
        let layout = compute_refrain_layout(&self.measurer, &state.text, self.base.width as f32, state.opacity);
        draw_optional(&mut self.base, Some(layout.line), &state.text);
        self.base.upload_and_blit(queue, encoder);
    }
}

/// Two-line (artist/title) song-info tile.
pub struct SongInfoTile {
    base: TextTileBase,
    measurer: CoreTextMeasurer,
}

impl SongInfoTile {
    /// Allocates the tile's bitmap/texture/target at `width`x`height`.
    pub fn new(device: &Arc<wgpu::Device>, width: u32, height: u32) -> Self {
        Self { base: TextTileBase::new(device, width, height, "song-info"), measurer: CoreTextMeasurer }
    }

    /// The tile's private BGRA8 render target.
    pub fn target(&self) -> &wgpu::Texture {
        self.base.target()
    }

    /// Clears the bitmap, lays out and draws whichever of artist/title are
    /// present, uploads and blits.
    pub fn render(&mut self, state: &SongInfoDisplayState, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        self.base.clear();
        let opacity = state.opacity();
        let layout = compute_song_info_layout(&self.measurer, &state.artist, &state.title, self.base.width as f32, opacity);
        draw_optional(&mut self.base, layout.artist, &state.artist);
        draw_optional(&mut self.base, layout.title, &state.title);
        self.base.upload_and_blit(queue, encoder);
    }
}

#[cfg(test)]
mod tests {
    use super::raster::CoreTextMeasurer as TestMeasurer;
    use crate::layout::auto_fit_font_size;

    #[test]
    fn platform_measurer_produces_finite_positive_width() {
        let measurer = TestMeasurer;
        let size = auto_fit_font_size(&measurer, "hello world", 400.0, 12.0, 96.0);
        assert!(size >= 12.0 && size <= 96.0);
    }
}
