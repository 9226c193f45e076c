//! SwiftVJ Engine - owns the GPU device, the six tiles, and the
//! fixed-timestep render loop that drives them (`SPEC_FULL.md` §4.9).
//!
//! The engine itself does not spawn a thread or an event loop: the host
//! calls [`RenderEngine::start`] once, then [`RenderEngine::tick`] once per
//! frame on its own thread (typically a CVDisplayLink or a plain 60 Hz
//! timer), and [`RenderEngine::stop`] when done. The only concurrency this
//! crate introduces is around [`swiftvj_audio::AudioProcessor`]: its
//! `update` is meant to be called from a realtime audio callback thread,
//! so it sits behind one `parking_lot::Mutex`, and its output is published
//! into a `parking_lot::RwLock` "latest slot" the render loop samples
//! without contending with the writer (`SPEC_FULL.md` §5).

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gpu;
pub mod logging;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use gpu::GpuContext;
pub use logging::{init as init_logging, LogConfig, LogGuard};

use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use swiftvj_audio::AudioProcessor;
use swiftvj_core::{
    calc_synthetic_mouse, AudioState, LyricLine, LyricsDisplayState, RawAudioLevels, RefrainDisplayState, ShaderDisplayState,
    SongInfoDisplayState, TileConfig,
};
use swiftvj_io::SurfacePublisher;
use swiftvj_render::{MaskTile, ShaderLibrary, ShaderManager, ShaderTile};
use swiftvj_text::TextStateManager;
use swiftvj_tiles::{ImageTile, LyricsTile, RefrainTile, SongInfoTile};

/// Number of frame samples the FPS counter averages over (`SPEC_FULL.md`
/// §2's "accumulates over 30 frames").
const FPS_WINDOW: usize = 30;

/// Everything that exists only while the engine is `running`: GPU resources,
/// the six tiles, and their per-run state. Built in [`RenderEngine::start`],
/// torn down in [`RenderEngine::stop`].
struct Running {
    gpu: GpuContext,
    publisher: SurfacePublisher,
    text: TextStateManager,
    shader_manager: ShaderManager,
    shader_display: ShaderDisplayState,
    mask_display: ShaderDisplayState,
    shader_tile: ShaderTile,
    mask_tile: MaskTile,
    lyrics_tile: LyricsTile,
    refrain_tile: RefrainTile,
    song_info_tile: SongInfoTile,
    image_tile: ImageTile,
    last_frame: Instant,
    frame_times: Vec<f32>,
    fps: f32,
}

/// The tile manager and render engine: three-state lifecycle
/// (idle -> running -> idle), event fan-out, and the per-frame pipeline.
pub struct RenderEngine {
    config: EngineConfig,
    audio_processor: Arc<Mutex<AudioProcessor>>,
    latest_audio: Arc<RwLock<AudioState>>,
    running: Option<Running>,
}

impl RenderEngine {
    /// Builds an idle engine against `config`. No GPU resources are
    /// acquired until [`RenderEngine::start`].
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            audio_processor: Arc::new(Mutex::new(AudioProcessor::new())),
            latest_audio: Arc::new(RwLock::new(AudioState::silent(Instant::now()))),
            running: None,
        }
    }

    /// Whether the engine is currently `running`.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// This run's frames-per-second, averaged over the last
    /// [`FPS_WINDOW`] frames. `0.0` while idle or before the window fills.
    pub fn fps(&self) -> f32 {
        self.running.as_ref().map(|r| r.fps).unwrap_or(0.0)
    }

    /// The most recent audio snapshot `tick` sampled, or rest values while
    /// idle (no frame has run yet).
    pub fn audio_state(&self) -> AudioState {
        *self.latest_audio.read()
    }

    /// The generator shader display state, if running.
    pub fn shader_display(&self) -> Option<&ShaderDisplayState> {
        self.running.as_ref().map(|r| &r.shader_display)
    }

    /// The mask shader display state, if running.
    pub fn mask_display(&self) -> Option<&ShaderDisplayState> {
        self.running.as_ref().map(|r| &r.mask_display)
    }

    /// The lyrics envelope, if running.
    pub fn lyrics(&self) -> Option<&LyricsDisplayState> {
        self.running.as_ref().map(|r| r.text.lyrics())
    }

    /// The refrain envelope, if running.
    pub fn refrain(&self) -> Option<&RefrainDisplayState> {
        self.running.as_ref().map(|r| r.text.refrain())
    }

    /// The song-info envelope, if running.
    pub fn song_info(&self) -> Option<&SongInfoDisplayState> {
        self.running.as_ref().map(|r| r.text.song_info())
    }

    /// Acquires a GPU device, allocates the six tiles at the configured
    /// resolution, registers their shared surfaces, and transitions to
    /// `running`. The only error this engine ever returns across its public
    /// API (`SPEC_FULL.md` §7): no compatible adapter, or device creation
    /// failure.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let gpu = pollster::block_on(GpuContext::new())?;
        tracing::info!(adapter = %gpu.adapter_info.name, backend = ?gpu.adapter_info.backend, "engine starting");

        self.audio_processor.lock().reset();
        *self.latest_audio.write() = AudioState::silent(Instant::now());

        let shader_entries = ShaderLibrary::index(&self.config.shader_dir).unwrap_or_else(|err| {
            tracing::warn!(error = %err, dir = %self.config.shader_dir.display(), "failed to index shader directory, starting empty");
            Vec::new()
        });
        let shader_manager = ShaderManager::new(shader_entries);

        let (w, h) = (self.config.tile_width, self.config.tile_height);

        let mut publisher = SurfacePublisher::new(gpu.device.clone());
        publisher.create_standard_servers();

        let running = Running {
            shader_tile: ShaderTile::new(gpu.device.clone(), w, h, "shader"),
            mask_tile: MaskTile::new(gpu.device.clone(), w, h, "mask"),
            lyrics_tile: LyricsTile::new(&gpu.device, w, h),
            refrain_tile: RefrainTile::new(&gpu.device, w, h),
            song_info_tile: SongInfoTile::new(&gpu.device, w, h),
            image_tile: ImageTile::new(gpu.device.clone(), w, h),
            text: TextStateManager::new(Instant::now()),
            shader_manager,
            shader_display: ShaderDisplayState::new(),
            mask_display: ShaderDisplayState::new(),
            publisher,
            gpu,
            last_frame: Instant::now(),
            frame_times: Vec::with_capacity(FPS_WINDOW),
            fps: 0.0,
        };
        self.running = Some(running);
        Ok(())
    }

    /// Stops publishing and tears every per-run resource down, in reverse
    /// of the order `start()` acquired them: surfaces first, then tiles and
    /// the GPU context drop with the returned value. A no-op while idle.
    pub fn stop(&mut self) {
        if let Some(mut running) = self.running.take() {
            running.publisher.stop_all();
            tracing::info!("engine stopped");
        }
    }

    /// `onTrackChange`: restarts the song-info envelope.
    pub fn on_track_change(&mut self, artist: &str, title: &str, album: &str) {
        if let Some(running) = self.running.as_mut() {
            running.text.set_song_info(artist, title, album, Instant::now());
        }
    }

    /// `onLyricsLoaded`: replaces the karaoke line buffer.
    pub fn on_lyrics_loaded(&mut self, lines: Vec<LyricLine>) {
        if let Some(running) = self.running.as_mut() {
            running.text.set_lyrics(lines, Instant::now());
        }
    }

    /// `onActiveLine`: advances which lyric line is current.
    pub fn on_active_line(&mut self, index: i32) {
        if let Some(running) = self.running.as_mut() {
            running.text.set_active_line(index, Instant::now());
        }
    }

    /// `onRefrain`: restarts the refrain envelope with new text.
    pub fn on_refrain(&mut self, text: &str) {
        if let Some(running) = self.running.as_mut() {
            running.text.set_refrain(text, Instant::now());
        }
    }

    /// `onShaderChange`: selects a library shader by name or index, reads
    /// and compiles its source, and falls back to the built-in default
    /// (recording the error in [`ShaderDisplayState::error`]) on failure -
    /// never propagating a `Result` past this method.
    ///
    /// Selecting an already-loaded name a second time hits
    /// [`ShaderTile::is_cached`] and returns without touching the
    /// filesystem or the transpile/compile path at all (`SPEC_FULL.md` §8,
    /// Testable Property 10).
    pub fn on_shader_change(&mut self, name_or_index: &str) {
        let Some(running) = self.running.as_mut() else { return };
        running.shader_manager.select(name_or_index);
        let Some(entry) = running.shader_manager.current() else { return };
        let (entry_name, path) = (entry.name.clone(), entry.path.clone());

        if running.shader_tile.is_cached(&entry_name) {
            running.shader_display.is_loaded = true;
            running.shader_display.error.clear();
            running.shader_display.current = Some(entry_name);
            return;
        }

        match std::fs::read_to_string(&path) {
            Ok(source) => {
                let error = running.shader_tile.ensure_loaded(&entry_name, &source);
                running.shader_display.is_loaded = error.is_none();
                running.shader_display.error = error.unwrap_or_default();
                running.shader_display.current = Some(entry_name);
            }
            Err(err) => {
                tracing::warn!(shader = %entry_name, error = %err, "failed to read shader source, keeping previous selection");
                running.shader_display.error = err.to_string();
            }
        }
    }

    /// `onAudioUpdate`: the one method safe to call from a different thread
    /// than [`RenderEngine::tick`] (a realtime audio callback). Locks the
    /// processor, reshapes the raw levels, and publishes the result into
    /// the latest-state slot `tick` reads.
    pub fn on_audio_update(&mut self, raw: RawAudioLevels) {
        let state = self.audio_processor.lock().update(raw);
        *self.latest_audio.write() = state;
    }

    /// Advances one frame: samples audio, ticks every display-state
    /// envelope, renders all six tiles into one command buffer, publishes
    /// them, and submits. A no-op while idle.
    pub fn tick(&mut self) {
        let Some(running) = self.running.as_mut() else { return };
        let now = Instant::now();
        let dt = now.duration_since(running.last_frame).as_secs_f32().max(1e-4);
        running.last_frame = now;

        let audio = {
            let mut processor = self.audio_processor.lock();
            if processor.is_active() {
                drop(processor);
                *self.latest_audio.read()
            } else {
                let decayed = processor.update_with_timeout_decay();
                drop(processor);
                *self.latest_audio.write() = decayed;
                decayed
            }
        };

        running.text.tick(now);

        running.shader_display.audio_time += dt * audio.speed;
        running.shader_display.synthetic_mouse =
            calc_synthetic_mouse(running.shader_display.audio_time, audio.energy_slow, audio.bass, audio.mid, audio.beat_phase);
        running.mask_display.audio_time = running.shader_display.audio_time;
        running.mask_display.synthetic_mouse = running.shader_display.synthetic_mouse;

        let queue = running.gpu.queue.clone();
        running.image_tile.update(audio.beat4, now, &queue);

        let mut encoder = running.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("engine-frame") });

        running.shader_tile.render(&mut encoder, &queue, &audio, &running.shader_display);
        running.mask_tile.render(&mut encoder, &queue, &audio, &running.mask_display);
        running.lyrics_tile.render(running.text.lyrics(), &queue, &mut encoder);
        running.refrain_tile.render(running.text.refrain(), &queue, &mut encoder);
        running.song_info_tile.render(running.text.song_info(), &queue, &mut encoder);
        running.image_tile.render(&mut encoder, &queue);

        for tile in TileConfig::standard_six() {
            let texture = match tile.name {
                "Shader" => running.shader_tile.target(),
                "Mask" => running.mask_tile.target(),
                "Lyrics" => running.lyrics_tile.target(),
                "Refrain" => running.refrain_tile.target(),
                "SongInfo" => running.song_info_tile.target(),
                "Image" => running.image_tile.target(),
                _ => continue,
            };
            if let Err(err) = running.publisher.publish_on(tile.published_surface_name, texture, &queue, &mut encoder) {
                tracing::warn!(surface = tile.published_surface_name, error = %err, "surface publish failed");
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        running.gpu.device.poll(wgpu::PollType::Wait { submission_index: None, timeout: None }).ok();

        if running.frame_times.len() == FPS_WINDOW {
            running.frame_times.remove(0);
        }
        running.frame_times.push(dt);
        let total: f32 = running.frame_times.iter().sum();
        if total > 0.0 {
            running.fps = running.frame_times.len() as f32 / total;
        }
    }
}
