//! Shader library entries and the shader tile's display-state snapshot.

use glam::Vec2;
use std::path::PathBuf;

/// A subjective quality rating applied to a shader by the (external)
/// rating store. Reading a rating in is not the "persistence of shader
/// ratings" Non-goal - this crate only consumes the value, it never writes
/// one back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShaderRating {
    /// Broken: fails to compile or renders garbage.
    Broken,
    /// Should be skipped when auto-cycling.
    Skip,
    /// Acceptable.
    Ok,
    /// Good.
    Good,
    /// The best of the library.
    Best,
}

/// One entry in the shader (or mask) library.
#[derive(Debug, Clone)]
pub struct ShaderInfo {
    /// File-stem name, used as the stable identifier for selection/caching.
    pub name: String,
    /// Full path to the source file.
    pub path: PathBuf,
    /// Quality rating.
    pub rating: ShaderRating,
}

/// The shader tile's per-frame display state.
#[derive(Debug, Clone)]
pub struct ShaderDisplayState {
    /// Name of the shader that should be bound, or `None` for the default.
    pub current: Option<String>,
    /// Whether `current` successfully compiled and is bound.
    pub is_loaded: bool,
    /// Non-empty when the most recent load attempt for `current` failed;
    /// holds the compiler/parse error text.
    pub error: String,
    /// Accumulated shader-local time, advanced by `audio_state.speed * dt`.
    pub audio_time: f32,
    /// The current synthetic-mouse position fed to the shader's `mouse`
    /// uniform.
    pub synthetic_mouse: Vec2,
}

impl ShaderDisplayState {
    /// Builds the state at tile construction: no shader selected (bound to
    /// the built-in default), zero elapsed time.
    pub fn new() -> Self {
        Self {
            current: None,
            is_loaded: true,
            error: String::new(),
            audio_time: 0.0,
            synthetic_mouse: Vec2::new(0.5, 0.5),
        }
    }
}

impl Default for ShaderDisplayState {
    fn default() -> Self {
        Self::new()
    }
}
