//! Engine configuration, loaded from a TOML file.
//!
//! Mirrors the teacher's `mapmap-ui::config::UserConfig` (a `serde`-derived
//! struct with a `Default` impl, loaded from and saved to a file under the
//! platform config directory) but serialized as TOML rather than JSON, and
//! scoped to the handful of settings this engine actually owns: where to
//! find shaders and masks, the tile resolution new tiles default to, the
//! target frame rate, and how long silence is tolerated before the audio
//! processor starts decaying towards rest (`SPEC_FULL.md` §2).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

fn default_shader_dir() -> PathBuf {
    PathBuf::from("shaders")
}

fn default_mask_dir() -> PathBuf {
    PathBuf::from("masks")
}

fn default_tile_width() -> u32 {
    1280
}

fn default_tile_height() -> u32 {
    720
}

fn default_target_fps() -> f32 {
    60.0
}

fn default_silence_timeout_ms() -> u64 {
    1500
}

/// Engine-wide settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory scanned for generator shaders (`SPEC_FULL.md` §4.4).
    pub shader_dir: PathBuf,
    /// Directory scanned for mask shaders, indexed separately from
    /// `shader_dir` even though both use [`swiftvj_render::ShaderLibrary`].
    pub mask_dir: PathBuf,
    /// Default tile width in pixels; overridable per [`swiftvj_core::TileConfig`].
    pub tile_width: u32,
    /// Default tile height in pixels; overridable per [`swiftvj_core::TileConfig`].
    pub tile_height: u32,
    /// Target render loop frequency.
    pub target_fps: f32,
    /// How long the audio processor waits for a fresh update before it
    /// starts decaying towards silence (`swiftvj_audio::SILENCE_TIMEOUT`).
    pub silence_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shader_dir: default_shader_dir(),
            mask_dir: default_mask_dir(),
            tile_width: default_tile_width(),
            tile_height: default_tile_height(),
            target_fps: default_target_fps(),
            silence_timeout_ms: default_silence_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// The per-user config file path (`~/.config/SwiftVJ/config.toml` on
    /// Linux, the platform equivalent elsewhere), if the platform exposes
    /// one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("SwiftVJ");
            p.push("config.toml");
            p
        })
    }

    /// Reads and parses `path`. Returns [`EngineError::Config`] if the file
    /// exists but fails to parse; a missing file is not an error and yields
    /// [`EngineConfig::default`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).unwrap_or_default();
        toml::from_str(&content).map_err(|source| EngineError::Config { path: path.display().to_string(), source })
    }

    /// Loads from [`EngineConfig::default_path`], falling back to
    /// [`EngineConfig::default`] if the platform has no config directory or
    /// the file doesn't exist yet.
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load(&path).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Serializes to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_targets() {
        let config = EngineConfig::default();
        assert_eq!(config.tile_width, 1280);
        assert_eq!(config.tile_height, 720);
        assert_eq!(config.target_fps, 60.0);
        assert_eq!(config.silence_timeout_ms, 1500);
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = EngineConfig::default();
        config.target_fps = 30.0;
        config.shader_dir = PathBuf::from("/tmp/shaders");
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn malformed_file_surfaces_as_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml {{{").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(EngineError::Config { .. })));
    }
}
