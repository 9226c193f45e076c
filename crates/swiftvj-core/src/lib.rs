//! SwiftVJ Core - Reactive Data Model
//!
//! This crate contains the immutable value types shared by every tile and
//! state manager in the engine, plus the pure helper functions used to
//! derive synthetic pointer motion, aspect-fit rectangles, and crossfade
//! easing. Nothing here touches a GPU, a clock, or the filesystem: every
//! type is a plain snapshot, and every function is deterministic given its
//! arguments.

#![warn(missing_docs)]

pub mod audio_state;
pub mod error;
pub mod image_state;
pub mod reactive;
pub mod shader_state;
pub mod text_state;
pub mod tile_config;
pub mod uniforms;

pub use audio_state::{AudioState, RawAudioLevels, SPEED_CEILING, SPEED_FLOOR};
pub use error::CoreError;
pub use glam::Vec2;
pub use image_state::ImageDisplayState;
pub use reactive::{calc_aspect_ratio_dimensions, calc_synthetic_mouse, ease_in_out_quad, Rect};
pub use shader_state::{ShaderDisplayState, ShaderInfo, ShaderRating};
pub use text_state::{hold_then_fall, LyricLine, LyricsDisplayState, RefrainDisplayState, SongInfoDisplayState};
pub use tile_config::TileConfig;
pub use uniforms::ShaderUniforms;

/// Normalizes a beat-within-bar counter to `{0, 1, 2, 3}`.
///
/// `beat_time` sources are not guaranteed to be non-negative or strictly
/// monotonic (see the open question in the design notes); a plain `%` would
/// return a negative remainder for negative input, so this uses the
/// double-modulo form.
pub fn normalize_beat4(beat_time: i64) -> u8 {
    (((beat_time % 4) + 4) % 4) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_beat4_handles_negative_and_large_input() {
        assert_eq!(normalize_beat4(0), 0);
        assert_eq!(normalize_beat4(1), 1);
        assert_eq!(normalize_beat4(4), 0);
        assert_eq!(normalize_beat4(-1), 3);
        assert_eq!(normalize_beat4(-4), 0);
        assert_eq!(normalize_beat4(9), 1);
    }
}
