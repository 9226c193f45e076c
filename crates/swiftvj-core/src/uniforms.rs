//! The fixed-layout GPU uniform block bound to every shader invocation.

use bytemuck::{Pod, Zeroable};

use crate::audio_state::AudioState;
use crate::shader_state::ShaderDisplayState;

/// Binary layout bound at buffer index 0 in both the vertex and fragment
/// stages. Field order and types are fixed across every loaded shader and
/// the built-in default - this is the one contract every generator, mask,
/// and fallback shares.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShaderUniforms {
    /// Accumulated shader-local time, seconds.
    pub time: f32,
    /// Tile resolution in pixels.
    pub resolution: [f32; 2],
    /// Synthetic mouse position, `[0,1]^2`.
    pub mouse: [f32; 2],
    /// Reactive animation speed.
    pub speed: f32,
    /// Bass band energy.
    pub bass: f32,
    /// Low-mid band energy.
    pub low_mid: f32,
    /// Mid band energy.
    pub mid: f32,
    /// Highs band energy.
    pub highs: f32,
    /// Overall level.
    pub level: f32,
    /// Smoothed kick envelope.
    pub kick_env: f32,
    /// `1.0` on the frame of a debounced kick edge, else `0.0`.
    pub kick_pulse: f32,
    /// Beat phase (`beatPhase`).
    pub beat: f32,
    /// Short-window energy envelope.
    pub energy_fast: f32,
    /// Long-window energy envelope.
    pub energy_slow: f32,
}

impl ShaderUniforms {
    /// Builds the uniform block for one frame from the audio snapshot and
    /// the shader tile's own time/mouse state.
    pub fn from_state(audio: &AudioState, shader: &ShaderDisplayState, resolution: [f32; 2]) -> Self {
        Self {
            time: shader.audio_time,
            resolution,
            mouse: shader.synthetic_mouse.into(),
            speed: audio.speed,
            bass: audio.bass,
            low_mid: audio.low_mid,
            mid: audio.mid,
            highs: audio.highs,
            level: audio.level,
            kick_env: audio.kick_env,
            kick_pulse: if audio.kick_pulse { 1.0 } else { 0.0 },
            beat: audio.beat_phase,
            energy_fast: audio.energy_fast,
            energy_slow: audio.energy_slow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_plain_old_data() {
        fn assert_pod<T: Pod>() {}
        assert_pod::<ShaderUniforms>();
    }

    #[test]
    fn layout_matches_documented_field_count() {
        // time + resolution(2) + mouse(2) + speed + 5 bands + kickEnv +
        // kickPulse + beat + energyFast + energySlow = 16 floats.
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 16 * 4);
    }
}
