//! The central reactive vector and its raw input counterpart.

use std::time::Instant;

/// Floor of the reactive speed scalar - never fully stops, so idle shaders
/// still breathe.
pub const SPEED_FLOOR: f32 = 0.02;
/// Ceiling of the reactive speed scalar.
pub const SPEED_CEILING: f32 = 1.20;

/// One sample of already-extracted audio features, as delivered by the
/// external playback/analysis pipeline (out of scope for this crate - see
/// the top-level design notes).
#[derive(Debug, Clone, Copy)]
pub struct RawAudioLevels {
    /// Bass band energy, `[0,1]`.
    pub bass: f32,
    /// Low-mid band energy, `[0,1]`.
    pub low_mid: f32,
    /// Mid band energy, `[0,1]`.
    pub mid: f32,
    /// Highs band energy, `[0,1]`.
    pub highs: f32,
    /// Overall level, `[0,1]`.
    pub level: f32,
    /// Raw kick/transient-detector signal, typically `[0,1]`.
    pub hits_bass: f32,
    /// Raw on-beat signal; a rising edge above 0.75 latches `beatPhase`.
    pub on_beat: f32,
    /// Monotonically-increasing beat counter from the external source.
    ///
    /// Not guaranteed non-negative or strictly monotonic - see
    /// [`crate::normalize_beat4`].
    pub beat_time: i64,
    /// Composite intensity driver feeding `energyFast`/`energySlow`.
    pub intensity: f32,
    /// Tempo-synced low-frequency oscillator, `[-1,1]`.
    pub bpm_twitcher: f32,
    /// Tempo-synced low-frequency oscillator, `[-1,1]`.
    pub bpm_sin4: f32,
    /// Confidence of the tempo estimate, `[0,1]`.
    pub bpm_confidence: f32,
}

impl Default for RawAudioLevels {
    fn default() -> Self {
        Self {
            bass: 0.0,
            low_mid: 0.0,
            mid: 0.0,
            highs: 0.0,
            level: 0.0,
            hits_bass: 0.0,
            on_beat: 0.0,
            beat_time: 0,
            intensity: 0.0,
            bpm_twitcher: 0.0,
            bpm_sin4: 0.0,
            bpm_confidence: 0.0,
        }
    }
}

/// The reshaped, smoothed reactive state consumed by every tile each frame.
///
/// Every field is bounded per the invariants documented on its getter-free
/// construction site ([`swiftvj_audio`]); this type itself does not enforce
/// the bounds, it is simply the snapshot shape they are produced into.
#[derive(Debug, Clone, Copy)]
pub struct AudioState {
    /// Bass band energy, smoothed, `[0,1]`.
    pub bass: f32,
    /// Low-mid band energy, smoothed, `[0,1]`.
    pub low_mid: f32,
    /// Mid band energy, smoothed, `[0,1]`.
    pub mid: f32,
    /// Highs band energy, smoothed, `[0,1]`.
    pub highs: f32,
    /// Overall level, smoothed, `[0,1]`.
    pub level: f32,
    /// Short-window envelope of composite intensity, `[0,1]`.
    pub energy_fast: f32,
    /// Long-window envelope of composite intensity, `[0,1]`.
    pub energy_slow: f32,
    /// Smoothed kick envelope, `[0,1]`.
    pub kick_env: f32,
    /// True exactly on the frame a kick edge passed the cooldown gate.
    pub kick_pulse: bool,
    /// `1.0` on a beat edge, decaying exponentially between edges, `[0,1]`.
    pub beat_phase: f32,
    /// Beat-within-bar counter, `{0,1,2,3}`.
    pub beat4: u8,
    /// Tempo-synced oscillator, `[-1,1]`.
    pub bpm_twitcher: f32,
    /// Tempo-synced oscillator, `[-1,1]`.
    pub bpm_sin4: f32,
    /// Tempo-estimate confidence, `[0,1]`.
    pub bpm_confidence: f32,
    /// Reactive animation speed scalar, `[0.02, 1.20]`.
    pub speed: f32,
    /// Instant this snapshot was produced.
    pub timestamp: Instant,
}

impl AudioState {
    /// A silent, floor-speed snapshot, used as the processor's initial
    /// state and as the terminal state of silence decay.
    pub fn silent(now: Instant) -> Self {
        Self {
            bass: 0.0,
            low_mid: 0.0,
            mid: 0.0,
            highs: 0.0,
            level: 0.0,
            energy_fast: 0.0,
            energy_slow: 0.0,
            kick_env: 0.0,
            kick_pulse: false,
            beat_phase: 0.0,
            beat4: 0,
            bpm_twitcher: 0.0,
            bpm_sin4: 0.0,
            bpm_confidence: 0.0,
            speed: SPEED_FLOOR,
            timestamp: now,
        }
    }
}
