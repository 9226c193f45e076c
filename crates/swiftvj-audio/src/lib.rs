//! SwiftVJ Audio - the Smooth -> Scale -> Ramp -> Beat-boost processor.
//!
//! [`AudioProcessor`] is the single logical actor that turns a stream of
//! [`RawAudioLevels`] into the rich [`AudioState`] every tile renders
//! against. All mutation happens through `&mut self`; the engine crate is
//! responsible for serializing calls (in practice, one `Mutex` at the call
//! site - see the design notes in `SPEC_FULL.md` §5).

use std::time::{Duration, Instant};

use swiftvj_core::{AudioState, RawAudioLevels, SPEED_CEILING, SPEED_FLOOR};

/// Retention (`alpha`) for the one-pole smoother applied to band energies.
const BAND_ALPHA: f32 = 0.80;
/// Retention for the fast energy envelope.
const ENERGY_FAST_ALPHA: f32 = 0.60;
/// Retention for the slow energy envelope (fed from the fast one).
const ENERGY_SLOW_ALPHA: f32 = 0.92;
/// Retention for the kick envelope.
const KICK_ENV_ALPHA: f32 = 0.55;
/// Retention for the BPM low-frequency oscillators.
const BPM_LFO_ALPHA: f32 = 0.85;

/// Kick edge-detector threshold.
const KICK_THRESHOLD: f32 = 0.65;
/// Minimum spacing between two `kickPulse` events.
const KICK_COOLDOWN: Duration = Duration::from_millis(140);
/// Beat edge-detector threshold.
const BEAT_THRESHOLD: f32 = 0.75;
/// Per-frame decay applied to `beatPhase` outside of a beat edge.
const BEAT_PHASE_DECAY: f32 = 0.87;

/// One-pole retention used while the speed ramp is rising toward its
/// target.
const RAMP_UP: f32 = 0.008;
/// One-pole retention used while the speed ramp is falling toward its
/// target - larger than `RAMP_UP` so intensity releases faster than it
/// builds.
const RAMP_DOWN: f32 = 0.025;
/// Weight given to `bass` (vs. `level`) when computing the speed driver.
const BASS_BOOST_WEIGHT: f32 = 0.35;
/// Amount a beat/kick transient adds to the speed boost.
const BEAT_BOOST_AMOUNT: f32 = 0.15;
/// Per-frame decay applied to the speed boost.
const BEAT_BOOST_DECAY: f32 = 0.92;

/// Silence timeout after which [`AudioProcessor::update_with_timeout_decay`]
/// should be driven instead of `update`.
pub const SILENCE_TIMEOUT: Duration = Duration::from_millis(1500);
/// Per-frame decay applied to every smoothed field while silent.
const SILENCE_DECAY: f32 = 0.90;

fn one_pole(current: f32, target: f32, alpha: f32) -> f32 {
    current * alpha + target * (1.0 - alpha)
}

/// Turns raw per-sample audio features into the smoothed, shaped
/// [`AudioState`] vector every tile consumes.
///
/// No method on this type returns an error: malformed input (`NaN`,
/// out-of-range) is clamped before it enters the smoothing cascade, per the
/// "Transient input" policy in `SPEC_FULL.md` §7.
pub struct AudioProcessor {
    bass: f32,
    low_mid: f32,
    mid: f32,
    highs: f32,
    level: f32,
    energy_fast: f32,
    energy_slow: f32,
    kick_env: f32,
    bpm_twitcher: f32,
    bpm_sin4: f32,
    bpm_confidence: f32,

    beat_phase: f32,
    prev_on_beat: f32,
    beat4: u8,

    ramped_speed: f32,
    boost: f32,

    last_kick_pulse_at: Option<Instant>,
    last_sample_at: Option<Instant>,
}

impl AudioProcessor {
    /// Builds a processor in the silent, floor-speed state.
    pub fn new() -> Self {
        Self {
            bass: 0.0,
            low_mid: 0.0,
            mid: 0.0,
            highs: 0.0,
            level: 0.0,
            energy_fast: 0.0,
            energy_slow: 0.0,
            kick_env: 0.0,
            bpm_twitcher: 0.0,
            bpm_sin4: 0.0,
            bpm_confidence: 0.0,
            beat_phase: 0.0,
            prev_on_beat: 0.0,
            beat4: 0,
            ramped_speed: SPEED_FLOOR,
            boost: 0.0,
            last_kick_pulse_at: None,
            last_sample_at: None,
        }
    }

    /// Resets the processor to its initial silent state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether a raw sample has arrived within [`SILENCE_TIMEOUT`].
    pub fn is_active(&self) -> bool {
        match self.last_sample_at {
            None => false,
            Some(t) => t.elapsed() < SILENCE_TIMEOUT,
        }
    }

    /// Feeds one raw sample through the smoothing cascade, edge detectors,
    /// and speed pipeline.
    pub fn update(&mut self, raw: RawAudioLevels) -> AudioState {
        self.update_at(raw, Instant::now())
    }

    /// As [`Self::update`], but with an explicit timestamp - used by tests
    /// that need deterministic frame spacing without real sleeps.
    pub fn update_at(&mut self, raw: RawAudioLevels, now: Instant) -> AudioState {
        let raw = clamp_raw(raw);

        self.bass = one_pole(self.bass, raw.bass, BAND_ALPHA);
        self.low_mid = one_pole(self.low_mid, raw.low_mid, BAND_ALPHA);
        self.mid = one_pole(self.mid, raw.mid, BAND_ALPHA);
        self.highs = one_pole(self.highs, raw.highs, BAND_ALPHA);
        self.level = one_pole(self.level, raw.level, BAND_ALPHA);

        self.energy_fast = one_pole(self.energy_fast, raw.intensity.clamp(0.0, 1.0), ENERGY_FAST_ALPHA);
        self.energy_slow = one_pole(self.energy_slow, self.energy_fast, ENERGY_SLOW_ALPHA);

        self.kick_env = one_pole(self.kick_env, raw.hits_bass, KICK_ENV_ALPHA);

        self.bpm_twitcher = one_pole(self.bpm_twitcher, raw.bpm_twitcher, BPM_LFO_ALPHA);
        self.bpm_sin4 = one_pole(self.bpm_sin4, raw.bpm_sin4, BPM_LFO_ALPHA);
        self.bpm_confidence = one_pole(self.bpm_confidence, raw.bpm_confidence, BPM_LFO_ALPHA);

        let kick_pulse = self.detect_kick_pulse(raw.hits_bass, now);
        self.detect_beat_phase(raw.on_beat);
        self.beat4 = swiftvj_core::normalize_beat4(raw.beat_time);

        self.run_speed_pipeline();

        self.last_sample_at = Some(now);

        self.snapshot(now, kick_pulse)
    }

    /// Advances the processor's decay path when no raw sample has arrived
    /// recently - called by the render loop instead of `update` once
    /// [`Self::is_active`] goes false.
    pub fn update_with_timeout_decay(&mut self) -> AudioState {
        self.update_with_timeout_decay_at(Instant::now())
    }

    /// As [`Self::update_with_timeout_decay`], with an explicit timestamp.
    pub fn update_with_timeout_decay_at(&mut self, now: Instant) -> AudioState {
        self.bass *= SILENCE_DECAY;
        self.low_mid *= SILENCE_DECAY;
        self.mid *= SILENCE_DECAY;
        self.highs *= SILENCE_DECAY;
        self.level *= SILENCE_DECAY;
        self.energy_fast *= SILENCE_DECAY;
        self.energy_slow *= SILENCE_DECAY;
        self.kick_env *= SILENCE_DECAY;
        self.bpm_twitcher *= SILENCE_DECAY;
        self.bpm_sin4 *= SILENCE_DECAY;
        self.bpm_confidence *= SILENCE_DECAY;

        self.beat_phase *= BEAT_PHASE_DECAY;

        self.ramped_speed = one_pole(self.ramped_speed, SPEED_FLOOR, 1.0 - RAMP_DOWN);
        self.boost *= BEAT_BOOST_DECAY;

        self.snapshot(now, false)
    }

    fn detect_kick_pulse(&mut self, hits_bass: f32, now: Instant) -> bool {
        if hits_bass <= KICK_THRESHOLD {
            return false;
        }
        let cooled_down = match self.last_kick_pulse_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= KICK_COOLDOWN,
        };
        if cooled_down {
            self.last_kick_pulse_at = Some(now);
            true
        } else {
            false
        }
    }

    fn detect_beat_phase(&mut self, on_beat: f32) {
        let rising_edge = on_beat > BEAT_THRESHOLD && self.prev_on_beat <= BEAT_THRESHOLD;
        self.prev_on_beat = on_beat;
        if rising_edge {
            self.beat_phase = 1.0;
        } else {
            self.beat_phase *= BEAT_PHASE_DECAY;
        }
    }

    fn run_speed_pipeline(&mut self) {
        let driver = (self.level * (1.0 - BASS_BOOST_WEIGHT) + self.bass * BASS_BOOST_WEIGHT).clamp(0.0, 1.0);
        let target = SPEED_FLOOR + driver * (SPEED_CEILING - SPEED_FLOOR);

        let alpha = if target >= self.ramped_speed { 1.0 - RAMP_UP } else { 1.0 - RAMP_DOWN };
        self.ramped_speed = one_pole(self.ramped_speed, target, alpha);

        let transient = self.kick_env.max(self.beat_phase) * BEAT_BOOST_AMOUNT;
        self.boost = (self.boost * BEAT_BOOST_DECAY).max(transient);
    }

    fn snapshot(&self, now: Instant, kick_pulse: bool) -> AudioState {
        AudioState {
            bass: self.bass.max(0.0),
            low_mid: self.low_mid.max(0.0),
            mid: self.mid.max(0.0),
            highs: self.highs.max(0.0),
            level: self.level.max(0.0),
            energy_fast: self.energy_fast.max(0.0),
            energy_slow: self.energy_slow.max(0.0),
            kick_env: self.kick_env.max(0.0),
            kick_pulse,
            beat_phase: self.beat_phase.clamp(0.0, 1.0),
            beat4: self.beat4,
            bpm_twitcher: self.bpm_twitcher.clamp(-1.0, 1.0),
            bpm_sin4: self.bpm_sin4.clamp(-1.0, 1.0),
            bpm_confidence: self.bpm_confidence.clamp(0.0, 1.0),
            speed: (self.ramped_speed + self.boost).clamp(SPEED_FLOOR, SPEED_CEILING),
            timestamp: now,
        }
    }
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps every field of a raw sample into its declared range, replacing
/// `NaN` with zero. Called once at the top of [`AudioProcessor::update`] so
/// nothing downstream needs to special-case bad input.
fn clamp_raw(raw: RawAudioLevels) -> RawAudioLevels {
    fn c01(v: f32) -> f32 {
        if v.is_finite() {
            v.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
    fn c11(v: f32) -> f32 {
        if v.is_finite() {
            v.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
    RawAudioLevels {
        bass: c01(raw.bass),
        low_mid: c01(raw.low_mid),
        mid: c01(raw.mid),
        highs: c01(raw.highs),
        level: c01(raw.level),
        hits_bass: c01(raw.hits_bass),
        on_beat: c01(raw.on_beat),
        beat_time: raw.beat_time,
        intensity: c01(raw.intensity),
        bpm_twitcher: c11(raw.bpm_twitcher),
        bpm_sin4: c11(raw.bpm_sin4),
        bpm_confidence: c01(raw.bpm_confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loud_sample() -> RawAudioLevels {
        RawAudioLevels {
            bass: 1.0,
            low_mid: 1.0,
            mid: 1.0,
            highs: 1.0,
            level: 1.0,
            hits_bass: 1.0,
            on_beat: 0.0,
            beat_time: 0,
            intensity: 1.0,
            bpm_twitcher: 0.5,
            bpm_sin4: 0.5,
            bpm_confidence: 0.9,
        }
    }

    #[test]
    fn kick_cooldown_allows_one_pulse_per_10_samples_in_100ms() {
        let mut proc = AudioProcessor::new();
        let start = Instant::now();
        let mut pulses = 0;
        for i in 0..10 {
            let now = start + Duration::from_millis(i * 10);
            let state = proc.update_at(loud_sample(), now);
            if state.kick_pulse {
                pulses += 1;
            }
        }
        assert_eq!(pulses, 1);
    }

    #[test]
    fn beat_phase_decays_geometrically_after_one_edge() {
        let mut proc = AudioProcessor::new();
        let start = Instant::now();
        let mut raw = RawAudioLevels { on_beat: 1.0, ..Default::default() };
        let state = proc.update_at(raw, start);
        assert!((state.beat_phase - 1.0).abs() < 1e-6);

        raw.on_beat = 0.0;
        let mut expected = 1.0_f32;
        for n in 1..=20 {
            let now = start + Duration::from_millis(n * 16);
            let state = proc.update_at(raw, now);
            expected *= BEAT_PHASE_DECAY;
            assert!((state.beat_phase - expected).abs() < 1e-4, "frame {n}");
        }
    }

    #[test]
    fn speed_ramp_rises_slower_than_it_falls() {
        let mut proc = AudioProcessor::new();
        let start = Instant::now();
        let loud = loud_sample();
        let silent = RawAudioLevels::default();

        let mut frames_to_99pct_ceiling = None;
        for n in 0..100_000 {
            let now = start + Duration::from_millis(n * 16);
            let state = proc.update_at(loud, now);
            if state.speed >= 0.99 * SPEED_CEILING && frames_to_99pct_ceiling.is_none() {
                frames_to_99pct_ceiling = Some(n);
                break;
            }
        }
        let rise_frames = frames_to_99pct_ceiling.expect("should reach ceiling eventually");

        let mut frames_to_1pct_above_floor = None;
        for n in 0..100_000 {
            let now = start + Duration::from_millis((100_000 + n) * 16);
            let state = proc.update_at(silent, now);
            if state.speed <= 1.01 * SPEED_FLOOR && frames_to_1pct_above_floor.is_none() {
                frames_to_1pct_above_floor = Some(n);
                break;
            }
        }
        let fall_frames = frames_to_1pct_above_floor.expect("should fall near floor eventually");

        assert!(rise_frames > fall_frames, "rise={rise_frames} fall={fall_frames}");
    }

    #[test]
    fn silence_decay_is_monotonic_and_reaches_near_zero() {
        let mut proc = AudioProcessor::new();
        let start = Instant::now();
        proc.update_at(loud_sample(), start);

        let mut prev_level = proc.level;
        let mut now = start;
        let mut reached_threshold = false;
        for _ in 0..500 {
            now += Duration::from_millis(16);
            let state = proc.update_with_timeout_decay_at(now);
            assert!(state.level <= prev_level + 1e-6);
            prev_level = state.level;
            if state.level < 1e-3 {
                reached_threshold = true;
                break;
            }
        }
        assert!(reached_threshold);
    }

    #[test]
    fn reset_returns_to_silent_floor_speed() {
        let mut proc = AudioProcessor::new();
        proc.update(loud_sample());
        proc.reset();
        let state = proc.update_with_timeout_decay();
        assert!((state.speed - SPEED_FLOOR).abs() < 1e-6);
        assert_eq!(state.bass, 0.0);
    }

    proptest! {
        #[test]
        fn audio_state_fields_always_stay_in_range(
            bass in -5.0f32..5.0,
            low_mid in -5.0f32..5.0,
            mid in -5.0f32..5.0,
            highs in -5.0f32..5.0,
            level in -5.0f32..5.0,
            hits_bass in -5.0f32..5.0,
            on_beat in -5.0f32..5.0,
            beat_time in -1000i64..1000,
            intensity in -5.0f32..5.0,
            bpm_twitcher in -5.0f32..5.0,
            bpm_sin4 in -5.0f32..5.0,
            bpm_confidence in -5.0f32..5.0,
        ) {
            let mut proc = AudioProcessor::new();
            let raw = RawAudioLevels {
                bass, low_mid, mid, highs, level, hits_bass, on_beat, beat_time,
                intensity, bpm_twitcher, bpm_sin4, bpm_confidence,
            };
            let state = proc.update(raw);

            prop_assert!(state.bass.is_finite() && state.bass >= 0.0);
            prop_assert!(state.low_mid.is_finite() && state.low_mid >= 0.0);
            prop_assert!(state.mid.is_finite() && state.mid >= 0.0);
            prop_assert!(state.highs.is_finite() && state.highs >= 0.0);
            prop_assert!(state.level.is_finite() && state.level >= 0.0);
            prop_assert!((SPEED_FLOOR..=SPEED_CEILING).contains(&state.speed));
            prop_assert!((0..=3).contains(&(state.beat4 as i32)));
            prop_assert!((0.0..=1.0).contains(&state.beat_phase));
            prop_assert!((-1.0..=1.0).contains(&state.bpm_twitcher));
            prop_assert!((-1.0..=1.0).contains(&state.bpm_sin4));
            prop_assert!((0.0..=1.0).contains(&state.bpm_confidence));
        }
    }
}
