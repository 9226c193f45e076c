//! Display-state snapshots for the three text tiles.

use std::time::Instant;

/// One lyric line.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Stable identifier, as assigned by the lyric-fetching pipeline.
    pub id: u64,
    /// Timestamp within the track this line becomes active, in seconds.
    pub time_sec: f64,
    /// The line text.
    pub text: String,
}

/// Karaoke lyrics display state: the full line list plus which line is
/// active and the current fade-envelope opacity.
#[derive(Debug, Clone)]
pub struct LyricsDisplayState {
    /// All known lines for the current track.
    pub lines: Vec<LyricLine>,
    /// Index into `lines` of the active line, or `-1` for "no active line".
    pub active_index: i32,
    /// Current opacity, `[0, 255]` (kept as float, quantized only at the
    /// pixel-write boundary).
    pub text_opacity: f32,
    /// Delay before the fade-out begins, in milliseconds.
    pub fade_delay_ms: u32,
    /// Duration of the fade-out, in milliseconds.
    pub fade_duration_ms: u32,
    /// Instant `active_index` (or the line list) last changed.
    pub last_change_time: Instant,
}

impl LyricsDisplayState {
    /// Builds the state at track start: no lines, no active line, fully
    /// transparent.
    pub fn new(now: Instant) -> Self {
        Self {
            lines: Vec::new(),
            active_index: -1,
            text_opacity: 0.0,
            fade_delay_ms: 5_000,
            fade_duration_ms: 1_000,
            last_change_time: now,
        }
    }

    fn line_at(&self, offset: i32) -> Option<&str> {
        if self.active_index < 0 {
            return None;
        }
        let idx = self.active_index + offset;
        if idx < 0 {
            return None;
        }
        self.lines.get(idx as usize).map(|l| l.text.as_str())
    }

    /// The line before the active one, or `""` if there is none.
    pub fn previous(&self) -> &str {
        self.line_at(-1).unwrap_or("")
    }

    /// The active line's text, or `""` if there is none.
    pub fn current(&self) -> &str {
        self.line_at(0).unwrap_or("")
    }

    /// The line after the active one, or `""` if there is none.
    pub fn next(&self) -> &str {
        self.line_at(1).unwrap_or("")
    }
}

/// Refrain/chorus display state.
#[derive(Debug, Clone)]
pub struct RefrainDisplayState {
    /// The refrain text, empty when inactive.
    pub text: String,
    /// Current opacity, `[0, 255]`.
    pub opacity: f32,
    /// Whether a refrain is currently armed (distinct from `opacity > 0`,
    /// since the fade-out tail keeps opacity positive briefly after
    /// `active` would otherwise go false).
    pub active: bool,
    /// Instant `text` last changed.
    pub last_change_time: Instant,
}

impl RefrainDisplayState {
    /// Builds the inactive state.
    pub fn new(now: Instant) -> Self {
        Self {
            text: String::new(),
            opacity: 0.0,
            active: false,
            last_change_time: now,
        }
    }
}

/// Fade-envelope shape shared by lyrics and refrain: hold at full opacity,
/// then fall linearly to zero.
pub fn hold_then_fall(elapsed_secs: f64, hold_secs: f64, fall_secs: f64) -> f32 {
    if elapsed_secs <= hold_secs {
        255.0
    } else {
        let into_fall = elapsed_secs - hold_secs;
        let t = (into_fall / fall_secs).clamp(0.0, 1.0);
        (255.0 * (1.0 - t)) as f32
    }
}

/// Song-info (artist/title/album) display state. Unlike lyrics/refrain,
/// opacity is computed entirely from `display_time` via a fixed envelope
/// (0.5s rise, 5.0s hold, 1.0s fall) rather than stored.
#[derive(Debug, Clone)]
pub struct SongInfoDisplayState {
    /// Artist name.
    pub artist: String,
    /// Track title.
    pub title: String,
    /// Album name, may be empty.
    pub album: String,
    /// Seconds elapsed since `last_change_time`; advanced by the state
    /// manager's tick.
    pub display_time: f64,
    /// Whether the envelope is still running.
    pub active: bool,
    /// Instant the track-change event was applied.
    pub last_change_time: Instant,
}

impl SongInfoDisplayState {
    const RISE_SECS: f64 = 0.5;
    const HOLD_SECS: f64 = 5.0;
    const FALL_SECS: f64 = 1.0;
    const TOTAL_SECS: f64 = Self::RISE_SECS + Self::HOLD_SECS + Self::FALL_SECS;

    /// Builds the inactive state.
    pub fn new(now: Instant) -> Self {
        Self {
            artist: String::new(),
            title: String::new(),
            album: String::new(),
            display_time: 0.0,
            active: false,
            last_change_time: now,
        }
    }

    /// The opacity at the current `display_time`, `[0, 255]`.
    pub fn opacity(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let t = self.display_time;
        if t < 0.0 {
            0.0
        } else if t < Self::RISE_SECS {
            (255.0 * (t / Self::RISE_SECS)) as f32
        } else if t < Self::RISE_SECS + Self::HOLD_SECS {
            255.0
        } else if t < Self::TOTAL_SECS {
            let into_fall = t - Self::RISE_SECS - Self::HOLD_SECS;
            (255.0 * (1.0 - into_fall / Self::FALL_SECS)) as f32
        } else {
            0.0
        }
    }

    /// Whether the envelope has finished (opacity permanently zero until
    /// the next change).
    pub fn is_finished(&self) -> bool {
        self.display_time >= Self::TOTAL_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn song_info_envelope_total_duration() {
        let mut state = SongInfoDisplayState::new(Instant::now());
        state.artist = "Artist".into();
        state.title = "Title".into();
        state.active = true;

        for centi in 0..660 {
            state.display_time = centi as f64 * 0.01;
            let opacity = state.opacity();
            if state.display_time < 6.5 {
                // At t=0.0 the rise has not started yet, so opacity is
                // exactly 0.0 there; it is strictly positive everywhere
                // after that up to the 6.5s cutoff.
                assert!(opacity >= 0.0, "expected non-negative opacity at t={}", state.display_time);
            } else {
                assert_eq!(opacity, 0.0, "expected zero opacity at t={}", state.display_time);
            }
        }
    }

    #[test]
    fn lyrics_active_index_minus_one_means_no_line() {
        let state = LyricsDisplayState::new(Instant::now());
        assert_eq!(state.current(), "");
        assert_eq!(state.previous(), "");
        assert_eq!(state.next(), "");
    }

    #[test]
    fn lyrics_line_accessors_use_active_index() {
        let mut state = LyricsDisplayState::new(Instant::now());
        state.lines = vec![
            LyricLine { id: 0, time_sec: 0.0, text: "line 1".into() },
            LyricLine { id: 1, time_sec: 2.0, text: "line 2".into() },
            LyricLine { id: 2, time_sec: 4.0, text: "line 3".into() },
        ];
        state.active_index = 1;
        assert_eq!(state.previous(), "line 1");
        assert_eq!(state.current(), "line 2");
        assert_eq!(state.next(), "line 3");
    }

    #[test]
    fn hold_then_fall_matches_lyrics_shape() {
        assert_eq!(hold_then_fall(0.0, 5.0, 1.0), 255.0);
        assert_eq!(hold_then_fall(5.0, 5.0, 1.0), 255.0);
        assert_eq!(hold_then_fall(5.5, 5.0, 1.0), 127.5);
        assert_eq!(hold_then_fall(6.0, 5.0, 1.0), 0.0);
        let _ = Duration::from_secs(1);
    }
}
