//! SwiftVJ Text - owns the three text display states and advances their
//! fade envelopes on a ~30 Hz tick.
//!
//! Mutators are conditional: re-setting the same active line or refrain
//! text does not re-arm the envelope, so a producer that re-sends the same
//! event every poll interval does not cause visible flicker.

use std::time::Instant;

use swiftvj_core::{hold_then_fall, LyricLine, LyricsDisplayState, RefrainDisplayState, SongInfoDisplayState};

/// Lyrics fade-out hold, in seconds, before the 1.0s linear fall begins.
const LYRICS_HOLD_SECS: f64 = 5.0;
const LYRICS_FALL_SECS: f64 = 1.0;
/// Refrain fade-out hold, in seconds.
const REFRAIN_HOLD_SECS: f64 = 2.0;
const REFRAIN_FALL_SECS: f64 = 1.0;

/// Owns [`LyricsDisplayState`], [`RefrainDisplayState`], and
/// [`SongInfoDisplayState`], and recomputes their opacity envelopes each
/// tick.
pub struct TextStateManager {
    lyrics: LyricsDisplayState,
    refrain: RefrainDisplayState,
    song_info: SongInfoDisplayState,
}

impl TextStateManager {
    /// Builds a manager with every display state inactive.
    pub fn new(now: Instant) -> Self {
        Self {
            lyrics: LyricsDisplayState::new(now),
            refrain: RefrainDisplayState::new(now),
            song_info: SongInfoDisplayState::new(now),
        }
    }

    /// Read-only snapshot of the lyrics display state.
    pub fn lyrics(&self) -> &LyricsDisplayState {
        &self.lyrics
    }

    /// Read-only snapshot of the refrain display state.
    pub fn refrain(&self) -> &RefrainDisplayState {
        &self.refrain
    }

    /// Read-only snapshot of the song-info display state.
    pub fn song_info(&self) -> &SongInfoDisplayState {
        &self.song_info
    }

    /// Replaces the lyric list; keeps `active_index` as-is (the active line
    /// may now be out of range, which renders as "no active line" until the
    /// next `set_active_line`).
    pub fn set_lyrics(&mut self, lines: Vec<LyricLine>, now: Instant) {
        self.lyrics.lines = lines;
        self.lyrics.last_change_time = now;
        tracing::debug!(count = self.lyrics.lines.len(), "lyrics loaded");
    }

    /// Sets the active lyric line. A no-op re-arm guard: calling this twice
    /// with the same `index` does not reset `last_change_time`.
    pub fn set_active_line(&mut self, index: i32, now: Instant) {
        if index == self.lyrics.active_index {
            return;
        }
        self.lyrics.active_index = index;
        self.lyrics.last_change_time = now;
    }

    /// Clears the lyrics display entirely.
    pub fn clear_lyrics(&mut self, now: Instant) {
        self.lyrics.lines.clear();
        self.lyrics.active_index = -1;
        self.lyrics.last_change_time = now;
    }

    /// Sets the refrain text. A no-op if unchanged from the current text.
    pub fn set_refrain(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if text == self.refrain.text {
            return;
        }
        self.refrain.text = text;
        self.refrain.active = true;
        self.refrain.last_change_time = now;
    }

    /// Clears the refrain display.
    pub fn clear_refrain(&mut self, now: Instant) {
        self.refrain.text.clear();
        self.refrain.active = false;
        self.refrain.last_change_time = now;
    }

    /// Sets track info and re-arms the song-info envelope.
    pub fn set_song_info(&mut self, artist: impl Into<String>, title: impl Into<String>, album: impl Into<String>, now: Instant) {
        self.song_info.artist = artist.into();
        self.song_info.title = title.into();
        self.song_info.album = album.into();
        self.song_info.display_time = 0.0;
        self.song_info.active = true;
        self.song_info.last_change_time = now;
    }

    /// Clears the song-info display.
    pub fn clear_song_info(&mut self, now: Instant) {
        self.song_info.artist.clear();
        self.song_info.title.clear();
        self.song_info.album.clear();
        self.song_info.active = false;
        self.song_info.last_change_time = now;
    }

    /// Advances every envelope to `now`. Driven by the render loop at
    /// roughly 30 Hz; calling it more or less often only changes envelope
    /// resolution, not its shape (both are pure functions of elapsed time).
    pub fn tick(&mut self, now: Instant) {
        let lyrics_elapsed = now.saturating_duration_since(self.lyrics.last_change_time).as_secs_f64();
        self.lyrics.text_opacity = hold_then_fall(lyrics_elapsed, LYRICS_HOLD_SECS, LYRICS_FALL_SECS);

        let refrain_elapsed = now.saturating_duration_since(self.refrain.last_change_time).as_secs_f64();
        self.refrain.opacity = if self.refrain.active {
            hold_then_fall(refrain_elapsed, REFRAIN_HOLD_SECS, REFRAIN_FALL_SECS)
        } else {
            0.0
        };

        if self.song_info.active {
            self.song_info.display_time = now.saturating_duration_since(self.song_info.last_change_time).as_secs_f64();
            if self.song_info.is_finished() {
                self.song_info.active = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn set_active_line_twice_does_not_rearm() {
        let t0 = Instant::now();
        let mut mgr = TextStateManager::new(t0);
        mgr.set_active_line(0, t0);
        let stamp = mgr.lyrics().last_change_time;

        let t1 = t0 + Duration::from_millis(500);
        mgr.set_active_line(0, t1);
        assert_eq!(mgr.lyrics().last_change_time, stamp);
    }

    #[test]
    fn set_refrain_same_text_does_not_rearm() {
        let t0 = Instant::now();
        let mut mgr = TextStateManager::new(t0);
        mgr.set_refrain("chorus", t0);
        let stamp = mgr.refrain().last_change_time;

        let t1 = t0 + Duration::from_millis(500);
        mgr.set_refrain("chorus", t1);
        assert_eq!(mgr.refrain().last_change_time, stamp);
    }

    #[test]
    fn scenario_b_track_change_and_lyrics() {
        let t0 = Instant::now();
        let mut mgr = TextStateManager::new(t0);
        mgr.set_song_info("Artist", "Title", "", t0);
        mgr.set_lyrics(
            vec![
                LyricLine { id: 0, time_sec: 0.0, text: "line 1".into() },
                LyricLine { id: 1, time_sec: 2.0, text: "line 2".into() },
                LyricLine { id: 2, time_sec: 4.0, text: "line 3".into() },
            ],
            t0,
        );
        mgr.set_active_line(0, t0);

        mgr.tick(t0 + Duration::from_millis(100));
        assert_eq!(mgr.lyrics().previous(), "");
        assert_eq!(mgr.lyrics().current(), "line 1");
        assert_eq!(mgr.lyrics().next(), "line 2");
        assert_eq!(mgr.lyrics().text_opacity, 255.0);

        mgr.set_active_line(1, t0 + Duration::from_millis(2000));
        mgr.tick(t0 + Duration::from_millis(2100));
        assert_eq!(mgr.lyrics().previous(), "line 1");
        assert_eq!(mgr.lyrics().current(), "line 2");
        assert_eq!(mgr.lyrics().next(), "line 3");

        mgr.tick(t0 + Duration::from_millis(500));
        assert_eq!(mgr.song_info().opacity(), 255.0);
        mgr.tick(t0 + Duration::from_millis(6_600));
        assert_eq!(mgr.song_info().opacity(), 0.0);
    }

    #[test]
    fn clear_lyrics_resets_active_index() {
        let t0 = Instant::now();
        let mut mgr = TextStateManager::new(t0);
        mgr.set_lyrics(vec![LyricLine { id: 0, time_sec: 0.0, text: "x".into() }], t0);
        mgr.set_active_line(0, t0);
        mgr.clear_lyrics(t0 + Duration::from_millis(10));
        assert_eq!(mgr.lyrics().active_index, -1);
        assert!(mgr.lyrics().lines.is_empty());
    }
}
