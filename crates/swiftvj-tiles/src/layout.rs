//! Pure text-layout math shared by the three text tiles.
//!
//! Font measurement is abstracted behind [`TextMeasurer`] so these
//! computations can be exercised without the platform text stack
//! ([`crate::text::CoreTextMeasurer`] provides the real implementation on
//! macOS); tests here use a synthetic measurer.

/// Measures the rendered width of `text` set at `size` points. The real
/// implementation asks Core Text for an attributed string's bounding box;
/// this abstraction exists purely so [`auto_fit_font_size`] and its callers
/// are unit-testable off of macOS.
pub trait TextMeasurer {
    /// Width in points of `text` rendered at `size` points.
    fn measure_width(&self, text: &str, size: f32) -> f32;
}

/// One line's resolved layout: font size, opacity, and vertical placement
/// as a fraction of tile height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayout {
    /// Font size in points.
    pub size: f32,
    /// Final opacity, `0.0..=1.0`.
    pub opacity: f32,
    /// Vertical center, as a fraction of tile height (`0.0` top, `1.0`
    /// bottom).
    pub y_fraction: f32,
}

/// Three-line karaoke layout: previous, current, next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricsLayout {
    /// Previous line.
    pub prev: LineLayout,
    /// Currently sung line.
    pub current: LineLayout,
    /// Upcoming line.
    pub next: LineLayout,
}

/// Single-line refrain layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefrainLayout {
    /// Resolved line.
    pub line: LineLayout,
}

/// Two-line (artist/title) song-info layout. Either line is `None` when its
/// source text was empty, per `spec.md` §4.6 "lines absent from the input
/// are simply skipped".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SongInfoLayout {
    /// Artist line, absent when the artist string is empty.
    pub artist: Option<LineLayout>,
    /// Title line, absent when the title string is empty.
    pub title: Option<LineLayout>,
}

/// Minimum/maximum font size bounds for the lyrics tile's three lines.
/// Not pinned down by the distilled spec; resolved in `DESIGN.md` as an
/// open-question decision consistent with the refrain/song-info bounds
/// already given.
pub const LYRICS_MIN_SIZE: f32 = 18.0;
pub const LYRICS_MAX_SIZE: f32 = 64.0;

const REFRAIN_MIN_SIZE: f32 = 36.0;
const REFRAIN_MAX_SIZE: f32 = 120.0;
const REFRAIN_WIDTH_FRACTION: f32 = 0.85;

const ARTIST_MIN_SIZE: f32 = 24.0;
const ARTIST_MAX_SIZE: f32 = 0.65 * 72.0;
const TITLE_MIN_SIZE: f32 = 28.0;
const TITLE_MAX_SIZE: f32 = 72.0;

/// Steps the font size down from `max_size` in 2 pt decrements until
/// `text`'s measured width at that size is `<= max_width`, or `min_size` is
/// reached.
pub fn auto_fit_font_size(measurer: &dyn TextMeasurer, text: &str, max_width: f32, min_size: f32, max_size: f32) -> f32 {
    let mut size = max_size;
    while size > min_size {
        if measurer.measure_width(text, size) <= max_width {
            return size;
        }
        size -= 2.0;
    }
    min_size
}

/// Resolves the three-line karaoke layout. Auto-fits once over
/// `{prev, current, next}` and uses the minimum resulting size across all
/// three, per `spec.md` §4.6.
pub fn compute_lyrics_layout(
    measurer: &dyn TextMeasurer,
    prev: &str,
    current: &str,
    next: &str,
    max_width: f32,
    state_opacity: f32,
) -> LyricsLayout {
    let size = [prev, current, next]
        .iter()
        .map(|text| auto_fit_font_size(measurer, text, max_width, LYRICS_MIN_SIZE, LYRICS_MAX_SIZE))
        .fold(f32::INFINITY, f32::min);

    LyricsLayout {
        prev: LineLayout { size: 0.7 * size, opacity: state_opacity * 0.35, y_fraction: 0.28 },
        current: LineLayout { size, opacity: state_opacity, y_fraction: 0.50 },
        next: LineLayout { size: 0.7 * size, opacity: state_opacity * 0.25, y_fraction: 0.72 },
    }
}

/// Resolves the single-line refrain layout against 85% of `tile_width`.
pub fn compute_refrain_layout(measurer: &dyn TextMeasurer, text: &str, tile_width: f32, opacity: f32) -> RefrainLayout {
    let max_width = tile_width * REFRAIN_WIDTH_FRACTION;
    let size = auto_fit_font_size(measurer, text, max_width, REFRAIN_MIN_SIZE, REFRAIN_MAX_SIZE);
    RefrainLayout { line: LineLayout { size, opacity, y_fraction: 0.50 } }
}

/// Resolves the two-line song-info layout. `tile_width` bounds both lines'
/// auto-fit measurement.
pub fn compute_song_info_layout(measurer: &dyn TextMeasurer, artist: &str, title: &str, tile_width: f32, opacity: f32) -> SongInfoLayout {
    let artist_layout = (!artist.is_empty()).then(|| LineLayout {
        size: auto_fit_font_size(measurer, artist, tile_width, ARTIST_MIN_SIZE, ARTIST_MAX_SIZE),
        opacity,
        y_fraction: 0.42,
    });
    let title_layout = (!title.is_empty()).then(|| LineLayout {
        size: auto_fit_font_size(measurer, title, tile_width, TITLE_MIN_SIZE, TITLE_MAX_SIZE),
        opacity,
        y_fraction: 0.55,
    });
    SongInfoLayout { artist: artist_layout, title: title_layout }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A measurer where width is simply `chars * size * POINT_WIDTH_FACTOR`,
    /// close enough to monospace rendering to exercise the stepping logic
    /// deterministically.
    struct FixedWidthMeasurer {
        point_width_factor: f32,
    }

    impl TextMeasurer for FixedWidthMeasurer {
        fn measure_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * self.point_width_factor
        }
    }

    #[test]
    fn auto_fit_steps_down_until_width_fits() {
        let measurer = FixedWidthMeasurer { point_width_factor: 0.6 };
        // 10 chars @ factor 0.6: width(size) = 6*size. Needs width <= 100 -> size <= 16.67.
        let size = auto_fit_font_size(&measurer, "0123456789", 100.0, 8.0, 64.0);
        assert!(size <= 100.0 / 6.0 + f32::EPSILON);
        assert!(size >= 8.0);
    }

    #[test]
    fn auto_fit_clamps_to_min_size_when_never_fits() {
        let measurer = FixedWidthMeasurer { point_width_factor: 10.0 };
        let size = auto_fit_font_size(&measurer, "unfittable text here", 1.0, 12.0, 64.0);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn lyrics_layout_uses_minimum_size_across_three_lines() {
        let measurer = FixedWidthMeasurer { point_width_factor: 0.5 };
        let layout = compute_lyrics_layout(&measurer, "short", "a much longer current line here", "mid", 200.0, 255.0);
        // current is the widest, so it drives the minimum fitted size.
        let current_only = auto_fit_font_size(&measurer, "a much longer current line here", 200.0, LYRICS_MIN_SIZE, LYRICS_MAX_SIZE);
        assert_eq!(layout.current.size, current_only);
        assert_eq!(layout.prev.size, 0.7 * current_only);
        assert_eq!(layout.next.size, 0.7 * current_only);
    }

    #[test]
    fn lyrics_layout_applies_documented_opacity_weights() {
        let measurer = FixedWidthMeasurer { point_width_factor: 0.1 };
        let layout = compute_lyrics_layout(&measurer, "p", "c", "n", 1000.0, 200.0);
        assert!((layout.prev.opacity - 70.0).abs() < 1e-4);
        assert_eq!(layout.current.opacity, 200.0);
        assert!((layout.next.opacity - 50.0).abs() < 1e-4);
    }

    #[test]
    fn song_info_skips_empty_lines() {
        let measurer = FixedWidthMeasurer { point_width_factor: 0.1 };
        let layout = compute_song_info_layout(&measurer, "", "Title Only", 400.0, 255.0);
        assert!(layout.artist.is_none());
        assert!(layout.title.is_some());
    }

    #[test]
    fn refrain_layout_bounds_width_to_85_percent_of_tile() {
        let measurer = FixedWidthMeasurer { point_width_factor: 1.0 };
        let layout = compute_refrain_layout(&measurer, "x", 100.0, 255.0);
        assert!(measurer.measure_width("x", layout.line.size) <= 85.0 + f32::EPSILON);
    }
}
