//! Display-state snapshot for the image tile.

use std::time::Instant;

/// Image tile display state: the current/next URL pair mid-crossfade, plus
/// optional beat-synchronous folder cycling.
#[derive(Debug, Clone)]
pub struct ImageDisplayState {
    /// URL or path of the currently-shown image, empty if none loaded yet.
    pub current_image_url: String,
    /// URL or path of the image being faded in, empty if not crossfading.
    pub next_image_url: String,
    /// Crossfade progress, `[0,1]`.
    pub crossfade_progress: f32,
    /// Whether a crossfade is in flight.
    pub is_fading: bool,
    /// `false` letterboxes, `true` fills and crops.
    pub cover_mode: bool,
    /// The loaded folder's image list, empty outside folder mode.
    pub folder_images: Vec<String>,
    /// Index into `folder_images` of the current image.
    pub folder_index: usize,
    /// Advance one folder image every `beats_per_change` bars; `0` disables
    /// beat cycling.
    pub beats_per_change: u32,
    /// Instant the current crossfade began; only meaningful while
    /// `is_fading`.
    pub fade_start_time: Instant,
    /// `beat4` value observed on the previous frame, used to detect the
    /// edge that gates automatic folder advance.
    pub last_seen_beat4: Option<u8>,
}

impl ImageDisplayState {
    /// Duration of a crossfade, in seconds.
    pub const FADE_DURATION_SECS: f32 = 0.5;

    /// Builds the empty state (no image loaded, not fading, letterboxed).
    pub fn new(now: Instant) -> Self {
        Self {
            current_image_url: String::new(),
            next_image_url: String::new(),
            crossfade_progress: 0.0,
            is_fading: false,
            cover_mode: false,
            folder_images: Vec::new(),
            folder_index: 0,
            beats_per_change: 0,
            fade_start_time: now,
            last_seen_beat4: None,
        }
    }
}
