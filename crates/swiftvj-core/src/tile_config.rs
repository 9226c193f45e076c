//! Canonical per-tile configuration.

/// Static configuration for one tile: its debug name, the name it is
/// published under, and its render-target resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileConfig {
    /// Human-readable tile name, e.g. `"Shader"`.
    pub name: &'static str,
    /// The shared-surface name external mixers bind to, e.g.
    /// `"SwiftVJ/Shader"`.
    pub published_surface_name: &'static str,
    /// Render-target width in pixels.
    pub width: u32,
    /// Render-target height in pixels.
    pub height: u32,
}

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;

impl TileConfig {
    /// The generator/shader tile.
    pub const fn shader() -> Self {
        Self { name: "Shader", published_surface_name: "SwiftVJ/Shader", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The grayscale mask tile.
    pub const fn mask() -> Self {
        Self { name: "Mask", published_surface_name: "SwiftVJ/Mask", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The karaoke lyrics tile.
    pub const fn lyrics() -> Self {
        Self { name: "Lyrics", published_surface_name: "SwiftVJ/Lyrics", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The refrain/chorus tile.
    pub const fn refrain() -> Self {
        Self { name: "Refrain", published_surface_name: "SwiftVJ/Refrain", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The song-info (artist/title) tile.
    pub const fn song_info() -> Self {
        Self { name: "SongInfo", published_surface_name: "SwiftVJ/SongInfo", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The image tile.
    pub const fn image() -> Self {
        Self { name: "Image", published_surface_name: "SwiftVJ/Image", width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }

    /// The six canonical configurations, in publish order.
    pub fn standard_six() -> [Self; 6] {
        [Self::shader(), Self::mask(), Self::lyrics(), Self::refrain(), Self::song_info(), Self::image()]
    }

    /// Returns a copy with a custom resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> crate::error::Result<Self> {
        if width == 0 || height == 0 {
            return Err(crate::error::CoreError::InvalidTileSize { width, height });
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_six_covers_every_published_surface() {
        let names: Vec<_> = TileConfig::standard_six().iter().map(|t| t.published_surface_name).collect();
        assert_eq!(
            names,
            vec![
                "SwiftVJ/Shader",
                "SwiftVJ/Mask",
                "SwiftVJ/Lyrics",
                "SwiftVJ/Refrain",
                "SwiftVJ/SongInfo",
                "SwiftVJ/Image",
            ]
        );
    }

    #[test]
    fn default_resolution_is_1280x720() {
        for tile in TileConfig::standard_six() {
            assert_eq!((tile.width, tile.height), (1280, 720));
        }
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(TileConfig::shader().with_resolution(0, 720).is_err());
    }
}
