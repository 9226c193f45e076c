//! SwiftVJ Tiles - the text and image tiles: CPU-bitmap text rasterization
//! and GPU image loading/crossfade/cycling.

#![warn(missing_docs)]

pub mod image;
pub mod layout;
pub mod text;

pub use crate::image::{ImageLoadError, ImageTile};
pub use layout::{LineLayout, LyricsLayout, RefrainLayout, SongInfoLayout, TextMeasurer};
pub use text::{LyricsTile, RefrainTile, SongInfoTile};
