//! Shared error type for core-level validation failures.

/// Errors raised while constructing or validating core data-model values.
///
/// Nothing in this crate performs I/O, so this enum stays intentionally
/// small; it exists for the handful of constructors (e.g. [`crate::tile_config::TileConfig`]
/// custom sizes) that can be handed a nonsensical value by a caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A tile dimension of zero was requested.
    #[error("tile dimensions must be non-zero, got {width}x{height}")]
    InvalidTileSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
