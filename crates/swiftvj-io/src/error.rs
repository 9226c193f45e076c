//! Error type for the surface publisher, styled after the teacher's
//! `mapmap-io::error::IoError`.

/// Errors surfaced from publishing a tile's render target.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// `publish` was called for a name with no registered server.
    #[error("no server registered for surface {0:?}")]
    UnknownServer(String),

    /// The platform zero-copy backend failed to back a texture with a
    /// shared surface.
    #[error("failed to create shared surface for {name:?}: {reason}")]
    SurfaceCreation {
        /// Surface name.
        name: String,
        /// Platform error description.
        reason: String,
    },
}

/// Result type for surface-publishing operations.
pub type Result<T> = std::result::Result<T, IoError>;
