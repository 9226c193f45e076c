//! SwiftVJ Render - wgpu plumbing shared by the shader, mask, text, and
//! image tiles: device/queue ownership, the fullscreen-quad pipeline, the
//! shader library/loading pipeline, and the built-in fallback shaders.
//!
//! Every shader pipeline compiled here is cached by name for the lifetime
//! of its owning tile; the shader tile and the mask tile each hold their
//! own cache (`SPEC_FULL.md` §3, "Ownership & lifecycle").

pub mod default_shader;
pub mod library;
pub mod quad;
pub mod tile;
pub mod transpile;
pub mod uniform_buffer;

pub use default_shader::{default_mask_source, default_shader_source};
pub use library::{ShaderLibrary, ShaderManager};
pub use quad::QuadPipeline;
pub use tile::{MaskTile, ShaderTile};
pub use uniform_buffer::UniformBuffer;

/// Render-target pixel format used by every tile - matches the BGRA8
/// contract in `SPEC_FULL.md` §4.4/§6.
pub const TILE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Rendering errors that cross a crate boundary.
///
/// Per the error-handling design (`SPEC_FULL.md` §7), only GPU-device
/// acquisition failures at startup are meant to propagate this far; shader
/// compile failures are caught internally and folded into
/// `ShaderDisplayState::error` instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No compatible GPU adapter was found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Device or queue creation failed.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// A shader directory could not be read.
    #[error("failed to read shader directory {path}: {source}")]
    ShaderDirectory {
        /// Directory that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
