//! Error type for the engine crate, styled after
//! [`swiftvj_render::RenderError`] and [`swiftvj_io::IoError`].
//!
//! Per `SPEC_FULL.md` §7, this is the one place a `Result` crosses the
//! public engine API: every other failure path (shader compile, missing
//! lyrics file, decode failure, surface publish) is absorbed into a
//! display-state field or a silent no-op inside the crate that produced it.

/// Errors that can abort [`crate::RenderEngine::start`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No compatible GPU adapter was found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Device or queue creation failed.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// `start()` was called while already running.
    #[error("engine is already running")]
    AlreadyRunning,

    /// The configuration file could not be parsed.
    #[error("failed to load engine config from {path}: {source}")]
    Config {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
