//! SwiftVJ IO - publishes each tile's render target under a named, shared
//! surface that external VJ mixers and video switchers bind to.
//!
//! On macOS this is meant to be zero-copy (`IoSurfaceBackend`), but that
//! backend is an honest stub for now (see the `backend` module docs): it
//! registers and tracks servers correctly, but every `publish` fails with
//! `IoError::SurfaceCreation` until the real IOSurface/Metal bridge is
//! built. Non-macOS builds get the CPU-copy fallback, which actually works
//! and preserves the same naming and enable/disable contract (`spec.md`
//! §4.8). Mirrors the teacher's `mapmap-io` crate, which fans a render
//! target out to NDI/Syphon/Spout/DeckLink behind one surface per output,
//! with Syphon/Spout themselves left as stubs the same way.

#![warn(missing_docs)]

pub mod backend;
pub mod error;

pub use error::{IoError, Result};

use backend::SurfaceBackend;
use swiftvj_core::TileConfig;

#[cfg(target_os = "macos")]
use backend::IoSurfaceBackend;
#[cfg(not(target_os = "macos"))]
use backend::CopyingFallbackBackend;

/// Publishes tile render targets under named, externally-consumable shared
/// surfaces.
///
/// `enabled` lets the whole engine go dark (e.g. while the output window is
/// minimized) without tearing down and re-registering every server.
pub struct SurfacePublisher {
    backend: Box<dyn SurfaceBackend>,
    enabled: bool,
}

impl SurfacePublisher {
    /// Builds a publisher backed by the platform's zero-copy mechanism where
    /// one exists, or the copying fallback otherwise.
    #[cfg(target_os = "macos")]
    pub fn new(device: std::sync::Arc<wgpu::Device>) -> Self {
        Self { backend: Box::new(IoSurfaceBackend::new(device)), enabled: true }
    }

    /// Builds a publisher backed by the platform's zero-copy mechanism where
    /// one exists, or the copying fallback otherwise.
    #[cfg(not(target_os = "macos"))]
    pub fn new(_device: std::sync::Arc<wgpu::Device>) -> Self {
        Self { backend: Box::new(CopyingFallbackBackend::new()), enabled: true }
    }

    /// Registers a single named server. Idempotent.
    pub fn create_server(&mut self, name: &str) {
        self.backend.create_server(name);
    }

    /// Registers one server per [`TileConfig::standard_six`], under each
    /// tile's `published_surface_name`.
    pub fn create_standard_servers(&mut self) {
        for tile in TileConfig::standard_six() {
            self.create_server(tile.published_surface_name);
        }
    }

    /// Publishes `texture` under `name` on an auto-created, immediately
    /// submitted command buffer. A no-op while disabled or if `name` has no
    /// registered server.
    pub fn publish(&mut self, name: &str, texture: &wgpu::Texture, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("surface-publish") });
        self.backend.publish(name, texture, queue, &mut encoder)?;
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Publishes `texture` under `name` on the caller's own command stream,
    /// for callers batching several tiles' publishes into one submission. A
    /// no-op while disabled or if `name` has no registered server.
    pub fn publish_on(&mut self, name: &str, texture: &wgpu::Texture, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.backend.publish(name, texture, queue, encoder)
    }

    /// Unregisters a server. A no-op if `name` was never registered.
    pub fn stop_server(&mut self, name: &str) {
        self.backend.stop_server(name);
    }

    /// Unregisters every server.
    pub fn stop_all(&mut self) {
        self.backend.stop_all();
    }

    /// Enables or disables publishing without touching server registration.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether publishing is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `name` currently has a registered server.
    pub fn has_server(&self, name: &str) -> bool {
        self.backend.has_server(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_publisher() -> SurfacePublisher {
        SurfacePublisher { backend: Box::new(backend::CopyingFallbackBackend::new()), enabled: true }
    }

    #[test]
    fn create_standard_servers_registers_all_six() {
        let mut publisher = test_publisher();
        publisher.create_standard_servers();
        for tile in TileConfig::standard_six() {
            assert!(publisher.has_server(tile.published_surface_name));
        }
    }

    #[test]
    fn disabling_does_not_unregister_servers() {
        let mut publisher = test_publisher();
        publisher.create_server("SwiftVJ/Shader");
        publisher.set_enabled(false);
        assert!(publisher.has_server("SwiftVJ/Shader"));
        assert!(!publisher.is_enabled());
    }

    #[test]
    fn stop_all_clears_every_server() {
        let mut publisher = test_publisher();
        publisher.create_standard_servers();
        publisher.stop_all();
        for tile in TileConfig::standard_six() {
            assert!(!publisher.has_server(tile.published_surface_name));
        }
    }
}
