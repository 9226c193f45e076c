//! GPU device/queue acquisition, adapted from the teacher's
//! `mapmap-render::backend::WgpuBackend::new` - try every non-GL backend at
//! `HighPerformance` first, fall back to every backend (including GL) at
//! `LowPower` if that fails. This is the one place GPU acquisition failure
//! is allowed to propagate (`SPEC_FULL.md` §7).

use std::sync::Arc;

use crate::error::EngineError;

/// The device/queue pair every tile renders through, plus the adapter's
/// description for diagnostics.
pub struct GpuContext {
    /// Shared GPU device. All tiles are built against this one device.
    pub device: Arc<wgpu::Device>,
    /// Shared command queue.
    pub queue: Arc<wgpu::Queue>,
    /// The adapter actually selected, for logging at startup.
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Acquires a device, preferring a dedicated (non-GL) backend before
    /// falling back to whatever is available.
    pub async fn new() -> Result<Self, EngineError> {
        match Self::new_with_options(wgpu::Backends::all() - wgpu::Backends::GL, wgpu::PowerPreference::HighPerformance).await {
            Ok(ctx) => Ok(ctx),
            Err(_) => Self::new_with_options(wgpu::Backends::all(), wgpu::PowerPreference::LowPower).await,
        }
    }

    async fn new_with_options(backends: wgpu::Backends, power_preference: wgpu::PowerPreference) -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor { backends, ..Default::default() });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions { power_preference, compatible_surface: None, force_fallback_adapter: false })
            .await
            .map_err(|_| EngineError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("SwiftVJ Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| EngineError::DeviceCreation(e.to_string()))?;

        Ok(Self { device: Arc::new(device), queue: Arc::new(queue), adapter_info: adapter.get_info() })
    }
}
