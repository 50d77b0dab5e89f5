//! Error types for the galaxy simulation.
//!
//! This module provides error types for GPU initialization, configuration
//! validation, epoch construction, and running the windowed simulation.

use std::fmt;

use crate::gpu::kernel::KernelGraphError;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// The surface reports no usable texture format for this adapter.
    UnsupportedSurface,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::UnsupportedSurface => write!(f, "The window surface is not supported by the GPU adapter"),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors produced when a configuration value is unusable.
#[derive(Debug)]
pub enum ConfigError {
    /// A parameter is outside its allowed range (or not a number).
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Failed to read a configuration file.
    Io(std::io::Error),
    /// Configuration file is not valid JSON for [`SimulationConfig`](crate::SimulationConfig).
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange { name, value, min, max } => write!(
                f,
                "Parameter '{}' = {} is outside the allowed range [{}, {}]",
                name, value, min, max
            ),
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::OutOfRange { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that prevent a simulation epoch from being constructed.
///
/// When any of these is returned the previous epoch (if any) is still intact.
#[derive(Debug)]
pub enum EpochError {
    /// Restart-only parameters were rejected.
    Config(ConfigError),
    /// The particle grid does not fit in a 2D texture on this device.
    GridTooLarge { side: u32, max: u32 },
    /// The backend cannot use this format as a writable storage texture.
    UnsupportedFormat(wgpu::TextureFormat),
    /// The kernel dependency graph is malformed.
    KernelGraph(KernelGraphError),
    /// The backend rejected a pipeline, bind group or resource.
    Backend(wgpu::Error),
}

impl fmt::Display for EpochError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpochError::Config(e) => write!(f, "Invalid configuration: {}", e),
            EpochError::GridTooLarge { side, max } => write!(
                f,
                "Particle grid of {}x{} exceeds the device texture limit of {}",
                side, side, max
            ),
            EpochError::UnsupportedFormat(format) => write!(
                f,
                "Texture format {:?} cannot be used as a storage texture on this backend",
                format
            ),
            EpochError::KernelGraph(e) => write!(f, "Invalid kernel graph: {}", e),
            EpochError::Backend(e) => write!(f, "GPU backend rejected the epoch: {}", e),
        }
    }
}

impl std::error::Error for EpochError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpochError::Config(e) => Some(e),
            EpochError::KernelGraph(e) => Some(e),
            EpochError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EpochError {
    fn from(e: ConfigError) -> Self {
        EpochError::Config(e)
    }
}

impl From<KernelGraphError> for EpochError {
    fn from(e: KernelGraphError) -> Self {
        EpochError::KernelGraph(e)
    }
}

/// Errors that can occur when running a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The first epoch could not be built.
    Epoch(EpochError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SimulationError::Window(e) => write!(f, "Failed to create window: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::Epoch(e) => write!(f, "Failed to start simulation: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::EventLoop(e) => Some(e),
            SimulationError::Window(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::Epoch(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SimulationError {
    fn from(e: winit::error::OsError) -> Self {
        SimulationError::Window(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

impl From<EpochError> for SimulationError {
    fn from(e: EpochError) -> Self {
        SimulationError::Epoch(e)
    }
}
