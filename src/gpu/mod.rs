//! GPU device setup and shared texture helpers.
//!
//! [`GpuContext`] owns the device and queue. It can be created for a window
//! surface or headless, and offers blocking readback for inspection and tests.

pub mod compositor;
pub mod kernel;
pub mod projector;
pub mod state_store;
pub mod stepper;

use std::sync::mpsc;

pub use crate::error::GpuError;
use crate::grid::ParticleGrid;

/// Device, queue and the adapter they came from.
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a device able to present to `surface`.
    pub async fn for_surface(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'_>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        Self::from_adapter(adapter).await
    }

    /// Create a device without a surface, falling back to a software adapter.
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let mut adapter = None;
        for force_fallback_adapter in [false, true] {
            adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter,
                })
                .await;
            if adapter.is_some() {
                break;
            }
        }

        Self::from_adapter(adapter.ok_or(GpuError::NoAdapter)?).await
    }

    async fn from_adapter(adapter: wgpu::Adapter) -> Result<Self, GpuError> {
        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("GPU uncaptured error: {}", error);
        }));

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Whether `format` can be bound as a writable storage texture.
    pub fn supports_storage(&self, format: wgpu::TextureFormat) -> bool {
        self.adapter
            .get_texture_format_features(format)
            .allowed_usages
            .contains(wgpu::TextureUsages::STORAGE_BINDING)
    }

    /// Largest square grid side the device can hold in one texture.
    pub fn max_grid_side(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Copy a whole 2D texture into host memory, row padding removed.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_texture(
        &self,
        texture: &wgpu::Texture,
        bytes_per_texel: u32,
    ) -> Result<Vec<u8>, GpuError> {
        let width = texture.width();
        let height = texture.height();
        let unpadded_row = width * bytes_per_texel;
        let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(GpuError::BufferMapping(e.to_string())),
            Err(_) => return Err(GpuError::BufferMapping("map callback dropped".into())),
        }

        let mut bytes = Vec::with_capacity((unpadded_row * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded_row as usize) {
                bytes.extend_from_slice(&row[..unpadded_row as usize]);
            }
        }
        staging.unmap();
        Ok(bytes)
    }

    /// Read a square RGBA32F grid texture.
    pub fn read_grid_texture(
        &self,
        texture: &wgpu::Texture,
        side: u32,
    ) -> Result<ParticleGrid, GpuError> {
        let bytes = self.read_texture(texture, 16)?;
        let cells: Vec<[f32; 4]> = bytes
            .chunks_exact(16)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        ParticleGrid::from_cells(side, cells)
            .ok_or_else(|| GpuError::BufferMapping("grid readback size mismatch".into()))
    }
}

/// Off-screen color texture used as a render target and shader input.
pub struct RenderTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTexture {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}
