//! GPU particle state: double-buffered position and velocity textures.

use crate::galaxy::ParticleState;
use crate::grid::ParticleGrid;
use crate::ping_pong::PingPong;

use super::kernel::{Field, GRID_FORMAT};
use super::{GpuContext, GpuError};

/// One RGBA32F grid texture and its view.
pub struct GridTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GridTexture {
    fn new(device: &wgpu::Device, label: &str, side: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: GRID_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn upload(&self, queue: &wgpu::Queue, grid: &ParticleGrid) {
        let side = grid.side();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            grid.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(side * 16),
                rows_per_image: Some(side),
            },
            wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Position and velocity grids for one epoch.
///
/// Both fields swap together, so they always share the same front slot.
pub struct ParticleStateStore {
    side: u32,
    position: PingPong<GridTexture>,
    velocity: PingPong<GridTexture>,
}

impl ParticleStateStore {
    /// Allocate both fields and seed every slot with the initial state.
    ///
    /// The renderer reads the back velocity slot as "previous velocity", so it
    /// must hold valid data before the first step.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, initial: &ParticleState) -> Self {
        let side = initial.positions.side();
        let position = PingPong::new(
            GridTexture::new(device, "Position Grid A", side),
            GridTexture::new(device, "Position Grid B", side),
        );
        let velocity = PingPong::new(
            GridTexture::new(device, "Velocity Grid A", side),
            GridTexture::new(device, "Velocity Grid B", side),
        );

        for slot in position.iter() {
            slot.upload(queue, &initial.positions);
        }
        for slot in velocity.iter() {
            slot.upload(queue, &initial.velocities);
        }

        Self {
            side,
            position,
            velocity,
        }
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn field(&self, field: Field) -> &PingPong<GridTexture> {
        match field {
            Field::Position => &self.position,
            Field::Velocity => &self.velocity,
        }
    }

    /// Slot index currently holding committed state.
    #[inline]
    pub fn front_index(&self) -> usize {
        self.position.front_index()
    }

    /// Commit the back slots written by the last step.
    pub fn swap(&mut self) {
        self.position.swap();
        self.velocity.swap();
    }

    /// Copy the committed position and velocity grids back to the host.
    pub fn read_back(&self, gpu: &GpuContext) -> Result<ParticleState, GpuError> {
        let positions = gpu.read_grid_texture(&self.position.front().texture, self.side)?;
        let velocities = gpu.read_grid_texture(&self.velocity.front().texture, self.side)?;
        Ok(ParticleState {
            positions,
            velocities,
        })
    }

    /// Release the GPU memory now rather than when the last handle drops.
    pub fn destroy(&self) {
        for slot in self.position.iter().chain(self.velocity.iter()) {
            slot.texture.destroy();
        }
    }
}
