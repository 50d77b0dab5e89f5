//! One simulation epoch: everything created by a (re)start.
//!
//! An epoch owns the state store, the compiled kernels, the star renderer
//! and the shared parameter uniform. It is built completely or not at all:
//! any failure releases what was already created and reports an
//! [`EpochError`], so the caller can keep running the previous epoch.

use wgpu::util::DeviceExt;

use crate::camera::{Camera, Viewport};
use crate::config::{LiveParams, SimulationConfig};
use crate::error::EpochError;
use crate::galaxy::{self, ParticleState};
use crate::gpu::compositor::SCENE_FORMAT;
use crate::gpu::kernel::{schedule, GRID_FORMAT};
use crate::gpu::projector::RenderProjector;
use crate::gpu::state_store::ParticleStateStore;
use crate::gpu::stepper::SimulationStepper;
use crate::gpu::{GpuContext, GpuError};
use crate::params::ParamBlock;
use crate::shaders;

pub struct SimulationEpoch {
    id: u64,
    seed: u64,
    particle_count: u32,
    params: ParamBlock,
    /// Host values changed since the last upload.
    params_dirty: bool,
    params_buffer: wgpu::Buffer,
    stepper: SimulationStepper,
    projector: RenderProjector,
}

impl SimulationEpoch {
    /// Generate a galaxy from `seed` and build every GPU resource for it.
    pub fn new(
        gpu: &GpuContext,
        config: &SimulationConfig,
        seed: u64,
        id: u64,
    ) -> Result<Self, EpochError> {
        config.validate()?;

        let side = config.galaxy.grid_side();
        let max = gpu.max_grid_side();
        if side > max {
            return Err(EpochError::GridTooLarge { side, max });
        }
        if !gpu.supports_storage(GRID_FORMAT) {
            return Err(EpochError::UnsupportedFormat(GRID_FORMAT));
        }

        let kernels = schedule(shaders::galaxy_kernels())?;
        let initial = galaxy::generate(&config.galaxy, seed);
        let particle_count = config.galaxy.particle_count;
        let params = ParamBlock::from_live(&config.live, particle_count);

        let device = &gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Params Uniform Buffer"),
            contents: &params.to_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let store = ParticleStateStore::new(device, &gpu.queue, &initial);
        let projector = RenderProjector::new(
            device,
            &store,
            &params,
            &params_buffer,
            SCENE_FORMAT,
            particle_count,
        );
        let stepper = SimulationStepper::new(device, store, &kernels, &params, &params_buffer);

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());

        let epoch = Self {
            id,
            seed,
            particle_count,
            params,
            params_dirty: false,
            params_buffer,
            stepper,
            projector,
        };

        if let Some(error) = validation.or(out_of_memory) {
            epoch.teardown();
            return Err(EpochError::Backend(error));
        }

        log::info!(
            "Epoch {} ready: {} particles on a {}x{} grid, seed {}",
            id,
            particle_count,
            side,
            side,
            seed
        );
        Ok(epoch)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn grid_side(&self) -> u32 {
        self.stepper.store().side()
    }

    pub fn steps(&self) -> u64 {
        self.stepper.steps()
    }

    /// Take new live values. They reach the GPU on the next [`sync`](Self::sync).
    pub fn set_live(&mut self, live: &LiveParams) {
        if self.params.update_live(live) {
            self.params_dirty = true;
        }
    }

    /// Upload pending uniform changes and the camera for this frame.
    pub fn sync(&mut self, queue: &wgpu::Queue, camera: &Camera, viewport: Viewport) {
        self.sync_params(queue);
        self.projector.update_camera(queue, camera, viewport);
    }

    pub fn sync_params(&mut self, queue: &wgpu::Queue) {
        if self.params_dirty {
            queue.write_buffer(&self.params_buffer, 0, &self.params.to_bytes());
            self.params_dirty = false;
        }
    }

    pub fn encode_step(&mut self, encoder: &mut wgpu::CommandEncoder) {
        self.stepper.encode_step(encoder);
    }

    /// Draw the committed state into `target`.
    pub fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        self.projector
            .draw(encoder, target, self.stepper.store().front_index());
    }

    /// Committed state, read back to the host. Blocks on the GPU.
    pub fn read_state(&self, gpu: &GpuContext) -> Result<ParticleState, GpuError> {
        self.stepper.read_state(gpu)
    }

    /// Release every GPU resource of this epoch.
    pub fn teardown(self) {
        log::debug!("Tearing down epoch {}", self.id);
        self.stepper.destroy();
        self.projector.destroy();
        self.params_buffer.destroy();
    }
}
