//! Advances the particle state by one time step.

use crate::galaxy::ParticleState;
use crate::params::ParamBlock;

use super::kernel::{GridKernel, KernelSpec};
use super::state_store::ParticleStateStore;
use super::{GpuContext, GpuError};

/// Scheduled kernels bound to one state store.
pub struct SimulationStepper {
    store: ParticleStateStore,
    kernels: Vec<GridKernel>,
    steps: u64,
}

impl SimulationStepper {
    /// Compile `kernels`, which must already be in dispatch order.
    pub fn new(
        device: &wgpu::Device,
        store: ParticleStateStore,
        kernels: &[KernelSpec],
        params: &ParamBlock,
        params_buffer: &wgpu::Buffer,
    ) -> Self {
        let kernels = kernels
            .iter()
            .map(|spec| GridKernel::new(device, spec, params, params_buffer, &store))
            .collect::<Vec<_>>();

        log::debug!(
            "Stepper ready: {}",
            kernels.iter().map(|k| k.name()).collect::<Vec<_>>().join(" -> ")
        );

        Self {
            store,
            kernels,
            steps: 0,
        }
    }

    /// Record one step and commit it.
    ///
    /// The swap happens on the host at record time; the commands must be
    /// submitted before anything else reads the store.
    pub fn encode_step(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let parity = self.store.front_index();
        for kernel in &self.kernels {
            kernel.dispatch(encoder, parity);
        }
        self.store.swap();
        self.steps += 1;
    }

    pub fn store(&self) -> &ParticleStateStore {
        &self.store
    }

    /// Steps committed since the epoch started.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn read_state(&self, gpu: &GpuContext) -> Result<ParticleState, GpuError> {
        self.store.read_back(gpu)
    }

    pub fn destroy(&self) {
        self.store.destroy();
    }
}
