//! Simulation lifecycle: restart, pause and live parameters.
//!
//! The controller owns the configuration and at most one
//! [`SimulationEpoch`]. Live parameters are pulled into the running epoch
//! without a rebuild; galaxy parameters are staged and take effect on the
//! next [`restart`](SimulationController::restart).

use crate::camera::{Camera, Viewport};
use crate::config::{GalaxyParams, LiveParams, SimulationConfig};
use crate::epoch::SimulationEpoch;
use crate::error::{ConfigError, EpochError};
use crate::galaxy::{GalaxySeeder, ParticleState};
use crate::gpu::compositor::MotionBlurCompositor;
use crate::gpu::{GpuContext, GpuError};

pub struct SimulationController {
    config: SimulationConfig,
    paused: bool,
    epoch: Option<SimulationEpoch>,
    next_epoch_id: u64,
}

impl SimulationController {
    /// Controller with no epoch yet. Call [`restart`](Self::restart) to start.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            paused: false,
            epoch: None,
            next_epoch_id: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn epoch(&self) -> Option<&SimulationEpoch> {
        self.epoch.as_ref()
    }

    /// Store new live values and hand them to the running epoch.
    ///
    /// The GPU upload happens once, at the next frame or step. Returns
    /// `Ok(false)` when nothing changed.
    pub fn apply_live_parameters(&mut self, live: &LiveParams) -> Result<bool, ConfigError> {
        live.validate()?;
        if *live == self.config.live {
            return Ok(false);
        }

        self.config.live = *live;
        if let Some(epoch) = &mut self.epoch {
            epoch.set_live(live);
        }
        log::debug!("Live parameters updated: {:?}", live);
        Ok(true)
    }

    /// Stage restart-only parameters. Validated by the next restart.
    pub fn set_galaxy(&mut self, galaxy: GalaxyParams) {
        self.config.galaxy = galaxy;
    }

    /// Build a new epoch from the current configuration and replace the old one.
    ///
    /// On error the running epoch is left untouched.
    pub fn restart(&mut self, gpu: &GpuContext) -> Result<(), EpochError> {
        let seed = self.config.seed.unwrap_or_else(GalaxySeeder::entropy_seed);
        let epoch = SimulationEpoch::new(gpu, &self.config, seed, self.next_epoch_id)?;
        self.next_epoch_id += 1;

        if let Some(previous) = self.epoch.replace(epoch) {
            previous.teardown();
        }
        self.paused = false;
        Ok(())
    }

    /// Flip the pause flag and return the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        log::debug!("{}", if self.paused { "Paused" } else { "Resumed" });
        self.paused
    }

    /// Advance one step without drawing. Returns whether a step ran.
    pub fn step(&mut self, gpu: &GpuContext) -> bool {
        if self.paused {
            return false;
        }
        let Some(epoch) = &mut self.epoch else {
            return false;
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });
        epoch.sync_params(&gpu.queue);
        epoch.encode_step(&mut encoder);
        gpu.queue.submit(std::iter::once(encoder.finish()));
        true
    }

    /// Record and submit one full frame into `target`.
    ///
    /// Uniform upload, step (unless paused), star draw and compositing all go
    /// into a single command buffer.
    pub fn frame(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        compositor: &mut MotionBlurCompositor,
        target: &wgpu::TextureView,
    ) {
        let (width, height) = compositor.size();
        let viewport = Viewport::new(width, height);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        match &mut self.epoch {
            Some(epoch) => {
                epoch.sync(&gpu.queue, camera, viewport);
                if !self.paused {
                    epoch.encode_step(&mut encoder);
                }
                epoch.encode_draw(&mut encoder, compositor.scene_view());
            }
            None => compositor.clear_scene(&mut encoder, wgpu::Color::BLACK),
        }
        compositor.composite(&mut encoder, target);

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Committed state of the running epoch, if any. Blocks on the GPU.
    pub fn read_state(&self, gpu: &GpuContext) -> Result<Option<ParticleState>, GpuError> {
        self.epoch
            .as_ref()
            .map(|epoch| epoch.read_state(gpu))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_pause_flips() {
        let mut controller = SimulationController::new(SimulationConfig::default());
        assert!(!controller.is_paused());
        assert!(controller.toggle_pause());
        assert!(controller.is_paused());
        assert!(!controller.toggle_pause());
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_apply_live_parameters_reports_changes() {
        let mut controller = SimulationController::new(SimulationConfig::default());
        let mut live = LiveParams::default();
        assert!(!controller.apply_live_parameters(&live).unwrap());

        live.gravity = 5.0;
        assert!(controller.apply_live_parameters(&live).unwrap());
        assert!(!controller.apply_live_parameters(&live).unwrap());
        assert_eq!(controller.config().live.gravity, 5.0);
    }

    #[test]
    fn test_invalid_live_parameters_are_not_stored() {
        let mut controller = SimulationController::new(SimulationConfig::default());
        let live = LiveParams {
            time_step: f32::NAN,
            ..Default::default()
        };
        assert!(controller.apply_live_parameters(&live).is_err());
        assert_eq!(controller.config().live, LiveParams::default());
    }

    #[test]
    fn test_galaxy_changes_are_staged() {
        let mut controller = SimulationController::new(SimulationConfig::default());
        controller.set_galaxy(GalaxyParams {
            particle_count: 4,
            ..Default::default()
        });
        assert_eq!(controller.config().galaxy.particle_count, 4);
        assert!(controller.epoch().is_none());
    }
}
