//! # Galaxy GPU
//!
//! A star galaxy simulated entirely on the GPU.
//!
//! Every star's position and velocity live in square float textures. Each
//! frame two compute kernels integrate the velocities and then the positions,
//! the stars are drawn as additive sprites, and a motion-blur pass blends the
//! new frame with the previous one to leave trails.
//!
//! ## Quick Start
//!
//! ```ignore
//! use galaxy_gpu::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new()
//!         .with_particle_count(100_000)
//!         .with_seed(7)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particle grid
//!
//! `particle_count` stars occupy a `side x side` grid with
//! `side = ceil(sqrt(particle_count))`. Cell 0 is the central attractor and
//! never moves. Cells past `particle_count` are simulated but not drawn.
//!
//! ### Epochs
//!
//! A [`SimulationEpoch`] owns every GPU resource built from one set of
//! [`GalaxyParams`]. Restarting builds a whole new epoch and only then tears
//! the old one down, so a rejected restart leaves the simulation running.
//!
//! ### Live parameters
//!
//! [`LiveParams`] (gravity, time step, luminosity, ...) are applied through
//! [`SimulationController::apply_live_parameters`] and reach the kernels on
//! the next frame without a rebuild.
//!
//! ## Headless use
//!
//! ```ignore
//! let gpu = pollster::block_on(GpuContext::headless())?;
//! let mut controller = SimulationController::new(config);
//! controller.restart(&gpu)?;
//! for _ in 0..100 {
//!     controller.step(&gpu);
//! }
//! let state = controller.read_state(&gpu)?;
//! ```

pub mod camera;
pub mod config;
pub mod controller;
pub mod epoch;
pub mod error;
pub mod galaxy;
pub mod gpu;
pub mod grid;
pub mod params;
pub mod ping_pong;
pub mod shaders;
mod simulation;

pub use camera::{Camera, Viewport};
pub use config::{GalaxyParams, LiveParams, MotionBlurParams, ParamSpec, SimulationConfig};
pub use controller::SimulationController;
pub use epoch::SimulationEpoch;
pub use error::{ConfigError, EpochError, GpuError, SimulationError};
pub use galaxy::{GalaxySeeder, ParticleState};
pub use glam::Vec3;
pub use gpu::GpuContext;
pub use grid::ParticleGrid;
pub use params::ParamBlock;
pub use simulation::Simulation;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use galaxy_gpu::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{GalaxyParams, LiveParams, MotionBlurParams, SimulationConfig};
    pub use crate::error::SimulationError;
    pub use crate::simulation::Simulation;
    pub use glam::Vec3;
}
