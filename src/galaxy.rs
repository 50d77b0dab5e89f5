//! Initial galaxy distribution.
//!
//! Seeds the position and velocity grids of a new epoch: a thin disk of stars
//! swirling around a fixed attractor at the origin.
//!
//! Stars are placed by rejection-sampling the unit disk, pushed outwards by
//! `radius * rr^center_rotation_exponent` and given a tangential velocity of
//! `initial_velocity * rr^0.2` plus a small jitter.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GalaxyParams;
use crate::grid::{grid_side, ParticleGrid};

/// Amplitude of the random velocity jitter.
const VELOCITY_JITTER: f32 = 0.001;
/// Extra damping of the vertical jitter.
const VERTICAL_JITTER_SCALE: f32 = 0.05;

/// Position and velocity grids of one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleState {
    pub positions: ParticleGrid,
    pub velocities: ParticleGrid,
}

/// Random source for galaxy generation.
///
/// Uses ChaCha8 so a given seed produces the same galaxy on every platform.
pub struct GalaxySeeder {
    rng: ChaCha8Rng,
}

impl GalaxySeeder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed derived from the wall clock.
    pub fn entropy_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    }

    /// Uniform f32 in `[-1, 1)`.
    #[inline]
    pub fn signed_unit(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// Uniform point in the closed unit disk, by rejection.
    pub fn sample_unit_disk(&mut self) -> (f32, f32) {
        loop {
            let x = self.signed_unit();
            let z = self.signed_unit();
            if x * x + z * z <= 1.0 {
                return (x, z);
            }
        }
    }

    /// Position and velocity of one non-attractor star.
    pub fn star(&mut self, params: &GalaxyParams) -> ([f32; 4], [f32; 4]) {
        let (x, z) = self.sample_unit_disk();
        let rr = (x * x + z * z).sqrt();

        let r_exp = params.radius * rr.powf(params.center_rotation_exponent);
        let vel = params.initial_velocity * rr.powf(0.2);

        let vx = vel * z + self.signed_unit() * VELOCITY_JITTER;
        let vy = self.signed_unit() * VELOCITY_JITTER * VERTICAL_JITTER_SCALE;
        let vz = -vel * x + self.signed_unit() * VELOCITY_JITTER;

        let y = self.signed_unit() * params.height;

        ([x * r_exp, y, z * r_exp, 0.0], [vx, vy, vz, 0.0])
    }

    /// Fill a full `side * side` grid pair for `params`.
    pub fn generate(&mut self, params: &GalaxyParams) -> ParticleState {
        let side = grid_side(params.particle_count);
        let mut positions = ParticleGrid::zeroed(side);
        let mut velocities = ParticleGrid::zeroed(side);

        // Cell 0 stays zeroed: the attractor.
        for index in 1..positions.len() {
            let (position, velocity) = self.star(params);
            positions.set(index, position);
            velocities.set(index, velocity);
        }

        ParticleState {
            positions,
            velocities,
        }
    }
}

/// Generate the initial state for `params` from `seed`.
pub fn generate(params: &GalaxyParams, seed: u64) -> ParticleState {
    GalaxySeeder::new(seed).generate(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(count: u32) -> GalaxyParams {
        GalaxyParams {
            particle_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_attractor_cell_is_zero() {
        for count in [2, 4, 5, 17, 1000] {
            let state = generate(&params(count), 3);
            assert_eq!(state.positions.get(0), [0.0; 4]);
            assert_eq!(state.velocities.get(0), [0.0; 4]);
        }
    }

    #[test]
    fn test_grid_size_matches_count() {
        let state = generate(&params(1000), 1);
        assert_eq!(state.positions.side(), 32);
        assert_eq!(state.velocities.side(), 32);
        assert_eq!(state.positions.len(), 1024);

        let state = generate(&params(4), 1);
        assert_eq!(state.positions.side(), 2);
    }

    #[test]
    fn test_unit_disk_rejection_sampling() {
        let mut seeder = GalaxySeeder::new(99);
        for _ in 0..100_000 {
            let (x, z) = seeder.sample_unit_disk();
            assert!(x * x + z * z <= 1.0);
        }
    }

    #[test]
    fn test_stars_stay_inside_radius_and_height() {
        let galaxy = GalaxyParams {
            particle_count: 20_000,
            radius: 10.0,
            height: 2.0,
            center_rotation_exponent: 2.0,
            initial_velocity: 15.0,
        };
        let state = generate(&galaxy, 11);
        for cell in state.positions.cells() {
            let planar = (cell[0] * cell[0] + cell[2] * cell[2]).sqrt();
            assert!(planar <= galaxy.radius * 1.0001);
            assert!(cell[1].abs() <= galaxy.height);
            assert_eq!(cell[3], 0.0);
        }
    }

    #[test]
    fn test_velocity_is_tangential_swirl() {
        let galaxy = GalaxyParams {
            particle_count: 500,
            height: 0.0,
            ..Default::default()
        };
        let state = generate(&galaxy, 5);
        for index in 1..state.positions.len() {
            let p = state.positions.get(index);
            let v = state.velocities.get(index);
            let planar = (p[0] * p[0] + p[2] * p[2]).sqrt();
            if planar < 1.0 {
                continue;
            }
            // v ~ vel * (z, -x): the radial component is only jitter.
            let radial = (v[0] * p[0] + v[2] * p[2]) / planar;
            assert!(radial.abs() < 0.01, "radial velocity {} too large", radial);
            assert!(v[1].abs() <= VELOCITY_JITTER * VERTICAL_JITTER_SCALE);
            assert_eq!(v[3], 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_galaxy() {
        let a = generate(&params(4096), 1234);
        let b = generate(&params(4096), 1234);
        assert_eq!(a, b);

        let c = generate(&params(4096), 1235);
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn test_trailing_cells_are_finite() {
        let galaxy = GalaxyParams {
            particle_count: 5,
            center_rotation_exponent: 0.0,
            ..Default::default()
        };
        let state = generate(&galaxy, 8);
        assert_eq!(state.positions.len(), 9);
        assert!(state.positions.is_finite());
        assert!(state.velocities.is_finite());
        // Trailing cells are generated like any other star.
        assert_ne!(state.positions.get(8), [0.0; 4]);
    }
}
