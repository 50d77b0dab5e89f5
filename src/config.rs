//! Simulation configuration.
//!
//! Parameters are split in two mutation classes:
//!
//! - [`LiveParams`] can change at any time and reach the running kernels
//!   through [`SimulationController::apply_live_parameters`](crate::SimulationController::apply_live_parameters).
//! - [`GalaxyParams`] shape the particle grid and the initial distribution,
//!   so they only take effect on restart.
//!
//! Every parameter is described by a [`ParamSpec`] so an external UI can build
//! its sliders from [`LIVE_PARAMETERS`] and [`GALAXY_PARAMETERS`].
//!
//! # Example
//!
//! ```ignore
//! let mut config = SimulationConfig::default();
//! config.galaxy.particle_count = 250_000;
//! config.live.gravity = 40.0;
//! config.validate()?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default motion-blur mix ratio between the fresh scene and the saved frame.
pub const DEFAULT_MIX_RATIO: f32 = 0.5;

/// Range and granularity of one tunable parameter.
///
/// `min..=max` is the slider range an external UI should offer. Validation
/// only enforces the wider hard limits, which reject non-finite values and
/// configurations the generator cannot build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    /// Identifier, matches the serde field name.
    pub name: &'static str,
    /// Human readable label.
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Smallest accepted value.
    pub lower_limit: f64,
    /// Largest accepted value.
    pub upper_limit: f64,
}

impl ParamSpec {
    const fn new(name: &'static str, label: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self {
            name,
            label,
            min,
            max,
            step,
            lower_limit: f64::MIN,
            upper_limit: f64::MAX,
        }
    }

    const fn at_least(mut self, lower_limit: f64) -> Self {
        self.lower_limit = lower_limit;
        self
    }

    /// Check a value against the hard limits. NaN and infinities are always rejected.
    pub fn check(&self, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value >= self.lower_limit && value <= self.upper_limit {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                name: self.name,
                value,
                min: self.lower_limit,
                max: self.upper_limit,
            })
        }
    }

    /// Whether `value` lies inside the slider range.
    pub fn in_ui_range(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Parameters that can be changed while the simulation runs.
pub const LIVE_PARAMETERS: [ParamSpec; 6] = [
    ParamSpec::new("gravity", "Gravitational force", 0.0, 1000.0, 0.05),
    ParamSpec::new("interaction_rate", "Interaction rate (%)", 0.0, 1.0, 0.001),
    ParamSpec::new("time_step", "Time step", 0.0, 0.01, 0.0001),
    ParamSpec::new("black_hole_force", "Black hole force", 0.0, 1000.0, 0.5),
    ParamSpec::new("luminosity", "Luminosity", 0.0, 10.0, 0.01),
    ParamSpec::new("max_acceleration_color", "Colors mix", 0.1, 1000.0, 0.1),
];

/// Parameters that require a restart.
///
/// A zero particle count (empty grid) and a negative radius or height are
/// rejected. A single particle is just the attractor.
pub const GALAXY_PARAMETERS: [ParamSpec; 5] = [
    ParamSpec::new("particle_count", "Number of stars", 2.0, 1_000_000.0, 1.0).at_least(1.0),
    ParamSpec::new("radius", "Galaxy diameter", 1.0, 1000.0, 1.0).at_least(0.0),
    ParamSpec::new("height", "Galaxy height", 0.0, 50.0, 0.01).at_least(0.0),
    ParamSpec::new("center_rotation_exponent", "Center rotation speed", 0.0, 20.0, 0.001),
    ParamSpec::new("initial_velocity", "Initial rotation speed", 0.0, 150.0, 0.1),
];

/// Live-tunable kernel and renderer parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveParams {
    /// Global force multiplier. Zero freezes velocities.
    pub gravity: f32,
    /// Weight of the sampled star-to-star pull.
    pub interaction_rate: f32,
    /// Integration step per frame.
    pub time_step: f32,
    /// Weight of the pull towards the central attractor.
    pub black_hole_force: f32,
    /// Brightness multiplier for rendered stars.
    pub luminosity: f32,
    /// Acceleration that maps to the hottest star color.
    pub max_acceleration_color: f32,
}

impl Default for LiveParams {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            interaction_rate: 1.0,
            time_step: 0.001,
            black_hole_force: 100.0,
            luminosity: 1.0,
            max_acceleration_color: 50.0,
        }
    }
}

impl LiveParams {
    /// Set the color bound from a "colors mix" percentage (bound = percent * 10).
    pub fn set_color_mix_percent(&mut self, percent: f32) {
        self.max_acceleration_color = percent * 10.0;
    }

    /// The color bound expressed as a "colors mix" percentage.
    pub fn color_mix_percent(&self) -> f32 {
        self.max_acceleration_color / 10.0
    }

    fn values(&self) -> [f32; 6] {
        [
            self.gravity,
            self.interaction_rate,
            self.time_step,
            self.black_hole_force,
            self.luminosity,
            self.max_acceleration_color,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        LIVE_PARAMETERS
            .iter()
            .zip(self.values())
            .try_for_each(|(spec, value)| spec.check(value as f64))
    }
}

/// Restart-only parameters describing the initial galaxy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParams {
    /// Number of stars, including the central attractor.
    pub particle_count: u32,
    /// Outer radius of the disk.
    pub radius: f32,
    /// Half-thickness of the disk.
    pub height: f32,
    /// Exponent applied to the normalized radius when placing stars.
    pub center_rotation_exponent: f32,
    /// Tangential speed scale at the rim.
    pub initial_velocity: f32,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            radius: 100.0,
            height: 5.0,
            center_rotation_exponent: 2.0,
            initial_velocity: 15.0,
        }
    }
}

impl GalaxyParams {
    /// Side of the square particle grid: `ceil(sqrt(particle_count))`.
    pub fn grid_side(&self) -> u32 {
        crate::grid::grid_side(self.particle_count)
    }

    fn values(&self) -> [f64; 5] {
        [
            self.particle_count as f64,
            self.radius as f64,
            self.height as f64,
            self.center_rotation_exponent as f64,
            self.initial_velocity as f64,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        GALAXY_PARAMETERS
            .iter()
            .zip(self.values())
            .try_for_each(|(spec, value)| spec.check(value))
    }
}

/// Motion-blur compositing settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurParams {
    pub enabled: bool,
    /// Weight of the saved frame in the blend (0 = no trail).
    pub mix_ratio: f32,
}

impl Default for MotionBlurParams {
    fn default() -> Self {
        Self {
            enabled: true,
            mix_ratio: DEFAULT_MIX_RATIO,
        }
    }
}

impl MotionBlurParams {
    /// Mix ratio actually used by the blend pass.
    pub fn effective_mix_ratio(&self) -> f32 {
        if self.enabled {
            self.mix_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Full simulation configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub live: LiveParams,
    pub galaxy: GalaxyParams,
    pub motion_blur: MotionBlurParams,
    /// Fixed seed for the galaxy generator. `None` picks a new seed per epoch.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Validate both parameter classes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.live.validate()?;
        self.galaxy.validate()
    }

    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        // Plain data with no maps or non-string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_particles_rejected() {
        let galaxy = GalaxyParams {
            particle_count: 0,
            ..Default::default()
        };
        match galaxy.validate() {
            Err(ConfigError::OutOfRange { name, .. }) => assert_eq!(name, "particle_count"),
            other => panic!("expected out of range, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_radius_and_height_rejected() {
        let galaxy = GalaxyParams {
            radius: -5.0,
            ..Default::default()
        };
        assert!(galaxy.validate().is_err());

        let galaxy = GalaxyParams {
            height: -0.1,
            ..Default::default()
        };
        assert!(galaxy.validate().is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let live = LiveParams {
            gravity: f32::NAN,
            ..Default::default()
        };
        assert!(live.validate().is_err());
    }

    #[test]
    fn test_color_mix_percent() {
        let mut live = LiveParams::default();
        live.set_color_mix_percent(5.0);
        assert_eq!(live.max_acceleration_color, 50.0);
        assert_eq!(live.color_mix_percent(), 5.0);
    }

    #[test]
    fn test_json_partial_config_uses_defaults() {
        let config = SimulationConfig::from_json(
            r#"{ "galaxy": { "particle_count": 4, "radius": 10.0 }, "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.galaxy.particle_count, 4);
        assert_eq!(config.galaxy.radius, 10.0);
        assert_eq!(config.galaxy.height, GalaxyParams::default().height);
        assert_eq!(config.live, LiveParams::default());
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let err = SimulationConfig::from_json(r#"{ "galaxy": { "radius": -2.0 } }"#);
        assert!(matches!(err, Err(ConfigError::OutOfRange { name: "radius", .. })));
    }

    #[test]
    fn test_values_past_the_sliders_are_accepted() {
        let galaxy = GalaxyParams {
            particle_count: 1,
            radius: 0.5,
            ..Default::default()
        };
        galaxy.validate().unwrap();

        let galaxy = GalaxyParams {
            particle_count: 2_000_000,
            ..Default::default()
        };
        galaxy.validate().unwrap();

        let live = LiveParams {
            gravity: 2000.0,
            time_step: 1.0,
            ..Default::default()
        };
        live.validate().unwrap();

        let spec = &LIVE_PARAMETERS[0];
        assert_eq!(spec.name, "gravity");
        assert!(!spec.in_ui_range(2000.0));
        assert!(spec.in_ui_range(20.0));
    }

    #[test]
    fn test_infinite_values_rejected() {
        let live = LiveParams {
            time_step: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            live.validate(),
            Err(ConfigError::OutOfRange { name: "time_step", .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SimulationConfig::default();
        config.seed = Some(42);
        config.motion_blur.mix_ratio = 0.8;
        let parsed = SimulationConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_disabled_motion_blur_has_zero_mix() {
        let blur = MotionBlurParams {
            enabled: false,
            mix_ratio: 0.7,
        };
        assert_eq!(blur.effective_mix_ratio(), 0.0);

        let blur = MotionBlurParams {
            enabled: true,
            mix_ratio: 3.0,
        };
        assert_eq!(blur.effective_mix_ratio(), 1.0);
    }
}
