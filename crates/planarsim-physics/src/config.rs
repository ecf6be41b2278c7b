//! Simulation driver configuration.
//!
//! Values resolve in three layers: an explicit [`SimConfig`] value wins, then
//! whatever the scene file suggests, then the built-in defaults below.

use std::collections::HashMap;
use std::path::Path;

use planarsim_ir::WorldParams;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Default fixed timestep (seconds).
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 130.0;
/// Default solver velocity iterations.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 3;
/// Default solver position iterations.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 2;

/// PID gains for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl PidGains {
    /// Create a gain set.
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::new(20.0, 1.0, 1.0)
    }
}

/// Driver configuration, typically read from a TOML file.
///
/// ```toml
/// timestep = 0.0125
/// velocity_iterations = 6
///
/// [gains]
/// kp = 20.0
/// ki = 1.0
/// kd = 1.0
///
/// [joint_gains.Arm1_to_Arm2]
/// kp = 10.0
/// ki = 0.0
/// kd = 0.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds.
    pub timestep: Option<f32>,
    /// Solver velocity iterations.
    pub velocity_iterations: Option<u32>,
    /// Solver position (stabilization) iterations.
    pub position_iterations: Option<u32>,
    /// Gains applied to every controller without an override.
    pub gains: PidGains,
    /// Per-joint gain overrides.
    pub joint_gains: HashMap<String, PidGains>,
    /// Joints to actuate, in controller order. `None` means every actuatable joint.
    pub actuated: Option<Vec<String>>,
}

/// Fully resolved stepping parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// Solver velocity iterations.
    pub velocity_iterations: u32,
    /// Solver position iterations.
    pub position_iterations: u32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            dt: DEFAULT_TIMESTEP,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
        }
    }
}

impl SimConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, PhysicsError> {
        toml::from_str(text).map_err(|e| PhysicsError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PhysicsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Gains for a given joint.
    pub fn gains_for(&self, joint: &str) -> PidGains {
        self.joint_gains.get(joint).copied().unwrap_or(self.gains)
    }

    /// Resolve stepping parameters against what the scene file suggests.
    pub fn resolve(&self, world: &WorldParams) -> Result<StepParams, PhysicsError> {
        let file_dt = world
            .steps_per_second
            .filter(|sps| *sps > 0.0)
            .map(|sps| (1.0 / sps) as f32);
        let dt = self.timestep.or(file_dt).unwrap_or(DEFAULT_TIMESTEP);
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::Config(format!(
                "timestep must be positive, got {dt}"
            )));
        }

        Ok(StepParams {
            dt,
            velocity_iterations: self
                .velocity_iterations
                .or(world.velocity_iterations)
                .unwrap_or(DEFAULT_VELOCITY_ITERATIONS),
            position_iterations: self
                .position_iterations
                .or(world.position_iterations)
                .unwrap_or(DEFAULT_POSITION_ITERATIONS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.gains, PidGains::new(20.0, 1.0, 1.0));

        let params = config.resolve(&WorldParams::default()).unwrap();
        assert_eq!(params, StepParams::default());
    }

    #[test]
    fn test_precedence() {
        let world = WorldParams {
            steps_per_second: Some(60.0),
            velocity_iterations: Some(6),
            ..WorldParams::default()
        };

        let from_file = SimConfig::default().resolve(&world).unwrap();
        assert_relative_eq!(from_file.dt, 1.0 / 60.0);
        assert_eq!(from_file.velocity_iterations, 6);
        assert_eq!(from_file.position_iterations, DEFAULT_POSITION_ITERATIONS);

        let config = SimConfig::from_toml_str("timestep = 0.01\nvelocity_iterations = 8").unwrap();
        let explicit = config.resolve(&world).unwrap();
        assert_relative_eq!(explicit.dt, 0.01);
        assert_eq!(explicit.velocity_iterations, 8);
    }

    #[test]
    fn test_joint_gain_override() {
        let config = SimConfig::from_toml_str(
            r#"
            actuated = ["elbow"]

            [gains]
            kp = 5.0
            ki = 0.0
            kd = 0.0

            [joint_gains.elbow]
            kp = 1.0
            ki = 2.0
            kd = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.gains_for("elbow"), PidGains::new(1.0, 2.0, 3.0));
        assert_eq!(config.gains_for("shoulder"), PidGains::new(5.0, 0.0, 0.0));
        assert_eq!(config.actuated, Some(vec!["elbow".to_string()]));
    }

    #[test]
    fn test_bad_timestep_rejected() {
        let config = SimConfig::from_toml_str("timestep = -1.0").unwrap();
        assert!(matches!(
            config.resolve(&WorldParams::default()),
            Err(PhysicsError::Config(_))
        ));
        assert!(SimConfig::from_toml_str("timestep = \"fast\"").is_err());
    }
}
