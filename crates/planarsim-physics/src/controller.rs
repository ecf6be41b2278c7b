//! PID joint controllers.
//!
//! Output is neither clamped nor protected against integral windup; choosing
//! gains that keep the loop stable is up to the caller.

use std::collections::HashMap;

use crate::config::PidGains;
use crate::error::PhysicsError;

/// A single PID loop with a fixed timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    gains: PidGains,
    dt: f64,
    setpoint: f64,
    integral: f64,
    previous_error: f64,
    output: f64,
}

impl Pid {
    /// Create a controller at rest (setpoint 0, no accumulated state).
    pub fn new(gains: PidGains, dt: f64) -> Self {
        Self {
            gains,
            dt,
            setpoint: 0.0,
            integral: 0.0,
            previous_error: 0.0,
            output: 0.0,
        }
    }

    /// Run one update against a measured value and return the new output.
    pub fn update(&mut self, measured: f64) -> f64 {
        let error = self.setpoint - measured;
        self.integral += error * self.dt;
        let derivative = (error - self.previous_error) / self.dt;
        self.output =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        self.previous_error = error;
        self.output
    }

    /// Change the setpoint. Accumulated integral and previous error are kept.
    pub fn set_target(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// Zero the setpoint, integral, previous error and output.
    pub fn reset(&mut self) {
        self.setpoint = 0.0;
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.output = 0.0;
    }

    /// Current setpoint.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Accumulated integral term.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Error seen by the last update.
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Output of the last update.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Gains of this loop.
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Timestep used for the integral and derivative.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

/// One PID loop per actuated joint, kept in creation order.
#[derive(Debug, Clone, Default)]
pub struct ControllerBank {
    controllers: Vec<(String, Pid)>,
    index: HashMap<String, usize>,
}

impl ControllerBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller for a joint.
    pub fn add(&mut self, joint: &str, gains: PidGains, dt: f64) -> Result<(), PhysicsError> {
        if self.index.contains_key(joint) {
            return Err(PhysicsError::DuplicateJointName(joint.to_string()));
        }
        self.index.insert(joint.to_string(), self.controllers.len());
        self.controllers.push((joint.to_string(), Pid::new(gains, dt)));
        Ok(())
    }

    fn slot(&mut self, joint: &str) -> Result<&mut Pid, PhysicsError> {
        let i = *self
            .index
            .get(joint)
            .ok_or_else(|| PhysicsError::UnknownJoint(joint.to_string()))?;
        Ok(&mut self.controllers[i].1)
    }

    /// Set a joint's target angle.
    pub fn set_target(&mut self, joint: &str, angle: f64) -> Result<(), PhysicsError> {
        self.slot(joint)?.set_target(angle);
        Ok(())
    }

    /// Reset a joint's controller state.
    pub fn reset(&mut self, joint: &str) -> Result<(), PhysicsError> {
        self.slot(joint)?.reset();
        Ok(())
    }

    /// Controller of a joint, if any.
    pub fn get(&self, joint: &str) -> Option<&Pid> {
        self.index.get(joint).map(|&i| &self.controllers[i].1)
    }

    /// Controllers in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pid)> {
        self.controllers.iter().map(|(name, pid)| (name.as_str(), pid))
    }

    /// Mutable controllers in creation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Pid)> {
        self.controllers
            .iter_mut()
            .map(|(name, pid)| (name.as_str(), pid))
    }

    /// Controlled joint names in creation order.
    pub fn joints(&self) -> impl Iterator<Item = &str> {
        self.controllers.iter().map(|(name, _)| name.as_str())
    }

    /// Number of controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// True if no joint is controlled.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
