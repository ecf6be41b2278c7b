//! Fixed-step simulation driver with PID joint actuation.

use std::path::Path;

use planarsim_ir::SceneDescriptor;
use serde::Serialize;

use crate::config::{SimConfig, StepParams};
use crate::controller::ControllerBank;
use crate::error::PhysicsError;
use crate::world::World;

/// Angle, target and last command of one controlled joint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointReading {
    /// Joint name.
    pub joint: String,
    /// Current joint angle (rad).
    pub angle: f64,
    /// Current setpoint (rad).
    pub target: f64,
    /// Motor speed commanded on the last step (rad/s).
    pub command: f64,
}

/// Snapshot of the simulation after some number of steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readings {
    /// Steps taken so far.
    pub step: u64,
    /// Simulated time in seconds.
    pub time: f64,
    /// Controlled joints in controller creation order.
    pub joints: Vec<JointReading>,
}

/// A world plus its joint controllers, advanced in fixed steps.
pub struct Simulation {
    world: World,
    controllers: ControllerBank,
    step_params: StepParams,
    steps: u64,
}

impl Simulation {
    /// Load a scene file and set up controllers according to `config`.
    pub fn load(path: impl AsRef<Path>, config: &SimConfig) -> Result<Self, PhysicsError> {
        Self::new(World::load_scene(path)?, config)
    }

    /// Build a scene and set up controllers according to `config`.
    pub fn from_scene(scene: &SceneDescriptor, config: &SimConfig) -> Result<Self, PhysicsError> {
        Self::new(World::from_scene(scene)?, config)
    }

    /// Wrap an existing world.
    ///
    /// Controllers are created for `config.actuated` in list order, or for
    /// every revolute and wheel joint in file order when no list is given.
    pub fn new(world: World, config: &SimConfig) -> Result<Self, PhysicsError> {
        let step_params = config.resolve(world.params())?;

        let actuated: Vec<String> = match &config.actuated {
            Some(joints) => joints.clone(),
            None => world
                .joint_names()
                .filter(|name| world.joint_kind(name).is_ok_and(|kind| kind.is_actuatable()))
                .map(str::to_string)
                .collect(),
        };

        let mut controllers = ControllerBank::new();
        for joint in &actuated {
            // Fails for unknown or non-actuatable joints.
            world.joint_angle(joint)?;
            controllers.add(joint, config.gains_for(joint), f64::from(step_params.dt))?;
        }

        Ok(Self {
            world,
            controllers,
            step_params,
            steps: 0,
        })
    }

    /// Set a controlled joint's target angle (rad).
    pub fn set_target(&mut self, joint: &str, angle: f64) -> Result<(), PhysicsError> {
        self.controllers.set_target(joint, angle)
    }

    /// Reset a controlled joint's controller.
    pub fn reset(&mut self, joint: &str) -> Result<(), PhysicsError> {
        self.controllers.reset(joint)
    }

    /// Run every controller in creation order, then advance the world once.
    pub fn step(&mut self) -> Result<(), PhysicsError> {
        for (joint, pid) in self.controllers.iter_mut() {
            let measured = self.world.joint_angle(joint)?;
            let command = pid.update(measured);
            self.world.set_motor_speed(joint, command)?;
        }
        self.world.advance(&self.step_params);
        self.steps += 1;
        Ok(())
    }

    /// Take `n` steps.
    pub fn run(&mut self, n: u64) -> Result<(), PhysicsError> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time: steps taken times the fixed timestep.
    pub fn time(&self) -> f64 {
        self.steps as f64 * f64::from(self.step_params.dt)
    }

    /// Current angle of any revolute or wheel joint.
    pub fn joint_angle(&self, joint: &str) -> Result<f64, PhysicsError> {
        self.world.joint_angle(joint)
    }

    /// Snapshot of step count, time and controlled joint angles.
    pub fn readings(&self) -> Result<Readings, PhysicsError> {
        let joints = self
            .controllers
            .iter()
            .map(|(joint, pid)| {
                Ok(JointReading {
                    joint: joint.to_string(),
                    angle: self.world.joint_angle(joint)?,
                    target: pid.setpoint(),
                    command: pid.output(),
                })
            })
            .collect::<Result<Vec<_>, PhysicsError>>()?;

        Ok(Readings {
            step: self.steps,
            time: self.time(),
            joints,
        })
    }

    /// Resolved stepping parameters.
    pub fn step_params(&self) -> &StepParams {
        &self.step_params
    }

    /// The controller bank.
    pub fn controllers(&self) -> &ControllerBank {
        &self.controllers
    }

    /// The underlying world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the underlying world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
