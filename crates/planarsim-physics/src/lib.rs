#![warn(missing_docs)]

//! 2D rigid-body scenes for planarsim using Rapier2d.
//!
//! This crate turns a parsed scene file into a live physics world and drives
//! it in fixed steps, with one PID controller per actuated joint feeding the
//! joint's motor speed.
//!
//! # Features
//!
//! - Circle, polygon, chain, loop and edge fixtures with category/mask/group filtering
//! - Revolute, distance, prismatic, wheel, rope, motor, weld and friction joints
//! - All-or-nothing scene loading with typed errors
//! - Deterministic controller order and exact `steps * dt` simulated time
//!
//! # Example
//!
//! ```ignore
//! use planarsim_physics::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::load("arm.json", &SimConfig::default())?;
//!
//! sim.set_target("Arm1_to_Arm2", 0.5)?;
//! for _ in 0..130 {
//!     sim.step()?;
//! }
//!
//! let readings = sim.readings()?;
//! ```

mod bodies;
mod colliders;
mod config;
mod controller;
mod error;
mod filter;
mod joints;
mod simulation;
mod world;

pub use bodies::{build_body, BodyPlan};
pub use colliders::{build_fixture, BuiltShape, FixturePlan, Material};
pub use config::{
    PidGains, SimConfig, StepParams, DEFAULT_POSITION_ITERATIONS, DEFAULT_TIMESTEP,
    DEFAULT_VELOCITY_ITERATIONS,
};
pub use controller::{ControllerBank, Pid};
pub use error::PhysicsError;
pub use filter::CollisionFilter;
pub use joints::{JointDef, JointKind, JointSpec};
pub use simulation::{JointReading, Readings, Simulation};
pub use world::{BodyOutline, BodyPose, World};
