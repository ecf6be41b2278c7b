//! Live physics world built from a scene, using Rapier2d.

use std::collections::{HashMap, HashSet};
use std::f64::consts::{PI, TAU};
use std::num::NonZeroUsize;
use std::path::Path;

use nalgebra::Vector2;
use planarsim_ir::{BodyKind, BodyRef, SceneDescriptor, WorldParams};
use rapier2d::dynamics::{
    CCDSolver, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager,
    JointAxis, MultibodyJointSet, RigidBodyHandle, RigidBodySet,
};
use rapier2d::geometry::{BroadPhaseMultiSap, ColliderHandle, ColliderSet, NarrowPhase};
use rapier2d::pipeline::{PhysicsPipeline, QueryPipeline};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bodies::{build_body, BodyPlan};
use crate::config::StepParams;
use crate::error::PhysicsError;
use crate::filter::{CollisionFilter, FilterHooks};
use crate::joints::{JointDef, JointKind, DEFAULT_MOTOR_DAMPING};

/// Position and unwrapped angle of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPose {
    /// Body origin in world coordinates.
    pub position: [f64; 2],
    /// Rotation in radians, tracked continuously (not wrapped to ±π).
    pub angle: f64,
}

/// World-space outline of a body's first fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum BodyOutline {
    /// Convex polygon vertices.
    Polygon {
        /// Vertices in world coordinates.
        vertices: Vec<[f64; 2]>,
    },
    /// Circle.
    Circle {
        /// Center in world coordinates.
        center: [f64; 2],
        /// Radius.
        radius: f64,
    },
}

struct BodyEntry {
    name: String,
    kind: BodyKind,
    handle: RigidBodyHandle,
    colliders: Vec<ColliderHandle>,
    filters: Vec<CollisionFilter>,
}

struct JointEntry {
    name: String,
    def: JointDef,
    handle: ImpulseJointHandle,
    body_a: usize,
    body_b: usize,
}

struct JointPlan {
    name: String,
    def: JointDef,
    body_a: usize,
    body_b: usize,
}

/// Physics simulation world.
///
/// Bodies and joints are stored in file order; names are a secondary index.
pub struct World {
    // Rapier components
    pipeline: PhysicsPipeline,
    gravity: Vector2<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    hooks: FilterHooks,

    params: WorldParams,

    // Scene arenas
    body_entries: Vec<BodyEntry>,
    body_index: HashMap<String, usize>,
    joint_entries: Vec<JointEntry>,
    joint_index: HashMap<String, usize>,

    // Continuous body angles, parallel to `body_entries`
    angles: Vec<f64>,
}

/// Wrap an angle difference into `[-π, π)`.
fn wrap_angle(delta: f64) -> f64 {
    (delta + PI).rem_euclid(TAU) - PI
}

impl World {
    /// Build a world from a parsed scene.
    ///
    /// Construction is all-or-nothing: on error no world is returned.
    pub fn from_scene(scene: &SceneDescriptor) -> Result<Self, PhysicsError> {
        let mut world = Self::new(&scene.world);
        world.extend(scene)?;
        info!(
            bodies = world.body_entries.len(),
            joints = world.joint_entries.len(),
            "scene loaded"
        );
        Ok(world)
    }

    /// Read, parse and build a scene file.
    pub fn load_scene(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PhysicsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = SceneDescriptor::from_json(&text)?;
        Self::from_scene(&scene)
    }

    /// Create an empty world with the given parameters.
    pub fn new(params: &WorldParams) -> Self {
        let mut integration_params = IntegrationParameters::default();
        if !params.warm_starting {
            integration_params.warmstart_coefficient = 0.0;
        }
        if params.sub_stepping {
            warn!("subStepping is not supported by the solver, ignoring");
        }

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector2::new(params.gravity.x as f32, params.gravity.y as f32),
            integration_params,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            hooks: FilterHooks,
            params: params.clone(),
            body_entries: Vec::new(),
            body_index: HashMap::new(),
            joint_entries: Vec::new(),
            joint_index: HashMap::new(),
            angles: Vec::new(),
        }
    }

    /// Add the bodies and joints of another scene.
    ///
    /// World parameters of `scene` are ignored. Joint index references resolve
    /// against `scene`'s own body list; name references may also name bodies
    /// already in the world. If anything fails, the world is left unchanged.
    pub fn extend(&mut self, scene: &SceneDescriptor) -> Result<(), PhysicsError> {
        // Plan everything first so that a failure leaves the world untouched.
        let mut new_bodies: HashMap<&str, usize> = HashMap::new();
        let mut body_plans = Vec::with_capacity(scene.bodies.len());
        for desc in &scene.bodies {
            if self.body_index.contains_key(&desc.name) || new_bodies.contains_key(desc.name.as_str()) {
                return Err(PhysicsError::DuplicateBodyName(desc.name.clone()));
            }
            new_bodies.insert(&desc.name, self.body_entries.len() + body_plans.len());
            body_plans.push(build_body(desc, &self.params)?);
        }

        let mut new_joints: HashSet<&str> = HashSet::new();
        let mut joint_plans = Vec::with_capacity(scene.joints.len());
        for desc in &scene.joints {
            if self.joint_index.contains_key(&desc.name) || !new_joints.insert(desc.name.as_str()) {
                return Err(PhysicsError::DuplicateJointName(desc.name.clone()));
            }
            let body_a = self.resolve_body(&desc.body_a, scene, &new_bodies, &desc.name)?;
            let body_b = self.resolve_body(&desc.body_b, scene, &new_bodies, &desc.name)?;
            joint_plans.push(JointPlan {
                name: desc.name.clone(),
                def: JointDef::from_descriptor(desc)?,
                body_a,
                body_b,
            });
        }

        for plan in body_plans {
            self.insert_body(plan);
        }
        for plan in joint_plans {
            self.insert_joint(plan);
        }
        Ok(())
    }

    fn resolve_body(
        &self,
        reference: &BodyRef,
        scene: &SceneDescriptor,
        new_bodies: &HashMap<&str, usize>,
        joint: &str,
    ) -> Result<usize, PhysicsError> {
        reference
            .resolve(&scene.bodies)
            .and_then(|name| {
                new_bodies
                    .get(name)
                    .or_else(|| self.body_index.get(name))
                    .copied()
            })
            .ok_or_else(|| PhysicsError::UnknownBodyReference {
                joint: joint.to_string(),
                reference: reference.to_string(),
            })
    }

    fn insert_body(&mut self, plan: BodyPlan) {
        let handle = self.bodies.insert(plan.rigid_body());

        let mut colliders = Vec::with_capacity(plan.fixtures.len());
        let mut filters = Vec::with_capacity(plan.fixtures.len());
        for fixture in &plan.fixtures {
            let collider = fixture.collider().build();
            colliders.push(
                self.colliders
                    .insert_with_parent(collider, handle, &mut self.bodies),
            );
            filters.push(fixture.filter);
            debug!(
                body = %plan.name,
                shape = fixture.shape.kind(),
                vertices = fixture.shape.vertex_count(),
                "attached fixture"
            );
        }
        debug!(body = %plan.name, kind = ?plan.kind, fixtures = colliders.len(), "built body");

        self.body_index
            .insert(plan.name.clone(), self.body_entries.len());
        self.angles.push(plan.angle);
        self.body_entries.push(BodyEntry {
            name: plan.name,
            kind: plan.kind,
            handle,
            colliders,
            filters,
        });
    }

    fn insert_joint(&mut self, plan: JointPlan) {
        let handle_a = self.body_entries[plan.body_a].handle;
        let handle_b = self.body_entries[plan.body_b].handle;
        let handle = self
            .impulse_joints
            .insert(handle_a, handle_b, plan.def.to_rapier(), true);
        debug!(
            joint = %plan.name,
            kind = %plan.def.kind(),
            body_a = %self.body_entries[plan.body_a].name,
            body_b = %self.body_entries[plan.body_b].name,
            "built joint"
        );

        self.joint_index
            .insert(plan.name.clone(), self.joint_entries.len());
        self.joint_entries.push(JointEntry {
            name: plan.name,
            def: plan.def,
            handle,
            body_a: plan.body_a,
            body_b: plan.body_b,
        });
    }

    /// Advance the simulation by one fixed step.
    pub fn advance(&mut self, step: &StepParams) {
        self.integration_params.dt = step.dt;
        self.integration_params.num_solver_iterations =
            NonZeroUsize::new(step.velocity_iterations as usize).unwrap_or(NonZeroUsize::MIN);
        self.integration_params.num_internal_stabilization_iterations =
            step.position_iterations as usize;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.hooks,
            &(),
        );

        if self.params.auto_clear_forces {
            for entry in &self.body_entries {
                if let Some(body) = self.bodies.get_mut(entry.handle) {
                    body.reset_forces(false);
                    body.reset_torques(false);
                }
            }
        }

        for (entry, angle) in self.body_entries.iter().zip(self.angles.iter_mut()) {
            if let Some(body) = self.bodies.get(entry.handle) {
                let current = f64::from(body.rotation().angle());
                *angle += wrap_angle(current - *angle);
            }
        }
    }

    fn body_entry(&self, name: &str) -> Result<(usize, &BodyEntry), PhysicsError> {
        self.body_index
            .get(name)
            .map(|&i| (i, &self.body_entries[i]))
            .ok_or_else(|| PhysicsError::UnknownBody(name.to_string()))
    }

    fn joint_entry(&self, name: &str) -> Result<&JointEntry, PhysicsError> {
        self.joint_index
            .get(name)
            .map(|&i| &self.joint_entries[i])
            .ok_or_else(|| PhysicsError::UnknownJoint(name.to_string()))
    }

    fn actuatable_entry(&self, name: &str) -> Result<&JointEntry, PhysicsError> {
        let entry = self.joint_entry(name)?;
        let kind = entry.def.kind();
        if !kind.is_actuatable() {
            return Err(PhysicsError::NotActuatable {
                joint: name.to_string(),
                kind: kind.as_str(),
            });
        }
        Ok(entry)
    }

    /// Current angle of a revolute or wheel joint, in radians.
    ///
    /// Measured as `angle(B) - angle(A) - reference angle` from continuously
    /// tracked body angles.
    pub fn joint_angle(&self, name: &str) -> Result<f64, PhysicsError> {
        let entry = self.actuatable_entry(name)?;
        Ok(self.angles[entry.body_b]
            - self.angles[entry.body_a]
            - entry.def.reference_angle())
    }

    /// Set the motor speed command of a revolute or wheel joint (rad/s).
    pub fn set_motor_speed(&mut self, name: &str, speed: f64) -> Result<(), PhysicsError> {
        let handle = self.actuatable_entry(name)?.handle;
        if let Some(joint) = self.impulse_joints.get_mut(handle, true) {
            joint
                .data
                .set_motor_velocity(JointAxis::AngX, speed as f32, DEFAULT_MOTOR_DAMPING);
        }
        Ok(())
    }

    /// Apply a world-space force at a body's center of mass.
    ///
    /// With `autoClearForces` the force lasts for the next step only.
    pub fn apply_force(&mut self, name: &str, force: [f64; 2]) -> Result<(), PhysicsError> {
        let (_, entry) = self.body_entry(name)?;
        let handle = entry.handle;
        if let Some(body) = self.bodies.get_mut(handle) {
            body.add_force(Vector2::new(force[0] as f32, force[1] as f32), true);
        }
        Ok(())
    }

    /// Position and continuous angle of a body.
    pub fn body_pose(&self, name: &str) -> Result<BodyPose, PhysicsError> {
        let (index, entry) = self.body_entry(name)?;
        let body = self
            .bodies
            .get(entry.handle)
            .ok_or_else(|| PhysicsError::UnknownBody(name.to_string()))?;
        let t = body.translation();
        Ok(BodyPose {
            position: [f64::from(t.x), f64::from(t.y)],
            angle: self.angles[index],
        })
    }

    /// World-space center of mass of a body.
    pub fn body_world_center(&self, name: &str) -> Result<[f64; 2], PhysicsError> {
        let (_, entry) = self.body_entry(name)?;
        let body = self
            .bodies
            .get(entry.handle)
            .ok_or_else(|| PhysicsError::UnknownBody(name.to_string()))?;
        let c = body.center_of_mass();
        Ok([f64::from(c.x), f64::from(c.y)])
    }

    /// World-space outline of a body's first fixture.
    ///
    /// `None` when the body has no fixture, or its first fixture is a chain or edge.
    pub fn body_outline(&self, name: &str) -> Result<Option<BodyOutline>, PhysicsError> {
        let (_, entry) = self.body_entry(name)?;
        let Some(collider) = entry
            .colliders
            .first()
            .and_then(|&handle| self.colliders.get(handle))
        else {
            return Ok(None);
        };

        let pose = collider.position();
        let shape = collider.shape();
        if let Some(polygon) = shape.as_convex_polygon() {
            let vertices = polygon
                .points()
                .iter()
                .map(|p| {
                    let w = pose * p;
                    [f64::from(w.x), f64::from(w.y)]
                })
                .collect();
            return Ok(Some(BodyOutline::Polygon { vertices }));
        }
        if let Some(ball) = shape.as_ball() {
            let c = pose.translation.vector;
            return Ok(Some(BodyOutline::Circle {
                center: [f64::from(c.x), f64::from(c.y)],
                radius: f64::from(ball.radius),
            }));
        }
        Ok(None)
    }

    /// Number of touching collider pairs between two bodies.
    ///
    /// Sensor overlaps count as touching.
    pub fn contact_count(&self, body_a: &str, body_b: &str) -> Result<usize, PhysicsError> {
        let (_, a) = self.body_entry(body_a)?;
        let (_, b) = self.body_entry(body_b)?;

        let mut count = 0;
        for &c1 in &a.colliders {
            for &c2 in &b.colliders {
                let touching = self
                    .narrow_phase
                    .contact_pair(c1, c2)
                    .is_some_and(|pair| pair.has_any_active_contact)
                    || self.narrow_phase.intersection_pair(c1, c2) == Some(true);
                if touching {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Body names in insertion order.
    pub fn body_names(&self) -> impl Iterator<Item = &str> {
        self.body_entries.iter().map(|e| e.name.as_str())
    }

    /// Joint names in insertion order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joint_entries.iter().map(|e| e.name.as_str())
    }

    /// Kind of a body.
    pub fn body_kind(&self, name: &str) -> Result<BodyKind, PhysicsError> {
        Ok(self.body_entry(name)?.1.kind)
    }

    /// Collision filters of a body's fixtures, in attachment order.
    pub fn fixture_filters(&self, name: &str) -> Result<&[CollisionFilter], PhysicsError> {
        Ok(&self.body_entry(name)?.1.filters)
    }

    /// Kind of a joint.
    pub fn joint_kind(&self, name: &str) -> Result<JointKind, PhysicsError> {
        Ok(self.joint_entry(name)?.def.kind())
    }

    /// Typed definition a joint was built from.
    pub fn joint_def(&self, name: &str) -> Result<&JointDef, PhysicsError> {
        Ok(&self.joint_entry(name)?.def)
    }

    /// Names of the two bodies a joint connects.
    pub fn joint_bodies(&self, name: &str) -> Result<(&str, &str), PhysicsError> {
        let entry = self.joint_entry(name)?;
        Ok((
            self.body_entries[entry.body_a].name.as_str(),
            self.body_entries[entry.body_b].name.as_str(),
        ))
    }

    /// Number of bodies.
    pub fn body_count(&self) -> usize {
        self.body_entries.len()
    }

    /// Number of joints.
    pub fn joint_count(&self) -> usize {
        self.joint_entries.len()
    }

    /// Parameters the world was created with.
    pub fn params(&self) -> &WorldParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PENDULUM: &str = r#"{
        "gravity": {"x": 0, "y": -10},
        "body": [
            {"name": "ground", "type": 0,
             "fixture": [{"polygon": {"vertices": {"x": [-5, 5, 5, -5], "y": [-1, -1, 0, 0]}}}]},
            {"name": "arm", "type": 2, "position": {"x": 0, "y": 3}, "angle": 0.3,
             "fixture": [{"density": 1, "polygon": {"vertices": {"x": [-0.1, 0.1, 0.1, -0.1], "y": [-1, -1, 1, 1]}}}]},
            {"name": "tip", "type": 2, "position": {"x": 0, "y": 5},
             "fixture": [{"density": 1, "circle": {"center": 0, "radius": 0.2}}]}
        ],
        "joint": [
            {"type": "revolute", "name": "shoulder", "bodyA": 0, "bodyB": 1,
             "anchorA": {"x": 0, "y": 2}, "anchorB": {"x": 0, "y": -1},
             "enableMotor": true, "maxMotorTorque": 100, "refAngle": 0.1},
            {"type": "weld", "name": "glue", "bodyA": "arm", "bodyB": "tip",
             "anchorA": {"x": 0, "y": 1}, "anchorB": {"x": 0, "y": -1}}
        ]
    }"#;

    fn scene(json: &str) -> SceneDescriptor {
        SceneDescriptor::from_json(json).unwrap()
    }

    #[test]
    fn test_names_round_trip_in_file_order() {
        let world = World::from_scene(&scene(PENDULUM)).unwrap();
        assert_eq!(world.body_names().collect::<Vec<_>>(), ["ground", "arm", "tip"]);
        assert_eq!(world.joint_names().collect::<Vec<_>>(), ["shoulder", "glue"]);
        assert_eq!(world.joint_kind("glue").unwrap(), JointKind::Weld);
        assert_eq!(world.joint_bodies("glue").unwrap(), ("arm", "tip"));
        assert_eq!(world.body_kind("ground").unwrap(), BodyKind::Static);
    }

    #[test]
    fn test_initial_joint_angle_uses_reference() {
        let world = World::from_scene(&scene(PENDULUM)).unwrap();
        assert_relative_eq!(world.joint_angle("shoulder").unwrap(), 0.2, epsilon = 1e-9);
        assert!(matches!(
            world.joint_angle("glue"),
            Err(PhysicsError::NotActuatable { kind: "weld", .. })
        ));
        assert!(matches!(
            world.joint_angle("elbow"),
            Err(PhysicsError::UnknownJoint(_))
        ));
    }

    #[test]
    fn test_unknown_body_reference_fails() {
        let json = r#"{
            "body": [{"name": "a"}],
            "joint": [{"type": "revolute", "name": "j", "bodyA": 0, "bodyB": 3}]
        }"#;
        match World::from_scene(&scene(json)) {
            Err(PhysicsError::UnknownBodyReference { joint, reference }) => {
                assert_eq!(joint, "j");
                assert_eq!(reference, "body #3");
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("world should not be built"),
        }

        let json = r#"{
            "body": [{"name": "a"}],
            "joint": [{"type": "rope", "name": "j", "bodyA": "a", "bodyB": "ghost"}]
        }"#;
        assert!(matches!(
            World::from_scene(&scene(json)),
            Err(PhysicsError::UnknownBodyReference { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_fail() {
        let json = r#"{"body": [{"name": "a"}, {"name": "a"}]}"#;
        assert!(matches!(
            World::from_scene(&scene(json)),
            Err(PhysicsError::DuplicateBodyName(name)) if name == "a"
        ));

        let json = r#"{
            "body": [{"name": "a"}, {"name": "b"}],
            "joint": [
                {"type": "weld", "name": "j", "bodyA": 0, "bodyB": 1},
                {"type": "rope", "name": "j", "bodyA": 1, "bodyB": 0}
            ]
        }"#;
        assert!(matches!(
            World::from_scene(&scene(json)),
            Err(PhysicsError::DuplicateJointName(name)) if name == "j"
        ));
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut world = World::from_scene(&scene(PENDULUM)).unwrap();

        let bad = scene(
            r#"{
                "body": [{"name": "extra", "type": 2}],
                "joint": [{"type": "gear", "name": "g", "bodyA": 0, "bodyB": "arm"}]
            }"#,
        );
        assert!(matches!(
            world.extend(&bad),
            Err(PhysicsError::UnsupportedJointKind { .. })
        ));
        assert_eq!(world.body_count(), 3);
        assert_eq!(world.joint_count(), 2);

        let good = scene(
            r#"{
                "gravity": {"x": 0, "y": 99},
                "body": [{"name": "extra", "type": 2, "position": {"x": 0, "y": 7}}],
                "joint": [{"type": "rope", "name": "leash", "bodyA": 0, "bodyB": "tip", "maxLength": 3}]
            }"#,
        );
        world.extend(&good).unwrap();
        assert_eq!(world.body_count(), 4);
        assert_eq!(world.joint_bodies("leash").unwrap(), ("extra", "tip"));
        assert_relative_eq!(world.params().gravity.y, -10.0);
        assert!(matches!(
            world.extend(&good),
            Err(PhysicsError::DuplicateBodyName(_))
        ));
    }

    #[test]
    fn test_contact_count() {
        let json = r#"{
            "body": [
                {"name": "ground",
                 "fixture": [{"polygon": {"vertices": {"x": [-5, 5, 5, -5], "y": [-1, -1, 0, 0]}}}]},
                {"name": "box", "type": 2, "position": {"x": 0, "y": 0.6},
                 "fixture": [{"density": 1, "polygon": {"vertices": {"x": [-0.5, 0.5, 0.5, -0.5], "y": [-0.5, -0.5, 0.5, 0.5]}}}]},
                {"name": "far", "type": 2, "position": {"x": 100, "y": 100}, "gravityScale": 0,
                 "fixture": [{"density": 1, "circle": {"radius": 0.5}}]}
            ]
        }"#;
        let mut world = World::from_scene(&scene(json)).unwrap();
        for _ in 0..60 {
            world.advance(&StepParams::default());
        }
        assert!(world.contact_count("ground", "box").unwrap() > 0);
        assert_eq!(
            world.contact_count("box", "ground").unwrap(),
            world.contact_count("ground", "box").unwrap()
        );
        assert_eq!(world.contact_count("ground", "far").unwrap(), 0);
        assert!(matches!(
            world.contact_count("ground", "nowhere"),
            Err(PhysicsError::UnknownBody(_))
        ));
    }

    #[test]
    fn test_angle_is_tracked_past_pi() {
        let json = r#"{
            "gravity": 0,
            "body": [{"name": "spinner", "type": 2, "angularVelocity": 10,
                      "fixture": [{"density": 1, "circle": {"radius": 0.5}}]}]
        }"#;
        let mut world = World::from_scene(&scene(json)).unwrap();
        let step = StepParams {
            dt: 0.01,
            ..StepParams::default()
        };
        for _ in 0..100 {
            world.advance(&step);
        }
        assert_relative_eq!(world.body_pose("spinner").unwrap().angle, 10.0, epsilon = 1e-2);
    }

    #[test]
    fn test_auto_clear_forces() {
        let json = r#"{
            "gravity": 0,
            "body": [{"name": "puck", "type": 2,
                      "fixture": [{"density": 1, "circle": {"radius": 0.5}}]}]
        }"#;
        let mut world = World::from_scene(&scene(json)).unwrap();
        world.apply_force("puck", [10.0, 0.0]).unwrap();
        world.advance(&StepParams::default());
        let x1 = world.body_pose("puck").unwrap().position[0];
        assert!(x1 > 0.0);

        let handle = world.body_entries[0].handle;
        assert_relative_eq!(world.bodies[handle].user_force().norm(), 0.0);
    }

    #[test]
    fn test_body_outline() {
        let world = World::from_scene(&scene(PENDULUM)).unwrap();
        let Some(BodyOutline::Polygon { vertices }) = world.body_outline("ground").unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(vertices.len(), 4);

        let json = r#"{
            "gravity": 0,
            "body": [{"name": "wheel", "type": 2, "position": {"x": 0, "y": 5},
                      "fixture": [{"density": 1, "circle": {"center": {"x": 1, "y": 0}, "radius": 0.2}}]}]
        }"#;
        let mut world = World::from_scene(&scene(json)).unwrap();
        world.advance(&StepParams::default());

        let Some(BodyOutline::Circle { center, radius }) = world.body_outline("wheel").unwrap() else {
            panic!("expected circle");
        };
        assert_relative_eq!(center[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(center[1], 5.0, epsilon = 1e-5);
        assert_relative_eq!(radius, 0.2, epsilon = 1e-6);

        let mass_center = world.body_world_center("wheel").unwrap();
        assert_relative_eq!(mass_center[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(mass_center[1], 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0.5), 0.5);
        assert_relative_eq!(wrap_angle(TAU - 0.5), -0.5, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-TAU + 0.5), 0.5, epsilon = 1e-12);
    }
}
