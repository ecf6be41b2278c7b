//! Rigid body construction from scene bodies.

use nalgebra::Vector2;
use planarsim_ir::{BodyDescriptor, BodyKind, Vec2, WorldParams};
use rapier2d::dynamics::{RigidBodyBuilder, RigidBodyType};
use tracing::debug;

use crate::colliders::{build_fixture, FixturePlan};
use crate::error::PhysicsError;

/// Mass given to a dynamic body whose fixtures carry no mass.
pub const FALLBACK_MASS: f32 = 1.0;

/// A body ready to be inserted, together with its fixtures.
#[derive(Debug, Clone)]
pub struct BodyPlan {
    /// Body name.
    pub name: String,
    /// Body type.
    pub kind: BodyKind,
    /// Declared angle, used to seed angle tracking.
    pub angle: f64,
    /// Fixtures in file order; fixtures without a shape are already dropped.
    pub fixtures: Vec<FixturePlan>,
    builder: RigidBodyBuilder,
}

impl BodyPlan {
    /// Rigid body builder with the pose, velocities and flags applied.
    pub fn rigid_body(&self) -> RigidBodyBuilder {
        self.builder.clone()
    }
}

fn vector(v: Vec2) -> Vector2<f32> {
    Vector2::new(v.x as f32, v.y as f32)
}

fn body_type(kind: BodyKind) -> RigidBodyType {
    match kind {
        BodyKind::Static => RigidBodyType::Fixed,
        BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
        BodyKind::Dynamic => RigidBodyType::Dynamic,
    }
}

/// Convert a body descriptor and its fixtures into a body plan.
///
/// `world` supplies the defaults for flags a body may leave unset (sleeping)
/// and gates per-body flags (continuous collision only applies when the world
/// enables it).
pub fn build_body(desc: &BodyDescriptor, world: &WorldParams) -> Result<BodyPlan, PhysicsError> {
    let mut fixtures = Vec::with_capacity(desc.fixtures.len());
    for (index, fixture) in desc.fixtures.iter().enumerate() {
        if let Some(plan) = build_fixture(fixture, &desc.name, index)? {
            fixtures.push(plan);
        }
    }

    let can_sleep = desc.allow_sleep.unwrap_or(world.allow_sleep);
    let mut builder = RigidBodyBuilder::new(body_type(desc.kind))
        .translation(vector(desc.position))
        .rotation(desc.angle as f32)
        .linvel(vector(desc.linear_velocity))
        .angvel(desc.angular_velocity as f32)
        .linear_damping(desc.linear_damping as f32)
        .angular_damping(desc.angular_damping as f32)
        .gravity_scale(desc.gravity_scale as f32)
        .ccd_enabled(world.continuous_physics && desc.bullet)
        .can_sleep(can_sleep)
        .sleeping(can_sleep && !desc.awake);

    if desc.fixed_rotation {
        builder = builder.lock_rotations();
    }

    let massless = fixtures.iter().all(|f| f.material.density <= 0.0);
    if desc.kind == BodyKind::Dynamic && massless {
        debug!(body = %desc.name, "dynamic body has no mass, using {FALLBACK_MASS}");
        builder = builder.additional_mass(FALLBACK_MASS);
    }

    Ok(BodyPlan {
        name: desc.name.clone(),
        kind: desc.kind,
        angle: desc.angle,
        fixtures,
        builder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body(json: &str) -> BodyDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_pose_and_velocity() {
        let plan = build_body(
            &body(
                r#"{
                    "name": "Arm1",
                    "type": 2,
                    "position": {"x": 1.5, "y": -2},
                    "angle": 0.5,
                    "linearVelocity": {"x": 3, "y": 0},
                    "angularVelocity": -1,
                    "fixture": [{"density": 1, "polygon": {"vertices": {
                        "x": [-1, 1, 1, -1], "y": [-0.1, -0.1, 0.1, 0.1]}}}]
                }"#,
            ),
            &WorldParams::default(),
        )
        .unwrap();

        assert_eq!(plan.kind, BodyKind::Dynamic);
        assert_eq!(plan.fixtures.len(), 1);

        let rb = plan.rigid_body().build();
        assert!(rb.is_dynamic());
        assert_relative_eq!(rb.translation().x, 1.5);
        assert_relative_eq!(rb.translation().y, -2.0);
        assert_relative_eq!(rb.rotation().angle(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(rb.linvel().x, 3.0);
        assert_relative_eq!(rb.angvel(), -1.0);
    }

    #[test]
    fn test_body_types() {
        let world = WorldParams::default();
        let fixed = build_body(&body(r#"{"name": "ground"}"#), &world).unwrap();
        assert!(fixed.rigid_body().build().is_fixed());

        let kinematic = build_body(&body(r#"{"name": "lift", "type": 1}"#), &world).unwrap();
        assert!(kinematic.rigid_body().build().is_kinematic());
    }

    #[test]
    fn test_sleep_flags() {
        let world = WorldParams {
            allow_sleep: false,
            ..WorldParams::default()
        };
        let rb = build_body(&body(r#"{"name": "b", "type": 2, "awake": false}"#), &world)
            .unwrap()
            .rigid_body()
            .build();
        assert!(!rb.is_sleeping());

        let rb = build_body(
            &body(r#"{"name": "b", "type": 2, "awake": false, "allowSleep": true}"#),
            &world,
        )
        .unwrap()
        .rigid_body()
        .build();
        assert!(rb.is_sleeping());
    }

    #[test]
    fn test_ccd_needs_world_and_bullet() {
        let bullet = body(r#"{"name": "b", "type": 2, "bullet": true}"#);
        let rb = build_body(&bullet, &WorldParams::default())
            .unwrap()
            .rigid_body()
            .build();
        assert!(rb.is_ccd_enabled());

        let world = WorldParams {
            continuous_physics: false,
            ..WorldParams::default()
        };
        let rb = build_body(&bullet, &world).unwrap().rigid_body().build();
        assert!(!rb.is_ccd_enabled());
    }

    #[test]
    fn test_shapeless_fixture_dropped_and_bad_shape_fails() {
        let plan = build_body(
            &body(r#"{"name": "b", "type": 2, "fixture": [{"density": 1}]}"#),
            &WorldParams::default(),
        )
        .unwrap();
        assert!(plan.fixtures.is_empty());

        let err = build_body(
            &body(r#"{"name": "b", "fixture": [{"circle": {"radius": -0.5}}]}"#),
            &WorldParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PhysicsError::MalformedShape { .. }));
    }
}
