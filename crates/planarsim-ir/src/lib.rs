//! Scene description for planarsim.
//!
//! This crate mirrors the JSON scene format one-to-one: world parameters, a
//! list of bodies (each carrying its fixtures) and a list of joints that refer
//! to bodies by position in the body list or by name.
//!
//! The descriptor is purely declarative. Nothing here knows about the physics
//! engine; building a live world from a [`SceneDescriptor`] is the job of
//! `planarsim-physics`. Optional keys stay optional so that the builders can
//! tell "absent" apart from an explicit value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// 2D vector with f64 components (conventionally meters).
///
/// In the file a vector is either `{"x": .., "y": ..}` or the bare number `0`
/// for the zero vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec2Repr")]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Vec2Repr {
    Xy { x: f64, y: f64 },
    Scalar(f64),
}

impl TryFrom<Vec2Repr> for Vec2 {
    type Error = String;

    fn try_from(repr: Vec2Repr) -> Result<Self, Self::Error> {
        match repr {
            Vec2Repr::Xy { x, y } => Ok(Self { x, y }),
            Vec2Repr::Scalar(v) if v == 0.0 => Ok(Self::ZERO),
            Vec2Repr::Scalar(v) => Err(format!("expected {{x, y}} or 0 for a vector, found {v}")),
        }
    }
}

/// Vertex list stored column-wise, as `{"x": [..], "y": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexList {
    /// X coordinates.
    pub x: Vec<f64>,
    /// Y coordinates.
    pub y: Vec<f64>,
}

impl VertexList {
    /// Build a vertex list from points.
    pub fn from_points(points: &[Vec2]) -> Self {
        Self {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
        }
    }

    /// Zip the two columns into points.
    ///
    /// Returns `None` when the columns have different lengths.
    pub fn points(&self) -> Option<Vec<Vec2>> {
        if self.x.len() != self.y.len() {
            return None;
        }
        Some(
            self.x
                .iter()
                .zip(&self.y)
                .map(|(&x, &y)| Vec2::new(x, y))
                .collect(),
        )
    }

    /// Number of complete points.
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    /// True if the list holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Global simulation parameters. Exactly one per scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldParams {
    /// Gravity acceleration.
    pub gravity: Vec2,
    /// Default sleep permission for bodies that do not set their own.
    pub allow_sleep: bool,
    /// Clear accumulated user forces after every step.
    pub auto_clear_forces: bool,
    /// Enable continuous collision detection.
    pub continuous_physics: bool,
    /// Reuse last step's impulses as the solver's starting point.
    pub warm_starting: bool,
    /// Step-by-step time-of-impact resolution (debugging aid).
    pub sub_stepping: bool,
    /// Solver velocity iterations suggested by the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_iterations: Option<u32>,
    /// Solver position iterations suggested by the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_iterations: Option<u32>,
    /// Step rate suggested by the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_per_second: Option<f64>,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            allow_sleep: true,
            auto_clear_forces: true,
            continuous_physics: true,
            warm_starting: true,
            sub_stepping: false,
            velocity_iterations: None,
            position_iterations: None,
            steps_per_second: None,
        }
    }
}

/// How a body participates in the simulation.
///
/// Encoded in the file as `0`/`1`/`2` or by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BodyKindRepr", into = "u8")]
pub enum BodyKind {
    /// Never moves.
    #[default]
    Static,
    /// Moves with its prescribed velocity, ignores forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BodyKindRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<BodyKindRepr> for BodyKind {
    type Error = String;

    fn try_from(repr: BodyKindRepr) -> Result<Self, Self::Error> {
        match repr {
            BodyKindRepr::Code(0) => Ok(Self::Static),
            BodyKindRepr::Code(1) => Ok(Self::Kinematic),
            BodyKindRepr::Code(2) => Ok(Self::Dynamic),
            BodyKindRepr::Code(code) => Err(format!("unknown body type code {code}")),
            BodyKindRepr::Name(name) => match name.as_str() {
                "static" => Ok(Self::Static),
                "kinematic" => Ok(Self::Kinematic),
                "dynamic" => Ok(Self::Dynamic),
                _ => Err(format!("unknown body type {name:?}")),
            },
        }
    }
}

impl From<BodyKind> for u8 {
    fn from(kind: BodyKind) -> Self {
        match kind {
            BodyKind::Static => 0,
            BodyKind::Kinematic => 1,
            BodyKind::Dynamic => 2,
        }
    }
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn default_friction() -> f64 {
    0.2
}

/// A rigid body and its fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyDescriptor {
    /// Unique name.
    pub name: String,
    /// Body kind (static when absent).
    #[serde(rename = "type", default)]
    pub kind: BodyKind,
    /// Initial position of the body origin.
    #[serde(default)]
    pub position: Vec2,
    /// Initial rotation in radians.
    #[serde(default)]
    pub angle: f64,
    /// Initial linear velocity.
    #[serde(default)]
    pub linear_velocity: Vec2,
    /// Initial angular velocity (rad/s).
    #[serde(default)]
    pub angular_velocity: f64,
    /// Linear velocity damping.
    #[serde(default)]
    pub linear_damping: f64,
    /// Angular velocity damping.
    #[serde(default)]
    pub angular_damping: f64,
    /// Multiplier applied to world gravity.
    #[serde(default = "one")]
    pub gravity_scale: f64,
    /// Fast-moving body that needs continuous collision against dynamic bodies.
    #[serde(default)]
    pub bullet: bool,
    /// Prevent rotation.
    #[serde(default)]
    pub fixed_rotation: bool,
    /// Per-body sleep permission; falls back to [`WorldParams::allow_sleep`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_sleep: Option<bool>,
    /// Start awake.
    #[serde(default = "yes")]
    pub awake: bool,
    /// Attached fixtures, in attachment order.
    #[serde(rename = "fixture", default)]
    pub fixtures: Vec<FixtureDescriptor>,
}

/// A shape plus material and filter properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDescriptor {
    /// Optional fixture name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mass density (kg/m²).
    #[serde(default)]
    pub density: f64,
    /// Coulomb friction coefficient.
    #[serde(default = "default_friction")]
    pub friction: f64,
    /// Bounciness.
    #[serde(default)]
    pub restitution: f64,
    /// Detects overlap without producing a collision response.
    #[serde(default)]
    pub sensor: bool,
    /// Collision category bits. `None` means the key was absent.
    #[serde(
        rename = "filter-categoryBits",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category_bits: Option<u16>,
    /// Collision mask bits. `None` means the key was absent.
    #[serde(
        rename = "filter-maskBits",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mask_bits: Option<u16>,
    /// Collision group index. `None` means the key was absent.
    #[serde(
        rename = "filter-groupIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub group_index: Option<i16>,
    /// Circle shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<CircleDescriptor>,
    /// Convex polygon shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<PolygonDescriptor>,
    /// Chain, loop or edge shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainDescriptor>,
}

impl FixtureDescriptor {
    /// The shape this fixture declares.
    ///
    /// When several shape keys are present, `chain` wins over `polygon`, which
    /// wins over `circle`.
    pub fn shape(&self) -> Option<ShapeDescriptor<'_>> {
        if let Some(chain) = &self.chain {
            return Some(ShapeDescriptor::Chain(chain));
        }
        if let Some(polygon) = &self.polygon {
            return Some(ShapeDescriptor::Polygon(polygon));
        }
        self.circle.as_ref().map(ShapeDescriptor::Circle)
    }

    /// Number of shape keys present on this fixture.
    pub fn declared_shape_count(&self) -> usize {
        usize::from(self.circle.is_some())
            + usize::from(self.polygon.is_some())
            + usize::from(self.chain.is_some())
    }
}

/// Borrowed view of the one shape a fixture carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDescriptor<'a> {
    /// Circle.
    Circle(&'a CircleDescriptor),
    /// Convex polygon.
    Polygon(&'a PolygonDescriptor),
    /// Open chain, closed loop, or (with fewer than three points) an edge.
    Chain(&'a ChainDescriptor),
}

/// Circle in body-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleDescriptor {
    /// Center relative to the body origin.
    #[serde(default)]
    pub center: Vec2,
    /// Radius.
    pub radius: f64,
}

/// Convex polygon in body-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonDescriptor {
    /// Polygon vertices.
    pub vertices: VertexList,
}

/// Connected vertex sequence in body-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Chain vertices.
    pub vertices: VertexList,
    /// Loop marker: a successor ghost vertex is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_next_vertex: Option<bool>,
    /// Loop marker: a predecessor ghost vertex is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_prev_vertex: Option<bool>,
    /// Successor ghost vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_vertex: Option<Vec2>,
    /// Predecessor ghost vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_vertex: Option<Vec2>,
}

impl ChainDescriptor {
    /// True if the chain carries loop-continuity markers.
    ///
    /// Only presence of the keys matters, not their value.
    pub fn is_loop(&self) -> bool {
        self.has_next_vertex.is_some() || self.has_prev_vertex.is_some()
    }
}

/// Reference from a joint to one of its bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyRef {
    /// Position in the scene's `body` list.
    Index(usize),
    /// Body name.
    Name(String),
}

impl BodyRef {
    /// Resolve to a body name using the scene's body list.
    ///
    /// Name references are returned as-is; their existence is checked by the
    /// builder. Index references out of range resolve to `None`.
    pub fn resolve<'a>(&'a self, bodies: &'a [BodyDescriptor]) -> Option<&'a str> {
        match self {
            BodyRef::Index(i) => bodies.get(*i).map(|b| b.name.as_str()),
            BodyRef::Name(name) => Some(name.as_str()),
        }
    }
}

impl fmt::Display for BodyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyRef::Index(i) => write!(f, "body #{i}"),
            BodyRef::Name(name) => write!(f, "body {name:?}"),
        }
    }
}

/// A joint between two bodies.
///
/// The joint kind is kept as the file's `type` string and every parameter is
/// optional; the physics crate turns this into a typed joint and applies the
/// per-kind defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointDescriptor {
    /// Joint kind tag (`"revolute"`, `"distance"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique name.
    pub name: String,
    /// First body.
    pub body_a: BodyRef,
    /// Second body.
    pub body_b: BodyRef,
    /// Anchor in body A's local frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_a: Option<Vec2>,
    /// Anchor in body B's local frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_b: Option<Vec2>,
    /// Let the two bodies collide with each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collide_connected: Option<bool>,
    /// Enable the limit range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_limit: Option<bool>,
    /// Enable the motor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_motor: Option<bool>,
    /// Older spelling of `motorSpeed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_speed: Option<f64>,
    /// Motor target speed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_speed: Option<f64>,
    /// Lower limit (angle or translation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    /// Upper limit (angle or translation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
    /// Maximum motor torque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_motor_torque: Option<f64>,
    /// Maximum motor force.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_motor_force: Option<f64>,
    /// Reference angle between the bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_angle: Option<f64>,
    /// Spring damping ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping_ratio: Option<f64>,
    /// Spring frequency (Hz).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    /// Rest length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Translation axis in body A's frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_axis_a: Option<Vec2>,
    /// Suspension spring damping ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring_damping_ratio: Option<f64>,
    /// Suspension spring frequency (Hz).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring_frequency: Option<f64>,
    /// Maximum distance between anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,
    /// Maximum force.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_force: Option<f64>,
    /// Maximum torque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_torque: Option<f64>,
    /// Target position of body B in body A's frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_offset: Option<Vec2>,
    /// Position error correction factor in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_factor: Option<f64>,
}

impl JointDescriptor {
    /// Create a joint descriptor with no optional parameters set.
    pub fn new(kind: impl Into<String>, name: impl Into<String>, body_a: BodyRef, body_b: BodyRef) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            body_a,
            body_b,
            anchor_a: None,
            anchor_b: None,
            collide_connected: None,
            enable_limit: None,
            enable_motor: None,
            joint_speed: None,
            motor_speed: None,
            lower_limit: None,
            upper_limit: None,
            max_motor_torque: None,
            max_motor_force: None,
            ref_angle: None,
            damping_ratio: None,
            frequency: None,
            length: None,
            local_axis_a: None,
            spring_damping_ratio: None,
            spring_frequency: None,
            max_length: None,
            max_force: None,
            max_torque: None,
            linear_offset: None,
            correction_factor: None,
        }
    }

    /// File keys of the optional parameters present on this joint.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        macro_rules! probe {
            ($($field:ident => $key:literal),* $(,)?) => {
                $( if self.$field.is_some() { keys.push($key); } )*
            };
        }
        probe!(
            anchor_a => "anchorA",
            anchor_b => "anchorB",
            collide_connected => "collideConnected",
            enable_limit => "enableLimit",
            enable_motor => "enableMotor",
            joint_speed => "jointSpeed",
            motor_speed => "motorSpeed",
            lower_limit => "lowerLimit",
            upper_limit => "upperLimit",
            max_motor_torque => "maxMotorTorque",
            max_motor_force => "maxMotorForce",
            ref_angle => "refAngle",
            damping_ratio => "dampingRatio",
            frequency => "frequency",
            length => "length",
            local_axis_a => "localAxisA",
            spring_damping_ratio => "springDampingRatio",
            spring_frequency => "springFrequency",
            max_length => "maxLength",
            max_force => "maxForce",
            max_torque => "maxTorque",
            linear_offset => "linearOffset",
            correction_factor => "correctionFactor",
        );
        keys
    }
}

/// A complete scene file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// World-level parameters (top-level keys of the file).
    #[serde(flatten)]
    pub world: WorldParams,
    /// Bodies in file order.
    #[serde(rename = "body", default)]
    pub bodies: Vec<BodyDescriptor>,
    /// Joints in file order.
    #[serde(rename = "joint", default)]
    pub joints: Vec<JointDescriptor>,
}

impl SceneDescriptor {
    /// Create an empty scene with default world parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a scene file.
    ///
    /// Parse failures surface as [`io::ErrorKind::InvalidData`].
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Find a body descriptor by name.
    pub fn body(&self, name: &str) -> Option<&BodyDescriptor> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Find a joint descriptor by name.
    pub fn joint(&self, name: &str) -> Option<&JointDescriptor> {
        self.joints.iter().find(|j| j.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ARM: &str = r#"{
        "gravity": {"x": 0, "y": -9.8},
        "allowSleep": true,
        "autoClearForces": true,
        "continuousPhysics": true,
        "warmStarting": true,
        "subStepping": false,
        "stepsPerSecond": 60,
        "body": [
            {
                "name": "Ground",
                "type": 0,
                "position": 0,
                "fixture": [
                    {"density": 1, "polygon": {"vertices": {"x": [-5, 5, 5, -5], "y": [-1, -1, 0, 0]}}}
                ]
            },
            {
                "name": "Arm1",
                "type": 2,
                "position": {"x": 0, "y": 2},
                "angle": 0.5,
                "customProperties": [],
                "fixture": [
                    {
                        "density": 1,
                        "friction": 0.4,
                        "filter-categoryBits": 0,
                        "circle": {"center": 0, "radius": 0.25}
                    }
                ]
            }
        ],
        "joint": [
            {
                "type": "revolute",
                "name": "Ground_to_Arm1",
                "bodyA": 0,
                "bodyB": 1,
                "anchorA": {"x": 0, "y": 1},
                "anchorB": 0,
                "enableMotor": true,
                "maxMotorTorque": 100
            }
        ]
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene = SceneDescriptor::from_json(ARM).unwrap();

        assert_relative_eq!(scene.world.gravity.y, -9.8);
        assert_eq!(scene.world.steps_per_second, Some(60.0));
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.bodies[0].kind, BodyKind::Static);
        assert_eq!(scene.bodies[0].position, Vec2::ZERO);
        assert_eq!(scene.bodies[1].kind, BodyKind::Dynamic);
        assert_relative_eq!(scene.bodies[1].angle, 0.5);
        assert!(scene.bodies[1].awake);
        assert_relative_eq!(scene.bodies[1].gravity_scale, 1.0);

        let joint = scene.joint("Ground_to_Arm1").unwrap();
        assert_eq!(joint.kind, "revolute");
        assert_eq!(joint.body_a.resolve(&scene.bodies), Some("Ground"));
        assert_eq!(joint.body_b.resolve(&scene.bodies), Some("Arm1"));
        assert_eq!(joint.anchor_b, Some(Vec2::ZERO));
        assert_eq!(joint.lower_limit, None);
    }

    #[test]
    fn test_fixture_defaults_and_explicit_zero() {
        let scene = SceneDescriptor::from_json(ARM).unwrap();

        let ground = &scene.bodies[0].fixtures[0];
        assert_eq!(ground.category_bits, None);
        assert_eq!(ground.mask_bits, None);
        assert_relative_eq!(ground.friction, 0.2);

        let arm = &scene.bodies[1].fixtures[0];
        assert_eq!(arm.category_bits, Some(0));
        assert!(matches!(arm.shape(), Some(ShapeDescriptor::Circle(c)) if c.radius == 0.25));
    }

    #[test]
    fn test_missing_world_keys_use_defaults() {
        let scene = SceneDescriptor::from_json(r#"{"body": []}"#).unwrap();
        assert_eq!(scene.world, WorldParams::default());
        assert!(scene.joints.is_empty());
    }

    #[test]
    fn test_bad_vector_is_rejected() {
        let err = SceneDescriptor::from_json(r#"{"gravity": 3}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_body_kind_by_name() {
        let body: BodyDescriptor =
            serde_json::from_str(r#"{"name": "b", "type": "kinematic"}"#).unwrap();
        assert_eq!(body.kind, BodyKind::Kinematic);
        assert!(body.fixtures.is_empty());

        let bad: Result<BodyDescriptor, _> = serde_json::from_str(r#"{"name": "b", "type": 7}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_chain_markers_and_shape_precedence() {
        let fixture: FixtureDescriptor = serde_json::from_str(
            r#"{
                "circle": {"radius": 1},
                "chain": {
                    "vertices": {"x": [0, 1, 1, 0], "y": [0, 0, 1, 1]},
                    "hasNextVertex": false
                }
            }"#,
        )
        .unwrap();

        assert_eq!(fixture.declared_shape_count(), 2);
        match fixture.shape() {
            Some(ShapeDescriptor::Chain(chain)) => {
                assert!(chain.is_loop());
                assert_eq!(chain.vertices.len(), 4);
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn test_vertex_list_length_mismatch() {
        let list = VertexList {
            x: vec![0.0, 1.0, 2.0],
            y: vec![0.0, 1.0],
        };
        assert!(list.points().is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_body_ref_by_name_and_out_of_range() {
        let scene = SceneDescriptor::from_json(ARM).unwrap();
        assert_eq!(BodyRef::Index(7).resolve(&scene.bodies), None);

        let joint: JointDescriptor = serde_json::from_str(
            r#"{"type": "weld", "name": "w", "bodyA": "Ground", "bodyB": 1, "frequency": 4}"#,
        )
        .unwrap();
        assert_eq!(joint.body_a, BodyRef::Name("Ground".to_string()));
        assert_eq!(joint.present_keys(), vec!["frequency"]);
    }

    #[test]
    fn test_json_round_trip_keeps_names_and_absent_keys() {
        let scene = SceneDescriptor::from_json(ARM).unwrap();
        let json = scene.to_json().unwrap();

        assert!(!json.contains("filter-maskBits"));
        assert!(json.contains("\"type\": 2"));

        let back = SceneDescriptor::from_json(&json).unwrap();
        assert_eq!(back, scene);
    }
}
