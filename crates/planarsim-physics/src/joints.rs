//! Joint conversion from scene descriptors to Rapier.
//!
//! Each scene joint is first turned into a typed [`JointDef`]; absent file keys
//! take the per-kind defaults below, which match the classic 2D engine's joint
//! definitions. The typed definition is then lowered to a Rapier
//! [`GenericJoint`].

use std::f32::consts::TAU;

use nalgebra::{Isometry2, Point2, Vector2};
use planarsim_ir::{JointDescriptor, Vec2};
use rapier2d::dynamics::{
    GenericJoint, GenericJointBuilder, JointAxesMask, JointAxis, MotorModel, RopeJointBuilder,
    SpringJointBuilder,
};
use tracing::warn;

use crate::error::PhysicsError;

/// Stiffness of position-driven motors, scaled by a motor joint's correction factor.
pub const DEFAULT_MOTOR_STIFFNESS: f32 = 1000.0;
/// Damping of velocity-driven motors.
pub const DEFAULT_MOTOR_DAMPING: f32 = 100.0;

/// Suspension frequency of a wheel joint (Hz).
pub const DEFAULT_WHEEL_FREQUENCY: f32 = 2.0;
/// Suspension damping ratio of a wheel joint.
pub const DEFAULT_WHEEL_DAMPING_RATIO: f32 = 0.7;

/// The eight supported joint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// Hinge with optional limit and angular motor.
    Revolute,
    /// Keeps the anchors at a fixed (or springy) distance.
    Distance,
    /// Slider along an axis with optional limit and linear motor.
    Prismatic,
    /// Suspension slider plus free rotation with an angular motor.
    Wheel,
    /// Maximum distance between the anchors.
    Rope,
    /// Drives body B toward an offset relative to body A.
    Motor,
    /// Glues the bodies together, optionally springy.
    Weld,
    /// Top-down friction between the bodies.
    Friction,
}

impl JointKind {
    /// Parse a file `type` tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "revolute" => Some(Self::Revolute),
            "distance" => Some(Self::Distance),
            "prismatic" => Some(Self::Prismatic),
            "wheel" => Some(Self::Wheel),
            "rope" => Some(Self::Rope),
            "motor" => Some(Self::Motor),
            "weld" => Some(Self::Weld),
            "friction" => Some(Self::Friction),
            _ => None,
        }
    }

    /// The file `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Distance => "distance",
            Self::Prismatic => "prismatic",
            Self::Wheel => "wheel",
            Self::Rope => "rope",
            Self::Motor => "motor",
            Self::Weld => "weld",
            Self::Friction => "friction",
        }
    }

    /// True if the joint has an angle and an angular motor a controller can drive.
    pub fn is_actuatable(self) -> bool {
        matches!(self, Self::Revolute | Self::Wheel)
    }

    /// File keys this kind reads.
    pub fn consumed_keys(self) -> &'static [&'static str] {
        const ANCHORS: [&str; 3] = ["anchorA", "anchorB", "collideConnected"];
        match self {
            Self::Revolute => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "enableLimit", "lowerLimit", "upperLimit",
                "enableMotor", "motorSpeed", "jointSpeed", "maxMotorTorque",
                "refAngle",
            ],
            Self::Distance => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "length", "frequency", "dampingRatio",
            ],
            Self::Prismatic => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "localAxisA", "refAngle",
                "enableLimit", "lowerLimit", "upperLimit",
                "enableMotor", "motorSpeed", "maxMotorForce",
            ],
            Self::Wheel => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "localAxisA",
                "enableMotor", "motorSpeed", "maxMotorTorque",
                "springFrequency", "springDampingRatio",
            ],
            Self::Rope => &[ANCHORS[0], ANCHORS[1], ANCHORS[2], "maxLength"],
            // anchorA carries the linear offset; anchorB is not read.
            Self::Motor => &[
                ANCHORS[0], ANCHORS[2],
                "linearOffset", "correctionFactor", "maxForce", "maxTorque",
            ],
            Self::Weld => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "refAngle", "frequency", "dampingRatio",
            ],
            Self::Friction => &[
                ANCHORS[0], ANCHORS[1], ANCHORS[2],
                "maxForce", "maxTorque",
            ],
        }
    }
}

impl std::fmt::Display for JointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revolute joint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevoluteParams {
    /// Angle of B relative to A at which the joint reads zero.
    pub reference_angle: f32,
    /// Enforce the lower/upper bounds.
    pub enable_limit: bool,
    /// Lower angle bound (rad).
    pub lower_angle: f32,
    /// Upper angle bound (rad).
    pub upper_angle: f32,
    /// Let the motor apply torque.
    pub enable_motor: bool,
    /// Motor speed command.
    pub motor_speed: f32,
    /// Motor torque bound.
    pub max_motor_torque: f32,
}

/// Distance joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceParams {
    /// Rest length.
    pub length: f32,
    /// Spring frequency; 0 makes the joint rigid.
    pub frequency_hz: f32,
    /// Spring damping ratio.
    pub damping_ratio: f32,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
        }
    }
}

/// Prismatic joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrismaticParams {
    /// Slide axis in body A's frame.
    pub axis: Vector2<f32>,
    /// Angle of B relative to A at which the joint reads zero.
    pub reference_angle: f32,
    /// Enforce the lower/upper bounds.
    pub enable_limit: bool,
    /// Lower translation bound.
    pub lower_translation: f32,
    /// Upper translation bound.
    pub upper_translation: f32,
    /// Let the motor apply force.
    pub enable_motor: bool,
    /// Motor speed command.
    pub motor_speed: f32,
    /// Motor force bound.
    pub max_motor_force: f32,
}

impl Default for PrismaticParams {
    fn default() -> Self {
        Self {
            axis: Vector2::x(),
            reference_angle: 0.0,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
        }
    }
}

/// Wheel joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelParams {
    /// Suspension axis in body A's frame.
    pub axis: Vector2<f32>,
    /// Let the motor apply torque.
    pub enable_motor: bool,
    /// Motor speed command.
    pub motor_speed: f32,
    /// Motor torque bound.
    pub max_motor_torque: f32,
    /// Spring frequency; 0 makes the joint rigid.
    pub frequency_hz: f32,
    /// Spring damping ratio.
    pub damping_ratio: f32,
}

impl Default for WheelParams {
    fn default() -> Self {
        Self {
            axis: Vector2::x(),
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            frequency_hz: DEFAULT_WHEEL_FREQUENCY,
            damping_ratio: DEFAULT_WHEEL_DAMPING_RATIO,
        }
    }
}

/// Rope joint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RopeParams {
    /// Maximum anchor distance.
    pub max_length: f32,
}

/// Motor joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorJointParams {
    /// Target position of B in A's frame.
    pub linear_offset: Vector2<f32>,
    /// Position correction factor in [0, 1].
    pub correction_factor: f32,
    /// Force bound.
    pub max_force: f32,
    /// Torque bound.
    pub max_torque: f32,
}

impl Default for MotorJointParams {
    fn default() -> Self {
        Self {
            linear_offset: Vector2::zeros(),
            correction_factor: 0.3,
            max_force: 1.0,
            max_torque: 1.0,
        }
    }
}

/// Weld joint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeldParams {
    /// Angle of B relative to A at which the joint reads zero.
    pub reference_angle: f32,
    /// Spring frequency; 0 makes the joint rigid.
    pub frequency_hz: f32,
    /// Spring damping ratio.
    pub damping_ratio: f32,
}

/// Friction joint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrictionParams {
    /// Force bound.
    pub max_force: f32,
    /// Torque bound.
    pub max_torque: f32,
}

/// Kind-specific joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum JointSpec {
    Revolute(RevoluteParams),
    Distance(DistanceParams),
    Prismatic(PrismaticParams),
    Wheel(WheelParams),
    Rope(RopeParams),
    Motor(MotorJointParams),
    Weld(WeldParams),
    Friction(FrictionParams),
}

impl JointSpec {
    /// Joint kind these parameters belong to.
    pub fn kind(&self) -> JointKind {
        match self {
            JointSpec::Revolute(_) => JointKind::Revolute,
            JointSpec::Distance(_) => JointKind::Distance,
            JointSpec::Prismatic(_) => JointKind::Prismatic,
            JointSpec::Wheel(_) => JointKind::Wheel,
            JointSpec::Rope(_) => JointKind::Rope,
            JointSpec::Motor(_) => JointKind::Motor,
            JointSpec::Weld(_) => JointKind::Weld,
            JointSpec::Friction(_) => JointKind::Friction,
        }
    }
}

/// A typed joint definition, independent of the bodies it connects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDef {
    /// Anchor in body A's frame.
    pub anchor_a: Point2<f32>,
    /// Anchor in body B's frame.
    pub anchor_b: Point2<f32>,
    /// Let the two bodies collide with each other.
    pub collide_connected: bool,
    /// Kind-specific parameters.
    pub spec: JointSpec,
    reference_angle: f64,
}

fn scalar(value: Option<f64>, default: f32) -> f32 {
    value.map_or(default, |v| v as f32)
}

fn point(value: Option<Vec2>) -> Point2<f32> {
    value.map_or_else(Point2::origin, |v| Point2::new(v.x as f32, v.y as f32))
}

fn vector(value: Option<Vec2>, default: Vector2<f32>) -> Vector2<f32> {
    value.map_or(default, |v| Vector2::new(v.x as f32, v.y as f32))
}

impl JointDef {
    /// Build a typed joint definition from a scene joint.
    ///
    /// Only keys relevant to the joint's kind are read; the rest are reported
    /// by a warning and otherwise ignored.
    pub fn from_descriptor(desc: &JointDescriptor) -> Result<Self, PhysicsError> {
        let kind = JointKind::parse(&desc.kind).ok_or_else(|| PhysicsError::UnsupportedJointKind {
            joint: desc.name.clone(),
            kind: desc.kind.clone(),
        })?;

        let ignored = unused_keys(desc, kind);
        if !ignored.is_empty() {
            warn!(
                joint = %desc.name,
                kind = %kind,
                "ignoring keys not used by this joint type: {}",
                ignored.join(", ")
            );
        }

        let spec = match kind {
            JointKind::Revolute => {
                let d = RevoluteParams::default();
                JointSpec::Revolute(RevoluteParams {
                    reference_angle: scalar(desc.ref_angle, d.reference_angle),
                    enable_limit: desc.enable_limit.unwrap_or(d.enable_limit),
                    lower_angle: scalar(desc.lower_limit, d.lower_angle),
                    upper_angle: scalar(desc.upper_limit, d.upper_angle),
                    enable_motor: desc.enable_motor.unwrap_or(d.enable_motor),
                    motor_speed: scalar(desc.motor_speed.or(desc.joint_speed), d.motor_speed),
                    max_motor_torque: scalar(desc.max_motor_torque, d.max_motor_torque),
                })
            }
            JointKind::Distance => {
                let d = DistanceParams::default();
                JointSpec::Distance(DistanceParams {
                    length: scalar(desc.length, d.length),
                    frequency_hz: scalar(desc.frequency, d.frequency_hz),
                    damping_ratio: scalar(desc.damping_ratio, d.damping_ratio),
                })
            }
            JointKind::Prismatic => {
                let d = PrismaticParams::default();
                JointSpec::Prismatic(PrismaticParams {
                    axis: vector(desc.local_axis_a, d.axis),
                    reference_angle: scalar(desc.ref_angle, d.reference_angle),
                    enable_limit: desc.enable_limit.unwrap_or(d.enable_limit),
                    lower_translation: scalar(desc.lower_limit, d.lower_translation),
                    upper_translation: scalar(desc.upper_limit, d.upper_translation),
                    enable_motor: desc.enable_motor.unwrap_or(d.enable_motor),
                    motor_speed: scalar(desc.motor_speed, d.motor_speed),
                    max_motor_force: scalar(desc.max_motor_force, d.max_motor_force),
                })
            }
            JointKind::Wheel => {
                let d = WheelParams::default();
                JointSpec::Wheel(WheelParams {
                    axis: vector(desc.local_axis_a, d.axis),
                    enable_motor: desc.enable_motor.unwrap_or(d.enable_motor),
                    motor_speed: scalar(desc.motor_speed, d.motor_speed),
                    max_motor_torque: scalar(desc.max_motor_torque, d.max_motor_torque),
                    frequency_hz: scalar(desc.spring_frequency, d.frequency_hz),
                    damping_ratio: scalar(desc.spring_damping_ratio, d.damping_ratio),
                })
            }
            JointKind::Rope => JointSpec::Rope(RopeParams {
                max_length: scalar(desc.max_length, RopeParams::default().max_length),
            }),
            JointKind::Motor => {
                let d = MotorJointParams::default();
                JointSpec::Motor(MotorJointParams {
                    linear_offset: vector(desc.linear_offset.or(desc.anchor_a), d.linear_offset),
                    correction_factor: scalar(desc.correction_factor, d.correction_factor),
                    max_force: scalar(desc.max_force, d.max_force),
                    max_torque: scalar(desc.max_torque, d.max_torque),
                })
            }
            JointKind::Weld => {
                let d = WeldParams::default();
                JointSpec::Weld(WeldParams {
                    reference_angle: scalar(desc.ref_angle, d.reference_angle),
                    frequency_hz: scalar(desc.frequency, d.frequency_hz),
                    damping_ratio: scalar(desc.damping_ratio, d.damping_ratio),
                })
            }
            JointKind::Friction => {
                let d = FrictionParams::default();
                JointSpec::Friction(FrictionParams {
                    max_force: scalar(desc.max_force, d.max_force),
                    max_torque: scalar(desc.max_torque, d.max_torque),
                })
            }
        };

        let (anchor_a, anchor_b) = if kind == JointKind::Motor {
            (Point2::origin(), Point2::origin())
        } else {
            (point(desc.anchor_a), point(desc.anchor_b))
        };

        let reference_angle = match kind {
            JointKind::Revolute => desc.ref_angle.unwrap_or(0.0),
            _ => 0.0,
        };

        Ok(Self {
            anchor_a,
            anchor_b,
            collide_connected: desc.collide_connected.unwrap_or(false),
            spec,
            reference_angle,
        })
    }

    /// The joint kind.
    pub fn kind(&self) -> JointKind {
        self.spec.kind()
    }

    /// Angle subtracted from the bodies' relative rotation when measuring the joint angle.
    pub fn reference_angle(&self) -> f64 {
        self.reference_angle
    }

    /// Lower this definition to a Rapier joint.
    pub fn to_rapier(&self) -> GenericJoint {
        match self.spec {
            JointSpec::Revolute(p) => create_revolute_joint(self, p),
            JointSpec::Distance(p) => create_distance_joint(self, p),
            JointSpec::Prismatic(p) => create_prismatic_joint(self, p),
            JointSpec::Wheel(p) => create_wheel_joint(self, p),
            JointSpec::Rope(p) => RopeJointBuilder::new(p.max_length)
                .local_anchor1(self.anchor_a)
                .local_anchor2(self.anchor_b)
                .contacts_enabled(self.collide_connected)
                .build()
                .into(),
            JointSpec::Motor(p) => create_motor_joint(self, p),
            JointSpec::Weld(p) => create_weld_joint(self, p),
            JointSpec::Friction(p) => create_friction_joint(self, p),
        }
    }
}

/// File keys present on the joint that its kind does not read.
pub fn unused_keys(desc: &JointDescriptor, kind: JointKind) -> Vec<&'static str> {
    let consumed = kind.consumed_keys();
    desc.present_keys()
        .into_iter()
        .filter(|key| !consumed.contains(key))
        .collect()
}

/// Spring stiffness and damping (acceleration-based) for a frequency and damping ratio.
fn spring_coefficients(frequency_hz: f32, damping_ratio: f32) -> (f32, f32) {
    let omega = TAU * frequency_hz;
    (omega * omega, 2.0 * damping_ratio * omega)
}

fn axis_angle(axis: Vector2<f32>) -> f32 {
    if axis.norm_squared() <= f32::EPSILON {
        warn!("joint axis has zero length, using the x axis");
        return 0.0;
    }
    axis.y.atan2(axis.x)
}

fn frames(def: &JointDef, angle1: f32, angle2: f32) -> (Isometry2<f32>, Isometry2<f32>) {
    (
        Isometry2::new(def.anchor_a.coords, angle1),
        Isometry2::new(def.anchor_b.coords, angle2),
    )
}

fn create_revolute_joint(def: &JointDef, p: RevoluteParams) -> GenericJoint {
    let (frame1, frame2) = frames(def, p.reference_angle, 0.0);
    let mut builder = GenericJointBuilder::new(JointAxesMask::LOCKED_REVOLUTE_AXES)
        .local_frame1(frame1)
        .local_frame2(frame2)
        .contacts_enabled(def.collide_connected);

    if p.enable_limit {
        builder = builder.limits(JointAxis::AngX, [p.lower_angle, p.upper_angle]);
    }

    // A disabled motor keeps its speed command but may not apply any torque.
    let max_torque = if p.enable_motor { p.max_motor_torque } else { 0.0 };
    builder
        .motor_model(JointAxis::AngX, MotorModel::AccelerationBased)
        .motor_velocity(JointAxis::AngX, p.motor_speed, DEFAULT_MOTOR_DAMPING)
        .motor_max_force(JointAxis::AngX, max_torque)
        .build()
}

fn create_distance_joint(def: &JointDef, p: DistanceParams) -> GenericJoint {
    if p.frequency_hz > 0.0 {
        let (stiffness, damping) = spring_coefficients(p.frequency_hz, p.damping_ratio);
        return SpringJointBuilder::new(p.length, stiffness, damping)
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor1(def.anchor_a)
            .local_anchor2(def.anchor_b)
            .contacts_enabled(def.collide_connected)
            .build()
            .into();
    }

    let mut joint: GenericJoint = RopeJointBuilder::new(p.length)
        .local_anchor1(def.anchor_a)
        .local_anchor2(def.anchor_b)
        .contacts_enabled(def.collide_connected)
        .build()
        .into();
    joint.set_limits(JointAxis::LinX, [p.length, p.length]);
    joint
}

fn create_prismatic_joint(def: &JointDef, p: PrismaticParams) -> GenericJoint {
    let theta = axis_angle(p.axis);
    let (frame1, frame2) = frames(def, theta, theta - p.reference_angle);
    let mut builder = GenericJointBuilder::new(JointAxesMask::LOCKED_PRISMATIC_AXES)
        .local_frame1(frame1)
        .local_frame2(frame2)
        .contacts_enabled(def.collide_connected);

    if p.enable_limit {
        builder = builder.limits(
            JointAxis::LinX,
            [p.lower_translation, p.upper_translation],
        );
    }

    let max_force = if p.enable_motor { p.max_motor_force } else { 0.0 };
    builder
        .motor_model(JointAxis::LinX, MotorModel::AccelerationBased)
        .motor_velocity(JointAxis::LinX, p.motor_speed, DEFAULT_MOTOR_DAMPING)
        .motor_max_force(JointAxis::LinX, max_force)
        .build()
}

fn create_wheel_joint(def: &JointDef, p: WheelParams) -> GenericJoint {
    let theta = axis_angle(p.axis);
    let (frame1, frame2) = frames(def, theta, theta);

    // Without a spring the suspension is rigid and the wheel is a plain hinge.
    let springy = p.frequency_hz > 0.0;
    let locked = if springy {
        JointAxesMask::LIN_Y
    } else {
        JointAxesMask::LIN_X | JointAxesMask::LIN_Y
    };

    let mut builder = GenericJointBuilder::new(locked)
        .local_frame1(frame1)
        .local_frame2(frame2)
        .contacts_enabled(def.collide_connected);

    if springy {
        let (stiffness, damping) = spring_coefficients(p.frequency_hz, p.damping_ratio);
        builder = builder
            .motor_model(JointAxis::LinX, MotorModel::AccelerationBased)
            .motor_position(JointAxis::LinX, 0.0, stiffness, damping);
    }

    let max_torque = if p.enable_motor { p.max_motor_torque } else { 0.0 };
    builder
        .motor_model(JointAxis::AngX, MotorModel::AccelerationBased)
        .motor_velocity(JointAxis::AngX, p.motor_speed, DEFAULT_MOTOR_DAMPING)
        .motor_max_force(JointAxis::AngX, max_torque)
        .build()
}

fn create_motor_joint(def: &JointDef, p: MotorJointParams) -> GenericJoint {
    let stiffness = p.correction_factor * DEFAULT_MOTOR_STIFFNESS;
    GenericJointBuilder::new(JointAxesMask::empty())
        .local_anchor1(def.anchor_a)
        .local_anchor2(def.anchor_b)
        .contacts_enabled(def.collide_connected)
        .motor_position(JointAxis::LinX, p.linear_offset.x, stiffness, DEFAULT_MOTOR_DAMPING)
        .motor_position(JointAxis::LinY, p.linear_offset.y, stiffness, DEFAULT_MOTOR_DAMPING)
        .motor_position(JointAxis::AngX, 0.0, stiffness, DEFAULT_MOTOR_DAMPING)
        .motor_max_force(JointAxis::LinX, p.max_force)
        .motor_max_force(JointAxis::LinY, p.max_force)
        .motor_max_force(JointAxis::AngX, p.max_torque)
        .build()
}

fn create_weld_joint(def: &JointDef, p: WeldParams) -> GenericJoint {
    let (frame1, frame2) = frames(def, p.reference_angle, 0.0);

    if p.frequency_hz <= 0.0 {
        return GenericJointBuilder::new(JointAxesMask::LOCKED_FIXED_AXES)
            .local_frame1(frame1)
            .local_frame2(frame2)
            .contacts_enabled(def.collide_connected)
            .build();
    }

    let (stiffness, damping) = spring_coefficients(p.frequency_hz, p.damping_ratio);
    let mut builder = GenericJointBuilder::new(JointAxesMask::empty())
        .local_frame1(frame1)
        .local_frame2(frame2)
        .contacts_enabled(def.collide_connected);
    for axis in [JointAxis::LinX, JointAxis::LinY, JointAxis::AngX] {
        builder = builder
            .motor_model(axis, MotorModel::AccelerationBased)
            .motor_position(axis, 0.0, stiffness, damping);
    }
    builder.build()
}

fn create_friction_joint(def: &JointDef, p: FrictionParams) -> GenericJoint {
    GenericJointBuilder::new(JointAxesMask::empty())
        .local_anchor1(def.anchor_a)
        .local_anchor2(def.anchor_b)
        .contacts_enabled(def.collide_connected)
        .motor_velocity(JointAxis::LinX, 0.0, DEFAULT_MOTOR_DAMPING)
        .motor_velocity(JointAxis::LinY, 0.0, DEFAULT_MOTOR_DAMPING)
        .motor_velocity(JointAxis::AngX, 0.0, DEFAULT_MOTOR_DAMPING)
        .motor_max_force(JointAxis::LinX, p.max_force)
        .motor_max_force(JointAxis::LinY, p.max_force)
        .motor_max_force(JointAxis::AngX, p.max_torque)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planarsim_ir::BodyRef;

    fn descriptor(kind: &str) -> JointDescriptor {
        JointDescriptor::new(kind, "j", BodyRef::Index(0), BodyRef::Index(1))
    }

    #[test]
    fn test_unsupported_kind() {
        let err = JointDef::from_descriptor(&descriptor("pulley")).unwrap_err();
        match err {
            PhysicsError::UnsupportedJointKind { joint, kind } => {
                assert_eq!(joint, "j");
                assert_eq!(kind, "pulley");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_every_kind_parses() {
        for tag in [
            "revolute", "distance", "prismatic", "wheel", "rope", "motor", "weld", "friction",
        ] {
            let def = JointDef::from_descriptor(&descriptor(tag)).unwrap();
            assert_eq!(def.kind().as_str(), tag);
            // Lowering never panics, whatever the defaults.
            let _ = def.to_rapier();
        }
    }

    #[test]
    fn test_revolute_defaults() {
        let def = JointDef::from_descriptor(&descriptor("revolute")).unwrap();
        assert_eq!(def.anchor_a, Point2::origin());
        assert!(!def.collide_connected);
        assert_eq!(def.spec, JointSpec::Revolute(RevoluteParams::default()));
        assert!(def.kind().is_actuatable());
    }

    #[test]
    fn test_revolute_fields_and_limits() {
        let mut desc = descriptor("revolute");
        desc.anchor_a = Some(Vec2::new(1.0, 2.0));
        desc.enable_limit = Some(true);
        desc.lower_limit = Some(-1.5);
        desc.upper_limit = Some(0.5);
        desc.enable_motor = Some(true);
        desc.max_motor_torque = Some(250.0);
        desc.joint_speed = Some(3.0);
        desc.ref_angle = Some(0.25);
        desc.collide_connected = Some(true);

        let def = JointDef::from_descriptor(&desc).unwrap();
        let JointSpec::Revolute(p) = def.spec else {
            panic!("expected revolute");
        };
        assert_relative_eq!(p.motor_speed, 3.0);
        assert_relative_eq!(p.max_motor_torque, 250.0);
        assert_relative_eq!(def.reference_angle(), 0.25);
        assert_eq!(def.anchor_a, Point2::new(1.0, 2.0));

        let joint = def.to_rapier();
        let limits = joint.limits(JointAxis::AngX).unwrap();
        assert_relative_eq!(limits.min, -1.5);
        assert_relative_eq!(limits.max, 0.5);
        assert!(joint.contacts_enabled());
    }

    #[test]
    fn test_motor_speed_wins_over_joint_speed() {
        let mut desc = descriptor("revolute");
        desc.joint_speed = Some(1.0);
        desc.motor_speed = Some(2.0);
        let JointSpec::Revolute(p) = JointDef::from_descriptor(&desc).unwrap().spec else {
            panic!("expected revolute");
        };
        assert_relative_eq!(p.motor_speed, 2.0);
    }

    #[test]
    fn test_irrelevant_fields_are_ignored() {
        let mut desc = descriptor("rope");
        desc.max_length = Some(4.0);
        desc.max_motor_torque = Some(10.0);
        desc.local_axis_a = Some(Vec2::new(0.0, 1.0));

        assert_eq!(
            unused_keys(&desc, JointKind::Rope),
            vec!["maxMotorTorque", "localAxisA"]
        );
        let def = JointDef::from_descriptor(&desc).unwrap();
        assert_eq!(def.spec, JointSpec::Rope(RopeParams { max_length: 4.0 }));
        assert!(!def.kind().is_actuatable());
    }

    #[test]
    fn test_motor_joint_offset_from_anchor_a() {
        let mut desc = descriptor("motor");
        desc.anchor_a = Some(Vec2::new(2.0, 1.0));
        desc.anchor_b = Some(Vec2::new(5.0, 5.0));

        assert_eq!(unused_keys(&desc, JointKind::Motor), vec!["anchorB"]);
        let def = JointDef::from_descriptor(&desc).unwrap();
        assert_eq!(def.anchor_a, Point2::origin());
        assert_eq!(def.anchor_b, Point2::origin());
        let JointSpec::Motor(p) = def.spec else {
            panic!("expected motor");
        };
        assert_relative_eq!(p.correction_factor, 0.3);
        assert_relative_eq!(p.max_force, 1.0);
        assert_eq!(p.linear_offset, Vector2::new(2.0, 1.0));

        // An explicit linearOffset wins over anchorA.
        desc.linear_offset = Some(Vec2::new(1.0, 0.0));
        let JointSpec::Motor(p) = JointDef::from_descriptor(&desc).unwrap().spec else {
            panic!("expected motor");
        };
        assert_eq!(p.linear_offset, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_wheel_and_distance_defaults() {
        let JointSpec::Wheel(w) = JointDef::from_descriptor(&descriptor("wheel")).unwrap().spec else {
            panic!("expected wheel");
        };
        assert_relative_eq!(w.frequency_hz, 2.0);
        assert_relative_eq!(w.damping_ratio, 0.7);
        assert_eq!(w.axis, Vector2::x());

        let JointSpec::Distance(d) = JointDef::from_descriptor(&descriptor("distance")).unwrap().spec
        else {
            panic!("expected distance");
        };
        assert_relative_eq!(d.length, 1.0);
    }

    #[test]
    fn test_rigid_distance_pins_length() {
        let mut desc = descriptor("distance");
        desc.length = Some(2.5);
        let joint = JointDef::from_descriptor(&desc).unwrap().to_rapier();
        let limits = joint.limits(JointAxis::LinX).unwrap();
        assert_relative_eq!(limits.min, 2.5);
        assert_relative_eq!(limits.max, 2.5);
    }

    #[test]
    fn test_weld_rigid_and_soft() {
        let rigid = JointDef::from_descriptor(&descriptor("weld")).unwrap().to_rapier();
        assert_eq!(rigid.locked_axes, JointAxesMask::LOCKED_FIXED_AXES);

        let mut desc = descriptor("weld");
        desc.frequency = Some(5.0);
        desc.damping_ratio = Some(0.5);
        let soft = JointDef::from_descriptor(&desc).unwrap().to_rapier();
        assert!(soft.locked_axes.is_empty());
        assert!(soft.motor(JointAxis::AngX).is_some());
    }

    #[test]
    fn test_spring_coefficients() {
        let (k, c) = spring_coefficients(1.0, 0.5);
        assert_relative_eq!(k, TAU * TAU, epsilon = 1e-4);
        assert_relative_eq!(c, TAU, epsilon = 1e-5);
    }
}
