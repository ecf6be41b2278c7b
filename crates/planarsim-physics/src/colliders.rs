//! Collision shape generation from scene fixtures.

use nalgebra::{Point2, Vector2};
use parry2d::shape::SharedShape;
use planarsim_ir::{ChainDescriptor, CircleDescriptor, FixtureDescriptor, ShapeDescriptor, Vec2};
use rapier2d::geometry::{ColliderBuilder, InteractionGroups};
use rapier2d::pipeline::ActiveHooks;
use tracing::warn;

use crate::error::PhysicsError;
use crate::filter::{CollisionFilter, DEFAULT_CATEGORY_BITS, DEFAULT_MASK_BITS};

/// Concrete shape produced from a fixture's shape descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltShape {
    /// Circle with a body-local center.
    Circle {
        /// Center relative to the body origin.
        center: Point2<f32>,
        /// Radius.
        radius: f32,
    },
    /// Convex polygon.
    Polygon {
        /// Vertices as declared.
        vertices: Vec<Point2<f32>>,
    },
    /// Open polyline.
    OpenChain {
        /// Vertices in order.
        vertices: Vec<Point2<f32>>,
    },
    /// Closed polyline; the last vertex connects back to the first.
    ClosedLoop {
        /// Vertices in order, without the declared final vertex.
        vertices: Vec<Point2<f32>>,
        /// Predecessor ghost vertex, if declared.
        prev_ghost: Option<Point2<f32>>,
        /// Successor ghost vertex, if declared.
        next_ghost: Option<Point2<f32>>,
    },
    /// Single segment.
    Edge {
        /// First endpoint.
        a: Point2<f32>,
        /// Second endpoint.
        b: Point2<f32>,
    },
}

impl BuiltShape {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            BuiltShape::Circle { .. } => "circle",
            BuiltShape::Polygon { .. } => "polygon",
            BuiltShape::OpenChain { .. } => "chain",
            BuiltShape::ClosedLoop { .. } => "loop",
            BuiltShape::Edge { .. } => "edge",
        }
    }

    /// Number of vertices (0 for circles).
    pub fn vertex_count(&self) -> usize {
        match self {
            BuiltShape::Circle { .. } => 0,
            BuiltShape::Polygon { vertices }
            | BuiltShape::OpenChain { vertices }
            | BuiltShape::ClosedLoop { vertices, .. } => vertices.len(),
            BuiltShape::Edge { .. } => 2,
        }
    }
}

/// Density, friction and restitution of a fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Mass density.
    pub density: f32,
    /// Friction coefficient.
    pub friction: f32,
    /// Restitution coefficient.
    pub restitution: f32,
}

/// A fixture ready to be attached to a body.
#[derive(Debug, Clone)]
pub struct FixturePlan {
    /// The shape variant.
    pub shape: BuiltShape,
    /// Material terms.
    pub material: Material,
    /// Collision filter.
    pub filter: CollisionFilter,
    /// Sensor flag.
    pub sensor: bool,
    collider: ColliderBuilder,
}

impl FixturePlan {
    /// Collider builder carrying the shape, material and filter.
    pub fn collider(&self) -> ColliderBuilder {
        self.collider.clone()
    }
}

/// Convert one fixture descriptor into a fixture plan.
///
/// Returns `Ok(None)` for a fixture that declares no shape; such fixtures are
/// skipped with a warning.
///
/// # Arguments
///
/// * `fixture` - The fixture descriptor
/// * `body` - Owning body name, for error messages
/// * `index` - Fixture position within the body, for error messages
pub fn build_fixture(
    fixture: &FixtureDescriptor,
    body: &str,
    index: usize,
) -> Result<Option<FixturePlan>, PhysicsError> {
    let Some(shape_desc) = fixture.shape() else {
        warn!(body, fixture = index, "fixture declares no shape, skipping");
        return Ok(None);
    };
    if fixture.declared_shape_count() > 1 {
        warn!(
            body,
            fixture = index,
            "fixture declares several shapes, using the {}",
            match shape_desc {
                ShapeDescriptor::Circle(_) => "circle",
                ShapeDescriptor::Polygon(_) => "polygon",
                ShapeDescriptor::Chain(_) => "chain",
            }
        );
    }

    let malformed = |reason: String| PhysicsError::MalformedShape {
        body: body.to_string(),
        fixture: index,
        reason,
    };

    let shape = match shape_desc {
        ShapeDescriptor::Circle(circle) => build_circle(circle).map_err(malformed)?,
        ShapeDescriptor::Polygon(polygon) => {
            let points = polygon
                .vertices
                .points()
                .ok_or_else(|| malformed("polygon x/y vertex lists differ in length".to_string()))?;
            build_polygon(&points).map_err(malformed)?
        }
        ShapeDescriptor::Chain(chain) => build_chain(chain).map_err(malformed)?,
    };
    let shared = shared_shape(&shape).map_err(malformed)?;

    let filter = CollisionFilter {
        category_bits: fixture.category_bits.unwrap_or(DEFAULT_CATEGORY_BITS),
        mask_bits: fixture.mask_bits.unwrap_or(DEFAULT_MASK_BITS),
        group_index: fixture.group_index.unwrap_or(0),
    };
    let material = Material {
        density: fixture.density as f32,
        friction: fixture.friction as f32,
        restitution: fixture.restitution as f32,
    };

    let mut collider = ColliderBuilder::new(shared)
        .density(material.density)
        .friction(material.friction)
        .restitution(material.restitution)
        .sensor(fixture.sensor)
        .collision_groups(InteractionGroups::all())
        .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
        .user_data(filter.to_user_data());
    if let BuiltShape::Circle { center, .. } = &shape {
        collider = collider.translation(center.coords);
    }

    Ok(Some(FixturePlan {
        shape,
        material,
        filter,
        sensor: fixture.sensor,
        collider,
    }))
}

fn to_point(v: &Vec2) -> Result<Point2<f32>, String> {
    if v.x.is_finite() && v.y.is_finite() {
        Ok(Point2::new(v.x as f32, v.y as f32))
    } else {
        Err(format!("non-finite vertex ({}, {})", v.x, v.y))
    }
}

fn to_points(points: &[Vec2]) -> Result<Vec<Point2<f32>>, String> {
    points.iter().map(to_point).collect()
}

fn build_circle(circle: &CircleDescriptor) -> Result<BuiltShape, String> {
    if !(circle.radius.is_finite() && circle.radius >= 0.0) {
        return Err(format!("circle radius must not be negative, got {}", circle.radius));
    }
    Ok(BuiltShape::Circle {
        center: to_point(&circle.center)?,
        radius: circle.radius as f32,
    })
}

fn build_polygon(points: &[Vec2]) -> Result<BuiltShape, String> {
    if points.len() < 3 {
        return Err(format!("polygon needs at least 3 vertices, got {}", points.len()));
    }
    let vertices = to_points(points)?;
    if is_degenerate(&vertices) {
        return Err("polygon vertices are collinear".to_string());
    }
    Ok(BuiltShape::Polygon { vertices })
}

fn build_chain(chain: &ChainDescriptor) -> Result<BuiltShape, String> {
    let points = chain
        .vertices
        .points()
        .ok_or_else(|| "chain x/y vertex lists differ in length".to_string())?;
    let mut vertices = to_points(&points)?;
    if vertices.len() < 2 {
        return Err(format!("chain needs at least 2 vertices, got {}", vertices.len()));
    }

    let closed = chain.is_loop();
    if closed && vertices.len() >= 3 {
        // The final vertex closes the loop onto the first one and is dropped.
        vertices.pop();
    }

    match vertices.len() {
        2 => Ok(BuiltShape::Edge {
            a: vertices[0],
            b: vertices[1],
        }),
        _ if closed => Ok(BuiltShape::ClosedLoop {
            vertices,
            prev_ghost: chain.prev_vertex.as_ref().map(to_point).transpose()?,
            next_ghost: chain.next_vertex.as_ref().map(to_point).transpose()?,
        }),
        _ => Ok(BuiltShape::OpenChain { vertices }),
    }
}

/// True if all points lie on a single line (or coincide).
fn is_degenerate(points: &[Point2<f32>]) -> bool {
    let origin = points[0];
    let Some(far) = points
        .iter()
        .max_by(|a, b| {
            (*a - origin)
                .norm_squared()
                .total_cmp(&(*b - origin).norm_squared())
        })
        .copied()
    else {
        return true;
    };
    let axis: Vector2<f32> = far - origin;
    let len = axis.norm();
    if len <= f32::EPSILON {
        return true;
    }
    points
        .iter()
        .all(|p| (axis.perp(&(p - origin)) / len).abs() <= 1.0e-6 * len.max(1.0))
}

fn shared_shape(shape: &BuiltShape) -> Result<SharedShape, String> {
    match shape {
        BuiltShape::Circle { radius, .. } => Ok(SharedShape::ball(*radius)),
        BuiltShape::Polygon { vertices } => SharedShape::convex_hull(vertices)
            .ok_or_else(|| "failed to compute polygon hull".to_string()),
        BuiltShape::OpenChain { vertices } => Ok(SharedShape::polyline(vertices.clone(), None)),
        BuiltShape::ClosedLoop { vertices, .. } => {
            let n = vertices.len() as u32;
            let indices = (0..n).map(|i| [i, (i + 1) % n]).collect();
            Ok(SharedShape::polyline(vertices.clone(), Some(indices)))
        }
        BuiltShape::Edge { a, b } => Ok(SharedShape::segment(*a, *b)),
    }
}
