//! Collision Shapes
//!
//! Closed tagged union of the supported 2D shapes. Narrow-phase dispatch is a
//! flat `match` on [`ShapeKind`] pairs instead of virtual calls, so the set of
//! supported pairings is enumerable at compile time.
//!
//! # Shapes
//!
//! - [`Shape::Circle`]: solid disc
//! - [`Shape::Polygon`]: convex polygon, up to 8 vertices, CCW winding
//! - [`Shape::Edge`]: one-sided line segment (zero mass)
//! - [`Shape::Chain`]: polyline of edges, optionally closed (zero mass)
//!
//! All shapes carry a skin radius so circle-polygon and polygon-polygon share
//! numerical behavior at vertices.

use crate::math::{Aabb2, Fix64, Transform2Fix, Vec2Fix};

// ============================================================================
// Constants
// ============================================================================

/// Maximum vertex count for a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Collision tolerance in world units. Shapes at rest sit this far apart.
pub const LINEAR_SLOP: Fix64 = Fix64::from_ratio(5, 1000);

/// Skin radius applied to polygons and edges (rounded corners).
pub const POLYGON_RADIUS: Fix64 = Fix64::from_ratio(1, 100);

// ============================================================================
// Support types
// ============================================================================

/// Discriminant of [`Shape`], used to key narrow-phase dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Solid disc
    Circle,
    /// Convex polygon
    Polygon,
    /// Line segment
    Edge,
    /// Polyline of segments
    Chain,
}

/// Mass, center of mass, and rotational inertia of a shape at unit scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MassData {
    /// Total mass
    pub mass: Fix64,
    /// Center of mass in shape-local coordinates
    pub center: Vec2Fix,
    /// Rotational inertia about the shape-local origin
    pub inertia: Fix64,
}

/// Ray segment from `p1` toward `p2`, clipped at `max_fraction`.
#[derive(Clone, Copy, Debug)]
pub struct RayCastInput {
    /// Ray origin
    pub p1: Vec2Fix,
    /// Ray target (defines direction and unit length)
    pub p2: Vec2Fix,
    /// Fraction of the segment to consider, usually 1.0
    pub max_fraction: Fix64,
}

/// Successful ray cast result.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// Surface normal at the hit point, world space
    pub normal: Vec2Fix,
    /// Fraction along the input segment where the hit occurred
    pub fraction: Fix64,
}

// ============================================================================
// Shape
// ============================================================================

/// Immutable collision geometry. Owned by exactly one fixture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Solid disc centered at `center` (shape-local).
    Circle {
        /// Center offset in shape-local coordinates
        center: Vec2Fix,
        /// Disc radius
        radius: Fix64,
    },
    /// Convex polygon with CCW winding and precomputed face normals.
    Polygon {
        /// Vertex positions, only `count` entries are valid
        vertices: [Vec2Fix; MAX_POLYGON_VERTICES],
        /// Outward face normals, `normals[i]` belongs to edge `i -> i+1`
        normals: [Vec2Fix; MAX_POLYGON_VERTICES],
        /// Number of valid vertices (3..=8)
        count: usize,
        /// Area centroid in shape-local coordinates
        centroid: Vec2Fix,
        /// Skin radius
        radius: Fix64,
    },
    /// One line segment. Zero mass, collides like a thin wall.
    Edge {
        /// First endpoint
        v1: Vec2Fix,
        /// Second endpoint
        v2: Vec2Fix,
    },
    /// Polyline of connected segments, each a separate broad-phase child.
    Chain {
        /// Ordered vertex list
        vertices: alloc::vec::Vec<Vec2Fix>,
        /// When true the last vertex connects back to the first
        closed: bool,
    },
}

impl Shape {
    /// Circle at a local offset.
    #[must_use]
    pub fn circle(center: Vec2Fix, radius: Fix64) -> Self {
        Self::Circle { center, radius }
    }

    /// Axis-aligned box with the given half extents, centered at the origin.
    #[must_use]
    pub fn box_shape(half_width: Fix64, half_height: Fix64) -> Self {
        Self::polygon(&[
            Vec2Fix::new(-half_width, -half_height),
            Vec2Fix::new(half_width, -half_height),
            Vec2Fix::new(half_width, half_height),
            Vec2Fix::new(-half_width, half_height),
        ])
    }

    /// Convex polygon from CCW vertices. Degenerate input (fewer than 3
    /// distinct vertices, or near-zero area) falls back to a unit box so the
    /// simulation stays stable instead of dividing by a zero area.
    #[must_use]
    pub fn polygon(points: &[Vec2Fix]) -> Self {
        let count = points.len().min(MAX_POLYGON_VERTICES);
        if count < 3 {
            return Self::box_shape(Fix64::HALF, Fix64::HALF);
        }

        let mut vertices = [Vec2Fix::ZERO; MAX_POLYGON_VERTICES];
        vertices[..count].copy_from_slice(&points[..count]);

        // Signed area via the shoelace formula. CCW input gives area > 0.
        let mut area2 = Fix64::ZERO;
        for i in 0..count {
            let j = (i + 1) % count;
            area2 += vertices[i].cross(vertices[j]);
        }
        if area2 <= LINEAR_SLOP * LINEAR_SLOP {
            return Self::box_shape(Fix64::HALF, Fix64::HALF);
        }

        let mut normals = [Vec2Fix::ZERO; MAX_POLYGON_VERTICES];
        for i in 0..count {
            let j = (i + 1) % count;
            let edge = vertices[j] - vertices[i];
            // Outward normal of a CCW edge
            normals[i] = edge.perp_right().normalize();
        }

        let centroid = polygon_centroid(&vertices[..count]);

        Self::Polygon {
            vertices,
            normals,
            count,
            centroid,
            radius: POLYGON_RADIUS,
        }
    }

    /// Box with the given half extents, offset and rotated in shape space.
    #[must_use]
    pub fn box_at(
        half_width: Fix64,
        half_height: Fix64,
        center: Vec2Fix,
        angle: Fix64,
    ) -> Self {
        let q = crate::math::Rot2Fix::from_angle(angle);
        let corners = [
            Vec2Fix::new(-half_width, -half_height),
            Vec2Fix::new(half_width, -half_height),
            Vec2Fix::new(half_width, half_height),
            Vec2Fix::new(-half_width, half_height),
        ];
        let mut placed = [Vec2Fix::ZERO; 4];
        for (dst, src) in placed.iter_mut().zip(corners.iter()) {
            *dst = q.apply(*src) + center;
        }
        Self::polygon(&placed)
    }

    /// Single edge segment.
    #[must_use]
    pub fn edge(v1: Vec2Fix, v2: Vec2Fix) -> Self {
        Self::Edge { v1, v2 }
    }

    /// Chain of segments. `closed` connects the ends into a loop.
    #[must_use]
    pub fn chain(points: &[Vec2Fix], closed: bool) -> Self {
        Self::Chain {
            vertices: points.to_vec(),
            closed,
        }
    }

    /// Skin radius used when deriving world-space contact data.
    #[must_use]
    pub fn surface_radius(&self) -> Fix64 {
        match self {
            Self::Circle { radius, .. } => *radius,
            Self::Polygon { radius, .. } => *radius,
            Self::Edge { .. } | Self::Chain { .. } => POLYGON_RADIUS,
        }
    }

    /// Shape discriminant for narrow-phase dispatch.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Edge { .. } => ShapeKind::Edge,
            Self::Chain { .. } => ShapeKind::Chain,
        }
    }

    /// Number of broad-phase children. Only chains have more than one.
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Chain { vertices, closed } => {
                if vertices.len() < 2 {
                    0
                } else if *closed {
                    vertices.len()
                } else {
                    vertices.len() - 1
                }
            }
            _ => 1,
        }
    }

    /// Extract child `index` of a chain as an edge segment.
    ///
    /// Returns `None` for non-chain shapes or out-of-range children.
    #[must_use]
    pub fn chain_child_edge(&self, index: usize) -> Option<(Vec2Fix, Vec2Fix)> {
        match self {
            Self::Chain { vertices, closed } => {
                if index >= self.child_count() {
                    return None;
                }
                let v1 = vertices[index];
                let v2 = if *closed && index + 1 == vertices.len() {
                    vertices[0]
                } else {
                    vertices[index + 1]
                };
                Some((v1, v2))
            }
            _ => None,
        }
    }

    /// Tight AABB of child `index` under transform `xf`.
    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform2Fix, child: usize) -> Aabb2 {
        match self {
            Self::Circle { center, radius } => {
                let p = xf.apply(*center);
                let r = Vec2Fix::new(*radius, *radius);
                Aabb2::new(p - r, p + r)
            }
            Self::Polygon {
                vertices,
                count,
                radius,
                ..
            } => {
                let mut lo = xf.apply(vertices[0]);
                let mut hi = lo;
                for v in &vertices[1..*count] {
                    let p = xf.apply(*v);
                    lo = lo.min(p);
                    hi = hi.max(p);
                }
                let r = Vec2Fix::new(*radius, *radius);
                Aabb2::new(lo - r, hi + r)
            }
            Self::Edge { v1, v2 } => {
                let p1 = xf.apply(*v1);
                let p2 = xf.apply(*v2);
                let r = Vec2Fix::new(POLYGON_RADIUS, POLYGON_RADIUS);
                Aabb2::new(p1.min(p2) - r, p1.max(p2) + r)
            }
            Self::Chain { .. } => match self.chain_child_edge(child) {
                Some((v1, v2)) => {
                    let p1 = xf.apply(v1);
                    let p2 = xf.apply(v2);
                    let r = Vec2Fix::new(POLYGON_RADIUS, POLYGON_RADIUS);
                    Aabb2::new(p1.min(p2) - r, p1.max(p2) + r)
                }
                None => Aabb2::new(xf.p, xf.p),
            },
        }
    }

    /// Mass properties at the given density. Edges and chains are massless.
    #[must_use]
    pub fn compute_mass(&self, density: Fix64) -> MassData {
        match self {
            Self::Circle { center, radius } => {
                let r2 = *radius * *radius;
                let mass = density * Fix64::PI * r2;
                // I = m (r²/2 + |c|²), about the shape origin
                let inertia = mass * (r2.half() + center.length_squared());
                MassData {
                    mass,
                    center: *center,
                    inertia,
                }
            }
            Self::Polygon {
                vertices, count, ..
            } => polygon_mass(&vertices[..*count], density),
            Self::Edge { .. } | Self::Chain { .. } => MassData::default(),
        }
    }

    /// True if a world-space point lies inside the shape. Always false for
    /// edges and chains (they have no interior).
    #[must_use]
    pub fn test_point(&self, xf: &Transform2Fix, p: Vec2Fix) -> bool {
        match self {
            Self::Circle { center, radius } => {
                let d = p - xf.apply(*center);
                d.length_squared() <= *radius * *radius
            }
            Self::Polygon {
                vertices,
                normals,
                count,
                ..
            } => {
                let local = xf.apply_inv(p);
                for i in 0..*count {
                    if normals[i].dot(local - vertices[i]) > Fix64::ZERO {
                        return false;
                    }
                }
                true
            }
            Self::Edge { .. } | Self::Chain { .. } => false,
        }
    }

    /// Cast a ray against child `index`.
    #[must_use]
    pub fn ray_cast(
        &self,
        input: &RayCastInput,
        xf: &Transform2Fix,
        child: usize,
    ) -> Option<RayHit> {
        match self {
            Self::Circle { center, radius } => ray_cast_circle(input, xf.apply(*center), *radius),
            Self::Polygon {
                vertices,
                normals,
                count,
                ..
            } => ray_cast_polygon(input, xf, &vertices[..*count], &normals[..*count]),
            Self::Edge { v1, v2 } => ray_cast_edge(input, xf, *v1, *v2),
            Self::Chain { .. } => {
                let (v1, v2) = self.chain_child_edge(child)?;
                ray_cast_edge(input, xf, v1, v2)
            }
        }
    }
}

// ============================================================================
// Geometry helpers
// ============================================================================

/// Area centroid of a convex CCW polygon (triangle-fan decomposition).
fn polygon_centroid(vertices: &[Vec2Fix]) -> Vec2Fix {
    let third = Fix64::from_ratio(1, 3);
    let origin = vertices[0];
    let mut center = Vec2Fix::ZERO;
    let mut area = Fix64::ZERO;

    for i in 1..vertices.len() - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let tri_area = e1.cross(e2).half();
        area += tri_area;
        center += (e1 + e2) * (tri_area * third);
    }

    if area.is_zero() {
        return origin;
    }
    origin + center / area
}

/// Mass, centroid, and inertia of a convex CCW polygon about the local origin.
fn polygon_mass(vertices: &[Vec2Fix], density: Fix64) -> MassData {
    let third = Fix64::from_ratio(1, 3);
    let quarter_third = Fix64::from_ratio(1, 12);
    let origin = vertices[0];

    let mut area = Fix64::ZERO;
    let mut center = Vec2Fix::ZERO;
    let mut inertia = Fix64::ZERO;

    for i in 1..vertices.len() - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let d = e1.cross(e2);
        let tri_area = d.half();
        area += tri_area;
        center += (e1 + e2) * (tri_area * third);

        let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
        let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
        inertia += quarter_third * d * (intx2 + inty2);
    }

    let mass = density * area;
    if area.is_zero() {
        return MassData {
            mass: Fix64::ZERO,
            center: origin,
            inertia: Fix64::ZERO,
        };
    }

    let local_center = center / area;
    let world_center = origin + local_center;
    // Inertia is about the fan origin; shift to the shape origin via the
    // parallel axis theorem: I_origin = I_center + m |c|².
    let about_center = density * inertia - mass * local_center.length_squared();
    let about_origin = about_center + mass * world_center.length_squared();

    MassData {
        mass,
        center: world_center,
        inertia: about_origin,
    }
}

fn ray_cast_circle(input: &RayCastInput, position: Vec2Fix, radius: Fix64) -> Option<RayHit> {
    let s = input.p1 - position;
    let b = s.length_squared() - radius * radius;

    let d = input.p2 - input.p1;
    let c = s.dot(d);
    let rr = d.length_squared();
    let sigma = c * c - rr * b;

    if sigma < Fix64::ZERO || rr.is_zero() {
        return None;
    }

    let t = -(c + sigma.sqrt());
    if t >= Fix64::ZERO && t <= input.max_fraction * rr {
        let fraction = t / rr;
        let normal = (s + d * fraction).normalize();
        return Some(RayHit { normal, fraction });
    }
    None
}

fn ray_cast_polygon(
    input: &RayCastInput,
    xf: &Transform2Fix,
    vertices: &[Vec2Fix],
    normals: &[Vec2Fix],
) -> Option<RayHit> {
    // Work in shape-local space
    let p1 = xf.apply_inv(input.p1);
    let p2 = xf.apply_inv(input.p2);
    let d = p2 - p1;

    let mut lower = Fix64::ZERO;
    let mut upper = input.max_fraction;
    let mut hit_index: Option<usize> = None;

    for i in 0..vertices.len() {
        // face plane: dot(normal, x - v) = 0
        let numerator = normals[i].dot(vertices[i] - p1);
        let denominator = normals[i].dot(d);

        if denominator.is_zero() {
            if numerator < Fix64::ZERO {
                return None;
            }
        } else if denominator < Fix64::ZERO && numerator < lower * denominator {
            // Ray enters this half-plane
            lower = numerator / denominator;
            hit_index = Some(i);
        } else if denominator > Fix64::ZERO && numerator < upper * denominator {
            // Ray exits this half-plane
            upper = numerator / denominator;
        }

        if upper < lower {
            return None;
        }
    }

    let index = hit_index?;
    Some(RayHit {
        normal: xf.q.apply(normals[index]),
        fraction: lower,
    })
}

fn ray_cast_edge(
    input: &RayCastInput,
    xf: &Transform2Fix,
    v1: Vec2Fix,
    v2: Vec2Fix,
) -> Option<RayHit> {
    let p1 = xf.apply_inv(input.p1);
    let p2 = xf.apply_inv(input.p2);
    let d = p2 - p1;

    let e = v2 - v1;
    let normal = e.perp().normalize();
    if normal == Vec2Fix::ZERO {
        return None;
    }

    let numerator = normal.dot(v1 - p1);
    let denominator = normal.dot(d);
    if denominator.is_zero() {
        return None;
    }

    let t = numerator / denominator;
    if t < Fix64::ZERO || t > input.max_fraction {
        return None;
    }

    let q = p1 + d * t;
    let rr = e.length_squared();
    if rr.is_zero() {
        return None;
    }
    let s = (q - v1).dot(e) / rr;
    if s < Fix64::ZERO || s > Fix64::ONE {
        return None;
    }

    let world_normal = if numerator > Fix64::ZERO {
        -xf.q.apply(normal)
    } else {
        xf.q.apply(normal)
    };
    Some(RayHit {
        normal: world_normal,
        fraction: t,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rot2Fix;

    fn tol() -> Fix64 {
        Fix64::from_ratio(1, 1000)
    }

    #[test]
    fn test_circle_aabb() {
        let s = Shape::circle(Vec2Fix::ZERO, Fix64::from_int(2));
        let xf = Transform2Fix::new(Vec2Fix::from_int(10, 5), Rot2Fix::IDENTITY);
        let aabb = s.compute_aabb(&xf, 0);
        assert_eq!(aabb.min, Vec2Fix::from_int(8, 3));
        assert_eq!(aabb.max, Vec2Fix::from_int(12, 7));
    }

    #[test]
    fn test_box_mass() {
        // 2x4 box at density 3: mass = 2*4*3 = 24
        let s = Shape::box_shape(Fix64::ONE, Fix64::TWO);
        let md = s.compute_mass(Fix64::from_int(3));
        assert!((md.mass - Fix64::from_int(24)).abs() < tol());
        assert!(md.center.length() < tol());
        // I_center = m (w² + h²) / 12 = 24 * (4 + 16) / 12 = 40
        assert!((md.inertia - Fix64::from_int(40)).abs() < Fix64::from_ratio(1, 10));
    }

    #[test]
    fn test_circle_mass() {
        let s = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let md = s.compute_mass(Fix64::ONE);
        assert!((md.mass - Fix64::PI).abs() < tol());
        // I = m r² / 2 = π/2
        assert!((md.inertia - Fix64::PI.half()).abs() < tol());
    }

    #[test]
    fn test_edge_is_massless() {
        let s = Shape::edge(Vec2Fix::ZERO, Vec2Fix::from_int(5, 0));
        let md = s.compute_mass(Fix64::ONE);
        assert!(md.mass.is_zero());
        assert!(md.inertia.is_zero());
    }

    #[test]
    fn test_polygon_point_containment() {
        let s = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let xf = Transform2Fix::IDENTITY;
        assert!(s.test_point(&xf, Vec2Fix::ZERO));
        assert!(s.test_point(&xf, Vec2Fix::new(Fix64::HALF, Fix64::HALF)));
        assert!(!s.test_point(&xf, Vec2Fix::from_int(2, 0)));
    }

    #[test]
    fn test_point_containment_with_transform() {
        let s = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let xf = Transform2Fix::new(Vec2Fix::from_int(10, 0), Rot2Fix::IDENTITY);
        assert!(s.test_point(&xf, Vec2Fix::from_int(10, 0)));
        assert!(!s.test_point(&xf, Vec2Fix::ZERO));
    }

    #[test]
    fn test_degenerate_polygon_falls_back() {
        let s = Shape::polygon(&[Vec2Fix::ZERO, Vec2Fix::from_int(1, 0)]);
        match s {
            Shape::Polygon { count, .. } => assert_eq!(count, 4),
            _ => panic!("expected polygon fallback"),
        }
        // Collinear points have zero area
        let s = Shape::polygon(&[
            Vec2Fix::ZERO,
            Vec2Fix::from_int(1, 0),
            Vec2Fix::from_int(2, 0),
        ]);
        let md = s.compute_mass(Fix64::ONE);
        assert!(md.mass > Fix64::ZERO);
    }

    #[test]
    fn test_chain_children() {
        let pts = [
            Vec2Fix::from_int(0, 0),
            Vec2Fix::from_int(1, 0),
            Vec2Fix::from_int(2, 1),
            Vec2Fix::from_int(3, 0),
        ];
        let open = Shape::chain(&pts, false);
        assert_eq!(open.child_count(), 3);
        let closed = Shape::chain(&pts, true);
        assert_eq!(closed.child_count(), 4);

        let (v1, v2) = closed.chain_child_edge(3).unwrap();
        assert_eq!(v1, pts[3]);
        assert_eq!(v2, pts[0]);
        assert!(open.chain_child_edge(3).is_none());
    }

    #[test]
    fn test_ray_cast_circle_hit() {
        let s = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let input = RayCastInput {
            p1: Vec2Fix::from_int(-5, 0),
            p2: Vec2Fix::from_int(5, 0),
            max_fraction: Fix64::ONE,
        };
        let hit = s.ray_cast(&input, &Transform2Fix::IDENTITY, 0).unwrap();
        // Enters at x = -1, which is fraction 4/10
        assert!((hit.fraction - Fix64::from_ratio(4, 10)).abs() < tol());
        assert!((hit.normal.x + Fix64::ONE).abs() < tol());
    }

    #[test]
    fn test_ray_cast_circle_miss() {
        let s = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let input = RayCastInput {
            p1: Vec2Fix::from_int(-5, 3),
            p2: Vec2Fix::from_int(5, 3),
            max_fraction: Fix64::ONE,
        };
        assert!(s.ray_cast(&input, &Transform2Fix::IDENTITY, 0).is_none());
    }

    #[test]
    fn test_ray_cast_polygon() {
        let s = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let input = RayCastInput {
            p1: Vec2Fix::from_int(-4, 0),
            p2: Vec2Fix::from_int(4, 0),
            max_fraction: Fix64::ONE,
        };
        let hit = s.ray_cast(&input, &Transform2Fix::IDENTITY, 0).unwrap();
        // Enters the left face at x = -1: fraction 3/8
        assert!((hit.fraction - Fix64::from_ratio(3, 8)).abs() < tol());
        assert!((hit.normal.x + Fix64::ONE).abs() < tol());
    }

    #[test]
    fn test_ray_cast_edge() {
        let s = Shape::edge(Vec2Fix::from_int(-2, 1), Vec2Fix::from_int(2, 1));
        let input = RayCastInput {
            p1: Vec2Fix::from_int(0, 4),
            p2: Vec2Fix::from_int(0, -4),
            max_fraction: Fix64::ONE,
        };
        let hit = s.ray_cast(&input, &Transform2Fix::IDENTITY, 0).unwrap();
        assert!((hit.fraction - Fix64::from_ratio(3, 8)).abs() < tol());
        // Normal points back toward the ray origin
        assert!(hit.normal.y > Fix64::ZERO);
    }
}
