//! Narrow-Phase Collision — Manifold Generation
//!
//! Exact pairwise shape tests producing contact manifolds. Dispatch is a flat
//! lookup on [`ShapeKind`] pairs; chain shapes extract a child edge first.
//!
//! # Pairings
//!
//! - circle vs circle
//! - polygon vs circle (Voronoi regions)
//! - polygon vs polygon (SAT + incident-edge clipping, persistent feature ids)
//! - edge vs circle / edge vs polygon (edge treated as a thin two-gon)
//!
//! Manifold points carry a packed contact feature id that stays stable while
//! the same features remain in contact, which is what lets the solver warm
//! start from last frame's impulses.

use crate::math::{Fix64, Transform2Fix, Vec2Fix};
use crate::shape::{Shape, ShapeKind, LINEAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS};

/// Maximum contact points per manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

// ============================================================================
// Contact features and manifolds
// ============================================================================

/// Feature type tag inside a [`ContactFeature`].
pub const FEATURE_VERTEX: u8 = 0;
/// Feature type tag inside a [`ContactFeature`].
pub const FEATURE_FACE: u8 = 1;

/// Identifies which features of the two shapes produced a contact point.
/// Packed into a `u32` key for cross-frame impulse matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactFeature {
    /// Feature index on shape A
    pub index_a: u8,
    /// Feature index on shape B
    pub index_b: u8,
    /// [`FEATURE_VERTEX`] or [`FEATURE_FACE`] for shape A
    pub type_a: u8,
    /// [`FEATURE_VERTEX`] or [`FEATURE_FACE`] for shape B
    pub type_b: u8,
}

impl ContactFeature {
    /// Pack into a single comparable key.
    #[inline]
    #[must_use]
    pub fn key(self) -> u32 {
        u32::from(self.index_a)
            | (u32::from(self.index_b) << 8)
            | (u32::from(self.type_a) << 16)
            | (u32::from(self.type_b) << 24)
    }

    /// Swap the A/B roles, used when operands were exchanged for dispatch.
    #[inline]
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// One contact point within a manifold.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifoldPoint {
    /// Shape-local contact point; frame depends on the manifold kind.
    pub local_point: Vec2Fix,
    /// Accumulated normal impulse from the previous solve (warm start seed).
    pub normal_impulse: Fix64,
    /// Accumulated tangent impulse from the previous solve.
    pub tangent_impulse: Fix64,
    /// Persistent feature id for cross-frame matching.
    pub id: ContactFeature,
}

/// How to interpret the manifold's local data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ManifoldKind {
    /// Point-vs-point; `local_point` is on A, points are on B.
    #[default]
    Circles,
    /// Reference face on A; `local_normal`/`local_point` in A's frame,
    /// contact points in B's frame.
    FaceA,
    /// Reference face on B, mirrored.
    FaceB,
}

/// Contact manifold: a shared normal plus up to two contact points.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manifold {
    /// Interpretation of the local fields
    pub kind: ManifoldKind,
    /// Face normal (FaceA/FaceB) in the reference shape's frame
    pub local_normal: Vec2Fix,
    /// Reference point (face midpoint, or circle A center)
    pub local_point: Vec2Fix,
    /// Contact points, only `count` entries valid
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    /// Number of valid points, 0 means not touching
    pub count: usize,
}

/// World-space view of a manifold: shared normal, world points, separations.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldManifold {
    /// World-space contact normal, pointing from A to B
    pub normal: Vec2Fix,
    /// World-space contact points
    pub points: [Vec2Fix; MAX_MANIFOLD_POINTS],
    /// Signed separations, negative while penetrating
    pub separations: [Fix64; MAX_MANIFOLD_POINTS],
}

impl WorldManifold {
    /// Derive world-space contact data from a manifold and both transforms.
    #[must_use]
    pub fn initialize(
        manifold: &Manifold,
        xf_a: &Transform2Fix,
        radius_a: Fix64,
        xf_b: &Transform2Fix,
        radius_b: Fix64,
    ) -> Self {
        let mut out = Self::default();
        if manifold.count == 0 {
            return out;
        }

        match manifold.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                let d = point_b - point_a;
                out.normal = if d.length_squared() > Fix64::ZERO {
                    d.normalize()
                } else {
                    Vec2Fix::UNIT_X
                };
                let c_a = point_a + out.normal * radius_a;
                let c_b = point_b - out.normal * radius_b;
                out.points[0] = (c_a + c_b) * Fix64::HALF;
                out.separations[0] = (c_b - c_a).dot(out.normal);
            }
            ManifoldKind::FaceA => {
                out.normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for i in 0..manifold.count {
                    let clip_point = xf_b.apply(manifold.points[i].local_point);
                    let depth = (clip_point - plane_point).dot(out.normal);
                    let c_a = clip_point + out.normal * (radius_a - depth);
                    let c_b = clip_point - out.normal * radius_b;
                    out.points[i] = (c_a + c_b) * Fix64::HALF;
                    out.separations[i] = (c_b - c_a).dot(out.normal);
                }
            }
            ManifoldKind::FaceB => {
                let normal_b = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for i in 0..manifold.count {
                    let clip_point = xf_a.apply(manifold.points[i].local_point);
                    let depth = (clip_point - plane_point).dot(normal_b);
                    let c_b = clip_point + normal_b * (radius_b - depth);
                    let c_a = clip_point - normal_b * radius_a;
                    out.points[i] = (c_a + c_b) * Fix64::HALF;
                    out.separations[i] = (c_a - c_b).dot(normal_b);
                }
                // Report the normal from A toward B
                out.normal = -normal_b;
            }
        }
        out
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Whether a pair of shape kinds produces manifolds with operands swapped.
/// Dispatch order is: edge/chain first, then polygon, then circle.
#[must_use]
pub fn dispatch_swapped(kind_a: ShapeKind, kind_b: ShapeKind) -> bool {
    dispatch_rank(kind_a) > dispatch_rank(kind_b)
}

fn dispatch_rank(kind: ShapeKind) -> u8 {
    match kind {
        ShapeKind::Edge | ShapeKind::Chain => 0,
        ShapeKind::Polygon => 1,
        ShapeKind::Circle => 2,
    }
}

/// Compute the manifold for a shape pair. The caller is responsible for
/// ordering operands so that `dispatch_swapped` is false (the contact manager
/// does this once at contact creation).
pub fn evaluate(
    manifold: &mut Manifold,
    shape_a: &Shape,
    xf_a: &Transform2Fix,
    child_a: usize,
    shape_b: &Shape,
    xf_b: &Transform2Fix,
    _child_b: usize,
) {
    *manifold = Manifold::default();

    match (shape_a, shape_b) {
        (
            Shape::Circle {
                center: ca,
                radius: ra,
            },
            Shape::Circle {
                center: cb,
                radius: rb,
            },
        ) => collide_circles(manifold, *ca, *ra, xf_a, *cb, *rb, xf_b),

        (
            Shape::Polygon {
                vertices,
                normals,
                count,
                radius,
                ..
            },
            Shape::Circle {
                center: cb,
                radius: rb,
            },
        ) => collide_polygon_circle(
            manifold,
            &vertices[..*count],
            &normals[..*count],
            *radius,
            xf_a,
            *cb,
            *rb,
            xf_b,
        ),

        (Shape::Polygon { .. }, Shape::Polygon { .. }) => {
            let a = PolyView::from_shape(shape_a);
            let b = PolyView::from_shape(shape_b);
            collide_poly_views(manifold, &a, xf_a, &b, xf_b);
        }

        (
            Shape::Edge { v1, v2 },
            Shape::Circle {
                center: cb,
                radius: rb,
            },
        ) => collide_edge_circle(manifold, *v1, *v2, xf_a, *cb, *rb, xf_b),

        (Shape::Edge { v1, v2 }, Shape::Polygon { .. }) => {
            let two_gon = EdgePoly::new(*v1, *v2);
            let b = PolyView::from_shape(shape_b);
            collide_poly_views(manifold, &two_gon.view(), xf_a, &b, xf_b);
        }

        (
            Shape::Chain { .. },
            Shape::Circle {
                center: cb,
                radius: rb,
            },
        ) => {
            if let Some((v1, v2)) = shape_a.chain_child_edge(child_a) {
                collide_edge_circle(manifold, v1, v2, xf_a, *cb, *rb, xf_b);
            }
        }

        (Shape::Chain { .. }, Shape::Polygon { .. }) => {
            if let Some((v1, v2)) = shape_a.chain_child_edge(child_a) {
                let two_gon = EdgePoly::new(v1, v2);
                let b = PolyView::from_shape(shape_b);
                collide_poly_views(manifold, &two_gon.view(), xf_a, &b, xf_b);
            }
        }

        // Segment-segment pairs (edge/chain vs edge/chain) have no interior
        // to push out of and are not collided.
        _ => {}
    }
}

// ============================================================================
// Circle pairs
// ============================================================================

fn collide_circles(
    manifold: &mut Manifold,
    center_a: Vec2Fix,
    radius_a: Fix64,
    xf_a: &Transform2Fix,
    center_b: Vec2Fix,
    radius_b: Fix64,
    xf_b: &Transform2Fix,
) {
    let p_a = xf_a.apply(center_a);
    let p_b = xf_b.apply(center_b);
    let d = p_b - p_a;
    let dist_sq = d.length_squared();
    let r = radius_a + radius_b;
    if dist_sq > r * r {
        return;
    }

    manifold.kind = ManifoldKind::Circles;
    manifold.local_point = center_a;
    manifold.local_normal = Vec2Fix::ZERO;
    manifold.count = 1;
    manifold.points[0].local_point = center_b;
    manifold.points[0].id = ContactFeature::default();
}

#[allow(clippy::too_many_arguments)]
fn collide_polygon_circle(
    manifold: &mut Manifold,
    vertices: &[Vec2Fix],
    normals: &[Vec2Fix],
    poly_radius: Fix64,
    xf_a: &Transform2Fix,
    center_b: Vec2Fix,
    radius_b: Fix64,
    xf_b: &Transform2Fix,
) {
    // Circle center in the polygon's frame
    let c = xf_a.apply_inv(xf_b.apply(center_b));
    let radius = poly_radius + radius_b;
    let count = vertices.len();

    // Face of maximum separation
    let mut separation = Fix64::MIN;
    let mut best = 0usize;
    for i in 0..count {
        let s = normals[i].dot(c - vertices[i]);
        if s > radius {
            return;
        }
        if s > separation {
            separation = s;
            best = i;
        }
    }

    let v1 = vertices[best];
    let v2 = vertices[(best + 1) % count];

    manifold.kind = ManifoldKind::FaceA;
    manifold.count = 1;
    manifold.points[0].local_point = center_b;
    manifold.points[0].id = ContactFeature::default();

    // Center inside the polygon: the deepest face wins outright.
    if separation < LINEAR_SLOP {
        manifold.local_normal = normals[best];
        manifold.local_point = (v1 + v2) * Fix64::HALF;
        return;
    }

    // Voronoi regions of the reference face
    let u1 = (c - v1).dot(v2 - v1);
    let u2 = (c - v2).dot(v1 - v2);
    if u1 <= Fix64::ZERO {
        if (c - v1).length_squared() > radius * radius {
            manifold.count = 0;
            return;
        }
        manifold.local_normal = (c - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= Fix64::ZERO {
        if (c - v2).length_squared() > radius * radius {
            manifold.count = 0;
            return;
        }
        manifold.local_normal = (c - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = (v1 + v2) * Fix64::HALF;
        if (c - face_center).dot(normals[best]) > radius {
            manifold.count = 0;
            return;
        }
        manifold.local_normal = normals[best];
        manifold.local_point = face_center;
    }
}

fn collide_edge_circle(
    manifold: &mut Manifold,
    v1: Vec2Fix,
    v2: Vec2Fix,
    xf_a: &Transform2Fix,
    center_b: Vec2Fix,
    radius_b: Fix64,
    xf_b: &Transform2Fix,
) {
    // Circle center in the edge's frame
    let q = xf_a.apply_inv(xf_b.apply(center_b));
    let e = v2 - v1;
    let radius = POLYGON_RADIUS + radius_b;

    // Barycentric coordinates of the projection onto the segment
    let u = e.dot(v2 - q);
    let v = e.dot(q - v1);

    let vertex_region = |manifold: &mut Manifold, p: Vec2Fix, index: u8| {
        if (q - p).length_squared() > radius * radius {
            return;
        }
        manifold.kind = ManifoldKind::Circles;
        manifold.local_normal = Vec2Fix::ZERO;
        manifold.local_point = p;
        manifold.count = 1;
        manifold.points[0].local_point = center_b;
        manifold.points[0].id = ContactFeature {
            index_a: index,
            index_b: 0,
            type_a: FEATURE_VERTEX,
            type_b: FEATURE_VERTEX,
        };
    };

    if v <= Fix64::ZERO {
        vertex_region(manifold, v1, 0);
        return;
    }
    if u <= Fix64::ZERO {
        vertex_region(manifold, v2, 1);
        return;
    }

    // Interior region: closest point on the segment
    let den = e.length_squared();
    if den.is_zero() {
        return;
    }
    let p = (v1 * u + v2 * v) / den;
    if (q - p).length_squared() > radius * radius {
        return;
    }

    let mut n = e.perp();
    if n.dot(q - v1) < Fix64::ZERO {
        n = -n;
    }
    manifold.kind = ManifoldKind::FaceA;
    manifold.local_normal = n.normalize();
    manifold.local_point = v1;
    manifold.count = 1;
    manifold.points[0].local_point = center_b;
    manifold.points[0].id = ContactFeature {
        index_a: 0,
        index_b: 0,
        type_a: FEATURE_FACE,
        type_b: FEATURE_VERTEX,
    };
}

// ============================================================================
// Polygon-polygon (SAT + clipping)
// ============================================================================

/// Borrowed polygon data, so edges can masquerade as thin two-gons.
struct PolyView<'a> {
    vertices: &'a [Vec2Fix],
    normals: &'a [Vec2Fix],
    radius: Fix64,
}

/// Backing storage for an edge's two-gon view.
struct EdgePoly {
    vertices: [Vec2Fix; 2],
    normals: [Vec2Fix; 2],
}

impl<'a> PolyView<'a> {
    fn from_shape(shape: &'a Shape) -> Self {
        match shape {
            Shape::Polygon {
                vertices,
                normals,
                count,
                radius,
                ..
            } => Self {
                vertices: &vertices[..*count],
                normals: &normals[..*count],
                radius: *radius,
            },
            _ => unreachable!("PolyView::from_shape on non-polygon"),
        }
    }
}

impl EdgePoly {
    fn new(v1: Vec2Fix, v2: Vec2Fix) -> Self {
        let n = (v2 - v1).perp_right().normalize();
        Self {
            vertices: [v1, v2],
            normals: [n, -n],
        }
    }

    fn view(&self) -> PolyView<'_> {
        PolyView {
            vertices: &self.vertices,
            normals: &self.normals,
            radius: POLYGON_RADIUS,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct ClipVertex {
    v: Vec2Fix,
    id: ContactFeature,
}

/// Maximum separation of `poly2`'s hull from `poly1`'s faces.
fn find_max_separation(
    poly1: &PolyView<'_>,
    xf1: &Transform2Fix,
    poly2: &PolyView<'_>,
    xf2: &Transform2Fix,
) -> (Fix64, usize) {
    // Work entirely in poly2's frame
    let xf = Transform2Fix {
        p: xf2.apply_inv(xf1.p),
        q: xf2.q.mul_t(xf1.q),
    };

    let mut best_sep = Fix64::MIN;
    let mut best_index = 0usize;
    for i in 0..poly1.vertices.len() {
        let n = xf.q.apply(poly1.normals[i]);
        let v1 = xf.apply(poly1.vertices[i]);

        let mut si = Fix64::MAX;
        for &v2 in poly2.vertices {
            let s = n.dot(v2 - v1);
            if s < si {
                si = s;
            }
        }
        if si > best_sep {
            best_sep = si;
            best_index = i;
        }
    }
    (best_sep, best_index)
}

/// The edge of `poly2` most anti-parallel to `poly1`'s reference face normal.
fn find_incident_edge(
    poly1: &PolyView<'_>,
    xf1: &Transform2Fix,
    edge1: usize,
    poly2: &PolyView<'_>,
    xf2: &Transform2Fix,
) -> [ClipVertex; 2] {
    let count2 = poly2.vertices.len();
    // Reference normal in poly2's frame
    let normal1 = xf2.q.apply_inv(xf1.q.apply(poly1.normals[edge1]));

    let mut index = 0usize;
    let mut min_dot = Fix64::MAX;
    for (i, n) in poly2.normals.iter().enumerate() {
        let d = normal1.dot(*n);
        if d < min_dot {
            min_dot = d;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (index + 1) % count2;
    [
        ClipVertex {
            v: xf2.apply(poly2.vertices[i1]),
            id: ContactFeature {
                index_a: edge1 as u8,
                index_b: i1 as u8,
                type_a: FEATURE_FACE,
                type_b: FEATURE_VERTEX,
            },
        },
        ClipVertex {
            v: xf2.apply(poly2.vertices[i2]),
            id: ContactFeature {
                index_a: edge1 as u8,
                index_b: i2 as u8,
                type_a: FEATURE_FACE,
                type_b: FEATURE_VERTEX,
            },
        },
    ]
}

/// Sutherland-Hodgman clip of a two-point segment against one half-plane.
fn clip_segment(
    input: &[ClipVertex; 2],
    normal: Vec2Fix,
    offset: Fix64,
    vertex_index_a: usize,
) -> ([ClipVertex; 2], usize) {
    let mut out = [ClipVertex::default(); 2];
    let mut count = 0;

    let d0 = normal.dot(input[0].v) - offset;
    let d1 = normal.dot(input[1].v) - offset;

    if d0 <= Fix64::ZERO {
        out[count] = input[0];
        count += 1;
    }
    if d1 <= Fix64::ZERO {
        out[count] = input[1];
        count += 1;
    }

    if d0 * d1 < Fix64::ZERO {
        // Crossing point gets a fresh vertex id from the clip plane
        let t = d0 / (d0 - d1);
        out[count].v = input[0].v.lerp(input[1].v, t);
        out[count].id = ContactFeature {
            index_a: vertex_index_a as u8,
            index_b: input[0].id.index_b,
            type_a: FEATURE_VERTEX,
            type_b: FEATURE_FACE,
        };
        count += 1;
    }
    (out, count)
}

fn collide_poly_views(
    manifold: &mut Manifold,
    a: &PolyView<'_>,
    xf_a: &Transform2Fix,
    b: &PolyView<'_>,
    xf_b: &Transform2Fix,
) {
    let total_radius = a.radius + b.radius;

    let (sep_a, edge_a) = find_max_separation(a, xf_a, b, xf_b);
    if sep_a > total_radius {
        return;
    }
    let (sep_b, edge_b) = find_max_separation(b, xf_b, a, xf_a);
    if sep_b > total_radius {
        return;
    }

    let k_tol = LINEAR_SLOP * Fix64::from_ratio(1, 10);
    let (poly1, poly2, xf1, xf2, edge1, flip) = if sep_b > sep_a + k_tol {
        manifold.kind = ManifoldKind::FaceB;
        (b, a, xf_b, xf_a, edge_b, true)
    } else {
        manifold.kind = ManifoldKind::FaceA;
        (a, b, xf_a, xf_b, edge_a, false)
    };

    let incident = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let count1 = poly1.vertices.len();
    let iv1 = edge1;
    let iv2 = (edge1 + 1) % count1;
    let v11 = poly1.vertices[iv1];
    let v12 = poly1.vertices[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = local_tangent.perp_right();
    let plane_point = (v11 + v12) * Fix64::HALF;

    let tangent = xf1.q.apply(local_tangent);
    let normal = tangent.perp_right();
    let w11 = xf1.apply(v11);
    let w12 = xf1.apply(v12);

    let front_offset = normal.dot(w11);
    let side_offset1 = -tangent.dot(w11) + total_radius;
    let side_offset2 = tangent.dot(w12) + total_radius;

    let (clip1, n1) = clip_segment(&incident, -tangent, side_offset1, iv1);
    if n1 < 2 {
        manifold.count = 0;
        return;
    }
    let (clip2, n2) = clip_segment(&clip1, tangent, side_offset2, iv2);
    if n2 < 2 {
        manifold.count = 0;
        return;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    let mut point_count = 0;
    for cv in &clip2 {
        let separation = normal.dot(cv.v) - front_offset;
        if separation <= total_radius {
            let mp = &mut manifold.points[point_count];
            mp.local_point = xf2.apply_inv(cv.v);
            mp.id = if flip { cv.id.swapped() } else { cv.id };
            point_count += 1;
        }
    }
    manifold.count = point_count;
    if point_count == 0 {
        manifold.kind = ManifoldKind::Circles;
    }
}

// Silence the unused-constant lint path when polygons shrink below capacity.
const _: () = assert!(MAX_MANIFOLD_POINTS <= MAX_POLYGON_VERTICES);

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

    fn xf(x: i64, y: i64) -> Transform2Fix {
        Transform2Fix::new(Vec2Fix::from_int(x, y), Rot2Fix::IDENTITY)
    }

    #[test]
    fn test_circles_overlapping() {
        let a = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let b = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let mut m = Manifold::default();
        evaluate(&mut m, &a, &xf(0, 0), 0, &b, &xf(1, 0), 0);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::Circles);

        let wm = WorldManifold::initialize(&m, &xf(0, 0), Fix64::ONE, &xf(1, 0), Fix64::ONE);
        assert!((wm.normal.x - Fix64::ONE).abs() < tol());
        assert!(wm.normal.y.abs() < tol());
        // Centers 1 apart, radii sum 2: separation = -1
        assert!((wm.separations[0] + Fix64::ONE).abs() < tol());
    }

    #[test]
    fn test_circles_apart() {
        let a = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let b = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let mut m = Manifold::default();
        evaluate(&mut m, &a, &xf(0, 0), 0, &b, &xf(5, 0), 0);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_circles_symmetry() {
        let a = Shape::circle(Vec2Fix::ZERO, Fix64::ONE);
        let b = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let mut m_ab = Manifold::default();
        let mut m_ba = Manifold::default();
        evaluate(&mut m_ab, &a, &xf(0, 0), 0, &b, &xf(1, 0), 0);
        evaluate(&mut m_ba, &b, &xf(1, 0), 0, &a, &xf(0, 0), 0);

        let wm_ab =
            WorldManifold::initialize(&m_ab, &xf(0, 0), Fix64::ONE, &xf(1, 0), Fix64::HALF);
        let wm_ba =
            WorldManifold::initialize(&m_ba, &xf(1, 0), Fix64::HALF, &xf(0, 0), Fix64::ONE);
        // Swapped operands negate the normal and agree on the contact point
        assert!((wm_ab.normal + wm_ba.normal).length() < tol());
        assert!((wm_ab.points[0] - wm_ba.points[0]).length() < tol());
    }

    #[test]
    fn test_polygon_circle_face_contact() {
        let poly = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let mut m = Manifold::default();
        // Circle resting just above the top face
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::ZERO, Fix64::ONE + Fix64::from_ratio(4, 10)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &poly, &xf(0, 0), 0, &circle, &xf_b, 0);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::FaceA);
        assert!((m.local_normal.y - Fix64::ONE).abs() < tol());
    }

    #[test]
    fn test_polygon_circle_vertex_region_miss() {
        let poly = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::from_ratio(1, 10));
        let mut m = Manifold::default();
        // Diagonal corner: close in x but outside the corner radius
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::from_ratio(15, 10), Fix64::from_ratio(15, 10)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &poly, &xf(0, 0), 0, &circle, &xf_b, 0);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_polygon_circle_center_inside() {
        let poly = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let mut m = Manifold::default();
        evaluate(&mut m, &poly, &xf(0, 0), 0, &circle, &xf(0, 0), 0);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::FaceA);
    }

    #[test]
    fn test_boxes_face_contact_two_points() {
        let a = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let b = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let mut m = Manifold::default();
        // Overlapping by 0.1 vertically
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::ZERO, Fix64::from_ratio(19, 10)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &a, &xf(0, 0), 0, &b, &xf_b, 0);
        assert_eq!(m.count, 2);

        let wm = WorldManifold::initialize(&m, &xf(0, 0), POLYGON_RADIUS, &xf_b, POLYGON_RADIUS);
        // Normal points from A toward B: up
        assert!((wm.normal.y.abs() - Fix64::ONE).abs() < tol());
        assert!(wm.separations[0] < Fix64::ZERO);
        assert!(wm.separations[1] < Fix64::ZERO);
    }

    #[test]
    fn test_boxes_apart() {
        let a = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let b = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let mut m = Manifold::default();
        evaluate(&mut m, &a, &xf(0, 0), 0, &b, &xf(5, 5), 0);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_box_pair_feature_ids_stable() {
        let a = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let b = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let mut m1 = Manifold::default();
        let mut m2 = Manifold::default();
        let xf_b1 = Transform2Fix::new(
            Vec2Fix::new(Fix64::ZERO, Fix64::from_ratio(19, 10)),
            Rot2Fix::IDENTITY,
        );
        // Slightly shifted, same touching features
        let xf_b2 = Transform2Fix::new(
            Vec2Fix::new(Fix64::from_ratio(1, 100), Fix64::from_ratio(19, 10)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m1, &a, &xf(0, 0), 0, &b, &xf_b1, 0);
        evaluate(&mut m2, &a, &xf(0, 0), 0, &b, &xf_b2, 0);
        assert_eq!(m1.count, 2);
        assert_eq!(m2.count, 2);
        let keys1 = [m1.points[0].id.key(), m1.points[1].id.key()];
        let keys2 = [m2.points[0].id.key(), m2.points[1].id.key()];
        assert_eq!(keys1, keys2);
    }

    #[test]
    fn test_edge_circle_interior() {
        let edge = Shape::edge(Vec2Fix::from_int(-2, 0), Vec2Fix::from_int(2, 0));
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let mut m = Manifold::default();
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::ZERO, Fix64::from_ratio(4, 10)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &edge, &xf(0, 0), 0, &circle, &xf_b, 0);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::FaceA);
        // Normal points up toward the circle
        assert!(m.local_normal.y > Fix64::ZERO);
    }

    #[test]
    fn test_edge_circle_endpoint_region() {
        let edge = Shape::edge(Vec2Fix::from_int(-2, 0), Vec2Fix::from_int(2, 0));
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let mut m = Manifold::default();
        // Past the right endpoint, inside the combined radius
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::from_int(2) + Fix64::from_ratio(3, 10), Fix64::ZERO),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &edge, &xf(0, 0), 0, &circle, &xf_b, 0);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::Circles);
    }

    #[test]
    fn test_edge_polygon_contact() {
        let edge = Shape::edge(Vec2Fix::from_int(-5, 0), Vec2Fix::from_int(5, 0));
        let poly = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let mut m = Manifold::default();
        // Box resting on the edge with slight overlap
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::ZERO, Fix64::from_ratio(95, 100)),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &edge, &xf(0, 0), 0, &poly, &xf_b, 0);
        assert_eq!(m.count, 2);
    }

    #[test]
    fn test_chain_child_dispatch() {
        let chain = Shape::chain(
            &[
                Vec2Fix::from_int(-4, 0),
                Vec2Fix::from_int(0, 0),
                Vec2Fix::from_int(4, 0),
            ],
            false,
        );
        let circle = Shape::circle(Vec2Fix::ZERO, Fix64::HALF);
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::from_int(2), Fix64::from_ratio(4, 10)),
            Rot2Fix::IDENTITY,
        );
        // Child 1 spans x in [0, 4] and is under the circle
        let mut m = Manifold::default();
        evaluate(&mut m, &chain, &xf(0, 0), 1, &circle, &xf_b, 0);
        assert_eq!(m.count, 1);
        // Child 0 is far away
        let mut m0 = Manifold::default();
        evaluate(&mut m0, &chain, &xf(0, 0), 0, &circle, &xf_b, 0);
        assert_eq!(m0.count, 0);
    }

    #[test]
    fn test_dispatch_ordering() {
        assert!(!dispatch_swapped(ShapeKind::Polygon, ShapeKind::Circle));
        assert!(dispatch_swapped(ShapeKind::Circle, ShapeKind::Polygon));
        assert!(!dispatch_swapped(ShapeKind::Edge, ShapeKind::Polygon));
        assert!(dispatch_swapped(ShapeKind::Polygon, ShapeKind::Edge));
        assert!(!dispatch_swapped(ShapeKind::Circle, ShapeKind::Circle));
    }

    #[test]
    fn test_deep_penetration_valid_normal() {
        let a = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let b = Shape::box_shape(Fix64::ONE, Fix64::ONE);
        let mut m = Manifold::default();
        // Nearly coincident boxes
        let xf_b = Transform2Fix::new(
            Vec2Fix::new(Fix64::from_ratio(1, 100), Fix64::ZERO),
            Rot2Fix::IDENTITY,
        );
        evaluate(&mut m, &a, &xf(0, 0), 0, &b, &xf_b, 0);
        assert!(m.count > 0);
        let len = m.local_normal.length();
        assert!((len - Fix64::ONE).abs() < tol());
    }
}
