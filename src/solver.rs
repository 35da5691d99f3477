//! Contact Constraint Solver
//!
//! Sequential-impulse velocity solver plus a non-linear Gauss-Seidel position
//! pass, operating on the island's scratch position/velocity buffers.
//!
//! Each touching manifold point contributes one normal row and one friction
//! row. Accumulated impulses are warm started from the previous step (matched
//! by feature id upstream) and written back afterwards. The restitution bias
//! is computed once at constraint init so bounce is never double-counted
//! across iterations. The position pass nudges penetrating bodies apart with
//! a capped Baumgarte factor and never touches velocities.

use alloc::vec::Vec;

use crate::arena::Arena;
use crate::body::Body;
use crate::collision::{ManifoldKind, MAX_MANIFOLD_POINTS};
use crate::contact::ContactManager;
use crate::events::ContactImpulses;
use crate::fixture::Fixture;
use crate::math::{Fix64, Rot2Fix, Transform2Fix, Vec2Fix};
use crate::world::WorldConfig;

/// Time-step parameters shared by every constraint in a step.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SolverStep {
    pub dt: Fix64,
    pub inv_dt: Fix64,
    /// dt / previous dt, scales warm-start impulses across step-size changes
    pub dt_ratio: Fix64,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
}

// ============================================================================
// Constraint data
// ============================================================================

#[derive(Clone, Copy, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2Fix,
    r_b: Vec2Fix,
    normal_impulse: Fix64,
    tangent_impulse: Fix64,
    normal_mass: Fix64,
    tangent_mass: Fix64,
    velocity_bias: Fix64,
}

struct VelocityConstraint {
    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],
    count: usize,
    normal: Vec2Fix,
    friction: Fix64,
    index_a: usize,
    index_b: usize,
    inv_mass_a: Fix64,
    inv_mass_b: Fix64,
    inv_i_a: Fix64,
    inv_i_b: Fix64,
    contact_index: u32,
}

struct PositionConstraint {
    local_points: [Vec2Fix; MAX_MANIFOLD_POINTS],
    count: usize,
    local_normal: Vec2Fix,
    local_point: Vec2Fix,
    kind: ManifoldKind,
    radius_a: Fix64,
    radius_b: Fix64,
    index_a: usize,
    index_b: usize,
    inv_mass_a: Fix64,
    inv_mass_b: Fix64,
    inv_i_a: Fix64,
    inv_i_b: Fix64,
    local_center_a: Vec2Fix,
    local_center_b: Vec2Fix,
}

/// Per-island contact solver over the island's scratch buffers.
pub(crate) struct ContactSolver {
    velocity: Vec<VelocityConstraint>,
    position: Vec<PositionConstraint>,
}

fn transform_of(position: (Vec2Fix, Fix64), local_center: Vec2Fix) -> Transform2Fix {
    let (c, a) = position;
    let q = Rot2Fix::from_angle(a);
    Transform2Fix::new(c - q.apply(local_center), q)
}

impl ContactSolver {
    /// Build constraints for the island's touching, enabled contacts.
    pub(crate) fn new(
        step: &SolverStep,
        contact_indices: &[u32],
        manager: &ContactManager,
        bodies: &Arena<Body>,
        fixtures: &Arena<Fixture>,
        positions: &[(Vec2Fix, Fix64)],
        velocities: &[(Vec2Fix, Fix64)],
        config: &WorldConfig,
    ) -> Self {
        let mut velocity = Vec::with_capacity(contact_indices.len());
        let mut position = Vec::with_capacity(contact_indices.len());

        for &ci in contact_indices {
            let Some(contact) = manager.contact(ci) else {
                continue;
            };
            if !contact.solve_enabled || contact.sensor || contact.manifold.count == 0 {
                continue;
            }
            let (Some(body_a), Some(body_b)) = (
                bodies.at(contact.body_a.index),
                bodies.at(contact.body_b.index),
            ) else {
                continue;
            };
            let (Some(fa), Some(fb)) = (
                fixtures.at(contact.fixture_a.index),
                fixtures.at(contact.fixture_b.index),
            ) else {
                continue;
            };

            let manifold = &contact.manifold;
            let radius_a = fa.shape.surface_radius();
            let radius_b = fb.shape.surface_radius();
            let ia = body_a.island_index;
            let ib = body_b.island_index;

            let mut pc = PositionConstraint {
                local_points: [Vec2Fix::ZERO; MAX_MANIFOLD_POINTS],
                count: manifold.count,
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                kind: manifold.kind,
                radius_a,
                radius_b,
                index_a: ia,
                index_b: ib,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                local_center_a: body_a.local_center,
                local_center_b: body_b.local_center,
            };

            let xf_a = transform_of(positions[ia], body_a.local_center);
            let xf_b = transform_of(positions[ib], body_b.local_center);
            let wm = crate::collision::WorldManifold::initialize(
                manifold, &xf_a, radius_a, &xf_b, radius_b,
            );

            let mut vc = VelocityConstraint {
                points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                count: manifold.count,
                normal: wm.normal,
                friction: contact.friction,
                index_a: ia,
                index_b: ib,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                contact_index: ci,
            };

            let tangent = wm.normal.perp_right();
            let (v_a, w_a) = velocities[ia];
            let (v_b, w_b) = velocities[ib];
            let center_a = positions[ia].0;
            let center_b = positions[ib].0;

            for i in 0..manifold.count {
                pc.local_points[i] = manifold.points[i].local_point;

                let point = &mut vc.points[i];
                point.r_a = wm.points[i] - center_a;
                point.r_b = wm.points[i] - center_b;
                // Warm-start impulses carry over scaled by the step ratio,
                // so a dt change does not over- or under-apply them.
                point.normal_impulse = manifold.points[i].normal_impulse * step.dt_ratio;
                point.tangent_impulse = manifold.points[i].tangent_impulse * step.dt_ratio;

                let rn_a = point.r_a.cross(wm.normal);
                let rn_b = point.r_b.cross(wm.normal);
                let k_normal = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rn_a * rn_a
                    + body_b.inv_inertia * rn_b * rn_b;
                point.normal_mass = if k_normal.is_zero() {
                    Fix64::ZERO
                } else {
                    Fix64::ONE / k_normal
                };

                let rt_a = point.r_a.cross(tangent);
                let rt_b = point.r_b.cross(tangent);
                let k_tangent = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rt_a * rt_a
                    + body_b.inv_inertia * rt_b * rt_b;
                point.tangent_mass = if k_tangent.is_zero() {
                    Fix64::ZERO
                } else {
                    Fix64::ONE / k_tangent
                };

                // Restitution bias, set once here so iterations cannot
                // double-count the bounce.
                let rel = v_b + Vec2Fix::cross_scalar_vec(w_b, point.r_b)
                    - v_a
                    - Vec2Fix::cross_scalar_vec(w_a, point.r_a);
                let vn = rel.dot(wm.normal);
                if vn < -config.velocity_threshold {
                    point.velocity_bias = -contact.restitution * vn;
                }
            }

            velocity.push(vc);
            position.push(pc);
        }

        Self { velocity, position }
    }

    /// Apply last frame's accumulated impulses before iterating.
    pub(crate) fn warm_start(&mut self, velocities: &mut [(Vec2Fix, Fix64)]) {
        for vc in &self.velocity {
            let tangent = vc.normal.perp_right();
            let (mut v_a, mut w_a) = velocities[vc.index_a];
            let (mut v_b, mut w_b) = velocities[vc.index_b];

            for point in vc.points.iter().take(vc.count) {
                let p = vc.normal * point.normal_impulse + tangent * point.tangent_impulse;
                v_a -= p * vc.inv_mass_a;
                w_a -= vc.inv_i_a * point.r_a.cross(p);
                v_b += p * vc.inv_mass_b;
                w_b += vc.inv_i_b * point.r_b.cross(p);
            }

            velocities[vc.index_a] = (v_a, w_a);
            velocities[vc.index_b] = (v_b, w_b);
        }
    }

    /// One projected Gauss-Seidel sweep over all velocity constraints.
    pub(crate) fn solve_velocity(&mut self, velocities: &mut [(Vec2Fix, Fix64)]) {
        for vc in &mut self.velocity {
            let normal = vc.normal;
            let tangent = normal.perp_right();
            let (mut v_a, mut w_a) = velocities[vc.index_a];
            let (mut v_b, mut w_b) = velocities[vc.index_b];

            // Friction first, clamped by the normal impulse from the
            // previous sweep (Coulomb cone).
            for point in vc.points.iter_mut().take(vc.count) {
                let rel = v_b + Vec2Fix::cross_scalar_vec(w_b, point.r_b)
                    - v_a
                    - Vec2Fix::cross_scalar_vec(w_a, point.r_a);
                let vt = rel.dot(tangent);
                let lambda = point.tangent_mass * -vt;

                let max_friction = vc.friction * point.normal_impulse;
                let new_impulse =
                    (point.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let lambda = new_impulse - point.tangent_impulse;
                point.tangent_impulse = new_impulse;

                let p = tangent * lambda;
                v_a -= p * vc.inv_mass_a;
                w_a -= vc.inv_i_a * point.r_a.cross(p);
                v_b += p * vc.inv_mass_b;
                w_b += vc.inv_i_b * point.r_b.cross(p);
            }

            // Normal rows, accumulated impulse clamped to stay >= 0.
            for point in vc.points.iter_mut().take(vc.count) {
                let rel = v_b + Vec2Fix::cross_scalar_vec(w_b, point.r_b)
                    - v_a
                    - Vec2Fix::cross_scalar_vec(w_a, point.r_a);
                let vn = rel.dot(normal);
                let lambda = -point.normal_mass * (vn - point.velocity_bias);

                let new_impulse = (point.normal_impulse + lambda).max(Fix64::ZERO);
                let lambda = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;

                let p = normal * lambda;
                v_a -= p * vc.inv_mass_a;
                w_a -= vc.inv_i_a * point.r_a.cross(p);
                v_b += p * vc.inv_mass_b;
                w_b += vc.inv_i_b * point.r_b.cross(p);
            }

            velocities[vc.index_a] = (v_a, w_a);
            velocities[vc.index_b] = (v_b, w_b);
        }
    }

    /// Write accumulated impulses back into the manifolds for next frame's
    /// warm start, and report them for `post_solve`.
    pub(crate) fn store_impulses(
        &self,
        manager: &mut ContactManager,
    ) -> Vec<(u32, ContactImpulses)> {
        let mut report = Vec::with_capacity(self.velocity.len());
        for vc in &self.velocity {
            let mut impulses = ContactImpulses {
                count: vc.count,
                ..Default::default()
            };
            if let Some(contact) = manager.contact_mut(vc.contact_index) {
                for i in 0..vc.count {
                    contact.manifold.points[i].normal_impulse = vc.points[i].normal_impulse;
                    contact.manifold.points[i].tangent_impulse = vc.points[i].tangent_impulse;
                    impulses.normal[i] = vc.points[i].normal_impulse;
                    impulses.tangent[i] = vc.points[i].tangent_impulse;
                }
            }
            report.push((vc.contact_index, impulses));
        }
        report
    }

    /// One position-correction sweep. Returns true once the worst remaining
    /// penetration is within tolerance.
    pub(crate) fn solve_position(
        &mut self,
        positions: &mut [(Vec2Fix, Fix64)],
        config: &WorldConfig,
    ) -> bool {
        let mut min_separation = Fix64::ZERO;

        for pc in &self.position {
            let (mut c_a, mut a_a) = positions[pc.index_a];
            let (mut c_b, mut a_b) = positions[pc.index_b];

            for i in 0..pc.count {
                let xf_a = transform_of((c_a, a_a), pc.local_center_a);
                let xf_b = transform_of((c_b, a_b), pc.local_center_b);
                let (normal, point, separation) = position_manifold(pc, &xf_a, &xf_b, i);

                min_separation = min_separation.min(separation);

                // Capped correction: resolve most of the overlap but never
                // all of it in one sweep, which would inject energy.
                let c = (config.baumgarte * (separation + config.linear_slop))
                    .clamp(-config.max_linear_correction, Fix64::ZERO);

                let r_a = point - c_a;
                let r_b = point - c_b;
                let rn_a = r_a.cross(normal);
                let rn_b = r_b.cross(normal);
                let k = pc.inv_mass_a
                    + pc.inv_mass_b
                    + pc.inv_i_a * rn_a * rn_a
                    + pc.inv_i_b * rn_b * rn_b;
                let impulse = if k > Fix64::ZERO { -c / k } else { Fix64::ZERO };

                let p = normal * impulse;
                c_a -= p * pc.inv_mass_a;
                a_a -= pc.inv_i_a * r_a.cross(p);
                c_b += p * pc.inv_mass_b;
                a_b += pc.inv_i_b * r_b.cross(p);
            }

            positions[pc.index_a] = (c_a, a_a);
            positions[pc.index_b] = (c_b, a_b);
        }

        // Tolerate up to three slops so stacks cannot oscillate forever.
        min_separation >= -(config.linear_slop * Fix64::from_int(3))
    }
}

/// World-space normal, point, and separation of one position constraint
/// point under trial transforms.
fn position_manifold(
    pc: &PositionConstraint,
    xf_a: &Transform2Fix,
    xf_b: &Transform2Fix,
    index: usize,
) -> (Vec2Fix, Vec2Fix, Fix64) {
    match pc.kind {
        ManifoldKind::Circles => {
            let point_a = xf_a.apply(pc.local_point);
            let point_b = xf_b.apply(pc.local_points[0]);
            let d = point_b - point_a;
            let normal = if d.length_squared() > Fix64::ZERO {
                d.normalize()
            } else {
                Vec2Fix::UNIT_X
            };
            let point = (point_a + point_b) * Fix64::HALF;
            let separation = d.length() - pc.radius_a - pc.radius_b;
            (normal, point, separation)
        }
        ManifoldKind::FaceA => {
            let normal = xf_a.q.apply(pc.local_normal);
            let plane_point = xf_a.apply(pc.local_point);
            let clip_point = xf_b.apply(pc.local_points[index]);
            let separation =
                (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldKind::FaceB => {
            let normal_b = xf_b.q.apply(pc.local_normal);
            let plane_point = xf_b.apply(pc.local_point);
            let clip_point = xf_a.apply(pc.local_points[index]);
            let separation =
                (clip_point - plane_point).dot(normal_b) - pc.radius_a - pc.radius_b;
            // Report the normal from A toward B
            (-normal_b, clip_point, separation)
        }
    }
}
