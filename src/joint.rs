//! Joints
//!
//! Constraints between two bodies, solved inside islands as peers of the
//! contact constraints: the same warm-started sequential-impulse scheme, with
//! a separate position pass.
//!
//! - [`DistanceJoint`]: holds two anchor points at a fixed distance; a
//!   nonzero frequency turns it into a damped spring
//! - [`RevoluteJoint`]: pins two anchor points together (free rotation)
//! - [`MouseJoint`]: soft drag of one body toward a moving world target

use crate::arena::Arena;
use crate::body::{Body, BodyHandle};
use crate::math::{Fix64, Rot2Fix, Vec2Fix};
use crate::shape::LINEAR_SLOP;
use crate::solver::SolverStep;

/// Generation-checked handle to a joint stored in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl JointHandle {
    /// A handle that never resolves.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }
}

// ============================================================================
// 2x2 effective-mass matrix
// ============================================================================

/// Column-major 2x2 matrix for two-row constraint solves.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Mat22 {
    pub ex: Vec2Fix,
    pub ey: Vec2Fix,
}

impl Mat22 {
    /// Solve `A x = b`. Returns zero when the matrix is singular.
    pub(crate) fn solve(&self, b: Vec2Fix) -> Vec2Fix {
        let det = self.ex.x * self.ey.y - self.ey.x * self.ex.y;
        if det.is_zero() {
            return Vec2Fix::ZERO;
        }
        Vec2Fix {
            x: (self.ey.y * b.x - self.ey.x * b.y) / det,
            y: (self.ex.x * b.y - self.ex.y * b.x) / det,
        }
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// Definition of a [`DistanceJoint`].
#[derive(Clone, Copy, Debug)]
pub struct DistanceJointDef {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
    /// Anchor in body A's local frame
    pub local_anchor_a: Vec2Fix,
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2Fix,
    /// Rest length between the anchors
    pub length: Fix64,
    /// Spring frequency in Hz; zero makes the joint rigid
    pub frequency: Fix64,
    /// Spring damping ratio
    pub damping_ratio: Fix64,
}

/// Definition of a [`RevoluteJoint`].
#[derive(Clone, Copy, Debug)]
pub struct RevoluteJointDef {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
    /// Pivot in body A's local frame
    pub local_anchor_a: Vec2Fix,
    /// Pivot in body B's local frame
    pub local_anchor_b: Vec2Fix,
}

/// Definition of a [`MouseJoint`].
#[derive(Clone, Copy, Debug)]
pub struct MouseJointDef {
    /// The dragged body
    pub body: BodyHandle,
    /// Grab point in the body's local frame
    pub local_anchor: Vec2Fix,
    /// Initial world-space target
    pub target: Vec2Fix,
    /// Force cap, scaled by the body's mass in typical use
    pub max_force: Fix64,
    /// Softness frequency in Hz
    pub frequency: Fix64,
    /// Softness damping ratio
    pub damping_ratio: Fix64,
}

/// Any joint definition, for `World::create_joint`.
#[derive(Clone, Copy, Debug)]
pub enum JointDef {
    /// Fixed-distance constraint
    Distance(DistanceJointDef),
    /// Pin constraint
    Revolute(RevoluteJointDef),
    /// Target drag constraint
    Mouse(MouseJointDef),
}

// ============================================================================
// Joint storage
// ============================================================================

/// Distance constraint state.
pub struct DistanceJoint {
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,
    pub(crate) local_anchor_a: Vec2Fix,
    pub(crate) local_anchor_b: Vec2Fix,
    pub(crate) length: Fix64,
    pub(crate) frequency: Fix64,
    pub(crate) damping_ratio: Fix64,

    // solver scratch
    index_a: usize,
    index_b: usize,
    u: Vec2Fix,
    r_a: Vec2Fix,
    r_b: Vec2Fix,
    local_center_a: Vec2Fix,
    local_center_b: Vec2Fix,
    inv_mass_a: Fix64,
    inv_mass_b: Fix64,
    inv_i_a: Fix64,
    inv_i_b: Fix64,
    mass: Fix64,
    impulse: Fix64,
    gamma: Fix64,
    bias: Fix64,
}

/// Pin constraint state.
pub struct RevoluteJoint {
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,
    pub(crate) local_anchor_a: Vec2Fix,
    pub(crate) local_anchor_b: Vec2Fix,

    index_a: usize,
    index_b: usize,
    r_a: Vec2Fix,
    r_b: Vec2Fix,
    local_center_a: Vec2Fix,
    local_center_b: Vec2Fix,
    inv_mass_a: Fix64,
    inv_mass_b: Fix64,
    inv_i_a: Fix64,
    inv_i_b: Fix64,
    mass: Mat22,
    impulse: Vec2Fix,
}

/// Target drag constraint state. The "other side" is the world itself.
pub struct MouseJoint {
    pub(crate) body: BodyHandle,
    pub(crate) local_anchor: Vec2Fix,
    pub(crate) target: Vec2Fix,
    pub(crate) max_force: Fix64,
    pub(crate) frequency: Fix64,
    pub(crate) damping_ratio: Fix64,

    index_b: usize,
    r_b: Vec2Fix,
    local_center_b: Vec2Fix,
    inv_mass_b: Fix64,
    inv_i_b: Fix64,
    mass: Mat22,
    impulse: Vec2Fix,
    gamma: Fix64,
    beta: Fix64,
    c: Vec2Fix,
}

/// A constraint between two bodies, stored in the world's joint arena.
pub enum Joint {
    /// Fixed-distance constraint
    Distance(DistanceJoint),
    /// Pin constraint
    Revolute(RevoluteJoint),
    /// Target drag constraint
    Mouse(MouseJoint),
}

impl Joint {
    pub(crate) fn from_def(def: &JointDef) -> Self {
        match def {
            JointDef::Distance(d) => Self::Distance(DistanceJoint {
                body_a: d.body_a,
                body_b: d.body_b,
                local_anchor_a: d.local_anchor_a,
                local_anchor_b: d.local_anchor_b,
                length: d.length,
                frequency: d.frequency,
                damping_ratio: d.damping_ratio,
                index_a: 0,
                index_b: 0,
                u: Vec2Fix::ZERO,
                r_a: Vec2Fix::ZERO,
                r_b: Vec2Fix::ZERO,
                local_center_a: Vec2Fix::ZERO,
                local_center_b: Vec2Fix::ZERO,
                inv_mass_a: Fix64::ZERO,
                inv_mass_b: Fix64::ZERO,
                inv_i_a: Fix64::ZERO,
                inv_i_b: Fix64::ZERO,
                mass: Fix64::ZERO,
                impulse: Fix64::ZERO,
                gamma: Fix64::ZERO,
                bias: Fix64::ZERO,
            }),
            JointDef::Revolute(d) => Self::Revolute(RevoluteJoint {
                body_a: d.body_a,
                body_b: d.body_b,
                local_anchor_a: d.local_anchor_a,
                local_anchor_b: d.local_anchor_b,
                index_a: 0,
                index_b: 0,
                r_a: Vec2Fix::ZERO,
                r_b: Vec2Fix::ZERO,
                local_center_a: Vec2Fix::ZERO,
                local_center_b: Vec2Fix::ZERO,
                inv_mass_a: Fix64::ZERO,
                inv_mass_b: Fix64::ZERO,
                inv_i_a: Fix64::ZERO,
                inv_i_b: Fix64::ZERO,
                mass: Mat22::default(),
                impulse: Vec2Fix::ZERO,
            }),
            JointDef::Mouse(d) => Self::Mouse(MouseJoint {
                body: d.body,
                local_anchor: d.local_anchor,
                target: d.target,
                max_force: d.max_force,
                frequency: d.frequency,
                damping_ratio: d.damping_ratio,
                index_b: 0,
                r_b: Vec2Fix::ZERO,
                local_center_b: Vec2Fix::ZERO,
                inv_mass_b: Fix64::ZERO,
                inv_i_b: Fix64::ZERO,
                mass: Mat22::default(),
                impulse: Vec2Fix::ZERO,
                gamma: Fix64::ZERO,
                beta: Fix64::ZERO,
                c: Vec2Fix::ZERO,
            }),
        }
    }

    /// First attached body. Mouse joints attach only one body.
    #[must_use]
    pub fn body_a(&self) -> BodyHandle {
        match self {
            Self::Distance(j) => j.body_a,
            Self::Revolute(j) => j.body_a,
            Self::Mouse(j) => j.body,
        }
    }

    /// Second attached body (same as `body_a` for mouse joints).
    #[must_use]
    pub fn body_b(&self) -> BodyHandle {
        match self {
            Self::Distance(j) => j.body_b,
            Self::Revolute(j) => j.body_b,
            Self::Mouse(j) => j.body,
        }
    }

    /// Update a mouse joint's world target. No-op for other joint kinds.
    pub fn set_mouse_target(&mut self, target: Vec2Fix) {
        if let Self::Mouse(j) = self {
            j.target = target;
        }
    }

    pub(crate) fn init_velocity_constraints(
        &mut self,
        step: &SolverStep,
        bodies: &Arena<Body>,
        positions: &[(Vec2Fix, Fix64)],
        velocities: &mut [(Vec2Fix, Fix64)],
    ) {
        match self {
            Self::Distance(j) => j.init(step, bodies, positions, velocities),
            Self::Revolute(j) => j.init(step, bodies, positions, velocities),
            Self::Mouse(j) => j.init(step, bodies, positions, velocities),
        }
    }

    pub(crate) fn solve_velocity_constraints(
        &mut self,
        step: &SolverStep,
        velocities: &mut [(Vec2Fix, Fix64)],
    ) {
        match self {
            Self::Distance(j) => j.solve_velocity(velocities),
            Self::Revolute(j) => j.solve_velocity(velocities),
            Self::Mouse(j) => j.solve_velocity(step, velocities),
        }
    }

    /// Returns true when the position error is within tolerance.
    pub(crate) fn solve_position_constraints(
        &mut self,
        positions: &mut [(Vec2Fix, Fix64)],
    ) -> bool {
        match self {
            Self::Distance(j) => j.solve_position(positions),
            Self::Revolute(j) => j.solve_position(positions),
            // Soft constraint, no position pass.
            Self::Mouse(_) => true,
        }
    }
}

fn body_params(bodies: &Arena<Body>, handle: BodyHandle) -> (usize, Vec2Fix, Fix64, Fix64) {
    match bodies.at(handle.index) {
        Some(b) => (b.island_index, b.local_center, b.inv_mass, b.inv_inertia),
        None => (0, Vec2Fix::ZERO, Fix64::ZERO, Fix64::ZERO),
    }
}

impl DistanceJoint {
    fn init(
        &mut self,
        step: &SolverStep,
        bodies: &Arena<Body>,
        positions: &[(Vec2Fix, Fix64)],
        velocities: &mut [(Vec2Fix, Fix64)],
    ) {
        let (ia, lc_a, im_a, ii_a) = body_params(bodies, self.body_a);
        let (ib, lc_b, im_b, ii_b) = body_params(bodies, self.body_b);
        self.index_a = ia;
        self.index_b = ib;
        self.local_center_a = lc_a;
        self.local_center_b = lc_b;
        self.inv_mass_a = im_a;
        self.inv_mass_b = im_b;
        self.inv_i_a = ii_a;
        self.inv_i_b = ii_b;

        let (c_a, a_a) = positions[ia];
        let (c_b, a_b) = positions[ib];
        let q_a = Rot2Fix::from_angle(a_a);
        let q_b = Rot2Fix::from_angle(a_b);

        self.r_a = q_a.apply(self.local_anchor_a - lc_a);
        self.r_b = q_b.apply(self.local_anchor_b - lc_b);
        let d = c_b + self.r_b - c_a - self.r_a;

        let (u, len) = d.normalize_with_length();
        self.u = u;

        let cr_a = self.r_a.cross(self.u);
        let cr_b = self.r_b.cross(self.u);
        let inv_mass =
            im_a + ii_a * cr_a * cr_a + im_b + ii_b * cr_b * cr_b;
        let raw_mass = if inv_mass.is_zero() {
            Fix64::ZERO
        } else {
            Fix64::ONE / inv_mass
        };

        if self.frequency > Fix64::ZERO {
            let c = len - self.length;
            let omega = Fix64::TWO_PI * self.frequency;
            let damp = Fix64::TWO * raw_mass * self.damping_ratio * omega;
            let stiff = raw_mass * omega * omega;
            let h = step.dt;
            let gamma = h * (damp + h * stiff);
            self.gamma = if gamma.is_zero() {
                Fix64::ZERO
            } else {
                Fix64::ONE / gamma
            };
            self.bias = c * h * stiff * self.gamma;
            let soft_inv = inv_mass + self.gamma;
            self.mass = if soft_inv.is_zero() {
                Fix64::ZERO
            } else {
                Fix64::ONE / soft_inv
            };
        } else {
            self.gamma = Fix64::ZERO;
            self.bias = Fix64::ZERO;
            self.mass = raw_mass;
        }

        // Warm start with scaled stored impulse
        let p = self.u * (self.impulse * step.dt_ratio);
        self.impulse = self.impulse * step.dt_ratio;
        let (ref mut v_a, ref mut w_a) = velocities[ia];
        *v_a -= p * self.inv_mass_a;
        *w_a -= self.inv_i_a * self.r_a.cross(p);
        let (ref mut v_b, ref mut w_b) = velocities[ib];
        *v_b += p * self.inv_mass_b;
        *w_b += self.inv_i_b * self.r_b.cross(p);
    }

    fn solve_velocity(&mut self, velocities: &mut [(Vec2Fix, Fix64)]) {
        let (v_a, w_a) = velocities[self.index_a];
        let (v_b, w_b) = velocities[self.index_b];

        let vp_a = v_a + Vec2Fix::cross_scalar_vec(w_a, self.r_a);
        let vp_b = v_b + Vec2Fix::cross_scalar_vec(w_b, self.r_b);
        let c_dot = self.u.dot(vp_b - vp_a);

        let impulse = -self.mass * (c_dot + self.bias + self.gamma * self.impulse);
        self.impulse += impulse;

        let p = self.u * impulse;
        velocities[self.index_a].0 = v_a - p * self.inv_mass_a;
        velocities[self.index_a].1 = w_a - self.inv_i_a * self.r_a.cross(p);
        velocities[self.index_b].0 = v_b + p * self.inv_mass_b;
        velocities[self.index_b].1 = w_b + self.inv_i_b * self.r_b.cross(p);
    }

    fn solve_position(&mut self, positions: &mut [(Vec2Fix, Fix64)]) -> bool {
        if self.frequency > Fix64::ZERO {
            // Springs carry their error in the velocity bias instead.
            return true;
        }

        let (c_a, a_a) = positions[self.index_a];
        let (c_b, a_b) = positions[self.index_b];
        let q_a = Rot2Fix::from_angle(a_a);
        let q_b = Rot2Fix::from_angle(a_b);
        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let d = c_b + r_b - c_a - r_a;
        let (u, len) = d.normalize_with_length();
        let max_c = Fix64::from_ratio(2, 10);
        let c = (len - self.length).clamp(-max_c, max_c);

        let impulse = -self.mass * c;
        let p = u * impulse;

        positions[self.index_a].0 = c_a - p * self.inv_mass_a;
        positions[self.index_a].1 = a_a - self.inv_i_a * r_a.cross(p);
        positions[self.index_b].0 = c_b + p * self.inv_mass_b;
        positions[self.index_b].1 = a_b + self.inv_i_b * r_b.cross(p);

        c.abs() < LINEAR_SLOP
    }
}

impl RevoluteJoint {
    fn init(
        &mut self,
        step: &SolverStep,
        bodies: &Arena<Body>,
        positions: &[(Vec2Fix, Fix64)],
        velocities: &mut [(Vec2Fix, Fix64)],
    ) {
        let (ia, lc_a, im_a, ii_a) = body_params(bodies, self.body_a);
        let (ib, lc_b, im_b, ii_b) = body_params(bodies, self.body_b);
        self.index_a = ia;
        self.index_b = ib;
        self.local_center_a = lc_a;
        self.local_center_b = lc_b;
        self.inv_mass_a = im_a;
        self.inv_mass_b = im_b;
        self.inv_i_a = ii_a;
        self.inv_i_b = ii_b;

        let (_c_a, a_a) = positions[ia];
        let (_c_b, a_b) = positions[ib];
        let q_a = Rot2Fix::from_angle(a_a);
        let q_b = Rot2Fix::from_angle(a_b);
        self.r_a = q_a.apply(self.local_anchor_a - lc_a);
        self.r_b = q_b.apply(self.local_anchor_b - lc_b);

        self.mass = point_mass_matrix(im_a, ii_a, self.r_a, im_b, ii_b, self.r_b);

        // Warm start with the step-ratio-scaled stored impulse
        self.impulse = self.impulse * step.dt_ratio;
        let p = self.impulse;
        let (ref mut v_a, ref mut w_a) = velocities[ia];
        *v_a -= p * im_a;
        *w_a -= ii_a * self.r_a.cross(p);
        let (ref mut v_b, ref mut w_b) = velocities[ib];
        *v_b += p * im_b;
        *w_b += ii_b * self.r_b.cross(p);
    }

    fn solve_velocity(&mut self, velocities: &mut [(Vec2Fix, Fix64)]) {
        let (v_a, w_a) = velocities[self.index_a];
        let (v_b, w_b) = velocities[self.index_b];

        let c_dot = v_b + Vec2Fix::cross_scalar_vec(w_b, self.r_b)
            - v_a
            - Vec2Fix::cross_scalar_vec(w_a, self.r_a);
        let impulse = -self.mass.solve(c_dot);
        self.impulse += impulse;

        velocities[self.index_a].0 = v_a - impulse * self.inv_mass_a;
        velocities[self.index_a].1 = w_a - self.inv_i_a * self.r_a.cross(impulse);
        velocities[self.index_b].0 = v_b + impulse * self.inv_mass_b;
        velocities[self.index_b].1 = w_b + self.inv_i_b * self.r_b.cross(impulse);
    }

    fn solve_position(&mut self, positions: &mut [(Vec2Fix, Fix64)]) -> bool {
        let (c_a, a_a) = positions[self.index_a];
        let (c_b, a_b) = positions[self.index_b];
        let q_a = Rot2Fix::from_angle(a_a);
        let q_b = Rot2Fix::from_angle(a_b);
        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let c = c_b + r_b - c_a - r_a;
        let k = point_mass_matrix(
            self.inv_mass_a,
            self.inv_i_a,
            r_a,
            self.inv_mass_b,
            self.inv_i_b,
            r_b,
        );
        let impulse = -k.solve(c);

        positions[self.index_a].0 = c_a - impulse * self.inv_mass_a;
        positions[self.index_a].1 = a_a - self.inv_i_a * r_a.cross(impulse);
        positions[self.index_b].0 = c_b + impulse * self.inv_mass_b;
        positions[self.index_b].1 = a_b + self.inv_i_b * r_b.cross(impulse);

        c.length() < LINEAR_SLOP
    }
}

impl MouseJoint {
    fn init(
        &mut self,
        step: &SolverStep,
        bodies: &Arena<Body>,
        positions: &[(Vec2Fix, Fix64)],
        velocities: &mut [(Vec2Fix, Fix64)],
    ) {
        let (ib, lc_b, im_b, ii_b) = body_params(bodies, self.body);
        self.index_b = ib;
        self.local_center_b = lc_b;
        self.inv_mass_b = im_b;
        self.inv_i_b = ii_b;

        let (c_b, a_b) = positions[ib];
        let q_b = Rot2Fix::from_angle(a_b);
        self.r_b = q_b.apply(self.local_anchor - lc_b);

        // Critically damped soft constraint toward the target
        let omega = Fix64::TWO_PI * self.frequency;
        // The effective mass here is the body's own mass
        let mass = if im_b.is_zero() {
            Fix64::ZERO
        } else {
            Fix64::ONE / im_b
        };
        let damp = Fix64::TWO * mass * self.damping_ratio * omega;
        let stiff = mass * omega * omega;
        let h = step.dt;
        let gamma = h * (damp + h * stiff);
        self.gamma = if gamma.is_zero() {
            Fix64::ZERO
        } else {
            Fix64::ONE / gamma
        };
        self.beta = h * stiff * self.gamma;

        self.c = (c_b + self.r_b - self.target) * self.beta;

        let r = self.r_b;
        self.mass = Mat22 {
            ex: Vec2Fix::new(
                im_b + ii_b * r.y * r.y + self.gamma,
                -ii_b * r.x * r.y,
            ),
            ey: Vec2Fix::new(
                -ii_b * r.x * r.y,
                im_b + ii_b * r.x * r.x + self.gamma,
            ),
        };

        // Warm start
        self.impulse = self.impulse * step.dt_ratio;
        let (ref mut v_b, ref mut w_b) = velocities[ib];
        *v_b += self.impulse * im_b;
        *w_b += ii_b * self.r_b.cross(self.impulse);
    }

    fn solve_velocity(&mut self, step: &SolverStep, velocities: &mut [(Vec2Fix, Fix64)]) {
        let (v_b, w_b) = velocities[self.index_b];

        let c_dot = v_b + Vec2Fix::cross_scalar_vec(w_b, self.r_b);
        let rhs = c_dot + self.c + self.impulse * self.gamma;
        let mut impulse = -self.mass.solve(rhs);

        // Clamp the accumulated impulse to max_force * dt
        let old = self.impulse;
        self.impulse += impulse;
        let max_impulse = step.dt * self.max_force;
        if self.impulse.length_squared() > max_impulse * max_impulse {
            self.impulse = self.impulse.normalize() * max_impulse;
        }
        impulse = self.impulse - old;

        velocities[self.index_b].0 = v_b + impulse * self.inv_mass_b;
        velocities[self.index_b].1 = w_b + self.inv_i_b * self.r_b.cross(impulse);
    }
}

/// Effective-mass matrix of a point-to-point constraint.
fn point_mass_matrix(
    im_a: Fix64,
    ii_a: Fix64,
    r_a: Vec2Fix,
    im_b: Fix64,
    ii_b: Fix64,
    r_b: Vec2Fix,
) -> Mat22 {
    let k11 = im_a + im_b + ii_a * r_a.y * r_a.y + ii_b * r_b.y * r_b.y;
    let k12 = -ii_a * r_a.x * r_a.y - ii_b * r_b.x * r_b.y;
    let k22 = im_a + im_b + ii_a * r_a.x * r_a.x + ii_b * r_b.x * r_b.x;
    Mat22 {
        ex: Vec2Fix::new(k11, k12),
        ey: Vec2Fix::new(k12, k22),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat22_solve() {
        let m = Mat22 {
            ex: Vec2Fix::from_int(2, 0),
            ey: Vec2Fix::from_int(0, 4),
        };
        let x = m.solve(Vec2Fix::from_int(6, 8));
        assert_eq!(x.x.floor_int(), 3);
        assert_eq!(x.y.floor_int(), 2);
    }

    #[test]
    fn test_mat22_singular_returns_zero() {
        let m = Mat22::default();
        assert_eq!(m.solve(Vec2Fix::from_int(1, 1)), Vec2Fix::ZERO);
    }

    #[test]
    fn test_joint_body_accessors() {
        let a = BodyHandle {
            index: 1,
            generation: 0,
        };
        let b = BodyHandle {
            index: 2,
            generation: 0,
        };
        let j = Joint::from_def(&JointDef::Revolute(RevoluteJointDef {
            body_a: a,
            body_b: b,
            local_anchor_a: Vec2Fix::ZERO,
            local_anchor_b: Vec2Fix::ZERO,
        }));
        assert_eq!(j.body_a(), a);
        assert_eq!(j.body_b(), b);

        let m = Joint::from_def(&JointDef::Mouse(MouseJointDef {
            body: b,
            local_anchor: Vec2Fix::ZERO,
            target: Vec2Fix::ZERO,
            max_force: Fix64::from_int(100),
            frequency: Fix64::from_int(5),
            damping_ratio: Fix64::from_ratio(7, 10),
        }));
        assert_eq!(m.body_a(), b);
        assert_eq!(m.body_b(), b);
    }
}
