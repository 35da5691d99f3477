//! Rigid Bodies
//!
//! Pose, velocity, mass data, and sleep state for one rigid body, plus the
//! edge lists that tie it into the contact and joint graphs. Bodies live in a
//! world-owned arena and are addressed by generation-checked handles; the
//! edge lists hold bare slot indices maintained by the contact manager and
//! the world.

use alloc::vec::Vec;

use crate::math::{Fix64, Rot2Fix, Transform2Fix, Vec2Fix};

/// Generation-checked handle to a body stored in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BodyHandle {
    /// A handle that never resolves. Placeholder for "no body".
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }
}

/// How a body participates in the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves, infinite mass. Terrain and walls.
    #[default]
    Static,
    /// Moves under its own velocity, infinite mass, unaffected by forces.
    Kinematic,
    /// Fully simulated: forces, impulses, collisions.
    Dynamic,
}

/// Blueprint for creating a body.
#[derive(Clone, Copy, Debug)]
pub struct BodyDef {
    /// Simulation role
    pub body_type: BodyType,
    /// Initial world position of the body origin
    pub position: Vec2Fix,
    /// Initial rotation in radians
    pub angle: Fix64,
    /// Initial linear velocity of the origin
    pub linear_velocity: Vec2Fix,
    /// Initial angular velocity (rad/s)
    pub angular_velocity: Fix64,
    /// Velocity fade per second, 0 = none
    pub linear_damping: Fix64,
    /// Angular velocity fade per second, 0 = none
    pub angular_damping: Fix64,
    /// Multiplier on world gravity, 1 = normal
    pub gravity_scale: Fix64,
    /// Prevent all rotation (infinite inertia)
    pub fixed_rotation: bool,
    /// Allow this body to fall asleep when quiescent
    pub allow_sleep: bool,
    /// Start awake
    pub awake: bool,
    /// Opaque collaborator payload
    pub user_data: u64,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            position: Vec2Fix::ZERO,
            angle: Fix64::ZERO,
            linear_velocity: Vec2Fix::ZERO,
            angular_velocity: Fix64::ZERO,
            linear_damping: Fix64::ZERO,
            angular_damping: Fix64::ZERO,
            gravity_scale: Fix64::ONE,
            fixed_rotation: false,
            allow_sleep: true,
            awake: true,
            user_data: 0,
        }
    }
}

impl BodyDef {
    /// A dynamic body at a position, other fields defaulted.
    #[must_use]
    pub fn dynamic(position: Vec2Fix) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position,
            ..Self::default()
        }
    }

    /// A static body at a position, other fields defaulted.
    #[must_use]
    pub fn fixed(position: Vec2Fix) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// One rigid body. Public mutation goes through the world so proxies and
/// contacts stay consistent.
pub struct Body {
    pub(crate) body_type: BodyType,
    /// Body-origin transform
    pub(crate) transform: Transform2Fix,
    /// Rotation angle tracked separately so integration stays exact
    pub(crate) angle: Fix64,
    /// Center of mass in body-local coordinates
    pub(crate) local_center: Vec2Fix,
    /// Linear velocity of the center of mass
    pub(crate) linear_velocity: Vec2Fix,
    pub(crate) angular_velocity: Fix64,
    pub(crate) force: Vec2Fix,
    pub(crate) torque: Fix64,

    pub(crate) mass: Fix64,
    pub(crate) inv_mass: Fix64,
    /// Rotational inertia about the center of mass
    pub(crate) inertia: Fix64,
    pub(crate) inv_inertia: Fix64,

    pub(crate) linear_damping: Fix64,
    pub(crate) angular_damping: Fix64,
    pub(crate) gravity_scale: Fix64,

    /// Seconds of continuous quiescence, reset on any disturbance
    pub(crate) sleep_time: Fix64,
    pub(crate) awake: bool,
    pub(crate) allow_sleep: bool,
    pub(crate) fixed_rotation: bool,
    /// Visited flag for island flood fill, cleared each solve
    pub(crate) island: bool,
    /// Scratch index into the island's position/velocity buffers
    pub(crate) island_index: usize,

    /// Fixture arena indices attached to this body
    pub(crate) fixtures: Vec<u32>,
    /// Contact slot indices touching this body
    pub(crate) contact_edges: Vec<u32>,
    /// Joint slot indices attached to this body
    pub(crate) joint_edges: Vec<u32>,

    pub(crate) user_data: u64,
}

impl Body {
    pub(crate) fn new(def: &BodyDef) -> Self {
        let q = Rot2Fix::from_angle(def.angle);
        let dynamic = def.body_type == BodyType::Dynamic;
        Self {
            body_type: def.body_type,
            transform: Transform2Fix::new(def.position, q),
            angle: def.angle,
            local_center: Vec2Fix::ZERO,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2Fix::ZERO,
            torque: Fix64::ZERO,
            mass: if dynamic { Fix64::ONE } else { Fix64::ZERO },
            inv_mass: if dynamic { Fix64::ONE } else { Fix64::ZERO },
            inertia: Fix64::ZERO,
            inv_inertia: Fix64::ZERO,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            sleep_time: Fix64::ZERO,
            awake: def.awake,
            allow_sleep: def.allow_sleep,
            fixed_rotation: def.fixed_rotation,
            island: false,
            island_index: 0,
            fixtures: Vec::new(),
            contact_edges: Vec::new(),
            joint_edges: Vec::new(),
            user_data: def.user_data,
        }
    }

    /// Simulation role.
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Body-origin transform.
    #[must_use]
    pub fn transform(&self) -> Transform2Fix {
        self.transform
    }

    /// World position of the body origin.
    #[must_use]
    pub fn position(&self) -> Vec2Fix {
        self.transform.p
    }

    /// Rotation in radians.
    #[must_use]
    pub fn angle(&self) -> Fix64 {
        self.angle
    }

    /// World position of the center of mass.
    #[must_use]
    pub fn world_center(&self) -> Vec2Fix {
        self.transform.apply(self.local_center)
    }

    /// Linear velocity of the center of mass.
    #[must_use]
    pub fn linear_velocity(&self) -> Vec2Fix {
        self.linear_velocity
    }

    /// Angular velocity in rad/s.
    #[must_use]
    pub fn angular_velocity(&self) -> Fix64 {
        self.angular_velocity
    }

    /// Total mass. Zero for static and kinematic bodies.
    #[must_use]
    pub fn mass(&self) -> Fix64 {
        self.mass
    }

    /// True if the body is awake and participating in the solver.
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Collaborator payload.
    #[must_use]
    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    /// Set the velocity directly. Wakes the body if nonzero.
    pub fn set_linear_velocity(&mut self, v: Vec2Fix) {
        if self.body_type == BodyType::Static {
            return;
        }
        if v.length_squared() > Fix64::ZERO {
            self.set_awake(true);
        }
        self.linear_velocity = v;
    }

    /// Set the angular velocity directly. Wakes the body if nonzero.
    pub fn set_angular_velocity(&mut self, w: Fix64) {
        if self.body_type == BodyType::Static {
            return;
        }
        if w * w > Fix64::ZERO {
            self.set_awake(true);
        }
        self.angular_velocity = w;
    }

    /// Wake or sleep the body. Sleeping zeroes velocities and forces.
    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            // The timer resets only on the asleep-to-awake transition, so a
            // body that stays awake keeps accumulating toward the sleep
            // threshold.
            if !self.awake {
                self.awake = true;
                self.sleep_time = Fix64::ZERO;
            }
        } else {
            self.awake = false;
            self.sleep_time = Fix64::ZERO;
            self.linear_velocity = Vec2Fix::ZERO;
            self.angular_velocity = Fix64::ZERO;
            self.force = Vec2Fix::ZERO;
            self.torque = Fix64::ZERO;
        }
    }

    /// Accumulate a force at the center of mass for the next step.
    pub fn apply_force_to_center(&mut self, force: Vec2Fix) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.set_awake(true);
        self.force += force;
    }

    /// Accumulate a force at a world point (adds torque about the center).
    pub fn apply_force(&mut self, force: Vec2Fix, point: Vec2Fix) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.set_awake(true);
        self.force += force;
        self.torque += (point - self.world_center()).cross(force);
    }

    /// Accumulate a torque for the next step.
    pub fn apply_torque(&mut self, torque: Fix64) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.set_awake(true);
        self.torque += torque;
    }

    /// Instantaneous velocity change at a world point.
    pub fn apply_linear_impulse(&mut self, impulse: Vec2Fix, point: Vec2Fix) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.set_awake(true);
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * (point - self.world_center()).cross(impulse);
    }

    /// Instantaneous angular velocity change.
    pub fn apply_angular_impulse(&mut self, impulse: Fix64) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.set_awake(true);
        self.angular_velocity += self.inv_inertia * impulse;
    }

    /// Rebuild the transform from a solved center-of-mass position and angle.
    pub(crate) fn synchronize_transform(&mut self, center: Vec2Fix, angle: Fix64) {
        self.angle = angle;
        self.transform.q = Rot2Fix::from_angle(angle);
        self.transform.p = center - self.transform.q.apply(self.local_center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_default_mass() {
        let b = Body::new(&BodyDef::default());
        assert_eq!(b.mass, Fix64::ZERO);
        assert_eq!(b.inv_mass, Fix64::ZERO);
    }

    #[test]
    fn test_dynamic_unit_mass_until_fixtures() {
        let b = Body::new(&BodyDef::dynamic(Vec2Fix::ZERO));
        assert_eq!(b.mass, Fix64::ONE);
        assert_eq!(b.inv_mass, Fix64::ONE);
    }

    #[test]
    fn test_sleep_zeroes_motion() {
        let mut b = Body::new(&BodyDef::dynamic(Vec2Fix::ZERO));
        b.set_linear_velocity(Vec2Fix::from_int(3, 0));
        b.apply_torque(Fix64::ONE);
        b.set_awake(false);
        assert!(!b.is_awake());
        assert_eq!(b.linear_velocity, Vec2Fix::ZERO);
        assert_eq!(b.torque, Fix64::ZERO);
    }

    #[test]
    fn test_impulse_wakes() {
        let mut b = Body::new(&BodyDef::dynamic(Vec2Fix::ZERO));
        b.set_awake(false);
        b.apply_linear_impulse(Vec2Fix::from_int(1, 0), Vec2Fix::ZERO);
        assert!(b.is_awake());
        assert_eq!(b.linear_velocity, Vec2Fix::from_int(1, 0));
    }

    #[test]
    fn test_wake_keeps_sleep_timer_while_already_awake() {
        let mut b = Body::new(&BodyDef::dynamic(Vec2Fix::ZERO));
        b.sleep_time = Fix64::HALF;
        b.set_awake(true);
        assert_eq!(b.sleep_time, Fix64::HALF);
        b.set_awake(false);
        b.set_awake(true);
        assert_eq!(b.sleep_time, Fix64::ZERO);
    }

    #[test]
    fn test_static_ignores_forces() {
        let mut b = Body::new(&BodyDef::default());
        b.apply_force_to_center(Vec2Fix::from_int(100, 0));
        assert_eq!(b.force, Vec2Fix::ZERO);
        b.set_linear_velocity(Vec2Fix::from_int(1, 0));
        assert_eq!(b.linear_velocity, Vec2Fix::ZERO);
    }

    #[test]
    fn test_synchronize_transform() {
        let mut b = Body::new(&BodyDef::dynamic(Vec2Fix::ZERO));
        b.local_center = Vec2Fix::from_int(1, 0);
        b.synchronize_transform(Vec2Fix::from_int(5, 0), Fix64::ZERO);
        // Origin sits one unit behind the center
        assert_eq!(b.transform.p, Vec2Fix::from_int(4, 0));
        assert_eq!(b.world_center(), Vec2Fix::from_int(5, 0));
    }
}
