//! Islands
//!
//! An island is a connected component of awake bodies linked by touching
//! contacts and joints, solved as an independent unit. Static bodies anchor
//! islands without merging them: they are added for constraint indexing but
//! never expanded during the flood fill.
//!
//! Sleep is an island-wide decision: the island goes to sleep only when every
//! member has been below the velocity thresholds for the full quiescence
//! duration, and a single restless body keeps the whole island awake.

use alloc::vec::Vec;

use crate::arena::Arena;
use crate::body::{Body, BodyType};
use crate::contact::ContactManager;
use crate::events::ContactListener;
use crate::fixture::Fixture;
use crate::joint::Joint;
use crate::math::{Fix64, Vec2Fix};
use crate::solver::{ContactSolver, SolverStep};
use crate::world::WorldConfig;

/// Scratch buffers for one island, reused across islands and steps.
pub(crate) struct Island {
    /// Body arena indices
    pub bodies: Vec<u32>,
    /// Contact slot indices
    pub contacts: Vec<u32>,
    /// Joint arena indices
    pub joints: Vec<u32>,
    /// Center-of-mass position and angle per island body
    positions: Vec<(Vec2Fix, Fix64)>,
    /// Linear and angular velocity per island body
    velocities: Vec<(Vec2Fix, Fix64)>,
}

impl Island {
    pub(crate) fn new() -> Self {
        Self {
            bodies: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    /// Add a body and record its scratch index on the body itself.
    pub(crate) fn add_body(&mut self, index: u32, body: &mut Body) {
        body.island_index = self.bodies.len();
        body.island = true;
        self.bodies.push(index);
    }

    /// Integrate, solve, integrate, correct, write back, sleep-check.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn solve(
        &mut self,
        step: &SolverStep,
        gravity: Vec2Fix,
        config: &WorldConfig,
        bodies: &mut Arena<Body>,
        manager: &mut ContactManager,
        joints: &mut Arena<Joint>,
        fixtures: &Arena<Fixture>,
        listener: Option<&mut (dyn ContactListener + '_)>,
    ) {
        let h = step.dt;

        // 1. Integrate forces into velocities, apply damping.
        self.positions.clear();
        self.velocities.clear();
        for &bi in &self.bodies {
            let Some(body) = bodies.at_mut(bi) else {
                continue;
            };
            let c = body.world_center();
            let a = body.angle;
            let mut v = body.linear_velocity;
            let mut w = body.angular_velocity;

            if body.body_type == BodyType::Dynamic {
                v += (gravity * body.gravity_scale + body.force * body.inv_mass) * h;
                w += h * body.inv_inertia * body.torque;
                // v *= 1 / (1 + h * damping), a stable first-order fade
                v = v / (Fix64::ONE + h * body.linear_damping);
                w = w / (Fix64::ONE + h * body.angular_damping);
            }

            self.positions.push((c, a));
            self.velocities.push((v, w));
        }

        // 2. Build constraints and warm start.
        let mut contact_solver = ContactSolver::new(
            step,
            &self.contacts,
            manager,
            bodies,
            fixtures,
            &self.positions,
            &self.velocities,
            config,
        );
        contact_solver.warm_start(&mut self.velocities);

        for &ji in &self.joints {
            if let Some(joint) = joints.at_mut(ji) {
                joint.init_velocity_constraints(
                    step,
                    bodies,
                    &self.positions,
                    &mut self.velocities,
                );
            }
        }

        // 3. Velocity iterations, fixed visitation order.
        for _ in 0..step.velocity_iterations {
            for &ji in &self.joints {
                if let Some(joint) = joints.at_mut(ji) {
                    joint.solve_velocity_constraints(step, &mut self.velocities);
                }
            }
            contact_solver.solve_velocity(&mut self.velocities);
        }

        let impulse_report = contact_solver.store_impulses(manager);

        // 4. Integrate positions, clamped to bound tunneling.
        for i in 0..self.bodies.len() {
            let (mut c, mut a) = self.positions[i];
            let (mut v, mut w) = self.velocities[i];

            let translation = v * h;
            if translation.length_squared()
                > config.max_translation * config.max_translation
            {
                let ratio = config.max_translation / translation.length();
                v = v * ratio;
            }
            let rotation = w * h;
            if rotation.abs() > config.max_rotation {
                let ratio = config.max_rotation / rotation.abs();
                w = w * ratio;
            }

            c += v * h;
            a += w * h;

            self.positions[i] = (c, a);
            self.velocities[i] = (v, w);
        }

        // 5. Position correction (does not touch velocities).
        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_ok = contact_solver.solve_position(&mut self.positions, config);
            let mut joints_ok = true;
            for &ji in &self.joints {
                if let Some(joint) = joints.at_mut(ji) {
                    let ok = joint.solve_position_constraints(&mut self.positions);
                    joints_ok = joints_ok && ok;
                }
            }
            if contacts_ok && joints_ok {
                position_solved = true;
                break;
            }
        }

        // 6. Write solved state back to the bodies.
        for (i, &bi) in self.bodies.iter().enumerate() {
            let Some(body) = bodies.at_mut(bi) else {
                continue;
            };
            if body.body_type == BodyType::Static {
                continue;
            }
            let (c, a) = self.positions[i];
            let (v, w) = self.velocities[i];
            body.synchronize_transform(c, a);
            body.linear_velocity = v;
            body.angular_velocity = w;
        }

        // 7. Post-solve callbacks with the applied impulses.
        if let Some(l) = listener {
            for (ci, impulses) in &impulse_report {
                if let Some(contact) = manager.contact(*ci) {
                    let view = crate::events::ContactView {
                        fixture_a: contact.fixture_a,
                        fixture_b: contact.fixture_b,
                        body_a: contact.body_a,
                        body_b: contact.body_b,
                    };
                    l.post_solve(&view, impulses);
                }
            }
        }

        // 8. Island-wide sleep decision.
        if config.allow_sleep {
            let mut min_sleep = Fix64::MAX;
            let lin_tol_sq = config.linear_sleep_tolerance * config.linear_sleep_tolerance;
            let ang_tol_sq = config.angular_sleep_tolerance * config.angular_sleep_tolerance;

            for &bi in &self.bodies {
                let Some(body) = bodies.at_mut(bi) else {
                    continue;
                };
                if body.body_type == BodyType::Static {
                    continue;
                }
                let restless = !body.allow_sleep
                    || body.angular_velocity * body.angular_velocity > ang_tol_sq
                    || body.linear_velocity.length_squared() > lin_tol_sq;
                if restless {
                    body.sleep_time = Fix64::ZERO;
                    min_sleep = Fix64::ZERO;
                } else {
                    body.sleep_time += h;
                    min_sleep = min_sleep.min(body.sleep_time);
                }
            }

            if min_sleep >= config.time_to_sleep && position_solved {
                for &bi in &self.bodies {
                    if let Some(body) = bodies.at_mut(bi) {
                        if body.body_type != BodyType::Static {
                            body.set_awake(false);
                        }
                    }
                }
            }
        }
    }
}
