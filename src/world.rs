//! World
//!
//! The façade over everything: arenas for bodies, fixtures, and joints, the
//! contact manager, the island solver, the particle system, and the step
//! loop that ties them together. Collaborators create and destroy entities
//! here, call [`World::step`] once per frame, and read collision events from
//! the buffered [`ContactEvents`] or a registered [`ContactListener`].
//!
//! The world is locked for the duration of a step: structural mutation from
//! inside a callback returns [`PhysicsError::WorldLocked`] instead of
//! corrupting the arenas mid-solve.
//!
//! # Step order
//!
//! 1. Pair discovery for fixtures created since the last step
//! 2. Narrow phase (`collide`): manifolds, begin/end events
//! 3. Island flood fill and solve (velocities, positions, sleep)
//! 4. Broad-phase proxy synchronization for moved bodies
//! 5. Pair discovery for proxies moved by the solve
//! 6. Particle system step
//! 7. Force accumulator clear

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::arena::Arena;
use crate::body::{Body, BodyDef, BodyHandle, BodyType};
use crate::contact::{mix_friction, mix_restitution, ContactManager};
use crate::error::PhysicsError;
use crate::events::{ContactEvents, ContactListener};
use crate::fixture::{pack_proxy_data, Fixture, FixtureDef, FixtureHandle, FixtureProxy};
use crate::filter::Filter;
use crate::island::Island;
use crate::joint::{Joint, JointDef, JointHandle};
use crate::math::{Aabb2, Fix64, Rot2Fix, Transform2Fix, Vec2Fix};
use crate::particle::{ParticleSystem, ParticleSystemDef};
use crate::profile::StepProfile;
use crate::shape::{RayCastInput, LINEAR_SLOP};
use crate::solver::SolverStep;

// ============================================================================
// Config
// ============================================================================

/// Solver tuning constants. The defaults assume MKS units with bodies in the
/// 0.1 to 10 meter range.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Relative normal velocity below which restitution is ignored
    pub velocity_threshold: Fix64,
    /// Fraction of position error corrected per position iteration
    pub baumgarte: Fix64,
    /// Allowed penetration before position correction kicks in
    pub linear_slop: Fix64,
    /// Cap on per-iteration position correction
    pub max_linear_correction: Fix64,
    /// Cap on per-step translation, bounds tunneling
    pub max_translation: Fix64,
    /// Cap on per-step rotation in radians
    pub max_rotation: Fix64,
    /// Quiescence duration before an island may sleep
    pub time_to_sleep: Fix64,
    /// Linear speed below which a body counts as quiescent
    pub linear_sleep_tolerance: Fix64,
    /// Angular speed below which a body counts as quiescent
    pub angular_sleep_tolerance: Fix64,
    /// Master switch for sleeping
    pub allow_sleep: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: Fix64::ONE,
            baumgarte: Fix64::from_ratio(2, 10),
            linear_slop: LINEAR_SLOP,
            max_linear_correction: Fix64::from_ratio(2, 10),
            max_translation: Fix64::TWO,
            max_rotation: Fix64::HALF_PI,
            time_to_sleep: Fix64::HALF,
            linear_sleep_tolerance: Fix64::from_ratio(1, 100),
            // roughly two degrees per second
            angular_sleep_tolerance: Fix64::from_ratio(349, 10_000),
            allow_sleep: true,
        }
    }
}

// ============================================================================
// World
// ============================================================================

/// The simulation container.
pub struct World {
    gravity: Vec2Fix,
    config: WorldConfig,

    bodies: Arena<Body>,
    fixtures: Arena<Fixture>,
    joints: Arena<Joint>,
    manager: ContactManager,
    island: Island,
    particles: ParticleSystem,
    particle_iterations: u32,

    events: ContactEvents,
    listener: Option<Box<dyn ContactListener>>,
    profile: StepProfile,

    /// True while `step` is running; guards structural mutation.
    locked: bool,
    /// Fixtures were created since the last pair discovery pass.
    new_fixtures: bool,
    /// 1 / dt of the previous step, for warm-start impulse scaling.
    inv_dt_prev: Fix64,
}

impl World {
    #[must_use]
    pub fn new(gravity: Vec2Fix) -> Self {
        Self::with_config(gravity, WorldConfig::default())
    }

    #[must_use]
    pub fn with_config(gravity: Vec2Fix, config: WorldConfig) -> Self {
        Self {
            gravity,
            config,
            bodies: Arena::new(),
            fixtures: Arena::new(),
            joints: Arena::new(),
            manager: ContactManager::new(),
            island: Island::new(),
            particles: ParticleSystem::new(ParticleSystemDef::default()),
            particle_iterations: 1,
            events: ContactEvents::default(),
            listener: None,
            profile: StepProfile::default(),
            locked: false,
            new_fixtures: false,
            inv_dt_prev: Fix64::ZERO,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn gravity(&self) -> Vec2Fix {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2Fix) {
        self.gravity = gravity;
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    #[must_use]
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.manager.contact_count()
    }

    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.index, handle.generation)
    }

    #[must_use]
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.index, handle.generation)
    }

    #[must_use]
    pub fn fixture(&self, handle: FixtureHandle) -> Option<&Fixture> {
        self.fixtures.get(handle.index, handle.generation)
    }

    #[must_use]
    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle.index, handle.generation)
    }

    #[must_use]
    pub fn joint_mut(&mut self, handle: JointHandle) -> Option<&mut Joint> {
        self.joints.get_mut(handle.index, handle.generation)
    }

    /// Handles of all live bodies, in deterministic arena order.
    #[must_use]
    pub fn body_handles(&self) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .map(|(index, _)| BodyHandle {
                index,
                generation: self.bodies.generation_at(index).unwrap_or(u32::MAX),
            })
            .collect()
    }

    /// Events buffered during the most recent step.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &ContactEvents {
        &self.events
    }

    /// Counters for the most recent step.
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    #[inline]
    #[must_use]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    #[inline]
    #[must_use]
    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    /// Relaxation iterations for the particle pressure pass.
    pub fn set_particle_iterations(&mut self, iterations: u32) {
        self.particle_iterations = iterations.max(1);
    }

    /// Install a contact listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listener = Some(listener);
    }

    /// Remove and return the installed listener.
    pub fn take_listener(&mut self) -> Option<Box<dyn ContactListener>> {
        self.listener.take()
    }

    // ------------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------------

    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyHandle, PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let (index, generation) = self.bodies.insert(Body::new(def));
        Ok(BodyHandle { index, generation })
    }

    /// Destroy a body with everything attached to it: joints, fixtures,
    /// proxies, contacts. No end events fire for contacts that die here,
    /// since the entity they would reference is already gone.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        if self.bodies.get(handle.index, handle.generation).is_none() {
            return Err(PhysicsError::StaleBodyHandle);
        }

        let joint_edges: Vec<u32> = self
            .bodies
            .at(handle.index)
            .map(|b| b.joint_edges.clone())
            .unwrap_or_default();
        for ji in joint_edges {
            self.destroy_joint_slot(ji);
        }

        let fixture_indices: Vec<u32> = self
            .bodies
            .at(handle.index)
            .map(|b| b.fixtures.clone())
            .unwrap_or_default();
        for fi in fixture_indices {
            self.manager.destroy_fixture_contacts(
                fi,
                &mut self.bodies,
                &mut self.events,
                false,
            );
            if let Some(fixture) = self.fixtures.at(fi) {
                for proxy in &fixture.proxies {
                    self.manager.broad_phase.destroy_proxy(proxy.proxy_id);
                }
            }
            if let Some(generation) = self.fixtures.generation_at(fi) {
                self.fixtures.remove(fi, generation);
            }
        }

        self.bodies.remove(handle.index, handle.generation);
        Ok(())
    }

    /// Teleport a body. Contacts are refreshed on the next step.
    pub fn set_body_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2Fix,
        angle: Fix64,
    ) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let body = self
            .bodies
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleBodyHandle)?;
        body.transform = Transform2Fix::new(position, Rot2Fix::from_angle(angle));
        body.angle = angle;
        let xf = body.transform;
        let fixture_indices = body.fixtures.clone();

        for fi in fixture_indices {
            let Some(fixture) = self.fixtures.at(fi) else {
                continue;
            };
            for proxy in &fixture.proxies {
                let tight = fixture.shape.compute_aabb(&xf, proxy.child);
                self.manager
                    .broad_phase
                    .move_proxy(proxy.proxy_id, &tight, Vec2Fix::ZERO);
            }
        }
        self.new_fixtures = true;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------------

    pub fn create_fixture(
        &mut self,
        body: BodyHandle,
        def: FixtureDef,
    ) -> Result<FixtureHandle, PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let xf = self
            .bodies
            .get(body.index, body.generation)
            .ok_or(PhysicsError::StaleBodyHandle)?
            .transform;

        let (index, generation) = self.fixtures.insert(Fixture::new(def, body));

        // One broad-phase proxy per shape child.
        if let Some(fixture) = self.fixtures.at_mut(index) {
            for child in 0..fixture.shape.child_count() {
                let tight = fixture.shape.compute_aabb(&xf, child);
                let proxy_id = self
                    .manager
                    .broad_phase
                    .create_proxy(&tight, pack_proxy_data(index, child));
                fixture.proxies.push(FixtureProxy { proxy_id, child });
            }
        }

        if let Some(b) = self.bodies.at_mut(body.index) {
            b.fixtures.push(index);
        }
        self.reset_mass_data(body.index);
        self.new_fixtures = true;
        Ok(FixtureHandle { index, generation })
    }

    /// Destroy a fixture. Contacts that were touching fire their end event.
    pub fn destroy_fixture(&mut self, handle: FixtureHandle) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let body_index = self
            .fixtures
            .get(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?
            .body
            .index;

        self.manager.destroy_fixture_contacts(
            handle.index,
            &mut self.bodies,
            &mut self.events,
            true,
        );
        if let Some(fixture) = self.fixtures.at(handle.index) {
            for proxy in &fixture.proxies {
                self.manager.broad_phase.destroy_proxy(proxy.proxy_id);
            }
        }
        if let Some(body) = self.bodies.at_mut(body_index) {
            body.fixtures.retain(|&fi| fi != handle.index);
        }
        self.fixtures.remove(handle.index, handle.generation);
        self.reset_mass_data(body_index);
        Ok(())
    }

    /// Switch a fixture between solid and sensor behavior. Live contacts pick
    /// up the change immediately.
    pub fn set_sensor(
        &mut self,
        handle: FixtureHandle,
        sensor: bool,
    ) -> Result<(), PhysicsError> {
        let fixture = self
            .fixtures
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?;
        if fixture.sensor == sensor {
            return Ok(());
        }
        fixture.sensor = sensor;
        let body_index = fixture.body.index;
        if let Some(body) = self.bodies.at_mut(body_index) {
            body.set_awake(true);
        }
        self.refresh_contact_materials(handle.index);
        Ok(())
    }

    pub fn set_friction(
        &mut self,
        handle: FixtureHandle,
        friction: Fix64,
    ) -> Result<(), PhysicsError> {
        self.fixtures
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?
            .friction = friction;
        self.refresh_contact_materials(handle.index);
        Ok(())
    }

    pub fn set_restitution(
        &mut self,
        handle: FixtureHandle,
        restitution: Fix64,
    ) -> Result<(), PhysicsError> {
        self.fixtures
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?
            .restitution = restitution;
        self.refresh_contact_materials(handle.index);
        Ok(())
    }

    /// Change density and recompute the owning body's mass data.
    pub fn set_density(
        &mut self,
        handle: FixtureHandle,
        density: Fix64,
    ) -> Result<(), PhysicsError> {
        let fixture = self
            .fixtures
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?;
        fixture.density = density;
        let body_index = fixture.body.index;
        self.reset_mass_data(body_index);
        Ok(())
    }

    /// Replace the collision filter. Existing contacts are re-checked on the
    /// next step and the proxies are re-queried for new pairs.
    pub fn set_filter(
        &mut self,
        handle: FixtureHandle,
        filter: Filter,
    ) -> Result<(), PhysicsError> {
        let fixture = self
            .fixtures
            .get_mut(handle.index, handle.generation)
            .ok_or(PhysicsError::StaleFixtureHandle)?;
        fixture.filter = filter;
        let proxies = fixture.proxies.clone();

        self.manager.flag_for_filtering(handle.index);
        for proxy in proxies {
            self.manager.broad_phase.touch_proxy(proxy.proxy_id);
        }
        self.new_fixtures = true;
        Ok(())
    }

    /// Re-mix friction, restitution, and the sensor flag on every live
    /// contact referencing a fixture.
    fn refresh_contact_materials(&mut self, fixture_index: u32) {
        for ci in self.manager.contact_indices() {
            let Some(contact) = self.manager.contact(ci) else {
                continue;
            };
            if contact.fixture_a.index != fixture_index
                && contact.fixture_b.index != fixture_index
            {
                continue;
            }
            let (Some(fa), Some(fb)) = (
                self.fixtures.at(contact.fixture_a.index),
                self.fixtures.at(contact.fixture_b.index),
            ) else {
                continue;
            };
            let friction = mix_friction(fa.friction, fb.friction);
            let restitution = mix_restitution(fa.restitution, fb.restitution);
            let sensor = fa.sensor || fb.sensor;
            if let Some(contact) = self.manager.contact_mut(ci) {
                contact.friction = friction;
                contact.restitution = restitution;
                contact.sensor = sensor;
            }
        }
    }

    /// Recompute a body's mass, center of mass, and inertia from its
    /// fixtures. A dynamic body whose fixtures sum to zero mass falls back
    /// to unit mass so it still responds to forces.
    fn reset_mass_data(&mut self, body_index: u32) {
        let Some(body) = self.bodies.at(body_index) else {
            return;
        };
        if body.body_type != BodyType::Dynamic {
            let body = match self.bodies.at_mut(body_index) {
                Some(b) => b,
                None => return,
            };
            body.mass = Fix64::ZERO;
            body.inv_mass = Fix64::ZERO;
            body.inertia = Fix64::ZERO;
            body.inv_inertia = Fix64::ZERO;
            body.local_center = Vec2Fix::ZERO;
            return;
        }

        let mut mass = Fix64::ZERO;
        let mut center = Vec2Fix::ZERO;
        let mut inertia = Fix64::ZERO;
        for &fi in &body.fixtures {
            let Some(fixture) = self.fixtures.at(fi) else {
                continue;
            };
            if fixture.density.is_zero() {
                continue;
            }
            let md = fixture.shape.compute_mass(fixture.density);
            mass += md.mass;
            center += md.center * md.mass;
            inertia += md.inertia;
        }

        let old_center;
        let new_center;
        {
            let Some(body) = self.bodies.at_mut(body_index) else {
                return;
            };
            if mass > Fix64::ZERO {
                body.inv_mass = Fix64::ONE / mass;
                center = center * body.inv_mass;
            } else {
                mass = Fix64::ONE;
                body.inv_mass = Fix64::ONE;
                center = Vec2Fix::ZERO;
            }
            body.mass = mass;

            // Inertia about the center of mass (parallel axis).
            inertia -= mass * center.dot(center);
            if inertia > Fix64::ZERO && !body.fixed_rotation {
                body.inertia = inertia;
                body.inv_inertia = Fix64::ONE / inertia;
            } else {
                body.inertia = Fix64::ZERO;
                body.inv_inertia = Fix64::ZERO;
            }

            old_center = body.world_center();
            body.local_center = center;
            new_center = body.world_center();

            // The center moved; keep the velocity field consistent.
            body.linear_velocity += Vec2Fix::cross_scalar_vec(
                body.angular_velocity,
                new_center - old_center,
            );
        }
    }

    // ------------------------------------------------------------------------
    // Joints
    // ------------------------------------------------------------------------

    pub fn create_joint(&mut self, def: &JointDef) -> Result<JointHandle, PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let joint = Joint::from_def(def);
        let body_a = joint.body_a();
        let body_b = joint.body_b();
        let single_body = matches!(def, JointDef::Mouse(_));
        if !single_body && body_a == body_b {
            return Err(PhysicsError::JointOnSingleBody);
        }
        if self.bodies.get(body_a.index, body_a.generation).is_none()
            || self.bodies.get(body_b.index, body_b.generation).is_none()
        {
            return Err(PhysicsError::StaleBodyHandle);
        }

        let (index, generation) = self.joints.insert(joint);
        if let Some(b) = self.bodies.at_mut(body_a.index) {
            b.joint_edges.push(index);
            b.set_awake(true);
        }
        if body_b.index != body_a.index {
            if let Some(b) = self.bodies.at_mut(body_b.index) {
                b.joint_edges.push(index);
                b.set_awake(true);
            }
        }
        Ok(JointHandle { index, generation })
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        if self.joints.get(handle.index, handle.generation).is_none() {
            return Err(PhysicsError::StaleJointHandle);
        }
        self.destroy_joint_slot(handle.index);
        Ok(())
    }

    fn destroy_joint_slot(&mut self, index: u32) {
        let Some(joint) = self.joints.at(index) else {
            return;
        };
        let body_a = joint.body_a();
        let body_b = joint.body_b();
        for bi in [body_a.index, body_b.index] {
            if let Some(body) = self.bodies.at_mut(bi) {
                body.joint_edges.retain(|&ji| ji != index);
                body.set_awake(true);
            }
        }
        if let Some(generation) = self.joints.generation_at(index) {
            self.joints.remove(index, generation);
        }
    }

    // ------------------------------------------------------------------------
    // Step
    // ------------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    pub fn step(
        &mut self,
        dt: Fix64,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }

        self.profile.reset();
        self.events.clear();

        if self.new_fixtures {
            self.manager
                .find_new_contacts(&mut self.bodies, &self.fixtures);
            self.new_fixtures = false;
        }

        self.locked = true;
        let mut listener = self.listener.take();

        let inv_dt = if dt > Fix64::ZERO {
            Fix64::ONE / dt
        } else {
            Fix64::ZERO
        };
        let step = SolverStep {
            dt,
            inv_dt,
            dt_ratio: self.inv_dt_prev * dt,
            velocity_iterations,
            position_iterations,
        };

        self.manager.collide(
            &mut self.bodies,
            &self.fixtures,
            &mut self.events,
            listener.as_deref_mut(),
            &mut self.profile,
        );

        if dt > Fix64::ZERO {
            self.solve_islands(&step, &mut listener);
            self.synchronize_fixtures(dt);
            self.manager
                .find_new_contacts(&mut self.bodies, &self.fixtures);
            self.profile.broad_phase_pairs = self.manager.broad_phase.last_pair_count() as u32;

            self.profile.particle_contacts =
                self.particles
                    .step(dt, self.gravity, self.particle_iterations);

            // Next step's warm-start ratio is computed against this step.
            self.inv_dt_prev = step.inv_dt;
        }

        self.clear_forces();
        self.profile.sleeping_bodies = self
            .bodies
            .iter()
            .filter(|(_, b)| b.body_type != BodyType::Static && !b.awake)
            .count() as u32;

        self.listener = listener;
        self.locked = false;
        Ok(())
    }

    /// Flood-fill islands over awake bodies and solve each one.
    ///
    /// Static bodies anchor islands but are never expanded, so two stacks
    /// resting on shared ground solve independently; their island flag is
    /// cleared after each island so the ground can anchor the next one.
    fn solve_islands(
        &mut self,
        step: &SolverStep,
        listener: &mut Option<Box<dyn ContactListener>>,
    ) {
        let Self {
            gravity,
            config,
            bodies,
            fixtures,
            joints,
            manager,
            island,
            profile,
            ..
        } = self;

        for bi in bodies.indices() {
            if let Some(body) = bodies.at_mut(bi) {
                body.island = false;
            }
        }
        for ci in manager.contact_indices() {
            if let Some(contact) = manager.contact_mut(ci) {
                contact.island = false;
            }
        }
        let mut visited_joints: BTreeSet<u32> = BTreeSet::new();
        let mut stack: Vec<u32> = Vec::new();

        for seed in bodies.indices() {
            {
                let Some(body) = bodies.at(seed) else {
                    continue;
                };
                if body.island || !body.awake || body.body_type == BodyType::Static {
                    continue;
                }
            }

            island.clear();
            stack.clear();
            stack.push(seed);
            if let Some(body) = bodies.at_mut(seed) {
                body.island = true;
            }

            while let Some(bi) = stack.pop() {
                let is_static;
                {
                    let Some(body) = bodies.at_mut(bi) else {
                        continue;
                    };
                    island.add_body(bi, body);
                    is_static = body.body_type == BodyType::Static;
                    if !is_static {
                        // A body dragged into an island cannot stay asleep.
                        body.set_awake(true);
                    }
                }
                if is_static {
                    continue;
                }

                let contact_edges = bodies
                    .at(bi)
                    .map(|b| b.contact_edges.clone())
                    .unwrap_or_default();
                for ci in contact_edges {
                    let other;
                    {
                        let Some(contact) = manager.contact_mut(ci) else {
                            continue;
                        };
                        if contact.island
                            || !contact.touching
                            || !contact.enabled
                            || contact.sensor
                        {
                            continue;
                        }
                        contact.island = true;
                        other = if contact.body_a.index == bi {
                            contact.body_b.index
                        } else {
                            contact.body_a.index
                        };
                    }
                    island.contacts.push(ci);
                    if let Some(body) = bodies.at_mut(other) {
                        if !body.island {
                            body.island = true;
                            stack.push(other);
                        }
                    }
                }

                let joint_edges = bodies
                    .at(bi)
                    .map(|b| b.joint_edges.clone())
                    .unwrap_or_default();
                for ji in joint_edges {
                    if visited_joints.contains(&ji) {
                        continue;
                    }
                    let Some(joint) = joints.at(ji) else {
                        continue;
                    };
                    let ends = [joint.body_a().index, joint.body_b().index];
                    visited_joints.insert(ji);
                    island.joints.push(ji);
                    for other in ends {
                        if other == bi {
                            continue;
                        }
                        if let Some(body) = bodies.at_mut(other) {
                            if !body.island {
                                body.island = true;
                                stack.push(other);
                            }
                        }
                    }
                }
            }

            island.solve(
                step,
                *gravity,
                config,
                bodies,
                manager,
                joints,
                fixtures,
                listener.as_deref_mut(),
            );
            profile.islands += 1;
            profile.solved_bodies += island.bodies.len() as u32;

            // Statics may anchor any number of islands.
            for &bi in &island.bodies {
                if let Some(body) = bodies.at_mut(bi) {
                    if body.body_type == BodyType::Static {
                        body.island = false;
                    }
                }
            }
        }
    }

    /// Push solved transforms back into the broad phase.
    fn synchronize_fixtures(&mut self, dt: Fix64) {
        let Self {
            bodies,
            fixtures,
            manager,
            ..
        } = self;
        for bi in bodies.indices() {
            let Some(body) = bodies.at(bi) else {
                continue;
            };
            if body.body_type == BodyType::Static || !body.awake {
                continue;
            }
            let xf = body.transform;
            let displacement = body.linear_velocity * dt;
            for &fi in &body.fixtures {
                let Some(fixture) = fixtures.at(fi) else {
                    continue;
                };
                for proxy in &fixture.proxies {
                    let tight = fixture.shape.compute_aabb(&xf, proxy.child);
                    manager
                        .broad_phase
                        .move_proxy(proxy.proxy_id, &tight, displacement);
                }
            }
        }
    }

    fn clear_forces(&mut self) {
        for bi in self.bodies.indices() {
            if let Some(body) = self.bodies.at_mut(bi) {
                body.force = Vec2Fix::ZERO;
                body.torque = Fix64::ZERO;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Visit every fixture whose fat AABB overlaps `aabb`. The callback
    /// returns false to stop early.
    pub fn query_aabb<F>(&self, aabb: &Aabb2, mut callback: F)
    where
        F: FnMut(FixtureHandle) -> bool,
    {
        let broad_phase = &self.manager.broad_phase;
        let fixtures = &self.fixtures;
        broad_phase.query(aabb, |proxy| {
            let (index, _child) = crate::fixture::unpack_proxy_data(broad_phase.data(proxy));
            match fixtures.generation_at(index) {
                Some(generation) => callback(FixtureHandle { index, generation }),
                None => true,
            }
        });
    }

    /// Cast a ray from `p1` to `p2`. For each fixture hit the callback
    /// receives the fixture, the world hit point, the surface normal, and
    /// the hit fraction, and returns the new max fraction: zero terminates,
    /// the reported fraction finds the closest hit, one finds every hit.
    pub fn ray_cast<F>(&self, p1: Vec2Fix, p2: Vec2Fix, mut callback: F)
    where
        F: FnMut(FixtureHandle, Vec2Fix, Vec2Fix, Fix64) -> Fix64,
    {
        let broad_phase = &self.manager.broad_phase;
        let fixtures = &self.fixtures;
        let bodies = &self.bodies;
        let input = RayCastInput {
            p1,
            p2,
            max_fraction: Fix64::ONE,
        };
        broad_phase.ray_cast(&input, |sub_input, proxy| {
            let (index, child) = crate::fixture::unpack_proxy_data(broad_phase.data(proxy));
            let Some(fixture) = fixtures.at(index) else {
                return sub_input.max_fraction;
            };
            let Some(body) = bodies.at(fixture.body.index) else {
                return sub_input.max_fraction;
            };
            let Some(hit) = fixture.shape.ray_cast(sub_input, &body.transform, child) else {
                return sub_input.max_fraction;
            };
            let generation = fixtures.generation_at(index).unwrap_or(u32::MAX);
            let point = sub_input.p1 + (sub_input.p2 - sub_input.p1) * hit.fraction;
            callback(
                FixtureHandle { index, generation },
                point,
                hit.normal,
                hit.fraction,
            )
        });
    }

    /// First fixture whose solid geometry contains a world point.
    #[must_use]
    pub fn test_point(&self, p: Vec2Fix) -> Option<FixtureHandle> {
        let probe = Aabb2::new(p, p).expanded(LINEAR_SLOP);
        let mut found = None;
        let broad_phase = &self.manager.broad_phase;
        let fixtures = &self.fixtures;
        let bodies = &self.bodies;
        broad_phase.query(&probe, |proxy| {
            let (index, _child) = crate::fixture::unpack_proxy_data(broad_phase.data(proxy));
            let Some(fixture) = fixtures.at(index) else {
                return true;
            };
            let Some(body) = bodies.at(fixture.body.index) else {
                return true;
            };
            if fixture.shape.test_point(&body.transform, p) {
                let generation = fixtures.generation_at(index).unwrap_or(u32::MAX);
                found = Some(FixtureHandle { index, generation });
                return false;
            }
            true
        });
        found
    }
}
