//! Particle System
//!
//! Grid-accelerated fluid/granular solver over structure-of-arrays buffers.
//! Particles carry bit-OR'd behavior flags and are created in bulk through
//! group definitions that lattice-fill a shape region. Groups track aggregate
//! statistics (mass, center, velocities) recomputed lazily: each group holds
//! the timestamp of its last recompute and compares it against the system's
//! step timestamp, so stats are computed at most once per step and never
//! served stale across steps.
//!
//! The pairwise passes follow the same sequential-impulse philosophy as the
//! rigid-body solver: per-contact velocity corrections applied in a fixed,
//! deterministic order.

use alloc::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::math::{Fix64, Rot2Fix, Transform2Fix, Vec2Fix};
use crate::shape::Shape;
use crate::spatial::SpatialGrid;

// ============================================================================
// Particle flags
// ============================================================================

/// Behavior flags. Bitwise-OR to combine.
pub mod particle_flags {
    /// Plain fluid particle. Zero is the default behavior, not a bit.
    pub const WATER: u32 = 0;
    /// Marked for removal; compacted out at the end of the step.
    pub const ZOMBIE: u32 = 1 << 1;
    /// Immovable barrier particle.
    pub const WALL: u32 = 1 << 2;
    /// Pairwise distance constraints to creation-time neighbors.
    pub const SPRING: u32 = 1 << 3;
    /// Triad shape-memory constraints to creation-time neighbors.
    pub const ELASTIC: u32 = 1 << 4;
    /// Velocity smoothing between neighbors.
    pub const VISCOUS: u32 = 1 << 5;
    /// Repulsion only under compression, no cohesion.
    pub const POWDER: u32 = 1 << 6;
    /// Surface tension.
    pub const TENSILE: u32 = 1 << 7;
}

// ============================================================================
// Definitions
// ============================================================================

/// A single particle to create.
#[derive(Clone, Copy, Debug)]
pub struct ParticleDef {
    pub flags: u32,
    pub position: Vec2Fix,
    pub velocity: Vec2Fix,
    pub color: [u8; 4],
    pub user_data: u64,
}

impl Default for ParticleDef {
    fn default() -> Self {
        Self {
            flags: particle_flags::WATER,
            position: Vec2Fix::ZERO,
            velocity: Vec2Fix::ZERO,
            color: [255, 255, 255, 255],
            user_data: 0,
        }
    }
}

/// A block of particles filling a shape region.
#[derive(Clone, Debug)]
pub struct ParticleGroupDef {
    /// Flags applied to every particle in the group.
    pub flags: u32,
    /// World position of the group origin.
    pub position: Vec2Fix,
    /// World rotation of the group.
    pub angle: Fix64,
    /// Linear velocity applied to every particle.
    pub linear_velocity: Vec2Fix,
    /// Angular velocity about the group origin.
    pub angular_velocity: Fix64,
    /// Region to lattice-fill, in group-local coordinates.
    pub shape: Shape,
    /// Spring/elastic constraint strength in `[0, 1]`.
    pub strength: Fix64,
    pub color: [u8; 4],
    pub user_data: u64,
}

impl ParticleGroupDef {
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            flags: particle_flags::WATER,
            position: Vec2Fix::ZERO,
            angle: Fix64::ZERO,
            linear_velocity: Vec2Fix::ZERO,
            angular_velocity: Fix64::ZERO,
            shape,
            strength: Fix64::ONE,
            color: [255, 255, 255, 255],
            user_data: 0,
        }
    }
}

// ============================================================================
// Groups and constraints
// ============================================================================

/// Aggregate view over a `[first, last)` particle index range.
#[derive(Clone, Copy, Debug)]
pub struct ParticleGroup {
    pub(crate) first: u32,
    pub(crate) last: u32,
    pub(crate) flags: u32,
    pub(crate) user_data: u64,
    /// Step timestamp of the last statistics recompute.
    stats_timestamp: u32,
    mass: Fix64,
    center: Vec2Fix,
    linear_velocity: Vec2Fix,
    angular_velocity: Fix64,
}

impl ParticleGroup {
    #[inline]
    #[must_use]
    pub fn first_index(&self) -> u32 {
        self.first
    }

    #[inline]
    #[must_use]
    pub fn last_index(&self) -> u32 {
        self.last
    }

    #[inline]
    #[must_use]
    pub fn particle_count(&self) -> u32 {
        self.last - self.first
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn user_data(&self) -> u64 {
        self.user_data
    }
}

/// Distance constraint between two particles.
#[derive(Clone, Copy, Debug)]
struct ParticleSpring {
    a: u32,
    b: u32,
    rest_length: Fix64,
    strength: Fix64,
}

/// Shape-memory constraint over three particles. Rest offsets are stored
/// relative to the triad centroid at creation time.
#[derive(Clone, Copy, Debug)]
struct ParticleTriad {
    a: u32,
    b: u32,
    c: u32,
    rest_a: Vec2Fix,
    rest_b: Vec2Fix,
    rest_c: Vec2Fix,
    strength: Fix64,
}

/// One interacting pair found by the neighbor grid. `weight` is the kernel
/// value `1 - distance / diameter`, `normal` points from `a` to `b`.
#[derive(Clone, Copy, Debug)]
struct ParticleContact {
    a: u32,
    b: u32,
    weight: Fix64,
    normal: Vec2Fix,
}

// ============================================================================
// System
// ============================================================================

/// Tuning parameters. Relaxation strengths are per-pass velocity fractions.
#[derive(Clone, Copy, Debug)]
pub struct ParticleSystemDef {
    /// Particle radius; the interaction diameter is twice this.
    pub radius: Fix64,
    /// Overlap-driven repulsion strength.
    pub pressure_strength: Fix64,
    /// Relative-velocity damping on contact.
    pub damping_strength: Fix64,
    pub viscous_strength: Fix64,
    pub spring_strength: Fix64,
    pub elastic_strength: Fix64,
    pub powder_strength: Fix64,
    pub surface_tension_strength: Fix64,
}

impl Default for ParticleSystemDef {
    fn default() -> Self {
        Self {
            radius: Fix64::from_ratio(1, 10),
            pressure_strength: Fix64::from_ratio(1, 20),
            damping_strength: Fix64::ONE,
            viscous_strength: Fix64::from_ratio(1, 4),
            spring_strength: Fix64::from_ratio(1, 4),
            elastic_strength: Fix64::from_ratio(1, 4),
            powder_strength: Fix64::from_ratio(1, 2),
            surface_tension_strength: Fix64::from_ratio(1, 10),
        }
    }
}

/// Structure-of-arrays particle solver.
pub struct ParticleSystem {
    def: ParticleSystemDef,
    inv_diameter: Fix64,
    /// Global step counter, compared against each group's stats timestamp.
    timestamp: u32,

    flags: Vec<u32>,
    positions: Vec<Vec2Fix>,
    velocities: Vec<Vec2Fix>,
    colors: Vec<[u8; 4]>,
    user_data: Vec<u64>,
    /// Per-particle kernel weight sum, rebuilt each step.
    weights: Vec<Fix64>,
    /// Per-particle weighted normal sum, used by the tensile pass.
    normal_sums: Vec<Vec2Fix>,

    groups: Vec<ParticleGroup>,
    springs: Vec<ParticleSpring>,
    triads: Vec<ParticleTriad>,

    grid: SpatialGrid,
    contacts: Vec<ParticleContact>,
}

impl ParticleSystem {
    #[must_use]
    pub fn new(def: ParticleSystemDef) -> Self {
        let diameter = def.radius.double();
        Self {
            def,
            inv_diameter: Fix64::ONE / diameter,
            timestamp: 0,
            flags: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            colors: Vec::new(),
            user_data: Vec::new(),
            weights: Vec::new(),
            normal_sums: Vec::new(),
            groups: Vec::new(),
            springs: Vec::new(),
            triads: Vec::new(),
            grid: SpatialGrid::new(diameter),
            contacts: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn particle_count(&self) -> u32 {
        self.positions.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn radius(&self) -> Fix64 {
        self.def.radius
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec2Fix] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn velocities(&self) -> &[Vec2Fix] {
        &self.velocities
    }

    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    #[inline]
    #[must_use]
    pub fn flags_of(&self, index: u32) -> u32 {
        self.flags[index as usize]
    }

    #[inline]
    #[must_use]
    pub fn group_count(&self) -> u32 {
        self.groups.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn group(&self, index: u32) -> &ParticleGroup {
        &self.groups[index as usize]
    }

    // ------------------------------------------------------------------------
    // Creation / destruction
    // ------------------------------------------------------------------------

    /// Create a single ungrouped particle. Returns its index. Indices are
    /// stable within a step but shift when zombie compaction runs.
    pub fn create_particle(&mut self, def: &ParticleDef) -> u32 {
        let index = self.positions.len() as u32;
        self.flags.push(def.flags);
        self.positions.push(def.position);
        self.velocities.push(def.velocity);
        self.colors.push(def.color);
        self.user_data.push(def.user_data);
        self.weights.push(Fix64::ZERO);
        self.normal_sums.push(Vec2Fix::ZERO);
        index
    }

    /// Flag a particle for removal. The slot survives until the end of the
    /// current step, then compaction reclaims it.
    pub fn destroy_particle(&mut self, index: u32) {
        self.flags[index as usize] |= particle_flags::ZOMBIE;
    }

    /// Lattice-fill the group shape with particles and build spring/elastic
    /// constraints between lattice neighbors. Returns the group index. Group
    /// indices are stable for the system's lifetime; a destroyed group keeps
    /// its slot with an empty range.
    pub fn create_group(&mut self, def: &ParticleGroupDef) -> u32 {
        let first = self.positions.len() as u32;
        // Stride below the interaction diameter, so lattice neighbors start
        // inside each other's kernel support.
        let stride = self.def.radius.double() * Fix64::from_ratio(3, 4);
        let xf = Transform2Fix {
            p: def.position,
            q: Rot2Fix::from_angle(def.angle),
        };
        let identity = Transform2Fix::IDENTITY;
        let aabb = def.shape.compute_aabb(&identity, 0);

        // Lattice coordinates of each created particle, for neighbor wiring.
        let mut lattice: Vec<(i32, i32, u32)> = Vec::new();

        let y_begin = (aabb.min.y / stride).floor_int() as i32;
        let y_end = (aabb.max.y / stride).floor_int() as i32 + 1;
        let x_begin = (aabb.min.x / stride).floor_int() as i32;
        let x_end = (aabb.max.x / stride).floor_int() as i32 + 1;

        for gy in y_begin..=y_end {
            for gx in x_begin..=x_end {
                let local = Vec2Fix::new(
                    stride * Fix64::from_int(i64::from(gx)),
                    stride * Fix64::from_int(i64::from(gy)),
                );
                if !def.shape.test_point(&identity, local) {
                    continue;
                }
                let p = xf.apply(local);
                // v = v_linear + omega x (p - origin)
                let offset = p - def.position;
                let velocity = def.linear_velocity
                    + Vec2Fix::cross_scalar_vec(def.angular_velocity, offset);
                let index = self.create_particle(&ParticleDef {
                    flags: def.flags,
                    position: p,
                    velocity,
                    color: def.color,
                    user_data: def.user_data,
                });
                lattice.push((gx, gy, index));
            }
        }

        let last = self.positions.len() as u32;

        if def.flags & (particle_flags::SPRING | particle_flags::ELASTIC) != 0 {
            self.wire_lattice_constraints(&lattice, def, stride);
        }

        self.groups.push(ParticleGroup {
            first,
            last,
            flags: def.flags,
            user_data: def.user_data,
            stats_timestamp: u32::MAX,
            mass: Fix64::ZERO,
            center: Vec2Fix::ZERO,
            linear_velocity: Vec2Fix::ZERO,
            angular_velocity: Fix64::ZERO,
        });
        self.groups.len() as u32 - 1
    }

    /// Springs between 4-neighborhood lattice pairs; triads over
    /// (cell, right, up) lattice corners.
    fn wire_lattice_constraints(
        &mut self,
        lattice: &[(i32, i32, u32)],
        def: &ParticleGroupDef,
        stride: Fix64,
    ) {
        let find = |gx: i32, gy: i32| -> Option<u32> {
            lattice
                .iter()
                .find(|&&(x, y, _)| x == gx && y == gy)
                .map(|&(_, _, i)| i)
        };
        for &(gx, gy, index) in lattice {
            let right = find(gx + 1, gy);
            let up = find(gx, gy + 1);
            if def.flags & particle_flags::SPRING != 0 {
                for neighbor in [right, up].into_iter().flatten() {
                    self.springs.push(ParticleSpring {
                        a: index,
                        b: neighbor,
                        rest_length: stride,
                        strength: def.strength,
                    });
                }
            }
            if def.flags & particle_flags::ELASTIC != 0 {
                if let (Some(b), Some(c)) = (right, up) {
                    let pa = self.positions[index as usize];
                    let pb = self.positions[b as usize];
                    let pc = self.positions[c as usize];
                    let centroid =
                        (pa + pb + pc) * Fix64::from_ratio(1, 3);
                    self.triads.push(ParticleTriad {
                        a: index,
                        b,
                        c,
                        rest_a: pa - centroid,
                        rest_b: pb - centroid,
                        rest_c: pc - centroid,
                        strength: def.strength,
                    });
                }
            }
        }
    }

    /// Flag every particle of a group for removal and empty its range. The
    /// group slot itself remains so other group indices stay valid.
    pub fn destroy_group(&mut self, group_index: u32) {
        let group = self.groups[group_index as usize];
        for i in group.first..group.last {
            self.flags[i as usize] |= particle_flags::ZOMBIE;
        }
        let g = &mut self.groups[group_index as usize];
        g.last = g.first;
    }

    // ------------------------------------------------------------------------
    // Group statistics
    // ------------------------------------------------------------------------

    /// Recompute aggregate stats if they are stale for the current step.
    fn update_group_statistics(&mut self, group_index: u32) {
        let group = &self.groups[group_index as usize];
        if group.stats_timestamp == self.timestamp {
            return;
        }
        let (first, last) = (group.first, group.last);

        // Unit mass per particle.
        let mut mass = Fix64::ZERO;
        let mut center = Vec2Fix::ZERO;
        let mut linear = Vec2Fix::ZERO;
        for i in first..last {
            mass = mass + Fix64::ONE;
            center = center + self.positions[i as usize];
            linear = linear + self.velocities[i as usize];
        }
        let mut angular = Fix64::ZERO;
        if !mass.is_zero() {
            let inv = Fix64::ONE / mass;
            center = center * inv;
            linear = linear * inv;
            // omega = sum r x (v - v_cm) / sum r.r
            let mut numer = Fix64::ZERO;
            let mut denom = Fix64::ZERO;
            for i in first..last {
                let r = self.positions[i as usize] - center;
                let dv = self.velocities[i as usize] - linear;
                numer = numer + r.cross(dv);
                denom = denom + r.dot(r);
            }
            if !denom.is_zero() {
                angular = numer / denom;
            }
        }

        let g = &mut self.groups[group_index as usize];
        g.mass = mass;
        g.center = center;
        g.linear_velocity = linear;
        g.angular_velocity = angular;
        g.stats_timestamp = self.timestamp;
    }

    #[must_use]
    pub fn group_mass(&mut self, group_index: u32) -> Fix64 {
        self.update_group_statistics(group_index);
        self.groups[group_index as usize].mass
    }

    #[must_use]
    pub fn group_center(&mut self, group_index: u32) -> Vec2Fix {
        self.update_group_statistics(group_index);
        self.groups[group_index as usize].center
    }

    #[must_use]
    pub fn group_linear_velocity(&mut self, group_index: u32) -> Vec2Fix {
        self.update_group_statistics(group_index);
        self.groups[group_index as usize].linear_velocity
    }

    #[must_use]
    pub fn group_angular_velocity(&mut self, group_index: u32) -> Fix64 {
        self.update_group_statistics(group_index);
        self.groups[group_index as usize].angular_velocity
    }

    // ------------------------------------------------------------------------
    // Step
    // ------------------------------------------------------------------------

    /// Advance the particle state by `dt`. Returns the number of particle
    /// contacts processed.
    pub fn step(&mut self, dt: Fix64, gravity: Vec2Fix, iterations: u32) -> u32 {
        self.timestamp = self.timestamp.wrapping_add(1);
        if self.positions.is_empty() {
            return 0;
        }

        // Gravity; wall particles never move.
        let dv = gravity * dt;
        for i in 0..self.velocities.len() {
            if self.flags[i] & particle_flags::WALL == 0 {
                self.velocities[i] = self.velocities[i] + dv;
            }
        }

        self.update_contacts();
        self.accumulate_weights();

        let all_flags = self.flags.iter().fold(0u32, |acc, &f| acc | f);

        if all_flags & particle_flags::SPRING != 0 {
            self.solve_springs();
        }
        if all_flags & particle_flags::ELASTIC != 0 {
            self.solve_elastic();
        }
        if all_flags & particle_flags::VISCOUS != 0 {
            self.solve_viscous();
        }
        if all_flags & particle_flags::POWDER != 0 {
            self.solve_powder();
        }
        if all_flags & particle_flags::TENSILE != 0 {
            self.solve_tensile();
        }
        for _ in 0..iterations.max(1) {
            self.solve_pressure();
        }
        self.solve_damping();

        // Integrate; walls stay pinned.
        for i in 0..self.positions.len() {
            if self.flags[i] & particle_flags::WALL != 0 {
                self.velocities[i] = Vec2Fix::ZERO;
                continue;
            }
            self.positions[i] = self.positions[i] + self.velocities[i] * dt;
        }

        let contact_count = self.contacts.len() as u32;
        if self.flags.iter().any(|f| f & particle_flags::ZOMBIE != 0) {
            self.solve_zombie();
        }
        contact_count
    }

    /// Rebuild the neighbor grid and the contact list. The list is sorted by
    /// index pair so the serial and parallel paths produce identical state.
    fn update_contacts(&mut self) {
        self.grid.rebuild(&self.positions);

        let mut candidates: Vec<(u32, u32)> = Vec::new();
        self.grid.for_each_candidate_pair(|a, b| {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            candidates.push((lo, hi));
        });
        candidates.sort_unstable();
        candidates.dedup();

        let diameter = self.def.radius.double();
        let diameter_sq = diameter * diameter;
        let positions = &self.positions;
        let flags = &self.flags;
        let inv_diameter = self.inv_diameter;

        let make_contact = |&(a, b): &(u32, u32)| -> Option<ParticleContact> {
            if (flags[a as usize] | flags[b as usize]) & particle_flags::ZOMBIE != 0 {
                return None;
            }
            let d = positions[b as usize] - positions[a as usize];
            let dist_sq = d.length_squared();
            if dist_sq.raw >= diameter_sq.raw {
                return None;
            }
            let (normal, length) = d.normalize_with_length();
            let normal = if length.is_zero() {
                Vec2Fix::new(Fix64::ZERO, Fix64::ONE)
            } else {
                normal
            };
            Some(ParticleContact {
                a,
                b,
                weight: Fix64::ONE - length * inv_diameter,
                normal,
            })
        };

        #[cfg(feature = "parallel")]
        {
            self.contacts = candidates.par_iter().filter_map(make_contact).collect();
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.contacts = candidates.iter().filter_map(make_contact).collect();
        }
    }

    fn accumulate_weights(&mut self) {
        for w in &mut self.weights {
            *w = Fix64::ZERO;
        }
        for n in &mut self.normal_sums {
            *n = Vec2Fix::ZERO;
        }
        for c in &self.contacts {
            self.weights[c.a as usize] = self.weights[c.a as usize] + c.weight;
            self.weights[c.b as usize] = self.weights[c.b as usize] + c.weight;
            let wn = c.normal * c.weight;
            self.normal_sums[c.a as usize] = self.normal_sums[c.a as usize] + wn;
            self.normal_sums[c.b as usize] = self.normal_sums[c.b as usize] - wn;
        }
    }

    /// Overlap relaxation: particles above rest weight push apart along the
    /// contact normal, proportional to combined excess weight.
    fn solve_pressure(&mut self) {
        let max_pressure = self.def.pressure_strength * Fix64::from_int(4);
        for c in &self.contacts {
            let wa = (self.weights[c.a as usize] - Fix64::ONE).max(Fix64::ZERO);
            let wb = (self.weights[c.b as usize] - Fix64::ONE).max(Fix64::ZERO);
            let h = (self.def.pressure_strength * (wa + wb))
                .clamp(Fix64::ZERO, max_pressure);
            let impulse = c.normal * (h * c.weight);
            self.velocities[c.a as usize] = self.velocities[c.a as usize] - impulse;
            self.velocities[c.b as usize] = self.velocities[c.b as usize] + impulse;
        }
    }

    /// Kill approach velocity along the contact normal.
    fn solve_damping(&mut self) {
        for c in &self.contacts {
            let dv = self.velocities[c.b as usize] - self.velocities[c.a as usize];
            let vn = dv.dot(c.normal);
            if vn.is_negative() {
                let impulse = c.normal * (self.def.damping_strength * c.weight * vn).half();
                self.velocities[c.a as usize] = self.velocities[c.a as usize] + impulse;
                self.velocities[c.b as usize] = self.velocities[c.b as usize] - impulse;
            }
        }
    }

    fn solve_viscous(&mut self) {
        for c in &self.contacts {
            if (self.flags[c.a as usize] | self.flags[c.b as usize])
                & particle_flags::VISCOUS
                == 0
            {
                continue;
            }
            let dv = self.velocities[c.b as usize] - self.velocities[c.a as usize];
            let impulse = dv * (self.def.viscous_strength * c.weight).half();
            self.velocities[c.a as usize] = self.velocities[c.a as usize] + impulse;
            self.velocities[c.b as usize] = self.velocities[c.b as usize] - impulse;
        }
    }

    /// Powder repels only under strong compression; there is no cohesion.
    fn solve_powder(&mut self) {
        let threshold = Fix64::from_ratio(1, 4);
        for c in &self.contacts {
            if (self.flags[c.a as usize] | self.flags[c.b as usize])
                & particle_flags::POWDER
                == 0
            {
                continue;
            }
            let excess = c.weight - threshold;
            if excess.is_negative() || excess.is_zero() {
                continue;
            }
            let impulse = c.normal * (self.def.powder_strength * excess);
            self.velocities[c.a as usize] = self.velocities[c.a as usize] - impulse;
            self.velocities[c.b as usize] = self.velocities[c.b as usize] + impulse;
        }
    }

    /// Surface tension from the weighted-normal field: pairs pull together
    /// where the field diverges, flattening the free surface.
    fn solve_tensile(&mut self) {
        for c in &self.contacts {
            if (self.flags[c.a as usize] | self.flags[c.b as usize])
                & particle_flags::TENSILE
                == 0
            {
                continue;
            }
            let dn = self.normal_sums[c.a as usize] - self.normal_sums[c.b as usize];
            let s = self.def.surface_tension_strength * c.weight * dn.dot(c.normal);
            let impulse = c.normal * s;
            self.velocities[c.a as usize] = self.velocities[c.a as usize] + impulse;
            self.velocities[c.b as usize] = self.velocities[c.b as usize] - impulse;
        }
    }

    fn solve_springs(&mut self) {
        for s in &self.springs {
            let pa = self.positions[s.a as usize];
            let pb = self.positions[s.b as usize];
            let (normal, length) = (pb - pa).normalize_with_length();
            if length.is_zero() {
                continue;
            }
            let stretch = length - s.rest_length;
            let impulse =
                normal * (self.def.spring_strength * s.strength * stretch).half();
            self.velocities[s.a as usize] = self.velocities[s.a as usize] + impulse;
            self.velocities[s.b as usize] = self.velocities[s.b as usize] - impulse;
        }
    }

    /// Pull each triad corner toward its rest offset from the current
    /// centroid, rotated by the triad's current orientation estimate.
    fn solve_elastic(&mut self) {
        for t in &self.triads {
            let pa = self.positions[t.a as usize];
            let pb = self.positions[t.b as usize];
            let pc = self.positions[t.c as usize];
            let centroid = (pa + pb + pc) * Fix64::from_ratio(1, 3);
            let oa = pa - centroid;
            let ob = pb - centroid;
            let oc = pc - centroid;

            // Orientation from the rest-to-current cross/dot sums.
            let sin_sum = t.rest_a.cross(oa) + t.rest_b.cross(ob) + t.rest_c.cross(oc);
            let cos_sum = t.rest_a.dot(oa) + t.rest_b.dot(ob) + t.rest_c.dot(oc);
            let angle = Fix64::atan2(sin_sum, cos_sum);
            let rot = Rot2Fix::from_angle(angle);

            let k = self.def.elastic_strength * t.strength;
            for (index, rest, current) in [
                (t.a, t.rest_a, oa),
                (t.b, t.rest_b, ob),
                (t.c, t.rest_c, oc),
            ] {
                let target = rot.apply(rest);
                let impulse = (target - current) * k;
                self.velocities[index as usize] =
                    self.velocities[index as usize] + impulse;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Zombie compaction
    // ------------------------------------------------------------------------

    /// Remove zombie particles, preserving relative order so group ranges
    /// stay contiguous. Constraints referencing removed particles are
    /// dropped; survivors are remapped.
    fn solve_zombie(&mut self) {
        let count = self.flags.len();
        let mut new_index: Vec<u32> = Vec::with_capacity(count);
        let mut next = 0u32;
        for &f in &self.flags {
            if f & particle_flags::ZOMBIE != 0 {
                new_index.push(u32::MAX);
            } else {
                new_index.push(next);
                next += 1;
            }
        }
        if next as usize == count {
            return;
        }

        let mut write = 0usize;
        for read in 0..count {
            if new_index[read] == u32::MAX {
                continue;
            }
            self.flags[write] = self.flags[read];
            self.positions[write] = self.positions[read];
            self.velocities[write] = self.velocities[read];
            self.colors[write] = self.colors[read];
            self.user_data[write] = self.user_data[read];
            write += 1;
        }
        self.flags.truncate(write);
        self.positions.truncate(write);
        self.velocities.truncate(write);
        self.colors.truncate(write);
        self.user_data.truncate(write);
        self.weights.truncate(write);
        self.normal_sums.truncate(write);

        self.springs.retain_mut(|s| {
            let (a, b) = (new_index[s.a as usize], new_index[s.b as usize]);
            if a == u32::MAX || b == u32::MAX {
                return false;
            }
            s.a = a;
            s.b = b;
            true
        });
        self.triads.retain_mut(|t| {
            let (a, b, c) = (
                new_index[t.a as usize],
                new_index[t.b as usize],
                new_index[t.c as usize],
            );
            if a == u32::MAX || b == u32::MAX || c == u32::MAX {
                return false;
            }
            t.a = a;
            t.b = b;
            t.c = c;
            true
        });

        // Surviving group members are contiguous, so a range maps to the new
        // indices of its first survivor and one past its last.
        for g in &mut self.groups {
            let mut first = g.last;
            let mut last = g.first;
            for i in g.first..g.last {
                if new_index[i as usize] != u32::MAX {
                    first = first.min(i);
                    last = i + 1;
                }
            }
            if first >= last {
                g.first = 0;
                g.last = 0;
            } else {
                g.first = new_index[first as usize];
                g.last = new_index[(last - 1) as usize] + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn box_group_def(half: i64) -> ParticleGroupDef {
        ParticleGroupDef::new(Shape::box_shape(
            Fix64::from_int(half),
            Fix64::from_int(half),
        ))
    }

    #[test]
    fn test_group_fill_creates_particles() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let g = sys.create_group(&box_group_def(1));
        assert!(sys.group(g).particle_count() > 50);
        let group = *sys.group(g);
        for i in group.first..group.last {
            let p = sys.positions()[i as usize];
            assert!(p.x.abs() <= Fix64::from_int(1));
            assert!(p.y.abs() <= Fix64::from_int(1));
        }
    }

    #[test]
    fn test_group_velocity_applied() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let mut def = box_group_def(1);
        def.linear_velocity = Vec2Fix::from_int(3, 0);
        let g = sys.create_group(&def);
        assert_eq!(sys.group_linear_velocity(g), Vec2Fix::from_int(3, 0));
    }

    #[test]
    fn test_stats_lazy_per_step() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let g = sys.create_group(&box_group_def(1));
        let m1 = sys.group_mass(g);
        let stamp_after_first = sys.groups[g as usize].stats_timestamp;
        let m2 = sys.group_mass(g);
        // Second read in the same step must not recompute.
        assert_eq!(sys.groups[g as usize].stats_timestamp, stamp_after_first);
        assert_eq!(m1.raw, m2.raw);

        sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 1);
        let _ = sys.group_mass(g);
        assert_ne!(sys.groups[g as usize].stats_timestamp, stamp_after_first);
    }

    #[test]
    fn test_group_lattice_neighbors_make_contacts() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        sys.create_group(&box_group_def(1));
        let contacts = sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 1);
        assert!(contacts > 0);
    }

    #[test]
    fn test_pressure_pushes_overlapping_apart() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let r = sys.radius();
        let a = sys.create_particle(&ParticleDef {
            position: Vec2Fix::ZERO,
            ..ParticleDef::default()
        });
        let b = sys.create_particle(&ParticleDef {
            position: Vec2Fix::new(r, Fix64::ZERO),
            ..ParticleDef::default()
        });
        // Surround them so weights exceed the rest threshold.
        for k in 1..=4 {
            sys.create_particle(&ParticleDef {
                position: Vec2Fix::new(Fix64::ZERO, r * Fix64::from_ratio(k, 4)),
                ..ParticleDef::default()
            });
            sys.create_particle(&ParticleDef {
                position: Vec2Fix::new(r, r * Fix64::from_ratio(k, 4)),
                ..ParticleDef::default()
            });
        }
        sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 4);
        let va = sys.velocities()[a as usize];
        let vb = sys.velocities()[b as usize];
        // Relative velocity along the a->b axis separates them.
        assert!((vb.x - va.x).raw > 0);
    }

    #[test]
    fn test_zombie_compaction_preserves_survivors() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let a = sys.create_particle(&ParticleDef {
            position: Vec2Fix::from_int(0, 0),
            user_data: 10,
            ..ParticleDef::default()
        });
        let _b = sys.create_particle(&ParticleDef {
            position: Vec2Fix::from_int(5, 0),
            user_data: 20,
            ..ParticleDef::default()
        });
        let c = sys.create_particle(&ParticleDef {
            position: Vec2Fix::from_int(9, 0),
            user_data: 30,
            ..ParticleDef::default()
        });
        assert_eq!((a, c), (0, 2));
        sys.destroy_particle(1);
        sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 1);
        assert_eq!(sys.particle_count(), 2);
        assert_eq!(sys.user_data[0], 10);
        assert_eq!(sys.user_data[1], 30);
    }

    #[test]
    fn test_destroy_group_zombies_range() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let g = sys.create_group(&box_group_def(1));
        let before = sys.particle_count();
        assert!(before > 0);
        sys.destroy_group(g);
        sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 1);
        assert_eq!(sys.particle_count(), 0);
        assert_eq!(sys.group(g).particle_count(), 0);
    }

    #[test]
    fn test_wall_particles_pinned() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let w = sys.create_particle(&ParticleDef {
            flags: particle_flags::WALL,
            position: Vec2Fix::from_int(0, 0),
            ..ParticleDef::default()
        });
        let gravity = Vec2Fix::from_int(0, -10);
        for _ in 0..10 {
            sys.step(Fix64::from_ratio(1, 60), gravity, 1);
        }
        assert_eq!(sys.positions()[w as usize], Vec2Fix::from_int(0, 0));
        assert_eq!(sys.velocities()[w as usize], Vec2Fix::ZERO);
    }

    #[test]
    fn test_spring_group_resists_stretch() {
        let mut sys = ParticleSystem::new(ParticleSystemDef::default());
        let mut def = box_group_def(1);
        def.flags = particle_flags::SPRING;
        let g = sys.create_group(&def);
        assert!(sys.group(g).particle_count() > 0);
        assert!(!sys.springs.is_empty());
        // Stretch one particle outward; springs pull it back.
        let i = sys.group(g).first as usize;
        let original = sys.positions[i];
        sys.positions[i] = original + Vec2Fix::new(sys.radius(), Fix64::ZERO);
        sys.step(Fix64::from_ratio(1, 60), Vec2Fix::ZERO, 1);
        assert!(sys.velocities[i].x.is_negative() || sys.velocities[i].x.is_zero());
    }

    #[test]
    fn test_step_determinism() {
        let run = || {
            let mut sys = ParticleSystem::new(ParticleSystemDef::default());
            let mut def = box_group_def(1);
            def.flags = particle_flags::TENSILE | particle_flags::VISCOUS;
            sys.create_group(&def);
            for _ in 0..5 {
                sys.step(Fix64::from_ratio(1, 60), Vec2Fix::from_int(0, -10), 2);
            }
            sys.positions()
                .iter()
                .map(|p| (p.x.raw, p.y.raw))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
