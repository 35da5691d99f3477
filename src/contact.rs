//! Contacts and the Contact Manager
//!
//! A contact is the per-fixture-pair collision state machine: created the
//! moment the broad phase reports a candidate pair, updated every step while
//! the fat AABBs overlap, destroyed the moment they separate or an owning
//! fixture goes away. Touching transitions fire begin/end events; warm-start
//! impulses are matched across frames by manifold feature id.
//!
//! The manager owns the broad phase, the contact slab, and the pair map. The
//! pair map is a `BTreeMap` so contact creation order is deterministic.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::arena::Arena;
use crate::body::{Body, BodyHandle, BodyType};
use crate::broadphase::BroadPhase;
use crate::collision::{dispatch_swapped, evaluate, Manifold, WorldManifold};
use crate::events::{ContactEvents, ContactListener, ContactView};
use crate::fixture::{unpack_proxy_data, Fixture, FixtureHandle};
use crate::math::Fix64;
use crate::profile::StepProfile;

/// Canonical pair key: (fixture index, child) of both sides, smaller first.
type PairKey = (u32, u32, u32, u32);

/// Collision state for one fixture pair.
pub(crate) struct Contact {
    pub fixture_a: FixtureHandle,
    pub child_a: usize,
    pub fixture_b: FixtureHandle,
    pub child_b: usize,
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub proxy_a: u32,
    pub proxy_b: u32,

    pub manifold: Manifold,
    pub touching: bool,
    /// Persistent enable flag, settable by collaborators.
    pub enabled: bool,
    /// Step-scoped enable flag, vetoed by `pre_solve` for one step.
    pub solve_enabled: bool,
    /// Sensors report touching but produce no impulses.
    pub sensor: bool,
    /// Re-run the filter check on the next collide pass.
    pub filter_check: bool,
    /// Visited flag for island flood fill.
    pub island: bool,
    /// Retained for parity with engines that track TOI substeps.
    pub toi_count: u32,

    pub friction: Fix64,
    pub restitution: Fix64,
}

impl Contact {
    fn view(&self) -> ContactView {
        ContactView {
            fixture_a: self.fixture_a,
            fixture_b: self.fixture_b,
            body_a: self.body_a,
            body_b: self.body_b,
        }
    }
}

/// Geometric mean of the two friction coefficients.
pub(crate) fn mix_friction(a: Fix64, b: Fix64) -> Fix64 {
    (a * b).sqrt()
}

/// Restitution mixes toward the bouncier surface.
pub(crate) fn mix_restitution(a: Fix64, b: Fix64) -> Fix64 {
    a.max(b)
}

/// Owns the broad phase, the contact slab, and the pair map.
pub(crate) struct ContactManager {
    pub broad_phase: BroadPhase,
    contacts: Vec<Option<Contact>>,
    free: Vec<u32>,
    pair_map: BTreeMap<PairKey, u32>,
}

impl ContactManager {
    pub(crate) fn new() -> Self {
        Self {
            broad_phase: BroadPhase::new(),
            contacts: Vec::new(),
            free: Vec::new(),
            pair_map: BTreeMap::new(),
        }
    }

    pub(crate) fn contact(&self, index: u32) -> Option<&Contact> {
        self.contacts.get(index as usize)?.as_ref()
    }

    pub(crate) fn contact_mut(&mut self, index: u32) -> Option<&mut Contact> {
        self.contacts.get_mut(index as usize)?.as_mut()
    }

    pub(crate) fn contact_indices(&self) -> Vec<u32> {
        self.contacts
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|_| i as u32))
            .collect()
    }

    pub(crate) fn contact_count(&self) -> usize {
        self.pair_map.len()
    }

    /// Drain the broad phase's moved buffer and create contacts for new
    /// candidate pairs. Same-body pairs and filtered pairs are pre-rejected.
    pub(crate) fn find_new_contacts(
        &mut self,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
    ) {
        let Self {
            broad_phase,
            contacts,
            free,
            pair_map,
        } = self;

        broad_phase.update_pairs(|data_a, data_b| {
            add_pair(contacts, free, pair_map, bodies, fixtures, data_a, data_b);
        });
    }

    /// Narrow-phase pass over every contact: destroy stale ones, re-evaluate
    /// manifolds, and fire touching transitions.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn collide(
        &mut self,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        events: &mut ContactEvents,
        mut listener: Option<&mut (dyn ContactListener + '_)>,
        profile: &mut StepProfile,
    ) {
        for index in 0..self.contacts.len() as u32 {
            let Some(contact) = self.contacts[index as usize].as_ref() else {
                continue;
            };

            // Re-run filtering when the flag was raised by a filter change.
            if contact.filter_check {
                let keep = match (
                    fixtures.get(contact.fixture_a.index, contact.fixture_a.generation),
                    fixtures.get(contact.fixture_b.index, contact.fixture_b.generation),
                ) {
                    (Some(fa), Some(fb)) => fa.filter.should_collide(&fb.filter),
                    _ => false,
                };
                if !keep {
                    self.destroy_contact(index, bodies, events, true);
                    continue;
                }
                if let Some(c) = self.contacts[index as usize].as_mut() {
                    c.filter_check = false;
                }
            }

            let Some(contact) = self.contacts[index as usize].as_ref() else {
                continue;
            };

            // Both bodies asleep: nothing can have changed.
            let awake_a = bodies
                .at(contact.body_a.index)
                .map(|b| b.awake && b.body_type != BodyType::Static)
                .unwrap_or(false);
            let awake_b = bodies
                .at(contact.body_b.index)
                .map(|b| b.awake && b.body_type != BodyType::Static)
                .unwrap_or(false);
            if !awake_a && !awake_b {
                continue;
            }

            // Fat AABBs separated: the candidate pair is gone.
            if !self
                .broad_phase
                .test_overlap(contact.proxy_a, contact.proxy_b)
            {
                self.destroy_contact(index, bodies, events, true);
                continue;
            }

            self.update_contact(index, bodies, fixtures, events, listener.as_deref_mut());
            profile.narrow_phase_tests += 1;
        }

        profile.contacts = self.pair_map.len() as u32;
        profile.touching_contacts = self
            .contacts
            .iter()
            .flatten()
            .filter(|c| c.touching)
            .count() as u32;
    }

    /// Re-evaluate one contact's manifold and handle touching transitions.
    fn update_contact(
        &mut self,
        index: u32,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        events: &mut ContactEvents,
        mut listener: Option<&mut (dyn ContactListener + '_)>,
    ) {
        let Some(contact) = self.contacts[index as usize].as_mut() else {
            return;
        };
        let (Some(fa), Some(fb)) = (
            fixtures.get(contact.fixture_a.index, contact.fixture_a.generation),
            fixtures.get(contact.fixture_b.index, contact.fixture_b.generation),
        ) else {
            return;
        };
        let (Some(body_a), Some(body_b)) = (
            bodies.at(contact.body_a.index),
            bodies.at(contact.body_b.index),
        ) else {
            return;
        };

        let xf_a = body_a.transform;
        let xf_b = body_b.transform;
        let old_manifold = contact.manifold;
        let was_touching = contact.touching;

        let mut new_manifold = Manifold::default();
        evaluate(
            &mut new_manifold,
            &fa.shape,
            &xf_a,
            contact.child_a,
            &fb.shape,
            &xf_b,
            contact.child_b,
        );

        let touching = new_manifold.count > 0;

        if contact.sensor {
            // Sensors report overlap but keep no manifold for the solver.
            new_manifold.count = 0;
        } else {
            // Warm starting: carry impulses forward for matching feature ids.
            for point in new_manifold.points.iter_mut().take(new_manifold.count) {
                for old in old_manifold.points.iter().take(old_manifold.count) {
                    if old.id.key() == point.id.key() {
                        point.normal_impulse = old.normal_impulse;
                        point.tangent_impulse = old.tangent_impulse;
                        break;
                    }
                }
            }
        }

        contact.manifold = new_manifold;
        contact.touching = touching;
        contact.solve_enabled = contact.enabled;
        let view = contact.view();

        let event_normal = if touching && !contact.sensor {
            WorldManifold::initialize(
                &new_manifold,
                &xf_a,
                fa.shape.surface_radius(),
                &xf_b,
                fb.shape.surface_radius(),
            )
            .normal
        } else {
            crate::math::Vec2Fix::ZERO
        };

        if touching != was_touching {
            // Any transition disturbs both bodies.
            if let Some(b) = bodies.at_mut(view.body_a.index) {
                if b.body_type != BodyType::Static {
                    b.set_awake(true);
                }
            }
            if let Some(b) = bodies.at_mut(view.body_b.index) {
                if b.body_type != BodyType::Static {
                    b.set_awake(true);
                }
            }

            if touching {
                events.push_begin(view, event_normal);
                if let Some(l) = listener.as_deref_mut() {
                    l.begin_contact(&view);
                }
            } else {
                events.push_end(view, event_normal);
                if let Some(l) = listener.as_deref_mut() {
                    l.end_contact(&view);
                }
            }
        }

        if touching && !view_is_sensor(fa, fb) {
            if let Some(l) = listener {
                if !l.pre_solve(&view, &old_manifold) {
                    if let Some(c) = self.contacts[index as usize].as_mut() {
                        c.solve_enabled = false;
                    }
                }
            }
        }
    }

    /// Destroy a contact. `fire_end` is false when the owning body is being
    /// removed outright, since there is no longer an entity to notify.
    pub(crate) fn destroy_contact(
        &mut self,
        index: u32,
        bodies: &mut Arena<Body>,
        events: &mut ContactEvents,
        fire_end: bool,
    ) {
        let Some(contact) = self.contacts[index as usize].take() else {
            return;
        };

        let key = pair_key(
            contact.fixture_a.index,
            contact.child_a,
            contact.fixture_b.index,
            contact.child_b,
        );
        self.pair_map.remove(&key);

        if let Some(body) = bodies.at_mut(contact.body_a.index) {
            body.contact_edges.retain(|&e| e != index);
            if contact.touching && body.body_type != BodyType::Static {
                body.set_awake(true);
            }
        }
        if let Some(body) = bodies.at_mut(contact.body_b.index) {
            body.contact_edges.retain(|&e| e != index);
            if contact.touching && body.body_type != BodyType::Static {
                body.set_awake(true);
            }
        }

        if contact.touching && fire_end {
            events.push_end(contact.view(), crate::math::Vec2Fix::ZERO);
        }

        self.free.push(index);
    }

    /// Destroy every contact attached to a fixture. Used by fixture and body
    /// destruction; `fire_end` follows the same rule as `destroy_contact`.
    pub(crate) fn destroy_fixture_contacts(
        &mut self,
        fixture_index: u32,
        bodies: &mut Arena<Body>,
        events: &mut ContactEvents,
        fire_end: bool,
    ) {
        let doomed: Vec<u32> = self
            .contacts
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                c.as_ref().and_then(|c| {
                    if c.fixture_a.index == fixture_index || c.fixture_b.index == fixture_index {
                        Some(i as u32)
                    } else {
                        None
                    }
                })
            })
            .collect();
        for index in doomed {
            self.destroy_contact(index, bodies, events, fire_end);
        }
    }

    /// Raise the filter-recheck flag on every contact touching a fixture.
    pub(crate) fn flag_for_filtering(&mut self, fixture_index: u32) {
        for contact in self.contacts.iter_mut().flatten() {
            if contact.fixture_a.index == fixture_index
                || contact.fixture_b.index == fixture_index
            {
                contact.filter_check = true;
            }
        }
    }
}

fn view_is_sensor(fa: &Fixture, fb: &Fixture) -> bool {
    fa.sensor || fb.sensor
}

fn pair_key(fix_a: u32, child_a: usize, fix_b: u32, child_b: usize) -> PairKey {
    let a = (fix_a, child_a as u32);
    let b = (fix_b, child_b as u32);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo.0, lo.1, hi.0, hi.1)
}

#[allow(clippy::too_many_arguments)]
fn add_pair(
    contacts: &mut Vec<Option<Contact>>,
    free: &mut Vec<u32>,
    pair_map: &mut BTreeMap<PairKey, u32>,
    bodies: &mut Arena<Body>,
    fixtures: &Arena<Fixture>,
    data_a: u64,
    data_b: u64,
) {
    let (fix_a_index, child_a) = unpack_proxy_data(data_a);
    let (fix_b_index, child_b) = unpack_proxy_data(data_b);

    if fix_a_index == fix_b_index {
        // Children of the same fixture (chain segments) never self-collide.
        return;
    }

    let key = pair_key(fix_a_index, child_a, fix_b_index, child_b);
    if pair_map.contains_key(&key) {
        return;
    }

    let (Some(fa), Some(fb)) = (fixtures.at(fix_a_index), fixtures.at(fix_b_index)) else {
        return;
    };
    if fa.body == fb.body {
        return;
    }
    if !fa.filter.should_collide(&fb.filter) {
        return;
    }
    // Two sensors report nothing and respond to nothing.
    if fa.sensor && fb.sensor {
        return;
    }

    let (Some(body_a), Some(body_b)) = (bodies.at(fa.body.index), bodies.at(fb.body.index)) else {
        return;
    };
    // At least one side must be dynamic for anything to respond.
    if body_a.body_type != BodyType::Dynamic && body_b.body_type != BodyType::Dynamic {
        return;
    }

    // Normalize operand order for the narrow-phase dispatch table.
    let swap = dispatch_swapped(fa.shape.kind(), fb.shape.kind());
    let (fi_a, ch_a, f_a, fi_b, ch_b, f_b) = if swap {
        (fix_b_index, child_b, fb, fix_a_index, child_a, fa)
    } else {
        (fix_a_index, child_a, fa, fix_b_index, child_b, fb)
    };

    let proxy_for = |f: &Fixture, child: usize| {
        f.proxies
            .iter()
            .find(|p| p.child == child)
            .map(|p| p.proxy_id)
    };
    let (Some(proxy_a), Some(proxy_b)) = (proxy_for(f_a, ch_a), proxy_for(f_b, ch_b)) else {
        return;
    };

    let contact = Contact {
        fixture_a: FixtureHandle {
            index: fi_a,
            generation: fixture_generation(fixtures, fi_a),
        },
        child_a: ch_a,
        fixture_b: FixtureHandle {
            index: fi_b,
            generation: fixture_generation(fixtures, fi_b),
        },
        child_b: ch_b,
        body_a: f_a.body,
        body_b: f_b.body,
        proxy_a,
        proxy_b,
        manifold: Manifold::default(),
        touching: false,
        enabled: true,
        solve_enabled: true,
        sensor: f_a.sensor || f_b.sensor,
        filter_check: false,
        island: false,
        toi_count: 0,
        friction: mix_friction(f_a.friction, f_b.friction),
        restitution: mix_restitution(f_a.restitution, f_b.restitution),
    };

    let index = if let Some(i) = free.pop() {
        contacts[i as usize] = Some(contact);
        i
    } else {
        contacts.push(Some(contact));
        (contacts.len() - 1) as u32
    };

    pair_map.insert(key, index);
    if let Some(body) = bodies.at_mut(f_a.body.index) {
        body.contact_edges.push(index);
    }
    if let Some(body) = bodies.at_mut(f_b.body.index) {
        body.contact_edges.push(index);
    }
}

fn fixture_generation(fixtures: &Arena<Fixture>, index: u32) -> u32 {
    fixtures.generation_at(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_friction_geometric_mean() {
        let f = mix_friction(Fix64::from_ratio(1, 4), Fix64::ONE);
        assert!((f - Fix64::HALF).abs() < Fix64::from_ratio(1, 1000));
        assert!(mix_friction(Fix64::ZERO, Fix64::ONE).is_zero());
    }

    #[test]
    fn test_mix_restitution_takes_max() {
        let r = mix_restitution(Fix64::from_ratio(3, 10), Fix64::from_ratio(8, 10));
        assert_eq!(r, Fix64::from_ratio(8, 10));
    }

    #[test]
    fn test_pair_key_canonical() {
        assert_eq!(pair_key(5, 0, 2, 1), pair_key(2, 1, 5, 0));
        assert_eq!(pair_key(2, 3, 2, 1), pair_key(2, 1, 2, 3));
    }
}
