//! Fixtures
//!
//! A fixture binds a shape and its material (density, friction, restitution,
//! sensor flag, collision filter) to a body, and owns one broad-phase proxy
//! per shape child. Fixtures are created and destroyed only through the
//! world, which keeps proxies, contacts, and mass data in sync.

use alloc::vec::Vec;

use crate::body::BodyHandle;
use crate::filter::Filter;
use crate::math::Fix64;
use crate::shape::Shape;

/// Generation-checked handle to a fixture stored in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixtureHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl FixtureHandle {
    /// A handle that never resolves. Placeholder for "no fixture".
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }
}

/// Blueprint for creating a fixture.
#[derive(Clone, Debug)]
pub struct FixtureDef {
    /// Collision geometry, moved into the fixture
    pub shape: Shape,
    /// Mass density (mass per unit area)
    pub density: Fix64,
    /// Coulomb friction coefficient, usually in [0, 1]
    pub friction: Fix64,
    /// Bounciness, 0 = inelastic, 1 = perfectly elastic
    pub restitution: Fix64,
    /// Sensors detect touching but generate no collision response
    pub sensor: bool,
    /// Collision filter bits
    pub filter: Filter,
    /// Opaque collaborator payload
    pub user_data: u64,
}

impl FixtureDef {
    /// Definition with default material: density 1, friction 0.2, no bounce.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            density: Fix64::ONE,
            friction: Fix64::from_ratio(2, 10),
            restitution: Fix64::ZERO,
            sensor: false,
            filter: Filter::DEFAULT,
            user_data: 0,
        }
    }
}

/// One broad-phase proxy owned by a fixture.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FixtureProxy {
    /// Broad-phase proxy id
    pub proxy_id: u32,
    /// Shape child index this proxy covers
    pub child: usize,
}

/// A shape attached to a body. Lives in the world's fixture arena.
pub struct Fixture {
    pub(crate) shape: Shape,
    pub(crate) density: Fix64,
    pub(crate) friction: Fix64,
    pub(crate) restitution: Fix64,
    pub(crate) sensor: bool,
    pub(crate) filter: Filter,
    pub(crate) user_data: u64,
    /// Owning body
    pub(crate) body: BodyHandle,
    /// One proxy per shape child while attached to an active world
    pub(crate) proxies: Vec<FixtureProxy>,
}

impl Fixture {
    pub(crate) fn new(def: FixtureDef, body: BodyHandle) -> Self {
        Self {
            shape: def.shape,
            density: def.density,
            friction: def.friction,
            restitution: def.restitution,
            sensor: def.sensor,
            filter: def.filter,
            user_data: def.user_data,
            body,
            proxies: Vec::new(),
        }
    }

    /// The fixture's geometry.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Owning body handle.
    #[must_use]
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Current collision filter.
    #[must_use]
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// True if this fixture is a sensor.
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Friction coefficient.
    #[must_use]
    pub fn friction(&self) -> Fix64 {
        self.friction
    }

    /// Restitution coefficient.
    #[must_use]
    pub fn restitution(&self) -> Fix64 {
        self.restitution
    }

    /// Mass density.
    #[must_use]
    pub fn density(&self) -> Fix64 {
        self.density
    }

    /// Collaborator payload.
    #[must_use]
    pub fn user_data(&self) -> u64 {
        self.user_data
    }
}

/// Pack a fixture arena index and child index into broad-phase payload bits.
#[inline]
pub(crate) fn pack_proxy_data(fixture_index: u32, child: usize) -> u64 {
    (u64::from(fixture_index) << 32) | (child as u64 & 0xFFFF_FFFF)
}

/// Inverse of [`pack_proxy_data`].
#[inline]
pub(crate) fn unpack_proxy_data(data: u64) -> (u32, usize) {
    ((data >> 32) as u32, (data & 0xFFFF_FFFF) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2Fix;

    #[test]
    fn test_proxy_data_round_trip() {
        let data = pack_proxy_data(0xDEAD_BEEF, 7);
        assert_eq!(unpack_proxy_data(data), (0xDEAD_BEEF, 7));
        let data = pack_proxy_data(0, 0);
        assert_eq!(unpack_proxy_data(data), (0, 0));
    }

    #[test]
    fn test_def_defaults() {
        let def = FixtureDef::new(Shape::circle(Vec2Fix::ZERO, Fix64::ONE));
        assert_eq!(def.density, Fix64::ONE);
        assert!(!def.sensor);
        assert_eq!(def.filter, Filter::DEFAULT);
    }
}
