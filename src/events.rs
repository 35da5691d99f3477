//! Contact Events
//!
//! Two consumption styles, both fed by the contact manager:
//!
//! - [`ContactListener`]: trait callbacks invoked during the step
//!   (`pre_solve` may veto a contact for the current step only)
//! - [`ContactEvents`]: a buffered collector cleared at the start of every
//!   step and readable after `step()` returns, for collaborators that prefer
//!   polling over callbacks

use alloc::vec::Vec;

use crate::body::BodyHandle;
use crate::collision::{Manifold, MAX_MANIFOLD_POINTS};
use crate::fixture::FixtureHandle;
use crate::math::{Fix64, Vec2Fix};

/// Snapshot of a contact's identity, safe to hold across the step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactView {
    /// First fixture of the pair
    pub fixture_a: FixtureHandle,
    /// Second fixture of the pair
    pub fixture_b: FixtureHandle,
    /// Body owning fixture A
    pub body_a: BodyHandle,
    /// Body owning fixture B
    pub body_b: BodyHandle,
}

/// Impulses applied by the solver to one contact, reported to `post_solve`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContactImpulses {
    /// Normal impulse magnitudes per manifold point
    pub normal: [Fix64; MAX_MANIFOLD_POINTS],
    /// Tangent impulse magnitudes per manifold point
    pub tangent: [Fix64; MAX_MANIFOLD_POINTS],
    /// Valid point count
    pub count: usize,
}

/// Collaborator-facing contact callbacks. All methods have no-op defaults.
pub trait ContactListener {
    /// Two fixtures started touching this step.
    fn begin_contact(&mut self, _contact: &ContactView) {}

    /// Two fixtures stopped touching this step. Not called when a touching
    /// pair disappears because a body was destroyed outright.
    fn end_contact(&mut self, _contact: &ContactView) {}

    /// Called before the solver consumes a touching contact. Return false to
    /// disable the contact for this step only.
    fn pre_solve(&mut self, _contact: &ContactView, _old_manifold: &Manifold) -> bool {
        true
    }

    /// Called after an island solve with the impulses the solver applied.
    fn post_solve(&mut self, _contact: &ContactView, _impulses: &ContactImpulses) {}
}

/// One buffered touching transition.
#[derive(Clone, Copy, Debug)]
pub struct ContactEvent {
    /// The pair that transitioned
    pub contact: ContactView,
    /// World-space contact normal at the transition (zero for end events
    /// caused by separation beyond the fat AABB)
    pub normal: Vec2Fix,
}

/// Buffered begin/end transitions for the most recent step.
#[derive(Default)]
pub struct ContactEvents {
    begin: Vec<ContactEvent>,
    end: Vec<ContactEvent>,
}

impl ContactEvents {
    /// Contacts that started touching during the last step.
    #[must_use]
    pub fn begin(&self) -> &[ContactEvent] {
        &self.begin
    }

    /// Contacts that stopped touching during the last step.
    #[must_use]
    pub fn end(&self) -> &[ContactEvent] {
        &self.end
    }

    pub(crate) fn clear(&mut self) {
        self.begin.clear();
        self.end.clear();
    }

    pub(crate) fn push_begin(&mut self, contact: ContactView, normal: Vec2Fix) {
        self.begin.push(ContactEvent { contact, normal });
    }

    pub(crate) fn push_end(&mut self, contact: ContactView, normal: Vec2Fix) {
        self.end.push(ContactEvent { contact, normal });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ContactView {
        ContactView {
            fixture_a: FixtureHandle::invalid(),
            fixture_b: FixtureHandle::invalid(),
            body_a: BodyHandle::invalid(),
            body_b: BodyHandle::invalid(),
        }
    }

    #[test]
    fn test_buffering_and_clear() {
        let mut events = ContactEvents::default();
        events.push_begin(view(), Vec2Fix::UNIT_Y);
        events.push_end(view(), Vec2Fix::ZERO);
        assert_eq!(events.begin().len(), 1);
        assert_eq!(events.end().len(), 1);
        events.clear();
        assert!(events.begin().is_empty());
        assert!(events.end().is_empty());
    }

    #[test]
    fn test_default_listener_allows_solve() {
        struct Silent;
        impl ContactListener for Silent {}
        let mut s = Silent;
        assert!(s.pre_solve(&view(), &Manifold::default()));
    }
}
