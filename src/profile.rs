//! Step Profiling
//!
//! Deterministic per-step counters instead of wall-clock timings: counts are
//! identical across platforms, so they double as a cheap cross-machine
//! divergence check alongside the bit-exact state comparison.

/// Counters for the most recent `step()` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepProfile {
    /// Candidate pairs emitted by the broad phase
    pub broad_phase_pairs: u32,
    /// Narrow-phase manifold evaluations
    pub narrow_phase_tests: u32,
    /// Live contacts after the collide pass
    pub contacts: u32,
    /// Contacts currently touching
    pub touching_contacts: u32,
    /// Islands solved
    pub islands: u32,
    /// Bodies that went through the solver
    pub solved_bodies: u32,
    /// Bodies asleep at the end of the step
    pub sleeping_bodies: u32,
    /// Particle neighbor contacts processed
    pub particle_contacts: u32,
}

impl StepProfile {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
