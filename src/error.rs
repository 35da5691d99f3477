//! Error Types
//!
//! Invalid API usage is a collaborator bug, not a simulation edge case, so it
//! fails fast through `Result` instead of being absorbed. Numerical trouble
//! (deep penetration, extreme impulses) is never an error: the solver bounds
//! it with clamps and keeps going.

use core::fmt;

/// Errors reported by the world's mutation API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsError {
    /// A body handle refers to a destroyed or never-created body.
    StaleBodyHandle,
    /// A fixture handle refers to a destroyed or never-created fixture.
    StaleFixtureHandle,
    /// A joint handle refers to a destroyed or never-created joint.
    StaleJointHandle,
    /// The world is mid-step; bodies and fixtures cannot be created or
    /// destroyed until the step completes.
    WorldLocked,
    /// A joint definition referenced the same body twice.
    JointOnSingleBody,
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleBodyHandle => write!(f, "stale body handle"),
            Self::StaleFixtureHandle => write!(f, "stale fixture handle"),
            Self::StaleJointHandle => write!(f, "stale joint handle"),
            Self::WorldLocked => write!(f, "world is locked during step"),
            Self::JointOnSingleBody => write!(f, "joint must connect two distinct bodies"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PhysicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            alloc::format!("{}", PhysicsError::WorldLocked),
            "world is locked during step"
        );
        assert_eq!(
            alloc::format!("{}", PhysicsError::StaleBodyHandle),
            "stale body handle"
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_error_trait() {
        let e: &dyn std::error::Error = &PhysicsError::StaleFixtureHandle;
        assert!(e.source().is_none());
    }
}
