//! Collision Filtering
//!
//! Category/mask bitfields plus signed collision groups. Group rules win over
//! category rules: a shared positive group always collides, a shared negative
//! group never collides. Otherwise both category/mask conjunctions must pass.

/// Per-fixture collision filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter {
    /// Category bits this fixture belongs to (one-hot by convention).
    pub category: u16,
    /// Categories this fixture is willing to collide with.
    pub mask: u16,
    /// Collision group. Zero means "use category/mask only".
    pub group: i16,
}

impl Filter {
    /// Collides with everything.
    pub const DEFAULT: Self = Self {
        category: 0x0001,
        mask: 0xFFFF,
        group: 0,
    };

    /// Create a filter with explicit bits.
    #[must_use]
    pub const fn new(category: u16, mask: u16, group: i16) -> Self {
        Self {
            category,
            mask,
            group,
        }
    }

    /// True if fixtures carrying these filters may collide.
    #[must_use]
    pub fn should_collide(&self, other: &Self) -> bool {
        if self.group == other.group && self.group != 0 {
            return self.group > 0;
        }
        (self.category & other.mask) != 0 && (other.category & self.mask) != 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Named category bits for common layer setups.
pub mod layers {
    /// Default world geometry.
    pub const WORLD: u16 = 0x0001;
    /// Player-controlled bodies.
    pub const PLAYER: u16 = 0x0002;
    /// Enemy bodies.
    pub const ENEMY: u16 = 0x0004;
    /// Projectiles.
    pub const PROJECTILE: u16 = 0x0008;
    /// Non-solid trigger volumes.
    pub const TRIGGER: u16 = 0x0010;
    /// Debris and cosmetic bodies.
    pub const DEBRIS: u16 = 0x0020;
    /// Matches every category.
    pub const ALL: u16 = 0xFFFF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collides_with_everything() {
        let a = Filter::DEFAULT;
        let b = Filter::DEFAULT;
        assert!(a.should_collide(&b));
    }

    #[test]
    fn test_category_mask() {
        let player = Filter::new(layers::PLAYER, layers::WORLD | layers::ENEMY, 0);
        let world = Filter::new(layers::WORLD, layers::ALL, 0);
        let debris = Filter::new(layers::DEBRIS, layers::WORLD, 0);
        assert!(player.should_collide(&world));
        assert!(world.should_collide(&player));
        // Player's mask excludes debris, and debris' mask excludes player
        assert!(!player.should_collide(&debris));
        assert!(!debris.should_collide(&player));
    }

    #[test]
    fn test_mask_must_pass_both_ways() {
        // a wants to hit b, but b's mask excludes a
        let a = Filter::new(0x0001, 0x0002, 0);
        let b = Filter::new(0x0002, 0x0004, 0);
        assert!(!a.should_collide(&b));
    }

    #[test]
    fn test_negative_group_never_collides() {
        let a = Filter::new(layers::PLAYER, layers::ALL, -3);
        let b = Filter::new(layers::ENEMY, layers::ALL, -3);
        assert!(!a.should_collide(&b));
    }

    #[test]
    fn test_positive_group_always_collides() {
        // Masks would reject, group overrides
        let a = Filter::new(0x0001, 0x0000, 7);
        let b = Filter::new(0x0002, 0x0000, 7);
        assert!(a.should_collide(&b));
    }

    #[test]
    fn test_different_groups_fall_back_to_masks() {
        let a = Filter::new(0x0001, 0xFFFF, -1);
        let b = Filter::new(0x0002, 0xFFFF, -2);
        assert!(a.should_collide(&b));
    }
}
