//! Pickups dropped by enemies and placed in rooms.

use crate::random::{weighted_index, RandomSource};
use serde::{Deserialize, Serialize};

/// Health restored by a dropped heart.
pub const HEALTH_DROP_VALUE: f32 = 2.0;
/// Ammo restored by a dropped bundle.
pub const AMMO_DROP_VALUE: f32 = 5.0;

/// What a pickup restores when consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Restores health
    Health,
    /// Restores ranged ammo
    Ammo,
    /// Grants a door key
    Key,
}

/// A pickup waiting on the floor. Consumed immediately on contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// What the pickup restores
    pub kind: PickupKind,
    /// Amount restored
    pub value: f32,
}

impl Pickup {
    /// A health drop.
    #[must_use]
    pub const fn health() -> Self {
        Self {
            kind: PickupKind::Health,
            value: HEALTH_DROP_VALUE,
        }
    }

    /// An ammo drop.
    #[must_use]
    pub const fn ammo() -> Self {
        Self {
            kind: PickupKind::Ammo,
            value: AMMO_DROP_VALUE,
        }
    }

    /// A door key.
    #[must_use]
    pub const fn key() -> Self {
        Self {
            kind: PickupKind::Key,
            value: 1.0,
        }
    }
}

/// Rolls the standard enemy drop table: health 3, ammo 3, nothing 14.
pub fn roll_enemy_drop<R: RandomSource + ?Sized>(rng: &mut R) -> Option<Pickup> {
    // The table is a compile-time constant; selection cannot fail.
    match weighted_index(rng, &[3, 3, 14]).ok()? {
        0 => Some(Pickup::health()),
        1 => Some(Pickup::ammo()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[test]
    fn test_drop_table_outcomes() {
        // Draws 0..3 land in the health band, 3..6 ammo, the rest nothing.
        let mut rng = FixedRandom::sequence(vec![0, 3, 6, 19]);
        assert_eq!(roll_enemy_drop(&mut rng), Some(Pickup::health()));
        assert_eq!(roll_enemy_drop(&mut rng), Some(Pickup::ammo()));
        assert_eq!(roll_enemy_drop(&mut rng), None);
        assert_eq!(roll_enemy_drop(&mut rng), None);
    }
}
