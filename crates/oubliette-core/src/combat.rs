//! Combat events and attack issuance.
//!
//! Damage instances travel as [`CombatEvent`] values and are consumed
//! immediately by [`crate::character::Character::apply_damage`]. Attacks are
//! issued as [`AttackRequest`] descriptions handed to the external
//! instantiation collaborator; the core configures damage, speed, and
//! placement once at creation and does not track the spawned object
//! afterward.

use crate::state::Facing;
use oubliette_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

/// Forward offset of a melee hitbox from its owner.
const MELEE_REACH: f32 = 0.75;
/// Sideways-attack hitboxes and shots sit slightly below center.
const SIDEARM_DROP: f32 = -0.0625;
/// Diagonal reach of the charged sweep positions.
const SWEEP_DIAGONAL: f32 = 0.8125;
/// Cardinal reach of the charged sweep's middle position.
const SWEEP_REACH: f32 = 1.0;

/// Who dealt a damage instance. Closed set, matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// The player or a player-owned weapon/projectile
    Player,
    /// An enemy body or enemy projectile
    Enemy,
    /// Hazards owned by the room itself
    Environment,
}

/// Ephemeral description of one damage instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Damage amount
    pub amount: f32,
    /// Knockback direction; normalized on application
    pub direction: Vec2,
    /// Who dealt the damage
    pub source: DamageSource,
}

/// Description of a spawn handed to the instantiation collaborator.
///
/// Offsets are relative to the owner's position; rotations are in degrees,
/// counter-clockwise from the sprite's rest orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackRequest {
    /// Short-lived melee hitbox parented to the attacker.
    MeleeHitbox {
        /// Attacking entity
        owner: EntityId,
        /// Damage dealt on overlap
        damage: f32,
        /// Lifetime of the hitbox in seconds
        duration: f32,
        /// Placement relative to the owner
        offset: Vec2,
        /// Sprite rotation in degrees
        rotation_deg: f32,
    },
    /// A projectile travelling in a straight line.
    Projectile {
        /// Firing entity
        owner: EntityId,
        /// Which side the projectile fights for
        source: DamageSource,
        /// Damage dealt on overlap
        damage: f32,
        /// Travel speed
        speed: f32,
        /// Unit travel direction
        direction: Vec2,
        /// Spawn offset relative to the owner
        offset: Vec2,
        /// Sprite rotation in degrees
        rotation_deg: f32,
    },
    /// Charged attack: one hitbox swept through three positions.
    ChargedSweep {
        /// Attacking entity
        owner: EntityId,
        /// Damage dealt on overlap
        damage: f32,
        /// Lifetime of the sweep in seconds
        duration: f32,
        /// Successive placements relative to the owner
        positions: [Vec2; 3],
        /// Sprite rotation in degrees
        rotation_deg: f32,
    },
}

/// Sprite rotation for a cardinal facing, in degrees.
#[must_use]
const fn cardinal_rotation_deg(facing: Facing) -> f32 {
    match facing {
        Facing::Up => 0.0,
        Facing::Down => 180.0,
        Facing::Left => 90.0,
        Facing::Right => 270.0,
    }
}

/// Builds a melee hitbox request in front of the attacker.
#[must_use]
pub fn melee_request(owner: EntityId, facing: Facing, damage: f32, duration: f32) -> AttackRequest {
    let offset = match facing {
        Facing::Up => Vec2::new(0.0, MELEE_REACH),
        Facing::Down => Vec2::new(0.0, -MELEE_REACH),
        Facing::Left => Vec2::new(-MELEE_REACH, SIDEARM_DROP),
        Facing::Right => Vec2::new(MELEE_REACH, SIDEARM_DROP),
    };
    AttackRequest::MeleeHitbox {
        owner,
        damage,
        duration,
        offset,
        rotation_deg: cardinal_rotation_deg(facing),
    }
}

/// Builds a cardinal projectile request.
///
/// Player shots fired sideways spawn at hand height, slightly below center.
#[must_use]
pub fn projectile_request(
    owner: EntityId,
    source: DamageSource,
    facing: Facing,
    damage: f32,
    speed: f32,
) -> AttackRequest {
    let offset = match (source, facing) {
        (DamageSource::Player, Facing::Left | Facing::Right) => Vec2::new(0.0, SIDEARM_DROP),
        _ => Vec2::ZERO,
    };
    AttackRequest::Projectile {
        owner,
        source,
        damage,
        speed,
        direction: facing.unit(),
        offset,
        rotation_deg: cardinal_rotation_deg(facing),
    }
}

/// Builds the charged sweep request. Deals double the attacker's base
/// damage, swept across the three positions flanking the facing direction.
#[must_use]
pub fn charged_request(
    owner: EntityId,
    facing: Facing,
    base_damage: f32,
    duration: f32,
) -> AttackRequest {
    let d = SWEEP_DIAGONAL;
    let r = SWEEP_REACH;
    let positions = match facing {
        Facing::Up => [Vec2::new(-d, d), Vec2::new(0.0, r), Vec2::new(d, d)],
        Facing::Down => [Vec2::new(d, -d), Vec2::new(0.0, -r), Vec2::new(-d, -d)],
        Facing::Left => [Vec2::new(-d, -d), Vec2::new(-r, 0.0), Vec2::new(-d, d)],
        Facing::Right => [Vec2::new(d, d), Vec2::new(r, 0.0), Vec2::new(d, -d)],
    };
    AttackRequest::ChargedSweep {
        owner,
        damage: base_damage * 2.0,
        duration,
        positions,
        rotation_deg: cardinal_rotation_deg(facing),
    }
}

/// Builds the boss's three-way spread: one shot aimed at the target plus two
/// satellites rotated `spread_deg` to either side.
#[must_use]
pub fn spread_requests(
    owner: EntityId,
    toward_target: Vec2,
    damage: f32,
    speed: f32,
    spread_deg: f32,
) -> [AttackRequest; 3] {
    let aim = toward_target.normalized();
    let aim_angle = aim.angle();
    let spread = spread_deg.to_radians();
    let shot = |direction: Vec2| AttackRequest::Projectile {
        owner,
        source: DamageSource::Enemy,
        damage,
        speed,
        direction,
        offset: Vec2::ZERO,
        rotation_deg: 0.0,
    };
    [
        shot(aim),
        shot(Vec2::from_angle(aim_angle - spread)),
        shot(Vec2::from_angle(aim_angle + spread)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> EntityId {
        EntityId::from_raw(7)
    }

    #[test]
    fn test_melee_offsets_follow_facing() {
        match melee_request(owner(), Facing::Up, 2.0, 0.3) {
            AttackRequest::MeleeHitbox {
                offset,
                rotation_deg,
                ..
            } => {
                assert_eq!(offset, Vec2::new(0.0, MELEE_REACH));
                assert_eq!(rotation_deg, 0.0);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        match melee_request(owner(), Facing::Left, 2.0, 0.3) {
            AttackRequest::MeleeHitbox {
                offset,
                rotation_deg,
                ..
            } => {
                assert_eq!(offset, Vec2::new(-MELEE_REACH, SIDEARM_DROP));
                assert_eq!(rotation_deg, 90.0);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_player_sideways_shot_drops_to_hand_height() {
        match projectile_request(owner(), DamageSource::Player, Facing::Right, 2.0, 8.0) {
            AttackRequest::Projectile {
                offset, direction, ..
            } => {
                assert_eq!(offset, Vec2::new(0.0, SIDEARM_DROP));
                assert_eq!(direction, Vec2::RIGHT);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        // Enemy shots spawn at center regardless of facing.
        match projectile_request(owner(), DamageSource::Enemy, Facing::Right, 2.0, 8.0) {
            AttackRequest::Projectile { offset, .. } => assert_eq!(offset, Vec2::ZERO),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_charged_doubles_damage() {
        match charged_request(owner(), Facing::Down, 3.0, 0.4) {
            AttackRequest::ChargedSweep {
                damage, positions, ..
            } => {
                assert_eq!(damage, 6.0);
                assert_eq!(positions[1], Vec2::new(0.0, -SWEEP_REACH));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_spread_directions() {
        let shots = spread_requests(owner(), Vec2::RIGHT, 2.0, 6.0, 30.0);
        let dirs: Vec<Vec2> = shots
            .iter()
            .map(|s| match s {
                AttackRequest::Projectile { direction, .. } => *direction,
                other => panic!("unexpected request: {other:?}"),
            })
            .collect();

        assert!((dirs[0].x - 1.0).abs() < 1e-6);
        // Satellites are mirrored about the aim line.
        assert!((dirs[1].y + dirs[2].y).abs() < 1e-6);
        assert!((dirs[1].x - dirs[2].x).abs() < 1e-6);
        let angle = 30.0_f32.to_radians();
        assert!((dirs[1].x - angle.cos()).abs() < 1e-5);
    }
}
