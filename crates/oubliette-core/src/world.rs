//! Physics collaborator boundary.
//!
//! The core never implements geometry itself. It asks the embedding engine
//! directional ray-probe questions through [`WorldQuery`] and receives
//! collision notifications as [`PlayerContact`]/[`EnemyContact`] values with
//! a closed participant enumeration instead of string tags.

use crate::pickup::PickupKind;
use crate::state::Facing;
use oubliette_common::{DoorId, RoomId, SwitchId, Vec2};
use serde::{Deserialize, Serialize};

/// Ray-probe queries answered by the external physics system.
///
/// Probes used by the behavior policies are cardinal; implementations only
/// need to answer axis-aligned rays.
pub trait WorldQuery {
    /// Distance to the nearest obstacle along `dir` from `origin`, within
    /// `max_dist`. `None` when the ray is clear.
    fn probe_obstacle(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32>;

    /// Distance to the player along `dir` from `origin`, within `max_dist`.
    /// `None` when the ray misses.
    fn probe_player(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32>;
}

/// Returns the facings around `pos` that have an obstacle within probe range.
///
/// Two rays are cast per facing from the entity's half-extents: vertical
/// probes from the left/right edge points, horizontal probes from the
/// top/bottom edge points. `probe.x` bounds the horizontal rays and
/// `probe.y` the vertical rays.
pub fn obstacle_directions<W: WorldQuery + ?Sized>(
    world: &W,
    pos: Vec2,
    half: Vec2,
    probe: Vec2,
) -> Vec<Facing> {
    let left = Vec2::new(pos.x - half.x, pos.y);
    let right = Vec2::new(pos.x + half.x, pos.y);
    let top = Vec2::new(pos.x, pos.y + half.y);
    let bottom = Vec2::new(pos.x, pos.y - half.y);

    let mut directions = Vec::new();
    if world.probe_obstacle(left, Vec2::UP, probe.y).is_some()
        || world.probe_obstacle(right, Vec2::UP, probe.y).is_some()
    {
        directions.push(Facing::Up);
    }
    if world.probe_obstacle(left, Vec2::DOWN, probe.y).is_some()
        || world.probe_obstacle(right, Vec2::DOWN, probe.y).is_some()
    {
        directions.push(Facing::Down);
    }
    if world.probe_obstacle(top, Vec2::LEFT, probe.x).is_some()
        || world.probe_obstacle(bottom, Vec2::LEFT, probe.x).is_some()
    {
        directions.push(Facing::Left);
    }
    if world.probe_obstacle(top, Vec2::RIGHT, probe.x).is_some()
        || world.probe_obstacle(bottom, Vec2::RIGHT, probe.x).is_some()
    {
        directions.push(Facing::Right);
    }
    directions
}

/// Whether the entity's current facing has an obstacle within probe range.
pub fn facing_wall<W: WorldQuery + ?Sized>(
    world: &W,
    pos: Vec2,
    half: Vec2,
    probe: Vec2,
    facing: Facing,
) -> bool {
    obstacle_directions(world, pos, half, probe).contains(&facing)
}

/// Whether the player is visible along `facing` within `max_dist`, with no
/// obstacle closer than the player.
pub fn sees_player<W: WorldQuery + ?Sized>(
    world: &W,
    pos: Vec2,
    facing: Facing,
    max_dist: f32,
) -> bool {
    let dir = facing.unit();
    match (
        world.probe_player(pos, dir, max_dist),
        world.probe_obstacle(pos, dir, max_dist),
    ) {
        (Some(_), None) => true,
        (Some(player_dist), Some(obstacle_dist)) => obstacle_dist >= player_dist,
        (None, _) => false,
    }
}

/// Collision notification delivered to the player policy.
///
/// `direction` vectors point from the other participant toward the player
/// and double as the knockback direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerContact {
    /// Continuing contact with an enemy body.
    Enemy {
        /// Contact damage dealt by the enemy
        damage: f32,
        /// Unit vector from the enemy toward the player
        direction: Vec2,
    },
    /// An enemy projectile overlapped the player.
    EnemyProjectile {
        /// Projectile damage
        damage: f32,
        /// Unit vector from the projectile toward the player
        direction: Vec2,
        /// Projectile position at the moment of overlap
        origin: Vec2,
    },
    /// The player touched a pickup.
    Pickup {
        /// What the pickup restores
        kind: PickupKind,
        /// Amount restored
        value: f32,
    },
    /// The player pressed against a locked door.
    LockedDoor {
        /// Room the door belongs to
        room: RoomId,
        /// The door
        door: DoorId,
    },
    /// The player stepped on a floor switch.
    Switch {
        /// Room the switch belongs to
        room: RoomId,
        /// The switch
        switch: SwitchId,
    },
    /// The player reached the end-of-game trigger.
    EndTrigger,
}

/// Collision notification delivered to an enemy policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyContact {
    /// Contact-start with a static obstacle.
    Obstacle,
    /// Continuing contact with another dynamic entity (enemy or player).
    Dynamic {
        /// Unit vector from the other entity toward this one
        away: Vec2,
    },
    /// A player projectile overlapped the enemy.
    PlayerProjectile {
        /// Projectile damage
        damage: f32,
        /// Unit vector from the projectile toward the enemy
        direction: Vec2,
    },
    /// A player melee hitbox overlapped the enemy.
    PlayerWeapon {
        /// Hitbox damage
        damage: f32,
        /// Unit vector from the hitbox toward the enemy
        direction: Vec2,
    },
}

/// Axis-aligned box used by the mock world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from its center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Distance from `origin` to this box along a cardinal `dir`, within
    /// `max_dist`. `None` when the ray misses or starts past the box.
    #[must_use]
    pub fn cardinal_ray_hit(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        let (travel, lateral_ok) = if dir.x > 0.5 {
            (self.min.x - origin.x, origin.y >= self.min.y && origin.y <= self.max.y)
        } else if dir.x < -0.5 {
            (origin.x - self.max.x, origin.y >= self.min.y && origin.y <= self.max.y)
        } else if dir.y > 0.5 {
            (self.min.y - origin.y, origin.x >= self.min.x && origin.x <= self.max.x)
        } else if dir.y < -0.5 {
            (origin.y - self.max.y, origin.x >= self.min.x && origin.x <= self.max.x)
        } else {
            return None;
        };

        if lateral_ok && (0.0..=max_dist).contains(&travel) {
            Some(travel)
        } else {
            None
        }
    }
}

/// In-memory world for tests: obstacles and the player as axis-aligned boxes.
#[derive(Debug, Default)]
pub struct MockWorld {
    obstacles: Vec<Aabb>,
    player: Option<Aabb>,
}

impl MockWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle box.
    pub fn add_obstacle(&mut self, center: Vec2, half: Vec2) {
        self.obstacles.push(Aabb::from_center(center, half));
    }

    /// Places the player box.
    pub fn set_player(&mut self, center: Vec2, half: Vec2) {
        self.player = Some(Aabb::from_center(center, half));
    }

    /// Removes all obstacles.
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }
}

impl WorldQuery for MockWorld {
    fn probe_obstacle(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        self.obstacles
            .iter()
            .filter_map(|b| b.cardinal_ray_hit(origin, dir, max_dist))
            .min_by(|a, b| a.total_cmp(b))
    }

    fn probe_player(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        self.player
            .as_ref()
            .and_then(|b| b.cardinal_ray_hit(origin, dir, max_dist))
    }
}
