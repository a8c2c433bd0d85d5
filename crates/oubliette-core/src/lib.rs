//! # Oubliette Core
//!
//! Behavioral core of a top-down action game.
//!
//! This crate provides the per-entity decision layer and room progression:
//! - Hold timers for timed behavior states
//! - Weighted-random behavior selection with an injectable random source
//! - Generic entity state machines with animation-refresh tracking
//! - Combat resolution (damage, knockback, invulnerability, attack issuance)
//! - Behavior policies (player, wanderer, ranged, seeker, boss)
//! - Room orchestration (clear conditions, door unlocking, pause, reset)
//! - Session direction and the outbound event bus for external collaborators
//!
//! Rendering, audio playback, physics geometry, and object instantiation are
//! external collaborators reached through [`world::WorldQuery`] and the
//! [`events::EventBus`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio;
pub mod character;
pub mod combat;
pub mod enemy;
pub mod events;
pub mod game;
pub mod pickup;
pub mod player;
pub mod random;
pub mod room;
pub mod state;
pub mod timer;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audio::*;
    pub use crate::character::*;
    pub use crate::combat::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::game::*;
    pub use crate::pickup::*;
    pub use crate::player::*;
    pub use crate::random::*;
    pub use crate::room::*;
    pub use crate::state::*;
    pub use crate::timer::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use oubliette_common::{RoomId, Vec2};

    #[test]
    fn test_full_tick_produces_collaborator_events() {
        let player = Player::new(PlayerConfig::default(), Vec2::ZERO);
        let mut session = Session::new(player, RoomId::new(1), 1.0);

        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::Enemy).as_starting_room(),
        );
        room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::new(4.0, 0.0)));
        session.add_room(room);
        session.start_game();
        session.drain_events();

        let world = MockWorld::new();
        let input = InputSnapshot {
            up: true,
            ..InputSnapshot::none()
        };
        session.update(0.1, &input, &world);
        session.update(0.1, &input, &world);

        let events = session.drain_events();
        // At minimum the player and the wandering enemy refreshed animations.
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::AnimationChanged { .. })));
        assert!(events.contains(&GameEvent::MusicStarted(MusicBus::Footsteps)));
    }

    #[test]
    fn test_enemy_defeat_clears_room_and_unlocks_doors() {
        use oubliette_common::DoorId;

        let player = Player::new(PlayerConfig::default(), Vec2::ZERO);
        let mut session = Session::new(player, RoomId::new(1), 1.0);

        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::Enemy)
                .as_starting_room()
                .with_unlock_delay(0.0),
        );
        let enemy_id = room.add_enemy(Enemy::new(EnemyConfig::ranged(), Vec2::new(4.0, 0.0)));
        room.add_door(DoorId::new(1), false);
        session.add_room(room);
        session.start_game();

        let world = MockWorld::new();
        session.handle_enemy_contact(
            RoomId::new(1),
            enemy_id,
            &EnemyContact::PlayerProjectile {
                damage: 100.0,
                direction: Vec2::UP,
            },
            &world,
        );
        session.update(0.1, &InputSnapshot::none(), &world);

        let room = session.room(RoomId::new(1)).expect("room");
        assert!(room.cleared());
        assert!(room.door(DoorId::new(1)).expect("door").open);
    }
}
