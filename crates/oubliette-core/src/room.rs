//! Room orchestration: clear conditions, door unlocking, pause propagation.
//!
//! A room tracks its enemies, bosses, switches, and doors. Once per tick it
//! prunes dead entities, evaluates its clear condition, and — exactly once —
//! runs the unlock sequence after the unlock delay. A room whose tracked
//! list for its own condition is empty clears immediately at load; a missing
//! collaborator degrades the feature instead of crashing.

use crate::audio::AudioCue;
use crate::enemy::Enemy;
use crate::events::{EventBus, GameEvent};
use crate::pickup::Pickup;
use crate::random::RandomSource;
use crate::timer::HoldTimer;
use crate::world::{EnemyContact, WorldQuery};
use ahash::AHashMap;
use oubliette_common::{DoorId, EntityId, RoomId, SwitchId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rule that marks a room traversable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearCondition {
    /// Cleared when every tracked enemy is defeated
    Enemy,
    /// Cleared when every tracked switch is activated
    Switch,
    /// Cleared when every tracked boss is defeated
    Boss,
    /// Cleared immediately
    None,
}

/// Progression phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Clear condition not yet met
    Uncleared,
    /// Cleared; the unlock delay is running
    ClearedPendingUnlock,
    /// Doors opened; terminal
    Unlocked,
}

/// A door tracked by the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Door identity within the room
    pub id: DoorId,
    /// Whether the door is open
    pub open: bool,
}

/// A floor switch tracked by the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSwitch {
    /// Switch identity within the room
    pub id: SwitchId,
    /// Whether the switch has been pressed
    pub activated: bool,
}

/// Room setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Room identity
    pub id: RoomId,
    /// Rule that marks this room traversable
    pub clear_condition: ClearCondition,
    /// Delay between clearing and the unlock sequence
    pub unlock_delay: f32,
    /// The designated starting room unlocks with zero delay
    pub starting_room: bool,
    /// Position to spawn a key at on unlock, if any
    pub key_spawn: Option<Vec2>,
}

impl RoomConfig {
    /// Creates a config with the given identity and condition.
    #[must_use]
    pub const fn new(id: RoomId, clear_condition: ClearCondition) -> Self {
        Self {
            id,
            clear_condition,
            unlock_delay: 1.0,
            starting_room: false,
            key_spawn: None,
        }
    }

    /// Marks this room as the starting room.
    #[must_use]
    pub const fn as_starting_room(mut self) -> Self {
        self.starting_room = true;
        self
    }

    /// Sets the unlock delay.
    #[must_use]
    pub const fn with_unlock_delay(mut self, delay: f32) -> Self {
        self.unlock_delay = delay;
        self
    }

    /// Spawns a key at `position` when the room unlocks.
    #[must_use]
    pub const fn with_key_spawn(mut self, position: Vec2) -> Self {
        self.key_spawn = Some(position);
        self
    }
}

/// One room of the level and everything it tracks.
#[derive(Debug)]
pub struct Room {
    config: RoomConfig,
    phase: RoomPhase,
    cleared: bool,
    unlock_timer: HoldTimer,
    enemies: Vec<Enemy>,
    bosses: Vec<Enemy>,
    doors: AHashMap<DoorId, Door>,
    switches: AHashMap<SwitchId, FloorSwitch>,
    max_boss_health: f32,
    had_bosses: bool,
}

impl Room {
    /// Creates an empty room.
    #[must_use]
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            phase: RoomPhase::Uncleared,
            cleared: false,
            unlock_timer: HoldTimer::new(),
            enemies: Vec::new(),
            bosses: Vec::new(),
            doors: AHashMap::new(),
            switches: AHashMap::new(),
            max_boss_health: 0.0,
            had_bosses: false,
        }
    }

    /// Room identity.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.config.id
    }

    /// Clear condition.
    #[must_use]
    pub const fn clear_condition(&self) -> ClearCondition {
        self.config.clear_condition
    }

    /// Whether the clear condition has been met. Monotonic: once true it is
    /// never observed false again.
    #[must_use]
    pub const fn cleared(&self) -> bool {
        self.cleared
    }

    /// Progression phase.
    #[must_use]
    pub const fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Tracks an enemy.
    pub fn add_enemy(&mut self, enemy: Enemy) -> EntityId {
        let id = enemy.id();
        self.enemies.push(enemy);
        id
    }

    /// Tracks a boss. Boss health counts toward the aggregate fraction.
    pub fn add_boss(&mut self, boss: Enemy) -> EntityId {
        let id = boss.id();
        self.max_boss_health += boss.character().max_health();
        self.had_bosses = true;
        self.bosses.push(boss);
        id
    }

    /// Tracks a door.
    pub fn add_door(&mut self, id: DoorId, open: bool) {
        self.doors.insert(id, Door { id, open });
    }

    /// Tracks a floor switch.
    pub fn add_switch(&mut self, id: SwitchId) {
        self.switches.insert(
            id,
            FloorSwitch {
                id,
                activated: false,
            },
        );
    }

    /// Live tracked enemies.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Live tracked bosses.
    #[must_use]
    pub fn bosses(&self) -> &[Enemy] {
        &self.bosses
    }

    /// Looks up a door.
    #[must_use]
    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(&id)
    }

    /// Looks up a switch.
    #[must_use]
    pub fn switch(&self, id: SwitchId) -> Option<&FloorSwitch> {
        self.switches.get(&id)
    }

    /// Aggregate boss health fraction for the HUD, `1.0` if this room never
    /// tracked any bosses.
    #[must_use]
    pub fn boss_health_fraction(&self) -> f32 {
        if !self.had_bosses || self.max_boss_health <= 0.0 {
            return 1.0;
        }
        let current: f32 = self
            .bosses
            .iter()
            .map(|b| b.character().health())
            .sum();
        (current / self.max_boss_health).clamp(0.0, 1.0)
    }

    /// Runs one simulation step: prune, clear-condition check, unlock
    /// sequencing, then every tracked entity's policy.
    pub fn update<W: WorldQuery + ?Sized>(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        world: &W,
        rng: &mut dyn RandomSource,
        bus: &EventBus,
    ) {
        // Dead entities are pruned lazily, once per tick.
        self.enemies.retain(|e| !e.is_dead());
        self.bosses.retain(|b| !b.is_dead());

        if !self.cleared && self.condition_met() {
            self.cleared = true;
            self.phase = RoomPhase::ClearedPendingUnlock;
            let delay = if self.config.starting_room {
                0.0
            } else {
                self.config.unlock_delay
            };
            self.unlock_timer.arm(delay);
            info!(room = self.config.id.raw(), "room cleared");
            bus.publish(GameEvent::RoomCleared {
                room: self.config.id,
            });
        }

        if self.phase == RoomPhase::ClearedPendingUnlock {
            self.unlock_timer.tick(dt);
            if self.unlock_timer.expired() {
                self.unlock(bus);
            }
        }

        for enemy in &mut self.enemies {
            enemy.update(dt, player_pos, world, rng, bus);
        }
        for boss in &mut self.bosses {
            boss.update(dt, player_pos, world, rng, bus);
        }
    }

    fn condition_met(&self) -> bool {
        match self.config.clear_condition {
            ClearCondition::Enemy => self.enemies.is_empty(),
            ClearCondition::Boss => self.bosses.is_empty(),
            ClearCondition::Switch => self.switches.values().all(|s| s.activated),
            ClearCondition::None => true,
        }
    }

    /// Opens every door and spawns the configured key. Runs exactly once;
    /// the phase machine guarantees no double-fire.
    fn unlock(&mut self, bus: &EventBus) {
        self.phase = RoomPhase::Unlocked;
        info!(room = self.config.id.raw(), "room unlocked");
        bus.publish(GameEvent::Cue(AudioCue::DoorOpen));

        for door in self.doors.values_mut() {
            if !door.open {
                door.open = true;
                bus.publish(GameEvent::DoorOpened {
                    room: self.config.id,
                    door: door.id,
                });
            }
        }

        if let Some(position) = self.config.key_spawn {
            bus.publish(GameEvent::SpawnPickup {
                pickup: Pickup::key(),
                position,
            });
        }
    }

    /// Opens a single door (key unlock). Returns whether it was closed.
    pub fn open_door(&mut self, id: DoorId, bus: &EventBus) -> bool {
        match self.doors.get_mut(&id) {
            Some(door) if !door.open => {
                door.open = true;
                bus.publish(GameEvent::DoorOpened {
                    room: self.config.id,
                    door: id,
                });
                true
            }
            _ => false,
        }
    }

    /// Activates a switch. Returns whether it was newly pressed.
    pub fn activate_switch(&mut self, id: SwitchId, bus: &EventBus) -> bool {
        match self.switches.get_mut(&id) {
            Some(switch) if !switch.activated => {
                switch.activated = true;
                bus.publish(GameEvent::Cue(AudioCue::SwitchPress));
                bus.publish(GameEvent::SwitchActivated {
                    room: self.config.id,
                    switch: id,
                });
                true
            }
            _ => false,
        }
    }

    /// Routes a collision notification to the tracked enemy or boss.
    pub fn handle_enemy_contact<W: WorldQuery + ?Sized>(
        &mut self,
        entity: EntityId,
        contact: &EnemyContact,
        world: &W,
        rng: &mut dyn RandomSource,
        bus: &EventBus,
    ) {
        if let Some(enemy) = self
            .enemies
            .iter_mut()
            .chain(self.bosses.iter_mut())
            .find(|e| e.id() == entity)
        {
            enemy.handle_contact(contact, world, rng, bus);
        }
    }

    /// Propagates a pause flag to every tracked enemy and boss. Pausing is
    /// advisory; paused entities keep their internal state.
    pub fn set_paused(&mut self, paused: bool) {
        for enemy in &mut self.enemies {
            enemy.character_mut().set_paused(paused);
        }
        for boss in &mut self.bosses {
            boss.character_mut().set_paused(paused);
        }
    }

    /// Restores every tracked enemy and boss to its spawn position, state,
    /// and health. Used when the player re-enters the room.
    pub fn reset(&mut self) {
        for enemy in &mut self.enemies {
            enemy.reset();
        }
        for boss in &mut self.bosses {
            boss.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::{EnemyConfig, EnemyState};
    use crate::random::Lcg;
    use crate::world::MockWorld;

    const DT: f32 = 0.1;

    fn tick(room: &mut Room, world: &MockWorld, rng: &mut Lcg, bus: &EventBus, n: usize) {
        for _ in 0..n {
            room.update(DT, Vec2::new(100.0, 100.0), world, rng, bus);
        }
    }

    fn door_open_count(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::DoorOpened { .. }))
            .count()
    }

    #[test]
    fn test_empty_enemy_room_clears_immediately() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        room.update(0.0, Vec2::ZERO, &world, &mut rng, &bus);
        assert!(room.cleared());
    }

    #[test]
    fn test_none_condition_clears_immediately() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::None));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::ZERO));
        room.update(0.0, Vec2::ZERO, &world, &mut rng, &bus);
        assert!(room.cleared());
    }

    #[test]
    fn test_enemy_room_clears_when_all_die() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        let id = room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::ZERO));
        tick(&mut room, &world, &mut rng, &bus, 2);
        assert!(!room.cleared());

        room.handle_enemy_contact(
            id,
            &EnemyContact::PlayerWeapon {
                damage: 100.0,
                direction: Vec2::UP,
            },
            &world,
            &mut rng,
            &bus,
        );
        tick(&mut room, &world, &mut rng, &bus, 1);
        assert!(room.cleared());
        assert!(room.enemies().is_empty());
    }

    #[test]
    fn test_cleared_is_monotonic() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        room.update(0.0, Vec2::ZERO, &world, &mut rng, &bus);
        assert!(room.cleared());

        // Even if something is tracked afterward, cleared never reverts.
        room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::ZERO));
        tick(&mut room, &world, &mut rng, &bus, 5);
        assert!(room.cleared());
    }

    #[test]
    fn test_doors_open_exactly_once() {
        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::None).with_unlock_delay(0.2),
        );
        room.add_door(DoorId::new(1), false);
        room.add_door(DoorId::new(2), false);
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        tick(&mut room, &world, &mut rng, &bus, 20);
        assert_eq!(room.phase(), RoomPhase::Unlocked);

        let events = bus.drain();
        assert_eq!(door_open_count(&events), 2);
        let cues = events
            .iter()
            .filter(|e| **e == GameEvent::Cue(AudioCue::DoorOpen))
            .count();
        assert_eq!(cues, 1);
    }

    #[test]
    fn test_unlock_waits_for_delay() {
        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::None).with_unlock_delay(0.5),
        );
        room.add_door(DoorId::new(1), false);
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        // Cleared on the first tick; the delay runs from the tick after.
        tick(&mut room, &world, &mut rng, &bus, 3);
        assert_eq!(room.phase(), RoomPhase::ClearedPendingUnlock);
        assert!(!room.door(DoorId::new(1)).expect("tracked").open);

        tick(&mut room, &world, &mut rng, &bus, 3);
        assert_eq!(room.phase(), RoomPhase::Unlocked);
        assert!(room.door(DoorId::new(1)).expect("tracked").open);
    }

    #[test]
    fn test_starting_room_unlocks_without_delay() {
        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::None)
                .with_unlock_delay(10.0)
                .as_starting_room(),
        );
        room.add_door(DoorId::new(1), false);
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        tick(&mut room, &world, &mut rng, &bus, 2);
        assert_eq!(room.phase(), RoomPhase::Unlocked);
    }

    #[test]
    fn test_key_spawns_on_unlock() {
        let mut room = Room::new(
            RoomConfig::new(RoomId::new(1), ClearCondition::None)
                .with_unlock_delay(0.0)
                .with_key_spawn(Vec2::new(3.0, 4.0)),
        );
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        tick(&mut room, &world, &mut rng, &bus, 5);
        let keys = bus
            .drain()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::SpawnPickup { pickup, .. } if pickup.kind == crate::pickup::PickupKind::Key
                )
            })
            .count();
        assert_eq!(keys, 1);
    }

    #[test]
    fn test_switch_condition_requires_all() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Switch));
        room.add_switch(SwitchId::new(1));
        room.add_switch(SwitchId::new(2));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        tick(&mut room, &world, &mut rng, &bus, 1);
        assert!(!room.cleared());

        assert!(room.activate_switch(SwitchId::new(1), &bus));
        tick(&mut room, &world, &mut rng, &bus, 1);
        assert!(!room.cleared());

        assert!(room.activate_switch(SwitchId::new(2), &bus));
        // Re-activation is a no-op.
        assert!(!room.activate_switch(SwitchId::new(2), &bus));
        tick(&mut room, &world, &mut rng, &bus, 1);
        assert!(room.cleared());
    }

    #[test]
    fn test_boss_health_fraction() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Boss));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        let boss_id = room.add_boss(Enemy::new(EnemyConfig::boss(), Vec2::ZERO));
        assert!((room.boss_health_fraction() - 1.0).abs() < 1e-6);

        // 30 max health; 12 damage leaves 18/30.
        room.handle_enemy_contact(
            boss_id,
            &EnemyContact::PlayerWeapon {
                damage: 12.0,
                direction: Vec2::UP,
            },
            &world,
            &mut rng,
            &bus,
        );
        assert!((room.boss_health_fraction() - 0.6).abs() < 1e-6);

        // Wait out the invulnerability window, then finish it off.
        tick(&mut room, &world, &mut rng, &bus, 5);
        room.handle_enemy_contact(
            boss_id,
            &EnemyContact::PlayerWeapon {
                damage: 100.0,
                direction: Vec2::UP,
            },
            &world,
            &mut rng,
            &bus,
        );
        tick(&mut room, &world, &mut rng, &bus, 1);
        assert!(room.cleared());
        assert_eq!(room.boss_health_fraction(), 0.0);
    }

    #[test]
    fn test_fraction_is_one_without_bosses() {
        let room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        assert!((room.boss_health_fraction() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_paused_propagates() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::ZERO));
        room.add_boss(Enemy::new(EnemyConfig::boss(), Vec2::ZERO));

        room.set_paused(true);
        assert!(room.enemies()[0].character().paused());
        assert!(room.bosses()[0].character().paused());

        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);
        tick(&mut room, &world, &mut rng, &bus, 10);
        // Paused entities skip their policies entirely.
        assert_eq!(room.enemies()[0].state(), EnemyState::Idle);

        room.set_paused(false);
        tick(&mut room, &world, &mut rng, &bus, 1);
        assert_eq!(room.enemies()[0].state(), EnemyState::Wander);
    }

    #[test]
    fn test_reset_restores_tracked_entities() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        let id = room.add_enemy(Enemy::new(EnemyConfig::wanderer(), Vec2::new(2.0, 2.0)));
        let world = MockWorld::new();
        let bus = EventBus::new();
        let mut rng = Lcg::new(1);

        tick(&mut room, &world, &mut rng, &bus, 5);
        room.handle_enemy_contact(
            id,
            &EnemyContact::PlayerWeapon {
                damage: 2.0,
                direction: Vec2::UP,
            },
            &world,
            &mut rng,
            &bus,
        );

        room.reset();
        let enemy = &room.enemies()[0];
        assert_eq!(enemy.position(), Vec2::new(2.0, 2.0));
        assert_eq!(enemy.state(), EnemyState::Idle);
        assert_eq!(
            enemy.character().health(),
            enemy.character().max_health()
        );
    }

    #[test]
    fn test_key_door_opens_once() {
        let mut room = Room::new(RoomConfig::new(RoomId::new(1), ClearCondition::Enemy));
        room.add_door(DoorId::new(4), false);
        let bus = EventBus::new();

        assert!(room.open_door(DoorId::new(4), &bus));
        assert!(!room.open_door(DoorId::new(4), &bus));
        // Unknown doors degrade gracefully.
        assert!(!room.open_door(DoorId::new(9), &bus));
        assert_eq!(door_open_count(&bus.drain()), 1);
    }
}
