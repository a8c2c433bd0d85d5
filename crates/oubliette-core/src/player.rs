//! Player behavior policy.
//!
//! Unlike enemies the player is input-driven: Idle/Walk follow directional
//! input, attacks trigger on discrete inputs gated by the attack cooldown,
//! and a charge accumulates while the melee button is held. Timed state
//! holds, the invulnerability window, and knockback use the same primitives
//! as every other character.

use crate::audio::{AudioCue, MusicBus};
use crate::character::{Character, DamageOutcome, PLAYER_FLASH_DURATION};
use crate::combat::{
    charged_request, melee_request, projectile_request, CombatEvent, DamageSource,
};
use crate::events::{AnimationKey, AnimationState, EventBus, GameEvent};
use crate::pickup::PickupKind;
use crate::state::{ActorTag, Facing, StateMachine};
use crate::timer::HoldTimer;
use crate::world::PlayerContact;
use oubliette_common::{DoorId, EntityId, RoomId, SwitchId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delay between pulses of the charge-ready indicator, in seconds.
const CHARGE_FLASH_DELAY: f32 = 0.09;
/// Health fraction at or below which the low-health loop plays.
const LOW_HEALTH_FRACTION: f32 = 0.5;

/// Player behavior states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Standing still
    Idle,
    /// Walking in the facing direction
    Walk,
    /// Melee swing in progress
    MeleeAttack,
    /// Ranged shot (or dry fire) in progress
    RangedAttack,
    /// Charged attack in progress
    ChargeAttack,
}

/// One tick's worth of player input, sampled by the embedding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Up direction held
    pub up: bool,
    /// Down direction held
    pub down: bool,
    /// Left direction held
    pub left: bool,
    /// Right direction held
    pub right: bool,
    /// Melee button went down this tick
    pub melee_pressed: bool,
    /// Melee button is held
    pub melee_held: bool,
    /// Melee button went up this tick
    pub melee_released: bool,
    /// Ranged button went down this tick
    pub ranged_pressed: bool,
}

impl InputSnapshot {
    /// No input at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            melee_pressed: false,
            melee_held: false,
            melee_released: false,
            ranged_pressed: false,
        }
    }

    /// Whether any directional input is held.
    #[must_use]
    pub const fn any_direction(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Player tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Maximum health
    pub max_health: f32,
    /// Base attack damage
    pub damage: f32,
    /// Knockback force taken when hit
    pub knockback_force: f32,
    /// Walk speed
    pub walk_speed: f32,
    /// Maximum ranged ammo
    pub max_ammo: u32,
    /// Maximum carried keys
    pub max_keys: u32,
    /// Cooldown before the next attack is allowed
    pub attack_delay: f32,
    /// Duration of an attack state hold and its weapon's lifetime
    pub attack_duration: f32,
    /// Player projectile travel speed
    pub projectile_speed: f32,
    /// Time the melee button must be held before a charge is ready
    pub charge_duration: f32,
    /// Collider half-extents
    pub half_extents: Vec2,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 6.0,
            damage: 2.0,
            knockback_force: 6.0,
            walk_speed: 4.0,
            max_ammo: 10,
            max_keys: 9,
            attack_delay: 0.4,
            attack_duration: 0.25,
            projectile_speed: 8.0,
            charge_duration: 1.0,
            half_extents: Vec2::new(0.5, 0.5),
        }
    }
}

/// Reply from a contact the player cannot resolve alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactReply {
    /// A key was spent; the room should open this door.
    UnlockDoor {
        /// Room the door belongs to
        room: RoomId,
        /// The door to open
        door: DoorId,
    },
    /// The room should activate this switch.
    PressSwitch {
        /// Room the switch belongs to
        room: RoomId,
        /// The switch to activate
        switch: SwitchId,
    },
}

/// The player: character record, state machine, resources, and charge state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: EntityId,
    config: PlayerConfig,
    character: Character,
    machine: StateMachine<PlayerState>,
    hold: HoldTimer,
    cooldown: HoldTimer,
    ammo: u32,
    keys: u32,
    charging: bool,
    charged: bool,
    charge_elapsed: f32,
    charged_time: f32,
    low_health_playing: bool,
    has_won: bool,
    position: Vec2,
    velocity: Vec2,
    prev_paused: bool,
}

impl Player {
    /// Creates the player at a position.
    #[must_use]
    pub fn new(config: PlayerConfig, position: Vec2) -> Self {
        let character = Character::new(config.max_health, config.damage, config.knockback_force)
            .with_flash_duration(PLAYER_FLASH_DURATION);
        Self {
            id: EntityId::new(),
            config,
            character,
            machine: StateMachine::new(PlayerState::Idle, Facing::Down),
            hold: HoldTimer::new(),
            cooldown: HoldTimer::new(),
            ammo: config.max_ammo,
            keys: 0,
            charging: false,
            charged: false,
            charge_elapsed: 0.0,
            charged_time: 0.0,
            low_health_playing: false,
            has_won: false,
            position,
            velocity: Vec2::ZERO,
            prev_paused: false,
        }
    }

    /// Entity ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Shared character record.
    #[must_use]
    pub const fn character(&self) -> &Character {
        &self.character
    }

    /// Current behavior state.
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        self.machine.state()
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.machine.facing()
    }

    /// Remaining ranged ammo.
    #[must_use]
    pub const fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Carried keys.
    #[must_use]
    pub const fn keys(&self) -> u32 {
        self.keys
    }

    /// Whether the player reached the end of the game.
    #[must_use]
    pub const fn has_won(&self) -> bool {
        self.has_won
    }

    /// Whether another attack may be issued.
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.cooldown.expired()
    }

    /// Whether a charged attack is ready for release.
    #[must_use]
    pub const fn charged(&self) -> bool {
        self.charged
    }

    /// Whether the player is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.character.is_dead()
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Writes back the position integrated by the physics collaborator.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Movement intent for this tick, consumed by the physics collaborator.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Suspends or resumes input evaluation.
    pub fn set_paused(&mut self, paused: bool) {
        self.character.set_paused(paused);
    }

    /// Phase of the charge-ready pulse, alternating every 0.09s. `None`
    /// while no charge is ready.
    #[must_use]
    pub fn charge_flash_phase(&self) -> Option<u8> {
        if self.charged {
            Some(((self.charged_time / CHARGE_FLASH_DELAY) as u32 % 2) as u8)
        } else {
            None
        }
    }

    /// Runs one simulation step of the player policy.
    ///
    /// Input is ignored while dead or paused, and for one tick after a
    /// resume so buffered presses cannot fire attacks. Timers and hit
    /// windows always advance.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot, bus: &EventBus) {
        self.velocity = Vec2::ZERO;
        self.hold.tick(dt);
        self.cooldown.tick(dt);
        self.character.tick(dt);

        let active =
            !self.character.is_dead() && !self.character.paused() && !self.prev_paused;
        if active {
            match self.machine.state() {
                PlayerState::Idle => self.update_idle(input),
                PlayerState::Walk => self.update_walk(input),
                PlayerState::MeleeAttack => self.update_melee(bus),
                PlayerState::RangedAttack => self.update_ranged(bus),
                PlayerState::ChargeAttack => self.update_charge_attack(bus),
            }

            self.update_charge(input, dt);

            // Footstep loop follows the walk-state edges.
            if self.machine.state() == PlayerState::Walk
                && self.machine.prev_state() != PlayerState::Walk
            {
                bus.publish(GameEvent::MusicStarted(MusicBus::Footsteps));
            } else if self.machine.state() != PlayerState::Walk
                && self.machine.prev_state() == PlayerState::Walk
            {
                bus.publish(GameEvent::MusicStopped(MusicBus::Footsteps));
            }

            if self.machine.animation_due() {
                bus.publish(GameEvent::AnimationChanged {
                    entity: self.id,
                    key: AnimationKey {
                        actor: ActorTag::Player,
                        state: AnimationState::Player(self.machine.state()),
                        facing: self.machine.facing(),
                    },
                });
            }
        }
        self.prev_paused = self.character.paused();

        if let Some(kb) = self.character.knockback_velocity() {
            self.velocity = kb;
        }
    }

    fn update_idle(&mut self, input: &InputSnapshot) {
        if input.any_direction() {
            self.machine.transition(PlayerState::Walk);
        } else if input.melee_pressed && self.can_attack() {
            self.machine.transition(PlayerState::MeleeAttack);
        } else if input.ranged_pressed && self.can_attack() {
            self.machine.transition(PlayerState::RangedAttack);
        } else if input.melee_released && self.can_attack() && self.charged {
            self.machine.transition(PlayerState::ChargeAttack);
        } else {
            self.machine.transition(PlayerState::Idle);
        }
    }

    fn update_walk(&mut self, input: &InputSnapshot) {
        if input.up {
            self.machine.transition_facing(Facing::Up);
        } else if input.down {
            self.machine.transition_facing(Facing::Down);
        } else if input.left {
            self.machine.transition_facing(Facing::Left);
        } else if input.right {
            self.machine.transition_facing(Facing::Right);
        }

        if input.melee_pressed && self.can_attack() {
            self.machine.transition(PlayerState::MeleeAttack);
        } else if input.ranged_pressed && self.can_attack() {
            self.machine.transition(PlayerState::RangedAttack);
        } else if input.melee_released && self.can_attack() && self.charged {
            self.machine.transition(PlayerState::ChargeAttack);
        } else if input.any_direction() {
            self.velocity = self.machine.facing().unit() * self.config.walk_speed;
            self.machine.transition(PlayerState::Walk);
        } else {
            self.machine.transition(PlayerState::Idle);
        }
    }

    fn update_melee(&mut self, bus: &EventBus) {
        if self.machine.just_entered() {
            bus.publish(GameEvent::Cue(AudioCue::PlayerAttack));
            bus.publish(GameEvent::SpawnAttack(melee_request(
                self.id,
                self.machine.facing(),
                self.character.damage(),
                self.config.attack_duration,
            )));
            self.cooldown.arm(self.config.attack_delay);
            self.hold.arm(self.config.attack_duration);
        }

        if self.hold.holding() {
            self.machine.transition(PlayerState::MeleeAttack);
        } else {
            self.machine.transition(PlayerState::Idle);
        }
    }

    fn update_ranged(&mut self, bus: &EventBus) {
        if self.machine.just_entered() {
            if self.ammo > 0 {
                self.ammo -= 1;
                bus.publish(GameEvent::Cue(AudioCue::PlayerShoot));
                bus.publish(GameEvent::SpawnAttack(projectile_request(
                    self.id,
                    DamageSource::Player,
                    self.machine.facing(),
                    self.character.damage(),
                    self.config.projectile_speed,
                )));
            }
            // Dry fire: no spawn, but the hold and cooldown are still
            // consumed so the attempt is visible.
            self.cooldown.arm(self.config.attack_delay);
            self.hold.arm(self.config.attack_duration);
        }

        if self.hold.holding() {
            self.machine.transition(PlayerState::RangedAttack);
        } else {
            self.machine.transition(PlayerState::Idle);
        }
    }

    fn update_charge_attack(&mut self, bus: &EventBus) {
        if self.machine.just_entered() {
            self.charged = false;
            self.charged_time = 0.0;
            bus.publish(GameEvent::Cue(AudioCue::PlayerStrongAttack));
            bus.publish(GameEvent::SpawnAttack(charged_request(
                self.id,
                self.machine.facing(),
                self.character.damage(),
                self.config.attack_duration,
            )));
            self.cooldown.arm(self.config.attack_delay);
            self.hold.arm(self.config.attack_duration);
        }

        if self.hold.holding() {
            self.machine.transition(PlayerState::ChargeAttack);
        } else {
            self.machine.transition(PlayerState::Idle);
        }
    }

    /// Accumulates the charge while the melee button is held.
    fn update_charge(&mut self, input: &InputSnapshot, dt: f32) {
        if !self.charging && input.melee_pressed {
            self.charging = true;
            self.charge_elapsed = 0.0;
        }

        if self.charging {
            if self.charge_elapsed < self.config.charge_duration && input.melee_held {
                self.charge_elapsed += dt;
            } else if self.charge_elapsed >= self.config.charge_duration && input.melee_held {
                self.charged = true;
                self.charging = false;
            } else {
                self.charging = false;
                self.charge_elapsed = 0.0;
            }
        }

        if self.charged {
            self.charged_time += dt;
        }
    }

    /// Handles a collision notification from the physics collaborator.
    ///
    /// Contacts the player cannot resolve alone (doors, switches) are
    /// returned for the session to route to the owning room.
    pub fn handle_contact(
        &mut self,
        contact: &PlayerContact,
        bus: &EventBus,
    ) -> Option<ContactReply> {
        match *contact {
            PlayerContact::Enemy { damage, direction } => {
                self.take_damage(damage, direction, bus);
                None
            }
            PlayerContact::EnemyProjectile {
                damage,
                direction,
                origin,
            } => {
                if self.blocks_projectile(direction, origin) {
                    bus.publish(GameEvent::Cue(AudioCue::PlayerBlock));
                } else {
                    self.take_damage(damage, direction, bus);
                }
                None
            }
            PlayerContact::Pickup { kind, value } => {
                self.consume_pickup(kind, value, bus);
                None
            }
            PlayerContact::LockedDoor { room, door } => {
                if self.keys > 0 {
                    self.keys -= 1;
                    bus.publish(GameEvent::Cue(AudioCue::DoorOpen));
                    Some(ContactReply::UnlockDoor { room, door })
                } else {
                    None
                }
            }
            PlayerContact::Switch { room, switch } => {
                Some(ContactReply::PressSwitch { room, switch })
            }
            PlayerContact::EndTrigger => {
                self.has_won = true;
                None
            }
        }
    }

    fn take_damage(&mut self, amount: f32, direction: Vec2, bus: &EventBus) {
        let outcome = self.character.apply_damage(&CombatEvent {
            amount,
            direction,
            source: DamageSource::Enemy,
        });
        if outcome == DamageOutcome::Ignored {
            return;
        }

        // Taking a hit interrupts an in-progress charge.
        self.charging = false;
        self.charge_elapsed = 0.0;

        if outcome == DamageOutcome::Hit {
            bus.publish(GameEvent::Cue(AudioCue::PlayerTakeDamage));
        } else {
            debug!("player died");
        }
        self.update_low_health_bus(bus);
    }

    fn consume_pickup(&mut self, kind: PickupKind, value: f32, bus: &EventBus) {
        match kind {
            PickupKind::Health => {
                self.character.change_health(value);
                self.update_low_health_bus(bus);
                bus.publish(GameEvent::Cue(AudioCue::PlayerGrabPotion));
            }
            PickupKind::Ammo => {
                self.ammo = (self.ammo + value as u32).min(self.config.max_ammo);
                bus.publish(GameEvent::Cue(AudioCue::PlayerGrabPotion));
            }
            PickupKind::Key => {
                self.keys = (self.keys + value as u32).min(self.config.max_keys);
                bus.publish(GameEvent::Cue(AudioCue::PlayerGrabKey));
            }
        }
    }

    /// Directional block: while idle or walking, a projectile arriving
    /// against the facing within a size-weighted cone is deflected.
    fn blocks_projectile(&self, direction: Vec2, origin: Vec2) -> bool {
        if !matches!(
            self.machine.state(),
            PlayerState::Idle | PlayerState::Walk
        ) {
            return false;
        }

        let height = self.config.half_extents.y * 2.0;
        let width = self.config.half_extents.x * 2.0;
        let facing = self.machine.facing();

        if direction.y.abs() / height >= direction.x.abs() / width {
            (origin.y >= self.position.y && facing == Facing::Up)
                || (origin.y <= self.position.y && facing == Facing::Down)
        } else {
            (origin.x >= self.position.x && facing == Facing::Right)
                || (origin.x <= self.position.x && facing == Facing::Left)
        }
    }

    /// Starts or stops the low-health loop on threshold crossings.
    fn update_low_health_bus(&mut self, bus: &EventBus) {
        if self.character.is_dead() {
            if self.low_health_playing {
                bus.publish(GameEvent::MusicStopped(MusicBus::LowHealth));
                self.low_health_playing = false;
            }
        } else if self.character.health_fraction() <= LOW_HEALTH_FRACTION
            && !self.low_health_playing
        {
            bus.publish(GameEvent::MusicStarted(MusicBus::LowHealth));
            self.low_health_playing = true;
        } else if self.character.health_fraction() > LOW_HEALTH_FRACTION
            && self.low_health_playing
        {
            bus.publish(GameEvent::MusicStopped(MusicBus::LowHealth));
            self.low_health_playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.1;

    fn player() -> Player {
        Player::new(PlayerConfig::default(), Vec2::ZERO)
    }

    fn walk_up() -> InputSnapshot {
        InputSnapshot {
            up: true,
            ..InputSnapshot::none()
        }
    }

    fn melee_press() -> InputSnapshot {
        InputSnapshot {
            melee_pressed: true,
            melee_held: true,
            ..InputSnapshot::none()
        }
    }

    fn ranged_press() -> InputSnapshot {
        InputSnapshot {
            ranged_pressed: true,
            ..InputSnapshot::none()
        }
    }

    fn count_spawns(bus: &EventBus) -> usize {
        bus.drain()
            .iter()
            .filter(|e| matches!(e, GameEvent::SpawnAttack(_)))
            .count()
    }

    #[test]
    fn test_idle_to_walk_and_back() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &walk_up(), &bus);
        assert_eq!(p.state(), PlayerState::Walk);

        p.update(DT, &walk_up(), &bus);
        assert_eq!(p.facing(), Facing::Up);
        assert!(p.velocity().y > 0.0);

        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(p.state(), PlayerState::Idle);
    }

    #[test]
    fn test_walk_emits_footstep_edges() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &walk_up(), &bus);
        p.update(DT, &walk_up(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);

        let events = bus.drain();
        let starts = events
            .iter()
            .filter(|e| **e == GameEvent::MusicStarted(MusicBus::Footsteps))
            .count();
        let stops = events
            .iter()
            .filter(|e| **e == GameEvent::MusicStopped(MusicBus::Footsteps))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_melee_attack_spawns_and_cools_down() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &melee_press(), &bus);
        assert_eq!(p.state(), PlayerState::MeleeAttack);
        // Entry tick issues the hitbox and starts the cooldown.
        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(count_spawns(&bus), 1);
        assert!(!p.can_attack());

        // Attack input is refused until the cooldown elapses.
        for _ in 0..2 {
            p.update(DT, &melee_press(), &bus);
        }
        assert_eq!(count_spawns(&bus), 0);

        for _ in 0..4 {
            p.update(DT, &InputSnapshot::none(), &bus);
        }
        assert!(p.can_attack());
    }

    #[test]
    fn test_attack_state_returns_to_idle_after_hold() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &melee_press(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(p.state(), PlayerState::MeleeAttack);

        // attack_duration is 0.25s; the hold armed on the entry tick.
        for _ in 0..3 {
            p.update(DT, &InputSnapshot::none(), &bus);
        }
        assert_eq!(p.state(), PlayerState::Idle);
    }

    #[test]
    fn test_ranged_attack_consumes_ammo() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &ranged_press(), &bus);
        assert_eq!(p.state(), PlayerState::RangedAttack);
        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(p.ammo(), p.config.max_ammo - 1);
        assert_eq!(count_spawns(&bus), 1);
    }

    #[test]
    fn test_dry_fire_spawns_nothing_but_cools_down() {
        let mut p = player();
        p.ammo = 0;
        let bus = EventBus::new();

        p.update(DT, &ranged_press(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(count_spawns(&bus), 0);
        assert_eq!(p.ammo(), 0);
        // The dry attempt still consumes the cooldown window.
        assert!(!p.can_attack());

        for _ in 0..5 {
            p.update(DT, &InputSnapshot::none(), &bus);
        }
        assert!(p.can_attack());
    }

    #[test]
    fn test_charge_ready_and_release() {
        let mut p = player();
        let bus = EventBus::new();
        let held = InputSnapshot {
            melee_held: true,
            ..InputSnapshot::none()
        };

        // Press starts both the melee attack and the charge.
        p.update(DT, &melee_press(), &bus);
        // Hold through the charge duration (1.0s).
        for _ in 0..12 {
            p.update(DT, &held, &bus);
        }
        assert!(p.charged());
        assert!(p.charge_flash_phase().is_some());

        bus.drain();
        let release = InputSnapshot {
            melee_released: true,
            ..InputSnapshot::none()
        };
        p.update(DT, &release, &bus);
        assert_eq!(p.state(), PlayerState::ChargeAttack);
        p.update(DT, &InputSnapshot::none(), &bus);
        assert!(!p.charged());

        let events = bus.drain();
        let spawned_sweep = events.iter().any(|e| {
            matches!(
                e,
                GameEvent::SpawnAttack(crate::combat::AttackRequest::ChargedSweep { .. })
            )
        });
        assert!(spawned_sweep);
    }

    #[test]
    fn test_damage_cancels_charging() {
        let mut p = player();
        let bus = EventBus::new();

        p.update(DT, &melee_press(), &bus);
        let held = InputSnapshot {
            melee_held: true,
            ..InputSnapshot::none()
        };
        p.update(DT, &held, &bus);
        assert!(p.charging);

        p.handle_contact(
            &PlayerContact::Enemy {
                damage: 1.0,
                direction: Vec2::LEFT,
            },
            &bus,
        );
        assert!(!p.charging);
    }

    #[test]
    fn test_block_negates_damage_without_invulnerability() {
        let mut p = player();
        let bus = EventBus::new();
        // Face up toward an incoming projectile from above.
        p.update(DT, &walk_up(), &bus);
        p.update(DT, &walk_up(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);
        assert_eq!(p.facing(), Facing::Up);
        bus.drain();

        p.handle_contact(
            &PlayerContact::EnemyProjectile {
                damage: 2.0,
                direction: Vec2::DOWN,
                origin: Vec2::new(0.0, 3.0),
            },
            &bus,
        );

        assert_eq!(p.character().health(), p.character().max_health());
        // No invulnerability window was consumed.
        assert!(p.character().can_take_damage());
        assert!(bus
            .drain()
            .contains(&GameEvent::Cue(AudioCue::PlayerBlock)));
    }

    #[test]
    fn test_projectile_from_behind_hits() {
        let mut p = player();
        let bus = EventBus::new();
        // Facing up; projectile arrives from below.
        p.update(DT, &walk_up(), &bus);
        p.update(DT, &walk_up(), &bus);
        p.update(DT, &InputSnapshot::none(), &bus);

        p.handle_contact(
            &PlayerContact::EnemyProjectile {
                damage: 2.0,
                direction: Vec2::UP,
                origin: Vec2::new(0.0, -3.0),
            },
            &bus,
        );
        assert!(p.character().health() < p.character().max_health());
    }

    #[test]
    fn test_low_health_bus_threshold() {
        let mut p = player();
        let bus = EventBus::new();

        // 6 max health; drop to 3 (exactly half).
        p.handle_contact(
            &PlayerContact::Enemy {
                damage: 3.0,
                direction: Vec2::LEFT,
            },
            &bus,
        );
        assert!(bus
            .drain()
            .contains(&GameEvent::MusicStarted(MusicBus::LowHealth)));

        // Healing back above half stops the loop.
        p.handle_contact(
            &PlayerContact::Pickup {
                kind: PickupKind::Health,
                value: 2.0,
            },
            &bus,
        );
        assert!(bus
            .drain()
            .contains(&GameEvent::MusicStopped(MusicBus::LowHealth)));
    }

    #[test]
    fn test_pickups_clamp_to_maximums() {
        let mut p = player();
        let bus = EventBus::new();

        p.handle_contact(
            &PlayerContact::Pickup {
                kind: PickupKind::Ammo,
                value: 50.0,
            },
            &bus,
        );
        assert_eq!(p.ammo(), p.config.max_ammo);

        for _ in 0..20 {
            p.handle_contact(
                &PlayerContact::Pickup {
                    kind: PickupKind::Key,
                    value: 1.0,
                },
                &bus,
            );
        }
        assert_eq!(p.keys(), p.config.max_keys);
    }

    #[test]
    fn test_locked_door_spends_a_key() {
        let mut p = player();
        let bus = EventBus::new();
        let door = PlayerContact::LockedDoor {
            room: RoomId::new(1),
            door: DoorId::new(2),
        };

        // Without a key nothing happens.
        assert_eq!(p.handle_contact(&door, &bus), None);

        p.handle_contact(
            &PlayerContact::Pickup {
                kind: PickupKind::Key,
                value: 1.0,
            },
            &bus,
        );
        let reply = p.handle_contact(&door, &bus);
        assert_eq!(
            reply,
            Some(ContactReply::UnlockDoor {
                room: RoomId::new(1),
                door: DoorId::new(2),
            })
        );
        assert_eq!(p.keys(), 0);
    }

    #[test]
    fn test_end_trigger_sets_win_flag() {
        let mut p = player();
        let bus = EventBus::new();
        assert!(!p.has_won());
        p.handle_contact(&PlayerContact::EndTrigger, &bus);
        assert!(p.has_won());
    }

    #[test]
    fn test_paused_player_ignores_input() {
        let mut p = player();
        let bus = EventBus::new();
        p.set_paused(true);

        for _ in 0..5 {
            p.update(DT, &walk_up(), &bus);
        }
        assert_eq!(p.state(), PlayerState::Idle);
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_one_tick_grace_after_resume() {
        let mut p = player();
        let bus = EventBus::new();
        p.set_paused(true);
        p.update(DT, &InputSnapshot::none(), &bus);

        p.set_paused(false);
        // First tick after resume still ignores buffered input.
        p.update(DT, &melee_press(), &bus);
        assert_eq!(p.state(), PlayerState::Idle);
        p.update(DT, &melee_press(), &bus);
        assert_eq!(p.state(), PlayerState::MeleeAttack);
    }
}
