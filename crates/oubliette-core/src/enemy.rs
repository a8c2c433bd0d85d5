//! Enemy behavior policies.
//!
//! Every variant shares the same idle/wander hold cycle and differs in its
//! extra state and exit-weight table: the wanderer only patrols, the ranged
//! enemy fires a projectile, the seeker charges along an unobstructed line
//! to the player, and the boss fires a three-way spread and turns aggressive
//! below half health. Variants are one [`Enemy`] value parameterized by
//! [`EnemyKind`] and [`EnemyConfig`] rather than a type hierarchy.

use crate::audio::AudioCue;
use crate::character::Character;
use crate::combat::{projectile_request, spread_requests, CombatEvent, DamageSource};
use crate::events::{AnimationKey, AnimationState, EventBus, GameEvent};
use crate::pickup::roll_enemy_drop;
use crate::random::{weighted_index, RandomSource, SelectorError};
use crate::state::{ActorTag, Facing, StateMachine};
use crate::timer::HoldTimer;
use crate::world::{facing_wall, obstacle_directions, sees_player, EnemyContact, WorldQuery};
use oubliette_common::{CoreError, CoreResult, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Margin added to half-extents when probing for walls after a collision.
const COLLISION_PROBE_MARGIN: f32 = 0.05;
/// Bound on facing re-rolls when boxed in on all sides.
const MAX_REROLLS: u32 = 16;

/// Behavior states shared by all enemy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Standing still for the idle hold
    Idle,
    /// Walking in the current facing for the wander hold
    Wander,
    /// Charging straight toward a spotted player
    Seek,
    /// Holding position while an attack plays out
    RangedAttack,
}

/// Enemy variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Patrol-only; always returns to idle after wandering
    Wanderer,
    /// Fires one cardinal projectile per attack window
    Ranged,
    /// Enters seek whenever the player is visible straight ahead
    Seeker,
    /// Ranged variant with a spread shot and health-gated aggression
    Boss,
}

/// Tuning for one enemy variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// Which variant this enemy is
    pub kind: EnemyKind,
    /// Maximum health
    pub max_health: f32,
    /// Contact and projectile damage
    pub damage: f32,
    /// Knockback force taken when hit
    pub knockback_force: f32,
    /// Walk speed while wandering
    pub walk_speed: f32,
    /// Idle hold duration in seconds
    pub idle_duration: f32,
    /// Wander hold duration in seconds
    pub wander_duration: f32,
    /// Attack hold duration in seconds
    pub attack_hold: f32,
    /// Projectile travel speed
    pub projectile_speed: f32,
    /// Seek movement speed
    pub seek_speed: f32,
    /// Forward distance checked for the player when seeking
    pub seek_distance: f32,
    /// Collider half-extents
    pub half_extents: Vec2,
    /// Wall-probe distances while wandering (x rays, y rays)
    pub wander_probe: Vec2,
    /// Wall-probe distances for the seek stop check
    pub seek_probe: Vec2,
    /// Exit-from-wander weights: `[attack-or-stay, idle]`
    pub exit_weights: [u32; 2],
    /// Exit weights once the boss drops to half health
    pub aggressive_weights: [u32; 2],
    /// Half-angle of the boss spread shot in degrees
    pub spread_angle_deg: f32,
    /// Walk-speed multiplier for the aggressive boss
    pub speed_modifier: f32,
}

impl EnemyConfig {
    fn base(kind: EnemyKind) -> Self {
        let half = Vec2::new(0.5, 0.5);
        Self {
            kind,
            max_health: 6.0,
            damage: 1.0,
            knockback_force: 6.0,
            walk_speed: 2.0,
            idle_duration: 1.5,
            wander_duration: 2.0,
            attack_hold: 1.0,
            projectile_speed: 5.0,
            seek_speed: 6.0,
            seek_distance: 5.0,
            half_extents: half,
            wander_probe: Vec2::new(half.x + 0.05, half.y + 0.05),
            seek_probe: Vec2::new(half.x + 0.05, half.y + 0.05),
            exit_weights: [0, 1],
            aggressive_weights: [0, 1],
            spread_angle_deg: 0.0,
            speed_modifier: 1.0,
        }
    }

    /// Patrol-only enemy.
    ///
    /// Its wall probe reaches only half the collider height below/above,
    /// a narrower check than the other variants use.
    #[must_use]
    pub fn wanderer() -> Self {
        let mut config = Self::base(EnemyKind::Wanderer);
        config.wander_probe = Vec2::new(
            config.half_extents.x + 0.05,
            config.half_extents.y / 2.0 + 0.05,
        );
        config
    }

    /// Projectile-firing enemy. Probes with its x half-extent on both axes.
    #[must_use]
    pub fn ranged() -> Self {
        let mut config = Self::base(EnemyKind::Ranged);
        config.wander_probe = Vec2::new(
            config.half_extents.x + 0.05,
            config.half_extents.x + 0.05,
        );
        config.exit_weights = [1, 4];
        config
    }

    /// Line-of-sight charger.
    #[must_use]
    pub fn seeker() -> Self {
        let mut config = Self::base(EnemyKind::Seeker);
        config.seek_probe = Vec2::new(
            config.half_extents.x + 0.05,
            config.half_extents.y / 2.0 + 0.05,
        );
        // On wander expiry: stay wandering 3, idle 1.
        config.exit_weights = [3, 1];
        config
    }

    /// Health-gated boss.
    #[must_use]
    pub fn boss() -> Self {
        let mut config = Self::base(EnemyKind::Boss);
        config.max_health = 30.0;
        config.damage = 2.0;
        config.attack_hold = config.idle_duration;
        config.exit_weights = [1, 1];
        config.aggressive_weights = [3, 1];
        config.spread_angle_deg = 25.0;
        config.speed_modifier = 1.5;
        config
    }

    /// Checks the weight tables at setup time.
    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.exit_weights.iter().sum::<u32>() == 0 {
            return Err(SelectorError::ZeroTotal);
        }
        if self.aggressive_weights.iter().sum::<u32>() == 0 {
            return Err(SelectorError::ZeroTotal);
        }
        Ok(())
    }
}

/// One enemy instance: character record, state machine, hold timer, and the
/// movement intent read back by the physics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    id: EntityId,
    config: EnemyConfig,
    character: Character,
    machine: StateMachine<EnemyState>,
    hold: HoldTimer,
    position: Vec2,
    velocity: Vec2,
    spawn_position: Vec2,
    spawn_state: EnemyState,
    spawn_facing: Facing,
}

impl Enemy {
    /// Spawns an enemy at a position.
    #[must_use]
    pub fn new(config: EnemyConfig, position: Vec2) -> Self {
        debug_assert!(config.validate().is_ok());
        let character = Character::new(config.max_health, config.damage, config.knockback_force);
        Self {
            id: EntityId::new(),
            config,
            character,
            machine: StateMachine::new(EnemyState::Idle, Facing::Down),
            hold: HoldTimer::new(),
            position,
            velocity: Vec2::ZERO,
            spawn_position: position,
            spawn_state: EnemyState::Idle,
            spawn_facing: Facing::Down,
        }
    }

    /// Spawns an enemy from an externally supplied config, surfacing
    /// malformed weight tables as a fatal setup error.
    pub fn try_new(config: EnemyConfig, position: Vec2) -> CoreResult<Self> {
        config
            .validate()
            .map_err(|e| CoreError::Configuration(e.to_string()))?;
        Ok(Self::new(config, position))
    }

    /// Entity ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Which variant this enemy is.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.config.kind
    }

    /// Animation tag for this variant.
    #[must_use]
    pub const fn actor_tag(&self) -> ActorTag {
        match self.config.kind {
            EnemyKind::Wanderer => ActorTag::Wanderer,
            EnemyKind::Ranged => ActorTag::RangedEnemy,
            EnemyKind::Seeker => ActorTag::SeekingEnemy,
            EnemyKind::Boss => ActorTag::Boss,
        }
    }

    /// Shared character record.
    #[must_use]
    pub const fn character(&self) -> &Character {
        &self.character
    }

    /// Mutable character record.
    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    /// Current behavior state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.machine.state()
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.machine.facing()
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

    /// Whether this enemy is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.character.is_dead()
    }

    /// Runs one simulation step of the behavior policy.
    ///
    /// Timers and hit windows advance even while paused; only the decision
    /// logic is suspended.
    pub fn update<W: WorldQuery + ?Sized>(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        world: &W,
        rng: &mut dyn RandomSource,
        bus: &EventBus,
    ) {
        self.velocity = Vec2::ZERO;
        self.hold.tick(dt);
        self.character.tick(dt);

        if !self.character.paused() && !self.character.is_dead() {
            match self.machine.state() {
                EnemyState::Idle => self.update_idle(world),
                EnemyState::Wander => self.update_wander(world, rng),
                EnemyState::Seek => self.update_seek(world),
                EnemyState::RangedAttack => self.update_ranged_attack(player_pos, bus),
            }
        }

        // Knockback overrides any movement intent until its window ends.
        if let Some(kb) = self.character.knockback_velocity() {
            self.velocity = kb;
        }

        if self.machine.animation_due() {
            bus.publish(GameEvent::AnimationChanged {
                entity: self.id,
                key: AnimationKey {
                    actor: self.actor_tag(),
                    state: AnimationState::Enemy(self.machine.state()),
                    facing: self.machine.facing(),
                },
            });
        }
    }

    fn update_idle<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        if self.machine.just_entered() {
            self.hold.arm(self.config.idle_duration);
        }

        if self.hold.holding() {
            self.machine.transition(EnemyState::Idle);
        } else {
            self.machine.transition(EnemyState::Wander);
        }

        if self.config.kind == EnemyKind::Seeker && self.player_ahead(world) {
            self.machine.transition(EnemyState::Seek);
            self.hold.invalidate();
        }
    }

    fn update_wander<W: WorldQuery + ?Sized>(&mut self, world: &W, rng: &mut dyn RandomSource) {
        if self.machine.just_entered() {
            self.hold.arm(self.config.wander_duration);
            // Coming out of seek keeps the facing the charge ended with.
            if !(self.config.kind == EnemyKind::Seeker
                && self.machine.prev_state() == EnemyState::Seek)
            {
                self.machine.transition_facing(Facing::random(rng));
            }
        }

        if facing_wall(
            world,
            self.position,
            self.config.half_extents,
            self.config.wander_probe,
            self.machine.facing(),
        ) {
            self.reroll_facing(world, rng);
        }

        self.velocity = self.machine.facing().unit() * self.current_walk_speed();

        if self.hold.holding() {
            self.machine.transition(EnemyState::Wander);
        } else {
            self.exit_wander(rng);
        }

        if self.config.kind == EnemyKind::Seeker && self.player_ahead(world) {
            self.machine.transition(EnemyState::Seek);
            self.hold.invalidate();
        }
    }

    fn update_seek<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        self.velocity = self.machine.facing().unit() * self.config.seek_speed;

        if facing_wall(
            world,
            self.position,
            self.config.half_extents,
            self.config.seek_probe,
            self.machine.facing(),
        ) {
            self.machine.transition(EnemyState::Wander);
        } else {
            self.machine.transition(EnemyState::Seek);
        }
    }

    fn update_ranged_attack(&mut self, player_pos: Vec2, bus: &EventBus) {
        if self.machine.just_entered() {
            self.fire(player_pos, bus);
            self.hold.arm(self.config.attack_hold);
        }

        if self.hold.holding() {
            self.machine.transition(EnemyState::RangedAttack);
        } else {
            self.machine.transition(EnemyState::Wander);
        }
    }

    /// Picks the next state once the wander hold has expired.
    fn exit_wander(&mut self, rng: &mut dyn RandomSource) {
        match self.config.kind {
            EnemyKind::Wanderer => {
                self.machine.transition(EnemyState::Idle);
            }
            EnemyKind::Ranged | EnemyKind::Boss => {
                // A misconfigured table degrades to the idle branch.
                let index = weighted_index(rng, &self.active_exit_weights()).unwrap_or(1);
                if index == 0 {
                    self.machine.transition(EnemyState::RangedAttack);
                } else {
                    self.machine.transition(EnemyState::Idle);
                }
            }
            EnemyKind::Seeker => {
                let index = weighted_index(rng, &self.config.exit_weights).unwrap_or(1);
                if index == 0 {
                    // Stay wandering without re-arming; re-rolled every tick
                    // until the idle branch wins.
                    self.machine.transition(EnemyState::Wander);
                } else {
                    self.machine.transition(EnemyState::Idle);
                }
            }
        }
    }

    /// Exit-weight table for the current health state.
    #[must_use]
    fn active_exit_weights(&self) -> [u32; 2] {
        if self.config.kind == EnemyKind::Boss && self.character.health_fraction() <= 0.5 {
            self.config.aggressive_weights
        } else {
            self.config.exit_weights
        }
    }

    /// Walk speed for the current health state.
    #[must_use]
    fn current_walk_speed(&self) -> f32 {
        if self.config.kind == EnemyKind::Boss && self.character.health_fraction() <= 0.5 {
            self.config.walk_speed * self.config.speed_modifier
        } else {
            self.config.walk_speed
        }
    }

    fn player_ahead<W: WorldQuery + ?Sized>(&self, world: &W) -> bool {
        sees_player(
            world,
            self.position,
            self.machine.facing(),
            self.config.seek_distance,
        )
    }

    /// Issues this variant's ranged attack.
    fn fire(&mut self, player_pos: Vec2, bus: &EventBus) {
        match self.config.kind {
            EnemyKind::Boss => {
                bus.publish(GameEvent::Cue(AudioCue::BossShoot));
                let shots = spread_requests(
                    self.id,
                    player_pos - self.position,
                    self.character.damage(),
                    self.config.projectile_speed,
                    self.config.spread_angle_deg,
                );
                for shot in shots {
                    bus.publish(GameEvent::SpawnAttack(shot));
                }
            }
            _ => {
                bus.publish(GameEvent::SpawnAttack(projectile_request(
                    self.id,
                    DamageSource::Enemy,
                    self.machine.facing(),
                    self.character.damage(),
                    self.config.projectile_speed,
                )));
            }
        }
    }

    /// Re-rolls facing until an unblocked direction is chosen.
    fn reroll_facing<W: WorldQuery + ?Sized>(&mut self, world: &W, rng: &mut dyn RandomSource) {
        let blocked = obstacle_directions(
            world,
            self.position,
            self.config.half_extents,
            self.collision_probe(),
        );

        for _ in 0..MAX_REROLLS {
            self.machine.transition_facing(Facing::random(rng));
            if !blocked.contains(&self.machine.facing()) {
                return;
            }
        }
        // Boxed in on all four sides; keep the last roll.
    }

    #[must_use]
    fn collision_probe(&self) -> Vec2 {
        Vec2::new(
            self.config.half_extents.x + COLLISION_PROBE_MARGIN,
            self.config.half_extents.y + COLLISION_PROBE_MARGIN,
        )
    }

    /// Handles a collision notification from the physics collaborator.
    ///
    /// Interrupts apply within the same tick, cutting any running hold
    /// short.
    pub fn handle_contact<W: WorldQuery + ?Sized>(
        &mut self,
        contact: &EnemyContact,
        world: &W,
        rng: &mut dyn RandomSource,
        bus: &EventBus,
    ) {
        match *contact {
            EnemyContact::Obstacle => {
                self.reroll_facing(world, rng);
                if self.machine.state() == EnemyState::Seek {
                    self.machine.transition(EnemyState::Wander);
                }
            }
            EnemyContact::Dynamic { away } => {
                if let Some(toward) = Facing::from_nearest_axis(-away) {
                    if self.machine.facing() == toward {
                        self.machine.transition_facing(toward.opposite());
                    }
                }
                if self.config.kind == EnemyKind::Seeker
                    && self.machine.state() == EnemyState::Seek
                {
                    self.machine.transition(EnemyState::Wander);
                }
            }
            EnemyContact::PlayerProjectile { damage, direction }
            | EnemyContact::PlayerWeapon { damage, direction } => {
                self.take_hit(damage, direction, rng, bus);
            }
        }
    }

    fn take_hit(
        &mut self,
        damage: f32,
        direction: Vec2,
        rng: &mut dyn RandomSource,
        bus: &EventBus,
    ) {
        let event = CombatEvent {
            amount: damage,
            direction,
            source: DamageSource::Player,
        };
        if self.character.apply_damage(&event) == crate::character::DamageOutcome::Fatal {
            debug!(id = ?self.id, kind = ?self.config.kind, "enemy defeated");
            bus.publish(GameEvent::EntityDied { entity: self.id });
            // Bosses never drop pickups.
            if self.config.kind != EnemyKind::Boss {
                if let Some(pickup) = roll_enemy_drop(rng) {
                    bus.publish(GameEvent::SpawnPickup {
                        pickup,
                        position: self.position,
                    });
                }
            }
        }
    }

    /// Restores this enemy to its spawn position, state, and health.
    ///
    /// Dead enemies stay dead; the room prunes them instead.
    pub fn reset(&mut self) {
        if self.character.is_dead() {
            return;
        }
        self.machine.reset(self.spawn_state, self.spawn_facing);
        self.character.restore();
        self.hold = HoldTimer::new();
        self.position = self.spawn_position;
        self.velocity = Vec2::ZERO;
    }
}
