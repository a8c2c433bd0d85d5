//! Character health, damage, invulnerability, and knockback.

use crate::combat::CombatEvent;
use oubliette_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Duration of the knockback impulse after a hit, in seconds.
pub const KNOCKBACK_DURATION: f32 = 0.1;
/// Delay between flash phases of the damage indicator, in seconds.
pub const FLASH_DELAY: f32 = 0.09;
/// Default invulnerability window for enemies.
pub const ENEMY_FLASH_DURATION: f32 = 0.35;
/// Invulnerability window for the player.
pub const PLAYER_FLASH_DURATION: f32 = 1.0;

/// Result of applying a combat event to a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The character could not take damage; nothing changed.
    Ignored,
    /// Damage landed; the character survived.
    Hit,
    /// Damage landed and the character died.
    Fatal,
}

/// Running invulnerability window with a two-phase flash indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct InvulnWindow {
    elapsed: f32,
    duration: f32,
}

/// Running knockback impulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Knockback {
    direction: Vec2,
    remaining: f32,
}

/// Health, damage, and hit-response record shared by the player and every
/// enemy variant.
///
/// Health is clamped to `[0, max_health]` on every mutation and `is_dead`
/// holds exactly when health reaches zero. Death is permanent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    health: f32,
    max_health: f32,
    damage: f32,
    knockback_force: f32,
    hit_flash_duration: f32,
    can_take_damage: bool,
    is_dead: bool,
    paused: bool,
    invuln: Option<InvulnWindow>,
    knockback: Option<Knockback>,
}

impl Character {
    /// Creates a character at full health.
    #[must_use]
    pub fn new(max_health: f32, damage: f32, knockback_force: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            damage,
            knockback_force,
            hit_flash_duration: ENEMY_FLASH_DURATION,
            can_take_damage: true,
            is_dead: false,
            paused: false,
            invuln: None,
            knockback: None,
        }
    }

    /// Sets the invulnerability window duration after a hit.
    #[must_use]
    pub const fn with_flash_duration(mut self, duration: f32) -> Self {
        self.hit_flash_duration = duration;
        self
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Health as a fraction of maximum, in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Contact damage this character deals.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Knockback force applied to this character when hit.
    #[must_use]
    pub const fn knockback_force(&self) -> f32 {
        self.knockback_force
    }

    /// Whether the character can currently take damage.
    #[must_use]
    pub const fn can_take_damage(&self) -> bool {
        self.can_take_damage
    }

    /// Whether the character is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Whether behavior evaluation is suspended.
    #[must_use]
    pub const fn paused(&self) -> bool {
        self.paused
    }

    /// Suspends or resumes behavior evaluation. Pausing is advisory; a
    /// paused character still exists and can still be damaged.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Applies a damage instance.
    ///
    /// A no-op while the character is invulnerable or already dead. A
    /// non-fatal hit arms the invulnerability window and the knockback
    /// impulse; a fatal hit marks the character dead permanently.
    pub fn apply_damage(&mut self, event: &CombatEvent) -> DamageOutcome {
        if !self.can_take_damage || self.is_dead {
            return DamageOutcome::Ignored;
        }

        self.health = (self.health - event.amount).max(0.0);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.is_dead = true;
            self.invuln = None;
            self.knockback = None;
            debug!(source = ?event.source, "character died");
            return DamageOutcome::Fatal;
        }

        self.can_take_damage = false;
        self.invuln = Some(InvulnWindow {
            elapsed: 0.0,
            duration: self.hit_flash_duration,
        });
        self.knockback = Some(Knockback {
            direction: event.direction.normalized(),
            remaining: KNOCKBACK_DURATION,
        });
        DamageOutcome::Hit
    }

    /// Raises or lowers health outside of combat (pickups, hazards).
    ///
    /// Clamped to `[0, max_health]`; lowering to zero kills. Dead characters
    /// are never revived.
    pub fn change_health(&mut self, delta: f32) {
        if self.is_dead {
            return;
        }
        self.health = (self.health + delta).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.is_dead = true;
        }
    }

    /// Restores full health and clears transient hit state. Only valid for
    /// living characters (room reset never resurrects).
    pub fn restore(&mut self) {
        if self.is_dead {
            return;
        }
        self.health = self.max_health;
        self.can_take_damage = true;
        self.invuln = None;
        self.knockback = None;
    }

    /// Advances the invulnerability and knockback windows.
    ///
    /// Runs every simulation step regardless of pause state.
    pub fn tick(&mut self, dt: f32) {
        if let Some(window) = &mut self.invuln {
            window.elapsed += dt;
            if window.elapsed >= window.duration {
                self.invuln = None;
                self.can_take_damage = true;
            }
        }

        if let Some(kb) = &mut self.knockback {
            kb.remaining -= dt;
            if kb.remaining <= 0.0 {
                self.knockback = None;
            }
        }
    }

    /// Velocity override while the knockback impulse is active.
    #[must_use]
    pub fn knockback_velocity(&self) -> Option<Vec2> {
        self.knockback
            .as_ref()
            .map(|kb| kb.direction * self.knockback_force)
    }

    /// Current phase of the damage flash indicator, alternating every
    /// [`FLASH_DELAY`] seconds. `None` when not flashing.
    #[must_use]
    pub fn flash_phase(&self) -> Option<u8> {
        self.invuln
            .as_ref()
            .map(|w| ((w.elapsed / FLASH_DELAY) as u32 % 2) as u8)
    }
}
