//! Hold timers for timed behavior states.
//!
//! A [`HoldTimer`] keeps an entity in its current behavior state for a
//! minimum duration. It is armed when the state is entered, ticked once per
//! simulation step, and reports expiry through [`HoldTimer::holding`].
//! External interrupts (collisions, damage) overwrite the state directly and
//! invalidate the pending hold; the stale hold then stops mattering and a
//! fresh arm happens on the next state entry.

use serde::{Deserialize, Serialize};

/// Scoped countdown gating behavior-state re-evaluation.
///
/// The timer records which arm "generation" it is counting for. Invalidation
/// bumps the generation so a hold armed for a state instance that no longer
/// exists can never expire on its owner's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldTimer {
    /// Target duration of the current hold in seconds.
    duration: f32,
    /// Time accumulated since the hold was armed.
    elapsed: f32,
    /// Whether the hold is still in effect.
    holding: bool,
    /// Current state-instance generation.
    generation: u32,
    /// Generation the running hold was armed for.
    armed_generation: u32,
}

impl HoldTimer {
    /// Creates an idle timer. An idle timer is not holding.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            duration: 0.0,
            elapsed: 0.0,
            holding: false,
            generation: 0,
            armed_generation: 0,
        }
    }

    /// Arms the timer for a fresh state instance.
    pub fn arm(&mut self, duration: f32) {
        self.generation = self.generation.wrapping_add(1);
        self.armed_generation = self.generation;
        self.duration = duration;
        self.elapsed = 0.0;
        self.holding = true;
    }

    /// Invalidates the pending hold.
    ///
    /// Called when the owning entity's state is overwritten by something
    /// other than the timer's own exit logic. The hold stops advancing and
    /// never flips to expired; the next `arm` revalidates the timer.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Advances the hold by the tick's delta time.
    ///
    /// A hold armed for a stale state instance is ignored.
    pub fn tick(&mut self, dt: f32) {
        if self.holding && self.armed_generation == self.generation {
            self.elapsed += dt;
            if self.elapsed >= self.duration {
                self.holding = false;
            }
        }
    }

    /// Whether the hold is still in effect.
    #[must_use]
    pub const fn holding(&self) -> bool {
        self.holding
    }

    /// Whether the hold has run to completion.
    #[must_use]
    pub const fn expired(&self) -> bool {
        !self.holding
    }

    /// Time accumulated since the hold was armed.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Target duration of the current hold.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }
}

impl Default for HoldTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_expired() {
        let timer = HoldTimer::new();
        assert!(!timer.holding());
        assert!(timer.expired());
    }

    #[test]
    fn test_hold_expires_at_duration() {
        let mut timer = HoldTimer::new();
        timer.arm(2.0);
        assert!(timer.holding());

        for _ in 0..19 {
            timer.tick(0.1);
        }
        assert!(timer.holding());

        timer.tick(0.1);
        assert!(timer.expired());
    }

    #[test]
    fn test_exact_boundary_expires() {
        let mut timer = HoldTimer::new();
        timer.arm(1.0);
        timer.tick(1.0);
        assert!(timer.expired());
    }

    #[test]
    fn test_invalidated_hold_never_expires() {
        let mut timer = HoldTimer::new();
        timer.arm(1.0);
        timer.invalidate();

        for _ in 0..100 {
            timer.tick(0.1);
        }
        // The stale hold stops mattering; it does not flip to expired.
        assert!(timer.holding());
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn test_rearm_after_invalidation() {
        let mut timer = HoldTimer::new();
        timer.arm(1.0);
        timer.invalidate();
        timer.arm(0.5);
        timer.tick(0.6);
        assert!(timer.expired());
    }

    #[test]
    fn test_rearm_resets_elapsed() {
        let mut timer = HoldTimer::new();
        timer.arm(1.0);
        timer.tick(0.9);
        timer.arm(1.0);
        timer.tick(0.5);
        assert!(timer.holding());
        assert!((timer.elapsed() - 0.5).abs() < 1e-6);
    }
}
