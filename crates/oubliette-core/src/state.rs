//! Entity state machine primitives.
//!
//! Every character carries a [`StateMachine`]: the current and previous
//! behavior state plus the current and previous facing direction. Transitions
//! are never rejected; legality is enforced entirely by the calling behavior
//! policy. The machine only tracks enough history to tell when an animation
//! refresh is due.

use crate::random::RandomSource;
use oubliette_common::Vec2;
use serde::{Deserialize, Serialize};

/// Cardinal facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing up (positive Y)
    Up,
    /// Facing down (negative Y)
    Down,
    /// Facing left (negative X)
    Left,
    /// Facing right (positive X)
    Right,
}

impl Facing {
    /// All four facings, in draw order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit vector for this facing.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::Up => Vec2::UP,
            Self::Down => Vec2::DOWN,
            Self::Left => Vec2::LEFT,
            Self::Right => Vec2::RIGHT,
        }
    }

    /// The opposite facing.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Classifies a vector onto the nearest cardinal axis.
    ///
    /// Ties on the diagonals resolve toward the X axis; a zero vector has no
    /// nearest axis.
    #[must_use]
    pub fn from_nearest_axis(v: Vec2) -> Option<Self> {
        let v = v.normalized();
        if v.x > 0.0 && v.x.abs() >= v.y.abs() {
            Some(Self::Right)
        } else if v.x < 0.0 && v.x.abs() >= v.y.abs() {
            Some(Self::Left)
        } else if v.y > 0.0 && v.y.abs() > v.x.abs() {
            Some(Self::Up)
        } else if v.y < 0.0 && v.y.abs() > v.x.abs() {
            Some(Self::Down)
        } else {
            None
        }
    }

    /// Picks a uniformly random facing.
    pub fn random<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.next_u32(4) as usize]
    }
}

/// Tag identifying which kind of actor an animation notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorTag {
    /// The player character
    Player,
    /// Patrol-only enemy
    Wanderer,
    /// Projectile-firing enemy
    RangedEnemy,
    /// Line-of-sight charging enemy
    SeekingEnemy,
    /// Health-gated boss
    Boss,
}

/// Generic behavior-state container with one-step history.
///
/// Policies call [`StateMachine::transition`] every tick, including with the
/// unchanged state; "previous" therefore reflects the state as of the prior
/// tick, and [`StateMachine::animation_due`] is true exactly when the state
/// or facing changed within the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateMachine<S> {
    state: S,
    prev_state: S,
    facing: Facing,
    prev_facing: Facing,
}

impl<S: Copy + PartialEq> StateMachine<S> {
    /// Creates a machine in `initial` state with the given facing.
    #[must_use]
    pub const fn new(initial: S, facing: Facing) -> Self {
        Self {
            state: initial,
            prev_state: initial,
            facing,
            prev_facing: facing,
        }
    }

    /// Records the current state into "previous" and installs `new_state`.
    ///
    /// No transition is rejected: any state is reachable from any other.
    pub fn transition(&mut self, new_state: S) {
        self.prev_state = self.state;
        self.state = new_state;
    }

    /// Records the current facing into "previous" and installs `new_facing`.
    pub fn transition_facing(&mut self, new_facing: Facing) {
        self.prev_facing = self.facing;
        self.facing = new_facing;
    }

    /// Current behavior state.
    #[must_use]
    pub const fn state(&self) -> S {
        self.state
    }

    /// Behavior state as of the previous transition.
    #[must_use]
    pub const fn prev_state(&self) -> S {
        self.prev_state
    }

    /// Current facing direction.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Facing as of the previous facing transition.
    #[must_use]
    pub const fn prev_facing(&self) -> Facing {
        self.prev_facing
    }

    /// Whether the state was just entered (changed by the last transition).
    #[must_use]
    pub fn just_entered(&self) -> bool {
        self.state != self.prev_state
    }

    /// Whether an animation refresh is due.
    #[must_use]
    pub fn animation_due(&self) -> bool {
        self.state != self.prev_state || self.facing != self.prev_facing
    }

    /// Forces both current and previous to the given values.
    ///
    /// Used when restoring an entity to its spawn configuration.
    pub fn reset(&mut self, state: S, facing: Facing) {
        self.state = state;
        self.prev_state = state;
        self.facing = facing;
        self.prev_facing = facing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestState {
        A,
        B,
        C,
    }

    #[test]
    fn test_transition_records_previous() {
        let mut machine = StateMachine::new(TestState::A, Facing::Down);
        machine.transition(TestState::B);
        assert_eq!(machine.state(), TestState::B);
        assert_eq!(machine.prev_state(), TestState::A);
    }

    #[test]
    fn test_one_step_history_only() {
        let mut machine = StateMachine::new(TestState::A, Facing::Down);
        machine.transition(TestState::B);
        machine.transition(TestState::C);
        // History never reaches further back than one transition.
        assert_eq!(machine.prev_state(), TestState::B);
    }

    #[test]
    fn test_any_transition_accepted() {
        let mut machine = StateMachine::new(TestState::C, Facing::Down);
        machine.transition(TestState::C);
        assert_eq!(machine.state(), TestState::C);
        assert!(!machine.animation_due());
    }

    #[test]
    fn test_animation_due_on_state_change() {
        let mut machine = StateMachine::new(TestState::A, Facing::Down);
        machine.transition(TestState::B);
        assert!(machine.animation_due());
        machine.transition(TestState::B);
        assert!(!machine.animation_due());
    }

    #[test]
    fn test_animation_due_on_facing_change() {
        let mut machine = StateMachine::new(TestState::A, Facing::Down);
        machine.transition(TestState::A);
        machine.transition_facing(Facing::Left);
        assert!(machine.animation_due());
    }

    #[test]
    fn test_nearest_axis() {
        assert_eq!(
            Facing::from_nearest_axis(Vec2::new(0.9, 0.1)),
            Some(Facing::Right)
        );
        assert_eq!(
            Facing::from_nearest_axis(Vec2::new(-0.2, -0.9)),
            Some(Facing::Down)
        );
        assert_eq!(Facing::from_nearest_axis(Vec2::ZERO), None);
        // Diagonal ties resolve toward the X axis.
        assert_eq!(
            Facing::from_nearest_axis(Vec2::new(1.0, 1.0)),
            Some(Facing::Right)
        );
    }

    #[test]
    fn test_random_facing_uses_source() {
        let mut rng = FixedRandom::sequence(vec![0, 1, 2, 3]);
        assert_eq!(Facing::random(&mut rng), Facing::Up);
        assert_eq!(Facing::random(&mut rng), Facing::Down);
        assert_eq!(Facing::random(&mut rng), Facing::Left);
        assert_eq!(Facing::random(&mut rng), Facing::Right);
    }
}
