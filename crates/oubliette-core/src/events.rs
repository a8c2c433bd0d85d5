//! Outbound event bus for renderer, audio, and instantiation collaborators.
//!
//! The core is synchronous and single-threaded; the bus exists so outward
//! notifications are fire-and-forget. The embedding engine drains the queue
//! once per rendered frame and dispatches each event to the collaborator
//! that owns it (animation playback, audio middleware, object spawning).

use crate::audio::{AudioCue, MusicBus};
use crate::combat::AttackRequest;
use crate::enemy::EnemyState;
use crate::pickup::Pickup;
use crate::player::PlayerState;
use crate::state::{ActorTag, Facing};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use oubliette_common::{DoorId, EntityId, RoomId, SwitchId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Capacity of the event queue. One frame's worth of notifications stays
/// far below this.
const BUS_CAPACITY: usize = 1024;

/// Behavior state carried by an animation notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimationState {
    /// A player behavior state
    Player(PlayerState),
    /// An enemy behavior state
    Enemy(EnemyState),
}

/// Notification that an entity's animation needs to be refreshed.
///
/// The renderer owns the `(tag, state, facing) -> clip` mapping and all
/// playback timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    /// Which kind of actor changed
    pub actor: ActorTag,
    /// The behavior state to animate
    pub state: AnimationState,
    /// The facing to animate
    pub facing: Facing,
}

/// Events published by the core for external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An entity's behavior state or facing changed
    AnimationChanged {
        /// Entity whose animation is stale
        entity: EntityId,
        /// New animation key
        key: AnimationKey,
    },
    /// Spawn an attack hitbox or projectile
    SpawnAttack(AttackRequest),
    /// Spawn a pickup at a position
    SpawnPickup {
        /// The pickup to spawn
        pickup: Pickup,
        /// World position
        position: Vec2,
    },
    /// Fire a one-shot audio cue
    Cue(AudioCue),
    /// Start a looping music bus
    MusicStarted(MusicBus),
    /// Stop a looping music bus
    MusicStopped(MusicBus),
    /// A door opened
    DoorOpened {
        /// Room the door belongs to
        room: RoomId,
        /// The door
        door: DoorId,
    },
    /// A floor switch was activated
    SwitchActivated {
        /// Room the switch belongs to
        room: RoomId,
        /// The switch
        switch: SwitchId,
    },
    /// An entity died this tick
    EntityDied {
        /// The dead entity
        entity: EntityId,
    },
    /// A room's clear condition was met
    RoomCleared {
        /// The cleared room
        room: RoomId,
    },
}

/// Bounded queue of [`GameEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = bounded(BUS_CAPACITY);
        Self { sender, receiver }
    }

    /// Publishes an event. A full queue drops the event; collaborator
    /// notifications are advisory and never block the simulation.
    pub fn publish(&self, event: GameEvent) {
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            warn!(?event, "event bus full, dropping notification");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
