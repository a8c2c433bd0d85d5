//! Session direction: menu/playing/win/game-over flow, pause propagation,
//! room traversal, and the HUD snapshot.
//!
//! The session is the explicit simulation context handed to the room
//! orchestrator and behavior policies: it owns the player, the rooms, the
//! random source, and the outbound event bus, and exposes only the narrow
//! surface they need.

use crate::audio::MusicBus;
use crate::events::{EventBus, GameEvent};
use crate::player::{ContactReply, InputSnapshot, Player};
use crate::random::Lcg;
use crate::room::{ClearCondition, Room};
use crate::timer::HoldTimer;
use crate::world::{EnemyContact, PlayerContact, WorldQuery};
use ahash::AHashMap;
use oubliette_common::{EntityId, RoomId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Top-level session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Title menu; everything paused
    Menu,
    /// Game running
    Playing,
    /// Player reached the end
    Win,
    /// Player died
    GameOver,
}

/// Per-tick values polled by the HUD collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// Player health
    pub health: f32,
    /// Player maximum health
    pub max_health: f32,
    /// Player ranged ammo
    pub ammo: u32,
    /// Player keys
    pub keys: u32,
    /// Aggregate boss health fraction of the current room
    pub boss_health_fraction: f32,
}

/// One play session: the player, the rooms, and the session state machine.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    player: Player,
    rooms: AHashMap<RoomId, Room>,
    current_room: RoomId,
    starting_room: RoomId,
    title_timer: HoldTimer,
    title_duration: f32,
    rng: Lcg,
    bus: EventBus,
}

impl Session {
    /// Creates a session at the menu. Rooms added while not playing start
    /// paused.
    #[must_use]
    pub fn new(player: Player, starting_room: RoomId, title_duration: f32) -> Self {
        let mut player = player;
        player.set_paused(true);
        Self {
            state: SessionState::Menu,
            player,
            rooms: AHashMap::new(),
            current_room: starting_room,
            starting_room,
            title_timer: HoldTimer::new(),
            title_duration,
            rng: Lcg::new(0x0DD5_EED5),
            bus: EventBus::new(),
        }
    }

    /// Replaces the default random seed, for deterministic replays.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Lcg::new(seed);
        self
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player access.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Adds a room. Rooms joining outside of play start paused.
    pub fn add_room(&mut self, mut room: Room) {
        if self.state != SessionState::Playing {
            room.set_paused(true);
        }
        self.rooms.insert(room.id(), room);
    }

    /// Looks up a room.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// The room the player is currently in.
    #[must_use]
    pub const fn current_room(&self) -> RoomId {
        self.current_room
    }

    /// Drains this tick's outbound events for the collaborators.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.bus.drain()
    }

    /// Returns to the title menu, pausing the player and every room.
    pub fn go_to_menu(&mut self) {
        self.state = SessionState::Menu;
        self.pause_everything();
    }

    /// Starts play: unpauses the player and only the starting room.
    pub fn start_game(&mut self) {
        info!("session started");
        self.state = SessionState::Playing;
        self.current_room = self.starting_room;
        self.player.set_paused(false);
        for room in self.rooms.values_mut() {
            room.set_paused(room.id() != self.starting_room);
        }
    }

    /// Whether the win/game-over title card has finished displaying.
    #[must_use]
    pub const fn title_card_done(&self) -> bool {
        matches!(self.state, SessionState::Win | SessionState::GameOver)
            && self.title_timer.expired()
    }

    /// Runs one simulation step in fixed order: session transitions, the
    /// player policy, then every room.
    pub fn update<W: WorldQuery + ?Sized>(&mut self, dt: f32, input: &InputSnapshot, world: &W) {
        if self.state == SessionState::Playing {
            if self.player.is_dead() {
                self.game_over();
            } else if self.player.has_won() {
                self.win();
            }
        }
        self.title_timer.tick(dt);

        self.player.update(dt, input, &self.bus);

        let player_pos = self.player.position();
        for room in self.rooms.values_mut() {
            room.update(dt, player_pos, world, &mut self.rng, &self.bus);
        }
    }

    /// Routes a player collision notification, forwarding door and switch
    /// outcomes to the owning room.
    pub fn handle_player_contact(&mut self, contact: &PlayerContact) {
        match self.player.handle_contact(contact, &self.bus) {
            Some(ContactReply::UnlockDoor { room, door }) => {
                if let Some(room) = self.rooms.get_mut(&room) {
                    room.open_door(door, &self.bus);
                }
            }
            Some(ContactReply::PressSwitch { room, switch }) => {
                if let Some(room) = self.rooms.get_mut(&room) {
                    room.activate_switch(switch, &self.bus);
                }
            }
            None => {}
        }
    }

    /// Routes an enemy collision notification to its room.
    pub fn handle_enemy_contact<W: WorldQuery + ?Sized>(
        &mut self,
        room: RoomId,
        entity: EntityId,
        contact: &EnemyContact,
        world: &W,
    ) {
        if let Some(room) = self.rooms.get_mut(&room) {
            room.handle_enemy_contact(entity, contact, world, &mut self.rng, &self.bus);
        }
    }

    /// Moves the player to another room: the room being left pauses, the
    /// destination resets to spawn state and resumes, and boss music starts
    /// when entering an uncleared boss room.
    pub fn transfer(&mut self, to: RoomId, spawn_position: Vec2) {
        if let Some(old) = self.rooms.get_mut(&self.current_room) {
            old.set_paused(true);
        }
        if let Some(next) = self.rooms.get_mut(&to) {
            next.reset();
            next.set_paused(false);
            if next.clear_condition() == ClearCondition::Boss && !next.cleared() {
                self.bus.publish(GameEvent::MusicStarted(MusicBus::Boss));
            }
        }
        self.current_room = to;
        self.player.set_position(spawn_position);
        info!(room = to.raw(), "player transferred");
    }

    /// Values polled by the HUD collaborator each tick.
    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        let boss_health_fraction = self
            .rooms
            .get(&self.current_room)
            .map_or(1.0, Room::boss_health_fraction);
        HudSnapshot {
            health: self.player.character().health(),
            max_health: self.player.character().max_health(),
            ammo: self.player.ammo(),
            keys: self.player.keys(),
            boss_health_fraction,
        }
    }

    fn game_over(&mut self) {
        info!("game over");
        self.state = SessionState::GameOver;
        self.pause_everything();
        self.title_timer.arm(self.title_duration);
    }

    fn win(&mut self) {
        info!("game won");
        self.state = SessionState::Win;
        self.pause_everything();
        self.title_timer.arm(self.title_duration);
    }

    fn pause_everything(&mut self) {
        self.player.set_paused(true);
        for room in self.rooms.values_mut() {
            room.set_paused(true);
        }
    }
}
