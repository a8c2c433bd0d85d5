//! Audio cue and music-bus identifiers.
//!
//! The core never plays audio. It emits fire-and-forget cue triggers and
//! persistent start/stop music-bus commands over the event bus; the audio
//! collaborator resolves them to its own playback events.

use serde::{Deserialize, Serialize};

/// One-shot sound cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    /// Player melee swing
    PlayerAttack,
    /// Player projectile shot
    PlayerShoot,
    /// Player charged attack release
    PlayerStrongAttack,
    /// Player hit by damage
    PlayerTakeDamage,
    /// Player deflected a projectile
    PlayerBlock,
    /// Player consumed a health or ammo pickup
    PlayerGrabPotion,
    /// Player collected a key
    PlayerGrabKey,
    /// Boss spread shot
    BossShoot,
    /// A door opened
    DoorOpen,
    /// A floor switch was pressed
    SwitchPress,
}

impl AudioCue {
    /// Event path understood by the audio middleware.
    #[must_use]
    pub const fn asset_path(self) -> &'static str {
        match self {
            Self::PlayerAttack => "event:/SFX/Player/Player_Attack",
            Self::PlayerShoot => "event:/SFX/Player/Player_Shoot",
            Self::PlayerStrongAttack => "event:/SFX/Player/Player_StrongAttack",
            Self::PlayerTakeDamage => "event:/SFX/Player/Player_TakeDamage",
            Self::PlayerBlock => "event:/SFX/Player/Player_Block",
            Self::PlayerGrabPotion => "event:/SFX/Player/Player_GrabPotion",
            Self::PlayerGrabKey => "event:/SFX/Player/Player_GrabKey",
            Self::BossShoot => "event:/SFX/Enemy/Boss/Boss_Shoot",
            Self::DoorOpen => "event:/SFX/Game/Game_OpenDoor",
            Self::SwitchPress => "event:/SFX/Game/Game_PressSwitch",
        }
    }
}

/// Looping buses driven by start/stop commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicBus {
    /// Heartbeat loop while the player is at or below half health
    LowHealth,
    /// Boss battle theme
    Boss,
    /// Player footstep loop while walking
    Footsteps,
}

impl MusicBus {
    /// Event path understood by the audio middleware.
    #[must_use]
    pub const fn asset_path(self) -> &'static str {
        match self {
            Self::LowHealth => "event:/Interface/Player_LowHealth",
            Self::Boss => "event:/Music/BossTheme",
            Self::Footsteps => "event:/SFX/Player/Player_Footsteps",
        }
    }
}
