//! Message definitions exchanged with the frame driver.
//! Commands flow in from the input layer; events and snapshots flow out to
//! renderers and the audio layer.

use serde::{Deserialize, Serialize};

use crate::game::combat::Side;
use crate::game::r#match::Outcome;
use crate::game::snapshot::MatchSnapshot;

/// Commands accepted by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Leave the menu and start a fresh match
    StartGame,
    /// Open the options screen from the menu
    OpenOptions,
    /// Return from options to the menu
    Back,
    /// Flip the music toggle (options screen only)
    ToggleMusic,

    /// Set the player's aim; values are clamped
    SetAim { angle: f64, power: f64 },

    /// Shift the player's aim by a delta; values are clamped
    NudgeAim { angle: f64, power: f64 },

    /// Fire the player's shot
    Fire,

    /// Regenerate terrain and reset the current match
    NewMatch,

    /// Stop the driver loop
    Shutdown,

    /// Stop the driver loop once the session is waiting on player input
    Finish,
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A side's aiming phase began
    TurnStarted { side: Side },

    /// A projectile left a mech's muzzle
    Shot {
        side: Side,
        angle: f64,
        power: f64,
        x: f64,
        y: f64,
    },

    /// A projectile hit the ground and dug a crater
    TerrainHit { side: Side, x: f64, y: f64 },

    /// A projectile struck the opposing mech
    MechHit {
        shooter: Side,
        target: Side,
        damage: i32,
        health_remaining: i32,
        x: f64,
        y: f64,
    },

    /// A projectile left the playfield
    OutOfBounds { side: Side, x: f64, y: f64 },

    /// The match is decided; emitted once
    MatchEnded { outcome: Outcome },
}

/// Messages broadcast by the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchUpdate {
    /// Events produced by one tick
    Events { tick: u64, events: Vec<GameEvent> },

    /// Read model for renderers
    Snapshot { snapshot: Box<MatchSnapshot> },

    /// A command could not be applied
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_tagged_json() {
        let json = serde_json::to_string(&Command::SetAim {
            angle: 30.0,
            power: 40.0,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"set_aim","angle":30.0,"power":40.0}"#);

        let parsed: Command = serde_json::from_str(r#"{"type":"fire"}"#).unwrap();
        assert_eq!(parsed, Command::Fire);
    }

    #[test]
    fn events_name_sides_in_snake_case() {
        let json = serde_json::to_string(&GameEvent::TurnStarted { side: Side::Ai }).unwrap();
        assert_eq!(json, r#"{"type":"turn_started","side":"ai"}"#);

        let json = serde_json::to_string(&GameEvent::MatchEnded {
            outcome: Outcome::PlayerWin,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"match_ended","outcome":"player_win"}"#);
    }
}
