//! Mech Duel - turn-based artillery duel between a player and an AI mech
//!
//! The crate is split into:
//! - `game`: terrain, ballistics, combat rules, the aim solver and the turn sequencer
//! - `protocol`: commands in, events and snapshots out
//! - `console`: line-oriented command parsing for the bundled binary
//! - `config`: environment-driven settings

pub mod config;
pub mod console;
pub mod game;
pub mod protocol;
pub mod util;
