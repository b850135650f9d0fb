//! Game simulation modules

pub mod ai;
pub mod combat;
pub mod r#match;
pub mod physics;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod terrain;

pub use combat::{Aim, Side};
pub use r#match::{MatchConfig, MatchError, MatchState, Outcome, TurnPhase};
pub use runner::{GameMatch, MatchHandle};
pub use session::{Scene, Session, SessionError};
