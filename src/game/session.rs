//! Scene flow around the match: menu, options and the duel itself

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::protocol::GameEvent;

use super::combat::Side;
use super::r#match::{MatchConfig, MatchError, MatchState, TurnPhase};

/// Which screen is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    Menu,
    Options,
    Playing,
}

/// Player preferences observed by the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub music_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} from the {from:?} scene")]
    InvalidTransition { from: Scene, action: &'static str },

    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Top-level state: the active scene, settings and the (last) match
pub struct Session {
    scene: Scene,
    settings: Settings,
    game: MatchState,
}

impl Session {
    pub fn new(config: MatchConfig) -> Result<Self, SessionError> {
        Ok(Self::with_game(MatchState::new(config)?, Settings::default()))
    }

    /// Wrap an existing match; the session starts in the menu
    pub fn with_game(game: MatchState, settings: Settings) -> Self {
        Self {
            scene: Scene::Menu,
            settings,
            game,
        }
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn game(&self) -> &MatchState {
        &self.game
    }

    /// Menu -> Playing, on a freshly generated match
    pub fn start_game(&mut self) -> Result<(), SessionError> {
        self.require(Scene::Menu, "start a game")?;
        self.game.new_match();
        self.enter(Scene::Playing);
        Ok(())
    }

    /// Menu -> Options
    pub fn open_options(&mut self) -> Result<(), SessionError> {
        self.require(Scene::Menu, "open options")?;
        self.enter(Scene::Options);
        Ok(())
    }

    /// Options -> Menu
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.require(Scene::Options, "go back")?;
        self.enter(Scene::Menu);
        Ok(())
    }

    /// Flip music on the options screen, returning the new value
    pub fn toggle_music(&mut self) -> Result<bool, SessionError> {
        self.require(Scene::Options, "toggle music")?;
        self.settings.music_enabled = !self.settings.music_enabled;
        info!(music_enabled = self.settings.music_enabled, "Music toggled");
        Ok(self.settings.music_enabled)
    }

    /// Set the player's aim; only during a game
    pub fn set_aim(&mut self, angle: f64, power: f64) -> Result<(), SessionError> {
        self.require(Scene::Playing, "aim")?;
        self.game.set_aim(angle, power);
        Ok(())
    }

    /// Shift the player's aim; only during a game
    pub fn nudge_aim(&mut self, angle_delta: f64, power_delta: f64) -> Result<(), SessionError> {
        self.require(Scene::Playing, "aim")?;
        self.game.nudge_aim(angle_delta, power_delta);
        Ok(())
    }

    /// Regenerate the running match in place
    pub fn new_match(&mut self) -> Result<(), SessionError> {
        self.require(Scene::Playing, "restart the match")?;
        self.game.new_match();
        Ok(())
    }

    /// Fire the human player's shot; only during a game
    pub fn fire(&mut self) -> Result<(), SessionError> {
        self.require(Scene::Playing, "fire")?;
        self.game.fire(Side::Player)?;
        Ok(())
    }

    /// Advance the match while playing. A decided match returns to the menu.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        if self.scene != Scene::Playing {
            return Vec::new();
        }

        let events = self.game.advance_tick();
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::MatchEnded { .. }))
        {
            self.enter(Scene::Menu);
        }
        events
    }

    /// True when nothing will happen until the human sends a command: outside
    /// a game, or on the player's own aiming phase
    pub fn is_waiting_for_player(&self) -> bool {
        self.scene != Scene::Playing
            || (self.game.turn() == Side::Player && self.game.phase() == TurnPhase::Aiming)
    }

    fn require(&self, expected: Scene, action: &'static str) -> Result<(), SessionError> {
        if self.scene == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.scene,
                action,
            })
        }
    }

    fn enter(&mut self, scene: Scene) {
        info!(from = ?self.scene, to = ?scene, "Scene changed");
        self.scene = scene;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::Aim;

    fn session() -> Session {
        Session::new(MatchConfig {
            seed: Some(3),
            ..MatchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn starts_in_menu_with_music_on() {
        let session = session();
        assert_eq!(session.scene(), Scene::Menu);
        assert!(session.settings().music_enabled);
    }

    #[test]
    fn options_round_trip() {
        let mut session = session();
        session.open_options().unwrap();
        assert_eq!(session.scene(), Scene::Options);
        assert_eq!(session.toggle_music(), Ok(false));
        assert_eq!(session.toggle_music(), Ok(true));
        session.back().unwrap();
        assert_eq!(session.scene(), Scene::Menu);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut session = session();
        assert_eq!(
            session.back(),
            Err(SessionError::InvalidTransition {
                from: Scene::Menu,
                action: "go back",
            })
        );
        assert!(session.toggle_music().is_err());

        session.start_game().unwrap();
        assert!(session.start_game().is_err());
        assert!(session.open_options().is_err());
        assert_eq!(session.scene(), Scene::Playing);
    }

    #[test]
    fn fire_requires_a_running_game() {
        let mut session = session();
        assert_eq!(
            session.fire(),
            Err(SessionError::InvalidTransition {
                from: Scene::Menu,
                action: "fire",
            })
        );
        assert!(session.game().projectile().is_none());

        session.start_game().unwrap();
        assert_eq!(session.fire(), Ok(()));
        assert!(matches!(session.fire(), Err(SessionError::Match(_))));
    }

    #[test]
    fn ticks_only_advance_while_playing() {
        let mut session = session();
        assert!(session.tick().is_empty());
        assert_eq!(session.game().tick(), 0);

        session.start_game().unwrap();
        assert!(!session.tick().is_empty());
        assert_eq!(session.game().tick(), 1);
    }

    #[test]
    fn start_game_regenerates_terrain() {
        let mut session = session();
        let before = session.game().terrain().clone();
        session.start_game().unwrap();
        assert_ne!(session.game().terrain(), &before);
    }

    #[test]
    fn match_commands_require_a_running_game() {
        let mut session = session();
        session.open_options().unwrap();
        let id = session.game().id();

        assert_eq!(
            session.new_match(),
            Err(SessionError::InvalidTransition {
                from: Scene::Options,
                action: "restart the match",
            })
        );
        assert!(session.set_aim(10.0, 10.0).is_err());
        assert!(session.nudge_aim(5.0, 5.0).is_err());
        assert_eq!(session.game().id(), id);
        assert_eq!(session.game().aim(), Aim::default());
        assert_eq!(session.scene(), Scene::Options);

        session.back().unwrap();
        session.start_game().unwrap();
        assert_eq!(session.set_aim(10.0, 10.0), Ok(()));
        assert_eq!(session.nudge_aim(5.0, 5.0), Ok(()));
        assert_eq!(session.game().aim(), Aim { angle: 15.0, power: 15.0 });
        let id = session.game().id();
        assert_eq!(session.new_match(), Ok(()));
        assert_ne!(session.game().id(), id);
        assert_eq!(session.scene(), Scene::Playing);
    }

    #[test]
    fn invalid_ballistics_are_reported() {
        let config = MatchConfig {
            ballistics: crate::game::physics::Ballistics {
                gravity: 0.0,
                ..Default::default()
            },
            ..MatchConfig::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(SessionError::Match(MatchError::Ballistics(_)))
        ));
    }

    #[test]
    fn waits_for_player_outside_games_and_while_aiming() {
        let mut session = session();
        assert!(session.is_waiting_for_player());

        session.start_game().unwrap();
        assert!(session.is_waiting_for_player());

        session.fire().unwrap();
        assert!(!session.is_waiting_for_player());
        for _ in 0..5_000 {
            if session.is_waiting_for_player() {
                break;
            }
            session.tick();
        }
        assert!(session.is_waiting_for_player());
        assert!(session.game().tick() > 1);
    }
}
