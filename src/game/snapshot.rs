//! Snapshot building for renderers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::time::unix_millis;

use super::combat::{Aim, HitEffect, Side};
use super::physics::Point;
use super::r#match::{MatchState, Outcome, TurnPhase};
use super::session::{Scene, Session};

/// One mech as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechSnapshot {
    pub side: Side,
    pub x: f64,
    pub y: f64,
    pub health: i32,
}

/// Read model of the whole session at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub scene: Scene,
    pub music_enabled: bool,
    pub turn: Side,
    pub phase: TurnPhase,
    pub outcome: Outcome,
    pub aim: Aim,
    pub ai_aim: Option<Aim>,
    pub mechs: Vec<MechSnapshot>,
    pub projectile: Option<Point>,
    pub hit_effect: Option<HitEffect>,
    /// Whether the hit flash is still visible
    pub hit_flash: bool,
    /// Dashed aim line, present while the player is aiming
    pub preview: Option<Vec<Point>>,
    pub terrain_revision: u64,
    /// Full height field, only when it changed since the previous snapshot
    pub terrain: Option<Vec<f64>>,
}

/// Builds snapshots and decides when to emit them
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Terrain last shipped, keyed by match id and revision
    last_terrain: Option<(Uuid, u64)>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            last_terrain: None,
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot of the session
    pub fn build(&mut self, session: &Session) -> MatchSnapshot {
        let game = session.game();
        let terrain_key = (game.id(), game.terrain().revision());
        let terrain = if self.last_terrain == Some(terrain_key) {
            None
        } else {
            self.last_terrain = Some(terrain_key);
            Some(game.terrain().heights().to_vec())
        };

        MatchSnapshot {
            tick: game.tick(),
            scene: session.scene(),
            music_enabled: session.settings().music_enabled,
            turn: game.turn(),
            phase: game.phase(),
            outcome: game.outcome(),
            aim: game.aim(),
            ai_aim: game.ai_aim(),
            mechs: mech_snapshots(game),
            projectile: game.projectile().map(|p| p.position()),
            hit_effect: game.hit_effect().copied(),
            hit_flash: game
                .hit_effect()
                .is_some_and(|effect| effect.is_fresh(unix_millis())),
            preview: game.preview_trajectory(),
            terrain_revision: terrain_key.1,
            terrain,
        }
    }
}

fn mech_snapshots(game: &MatchState) -> Vec<MechSnapshot> {
    [Side::Player, Side::Ai]
        .into_iter()
        .map(|side| {
            let pos = game.mech_position(side);
            MechSnapshot {
                side,
                x: pos.x,
                y: pos.y,
                health: game.mech(side).health,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::MatchConfig;
    use crate::game::session::Settings;
    use crate::game::terrain::Terrain;

    fn session() -> Session {
        let config = MatchConfig {
            seed: Some(5),
            ..MatchConfig::default()
        };
        let game =
            MatchState::with_layout(config, Terrain::flat(1000, 100.0), 50.0, 900.0).unwrap();
        Session::with_game(game, Settings::default())
    }

    #[test]
    fn interval_gates_snapshots() {
        let mut builder = SnapshotBuilder::new(3);
        assert!(!builder.should_send());
        assert!(!builder.should_send());
        assert!(builder.should_send());
        builder.force_next();
        assert!(builder.should_send());
    }

    #[test]
    fn terrain_is_sent_once_per_revision() {
        let session = session();
        let mut builder = SnapshotBuilder::new(1);

        let first = builder.build(&session);
        assert_eq!(first.terrain.as_ref().map(Vec::len), Some(1000));

        let second = builder.build(&session);
        assert!(second.terrain.is_none());
        assert_eq!(second.terrain_revision, first.terrain_revision);
    }

    #[test]
    fn snapshot_reflects_match() {
        let session = session();
        let snapshot = SnapshotBuilder::new(1).build(&session);

        assert_eq!(snapshot.scene, Scene::Menu);
        assert!(snapshot.music_enabled);
        assert_eq!(snapshot.turn, Side::Player);
        assert_eq!(snapshot.phase, TurnPhase::Aiming);
        assert_eq!(
            snapshot.mechs[1],
            MechSnapshot {
                side: Side::Ai,
                x: 900.0,
                y: 500.0,
                health: 100,
            }
        );
        assert!(snapshot.projectile.is_none());
        assert!(snapshot.hit_effect.is_none());
        assert!(!snapshot.hit_flash);
        assert!(snapshot.preview.is_some());
    }
}
