//! Match state and turn sequencing

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::GameEvent;
use crate::util::time::unix_millis;

use super::ai::{AimSolver, SolverGrid};
use super::combat::{
    Aim, CombatSystem, HitEffect, Mech, Projectile, Side, CRATER_RADIUS, HIT_DAMAGE,
};
use super::physics::{Ballistics, BallisticsError, PhysicsSystem, Point};
use super::terrain::{Terrain, TerrainConfig};

/// Tunable rules of a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub terrain: TerrainConfig,
    pub ballistics: Ballistics,
    pub solver: SolverGrid,
    /// Mechs spawn in `[0, resolution * spawn_fraction)`
    pub spawn_fraction: f64,
    /// Fixed RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            ballistics: Ballistics::default(),
            solver: SolverGrid::default(),
            spawn_fraction: 0.8,
            seed: None,
        }
    }
}

/// Phase of the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Active side is choosing angle and power
    Aiming,
    /// Projectile in flight
    Shooting,
    /// Shot resolved, hand-off on the next tick
    TurnEnd,
}

/// Match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ongoing,
    PlayerWin,
    AiWin,
}

impl Outcome {
    pub fn won_by(side: Side) -> Self {
        match side {
            Side::Player => Outcome::PlayerWin,
            Side::Ai => Outcome::AiWin,
        }
    }

    pub fn is_decided(self) -> bool {
        self != Outcome::Ongoing
    }
}

/// Rejected commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("match is already decided: {0:?}")]
    MatchOver(Outcome),

    #[error("it is not the {0:?} side's turn")]
    NotYourTurn(Side),

    #[error("cannot fire while {0:?}")]
    NotAiming(TurnPhase),

    #[error("a projectile is already in flight")]
    ProjectileInFlight,

    #[error(transparent)]
    Ballistics(#[from] BallisticsError),
}

/// Everything a duel needs: terrain, both mechs, the shot in flight and the
/// turn bookkeeping. Owned by a single sequencer; all mutation goes through
/// `fire`, `advance_tick`, the aim setters and `new_match`.
pub struct MatchState {
    id: Uuid,
    config: MatchConfig,
    rng: ChaCha8Rng,
    solver: AimSolver,
    tick: u64,
    terrain: Terrain,
    player: Mech,
    ai: Mech,
    turn: Side,
    phase: TurnPhase,
    aim: Aim,
    ai_aim: Option<Aim>,
    projectile: Option<Projectile>,
    hit_effect: Option<HitEffect>,
    outcome: Outcome,
    pending: Vec<GameEvent>,
}

impl MatchState {
    /// Start a match on freshly generated terrain
    pub fn new(config: MatchConfig) -> Result<Self, MatchError> {
        config.ballistics.validate()?;
        let mut rng = seeded_rng(config.seed);
        let terrain = Terrain::generate(&mut rng, &config.terrain);
        let (player_x, ai_x) = spawn_positions(&mut rng, &config, &terrain);
        Ok(Self::assemble(config, rng, terrain, player_x, ai_x))
    }

    /// Start a match on given terrain with mechs at fixed positions
    pub fn with_layout(
        config: MatchConfig,
        terrain: Terrain,
        player_x: f64,
        ai_x: f64,
    ) -> Result<Self, MatchError> {
        config.ballistics.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self::assemble(config, rng, terrain, player_x, ai_x))
    }

    fn assemble(
        config: MatchConfig,
        rng: ChaCha8Rng,
        terrain: Terrain,
        player_x: f64,
        ai_x: f64,
    ) -> Self {
        let mut state = Self {
            id: Uuid::new_v4(),
            solver: AimSolver::new(config.solver),
            config,
            rng,
            tick: 0,
            terrain,
            player: Mech::new(Side::Player, player_x),
            ai: Mech::new(Side::Ai, ai_x),
            turn: Side::Player,
            phase: TurnPhase::Aiming,
            aim: Aim::default(),
            ai_aim: None,
            projectile: None,
            hit_effect: None,
            outcome: Outcome::Ongoing,
            pending: Vec::new(),
        };
        state.announce_start();
        state
    }

    /// Regenerate terrain and reset every piece of match state
    pub fn new_match(&mut self) {
        let terrain = Terrain::generate(&mut self.rng, &self.config.terrain);
        let (player_x, ai_x) = spawn_positions(&mut self.rng, &self.config, &terrain);

        self.id = Uuid::new_v4();
        self.tick = 0;
        self.terrain = terrain;
        self.player = Mech::new(Side::Player, player_x);
        self.ai = Mech::new(Side::Ai, ai_x);
        self.turn = Side::Player;
        self.phase = TurnPhase::Aiming;
        self.aim = Aim::default();
        self.ai_aim = None;
        self.projectile = None;
        self.hit_effect = None;
        self.outcome = Outcome::Ongoing;
        self.pending.clear();
        self.announce_start();
    }

    fn announce_start(&mut self) {
        info!(
            match_id = %self.id,
            player_x = self.player.x,
            ai_x = self.ai.x,
            "Match started"
        );
        self.pending.push(GameEvent::TurnStarted { side: self.turn });
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn ballistics(&self) -> &Ballistics {
        &self.config.ballistics
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn mech(&self, side: Side) -> &Mech {
        match side {
            Side::Player => &self.player,
            Side::Ai => &self.ai,
        }
    }

    fn mech_mut(&mut self, side: Side) -> &mut Mech {
        match side {
            Side::Player => &mut self.player,
            Side::Ai => &mut self.ai,
        }
    }

    /// Ground-contact position of a mech on the current terrain
    pub fn mech_position(&self, side: Side) -> Point {
        let mech = self.mech(side);
        Point {
            x: mech.x,
            y: mech.ground_y(&self.terrain, &self.config.ballistics),
        }
    }

    pub fn projectile(&self) -> Option<&Projectile> {
        self.projectile.as_ref()
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn hit_effect(&self) -> Option<&HitEffect> {
        self.hit_effect.as_ref()
    }

    /// The human player's current aim
    pub fn aim(&self) -> Aim {
        self.aim
    }

    /// The aim the AI committed to on its latest turn
    pub fn ai_aim(&self) -> Option<Aim> {
        self.ai_aim
    }

    /// Predicted path of the player's shot while they are aiming
    pub fn preview_trajectory(&self) -> Option<Vec<Point>> {
        if self.outcome.is_decided() || self.turn != Side::Player || self.phase != TurnPhase::Aiming
        {
            return None;
        }
        let muzzle = self.player.muzzle(&self.terrain, &self.config.ballistics);
        Some(
            PhysicsSystem::simulate(
                &self.terrain,
                &self.config.ballistics,
                muzzle.x,
                muzzle.y,
                self.aim.angle,
                self.aim.power,
            )
            .collect(),
        )
    }

    pub fn set_aim(&mut self, angle: f64, power: f64) {
        self.aim.set(angle, power);
    }

    pub fn nudge_aim(&mut self, angle_delta: f64, power_delta: f64) {
        self.aim.nudge(angle_delta, power_delta);
    }

    /// Fire the active side's shot
    pub fn fire(&mut self, side: Side) -> Result<(), MatchError> {
        if self.outcome.is_decided() {
            return Err(MatchError::MatchOver(self.outcome));
        }
        if side != self.turn {
            return Err(MatchError::NotYourTurn(side));
        }
        if self.phase != TurnPhase::Aiming {
            return Err(MatchError::NotAiming(self.phase));
        }
        if self.projectile.is_some() {
            return Err(MatchError::ProjectileInFlight);
        }

        let aim = match side {
            Side::Player => self.aim,
            Side::Ai => self.ai_aim.unwrap_or_default(),
        };
        let muzzle = self.mech(side).muzzle(&self.terrain, &self.config.ballistics);
        self.projectile = Some(Projectile::fire(side, muzzle, aim));
        self.phase = TurnPhase::Shooting;

        debug!(
            match_id = %self.id,
            side = ?side,
            angle = aim.angle,
            power = aim.power,
            "Shot fired"
        );
        self.pending.push(GameEvent::Shot {
            side,
            angle: aim.angle,
            power: aim.power,
            x: muzzle.x,
            y: muzzle.y,
        });
        Ok(())
    }

    /// Run one frame: hand over the turn, let the AI shoot, step the shot.
    /// Returns the events produced since the previous tick. Once the match is
    /// decided this does nothing.
    pub fn advance_tick(&mut self) -> Vec<GameEvent> {
        if self.outcome.is_decided() {
            return Vec::new();
        }
        self.tick += 1;

        if self.phase == TurnPhase::TurnEnd {
            self.switch_turn();
        }

        if self.turn == Side::Ai && self.phase == TurnPhase::Aiming {
            self.take_ai_turn();
        }

        self.step_projectile();

        std::mem::take(&mut self.pending)
    }

    fn switch_turn(&mut self) {
        self.turn = self.turn.opponent();
        self.phase = TurnPhase::Aiming;
        info!(match_id = %self.id, side = ?self.turn, tick = self.tick, "Turn started");
        self.pending.push(GameEvent::TurnStarted { side: self.turn });
    }

    fn take_ai_turn(&mut self) {
        let origin = self.ai.muzzle(&self.terrain, &self.config.ballistics);
        let plan = self.solver.choose_shot(
            &self.terrain,
            &self.config.ballistics,
            origin,
            self.player.x,
        );
        self.ai_aim = Some(plan.aim);

        if let Err(e) = self.fire(Side::Ai) {
            warn!(match_id = %self.id, error = %e, "AI could not fire");
        }
    }

    fn step_projectile(&mut self) {
        let Some(mut projectile) = self.projectile.take() else {
            return;
        };
        projectile.shell.step(self.config.ballistics.gravity);

        let Point { x, y } = projectile.position();
        let shooter = projectile.owner;
        let target = shooter.opponent();
        let target_pos = self.mech_position(target);
        let ballistics = self.config.ballistics;

        if PhysicsSystem::terrain_collision(&self.terrain, &ballistics, x, y) {
            self.terrain
                .destroy(x.floor() as i64, y.floor() as i64, CRATER_RADIUS);
            debug!(match_id = %self.id, side = ?shooter, x, y, "Terrain hit");
            self.pending.push(GameEvent::TerrainHit { side: shooter, x, y });
            self.phase = TurnPhase::TurnEnd;
        } else if PhysicsSystem::mech_collision(x, y, target_pos.x, target_pos.y) {
            self.resolve_mech_hit(shooter, target, Point { x, y }, target_pos);
            self.phase = TurnPhase::TurnEnd;
        } else if PhysicsSystem::out_of_bounds(&self.terrain, &ballistics, x, y) {
            debug!(match_id = %self.id, side = ?shooter, x, y, "Shot left the playfield");
            self.pending.push(GameEvent::OutOfBounds { side: shooter, x, y });
            self.phase = TurnPhase::TurnEnd;
        } else {
            self.projectile = Some(projectile);
        }
    }

    fn resolve_mech_hit(&mut self, shooter: Side, target: Side, impact: Point, target_pos: Point) {
        let mech = self.mech_mut(target);
        let (new_health, killed) = CombatSystem::apply_damage(mech.health, HIT_DAMAGE);
        mech.health = new_health;

        self.hit_effect = Some(HitEffect {
            target,
            x: target_pos.x,
            y: target_pos.y,
            tick: self.tick,
            at_millis: unix_millis(),
        });

        info!(
            match_id = %self.id,
            shooter = ?shooter,
            target = ?target,
            health = new_health,
            "Mech hit"
        );
        self.pending.push(GameEvent::MechHit {
            shooter,
            target,
            damage: HIT_DAMAGE,
            health_remaining: new_health,
            x: impact.x,
            y: impact.y,
        });

        if killed {
            self.outcome = Outcome::won_by(shooter);
            info!(match_id = %self.id, outcome = ?self.outcome, tick = self.tick, "Match ended");
            self.pending.push(GameEvent::MatchEnded {
                outcome: self.outcome,
            });
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Each mech lands independently somewhere in the left part of the terrain
fn spawn_positions(rng: &mut ChaCha8Rng, config: &MatchConfig, terrain: &Terrain) -> (f64, f64) {
    let span = terrain.width() * config.spawn_fraction;
    if span <= 0.0 {
        return (0.0, 0.0);
    }
    (rng.gen_range(0.0..span), rng.gen_range(0.0..span))
}
