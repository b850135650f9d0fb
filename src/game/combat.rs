//! Combat system - sides, mechs, aim, damage and hit markers

use serde::{Deserialize, Serialize};

use super::physics::{Ballistics, Point, Shell, MECH_TORSO_OFFSET};
use super::terrain::Terrain;

/// Health every mech starts a match with
pub const STARTING_HEALTH: i32 = 100;
/// Damage dealt by one direct hit
pub const HIT_DAMAGE: i32 = 20;
/// Radius of the crater dug by a terrain impact
pub const CRATER_RADIUS: i64 = 10;
/// How long the renderer flashes a hit marker
pub const HIT_FLASH_MS: u64 = 100;

pub const ANGLE_RANGE: (f64, f64) = (0.0, 90.0);
pub const POWER_RANGE: (f64, f64) = (0.0, 100.0);

/// The two combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Ai,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Ai,
            Side::Ai => Side::Player,
        }
    }
}

/// Firing angle (degrees above the horizontal) and power
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aim {
    pub angle: f64,
    pub power: f64,
}

impl Aim {
    /// Build an aim clamped to the legal ranges
    pub fn clamped(angle: f64, power: f64) -> Self {
        let mut aim = Self::default();
        aim.set(angle, power);
        aim
    }

    /// Overwrite both values, clamping to range. Non-finite inputs are ignored.
    pub fn set(&mut self, angle: f64, power: f64) {
        if angle.is_finite() {
            self.angle = angle.clamp(ANGLE_RANGE.0, ANGLE_RANGE.1);
        }
        if power.is_finite() {
            self.power = power.clamp(POWER_RANGE.0, POWER_RANGE.1);
        }
    }

    /// Shift both values by a delta, clamping to range
    pub fn nudge(&mut self, angle_delta: f64, power_delta: f64) {
        self.set(self.angle + angle_delta, self.power + power_delta);
    }
}

impl Default for Aim {
    fn default() -> Self {
        Self {
            angle: 45.0,
            power: 50.0,
        }
    }
}

/// A combatant resting on the terrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mech {
    pub side: Side,
    pub x: f64,
    pub health: i32,
}

impl Mech {
    pub fn new(side: Side, x: f64) -> Self {
        Self {
            side,
            x,
            health: STARTING_HEALTH,
        }
    }

    /// Ground-contact y, re-derived from the terrain on every query
    pub fn ground_y(&self, terrain: &Terrain, ballistics: &Ballistics) -> f64 {
        ballistics.playfield_height - terrain.height_at(self.x)
    }

    /// Where this mech's shots start
    pub fn muzzle(&self, terrain: &Terrain, ballistics: &Ballistics) -> Point {
        Point {
            x: self.x,
            y: self.ground_y(terrain, ballistics) - MECH_TORSO_OFFSET,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }
}

/// The single shot in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub owner: Side,
    pub shell: Shell,
}

impl Projectile {
    pub fn fire(owner: Side, muzzle: Point, aim: Aim) -> Self {
        Self {
            owner,
            shell: Shell::launch(muzzle.x, muzzle.y, aim.angle, aim.power),
        }
    }

    pub fn position(&self) -> Point {
        self.shell.position()
    }
}

/// Transient marker left where a mech was struck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub target: Side,
    pub x: f64,
    pub y: f64,
    pub tick: u64,
    pub at_millis: u64,
}

impl HitEffect {
    /// Whether the flash should still be drawn at `now_millis`
    pub fn is_fresh(&self, now_millis: u64) -> bool {
        now_millis.saturating_sub(self.at_millis) < HIT_FLASH_MS
    }
}

/// Damage rules
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = (current_health - damage).max(0);
        (new_health, new_health <= 0)
    }
}
