//! Ballistic flight and collision detection

use serde::{Deserialize, Serialize};

use super::terrain::Terrain;

/// Vertical distance from a mech's ground contact to its torso centre
pub const MECH_TORSO_OFFSET: f64 = 10.0;
/// Radius of the circular mech hit region around the torso centre
pub const MECH_HIT_RADIUS: f64 = 20.0;

/// World constants shared by every trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ballistics {
    /// Added to the vertical velocity every step; must be positive
    pub gravity: f64,
    /// Bottom edge of the playfield (y grows downwards)
    pub playfield_height: f64,
}

impl Ballistics {
    /// Trajectories only terminate when shells fall towards a finite bottom edge
    pub fn validate(&self) -> Result<(), BallisticsError> {
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(BallisticsError::Gravity(self.gravity));
        }
        if !(self.playfield_height.is_finite() && self.playfield_height > 0.0) {
            return Err(BallisticsError::PlayfieldHeight(self.playfield_height));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BallisticsError {
    #[error("gravity must be positive and finite, got {0}")]
    Gravity(f64),

    #[error("playfield height must be positive and finite, got {0}")]
    PlayfieldHeight(f64),
}

impl Default for Ballistics {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            playfield_height: 600.0,
        }
    }
}

/// A position in playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Position and velocity of a point mass in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shell {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
}

impl Shell {
    /// Launch from `(x, y)`; the angle is measured from the horizontal with
    /// positive values pointing up.
    pub fn launch(x: f64, y: f64, angle_deg: f64, power: f64) -> Self {
        let angle = angle_deg.to_radians();
        Self {
            x,
            y,
            vel_x: power * angle.cos(),
            vel_y: -power * angle.sin(),
        }
    }

    /// Advance one integration step
    pub fn step(&mut self, gravity: f64) {
        self.x += self.vel_x;
        self.y += self.vel_y;
        self.vel_y += gravity;
    }

    pub fn position(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

/// Lazily integrated flight path.
///
/// Yields the position after every step and stops after the first point that
/// is at or below the playfield bottom or inside the terrain. That terminal
/// point is yielded, and at least one step is always taken.
#[derive(Debug, Clone)]
pub struct Trajectory<'a> {
    terrain: &'a Terrain,
    ballistics: Ballistics,
    shell: Shell,
    finished: bool,
}

impl Iterator for Trajectory<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.finished {
            return None;
        }

        self.shell.step(self.ballistics.gravity);
        let point = self.shell.position();

        if point.y >= self.ballistics.playfield_height
            || PhysicsSystem::terrain_collision(self.terrain, &self.ballistics, point.x, point.y)
        {
            self.finished = true;
        }

        Some(point)
    }
}

/// Stateless physics queries
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Simulate a complete shot without touching any game state.
    /// The path is finite only for ballistics that pass [`Ballistics::validate`].
    pub fn simulate<'a>(
        terrain: &'a Terrain,
        ballistics: &Ballistics,
        x0: f64,
        y0: f64,
        angle_deg: f64,
        power: f64,
    ) -> Trajectory<'a> {
        Trajectory {
            terrain,
            ballistics: *ballistics,
            shell: Shell::launch(x0, y0, angle_deg, power),
            finished: false,
        }
    }

    /// Whether a point is on or below the ground surface
    pub fn terrain_collision(terrain: &Terrain, ballistics: &Ballistics, x: f64, y: f64) -> bool {
        x >= 0.0
            && x < terrain.width()
            && y >= ballistics.playfield_height - terrain.height_at(x)
    }

    /// Whether a point is inside the hit circle of a mech standing at
    /// `(mech_x, mech_y)`
    pub fn mech_collision(x: f64, y: f64, mech_x: f64, mech_y: f64) -> bool {
        let dx = x - mech_x;
        let dy = y - (mech_y - MECH_TORSO_OFFSET);
        (dx * dx + dy * dy).sqrt() < MECH_HIT_RADIUS
    }

    /// Whether a live projectile has left the playfield
    pub fn out_of_bounds(terrain: &Terrain, ballistics: &Ballistics, x: f64, y: f64) -> bool {
        y > ballistics.playfield_height || x < 0.0 || x > terrain.width()
    }
}
