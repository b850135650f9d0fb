//! Brute-force AI gunner

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::time::Timer;

use super::combat::Aim;
use super::physics::{Ballistics, PhysicsSystem, Point};
use super::terrain::Terrain;

/// Discretized search space, in whole degrees and power units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverGrid {
    pub angle_min: u32,
    pub angle_max: u32,
    pub angle_step: u32,
    pub power_min: u32,
    pub power_max: u32,
    pub power_step: u32,
}

impl SolverGrid {
    /// Candidate aims in evaluation order: angle outer, power inner, both ascending
    pub fn candidates(&self) -> impl Iterator<Item = Aim> + '_ {
        let angles = (self.angle_min..=self.angle_max).step_by(self.angle_step.max(1) as usize);
        angles.flat_map(move |angle| {
            (self.power_min..=self.power_max)
                .step_by(self.power_step.max(1) as usize)
                .map(move |power| Aim {
                    angle: f64::from(angle),
                    power: f64::from(power),
                })
        })
    }
}

impl Default for SolverGrid {
    fn default() -> Self {
        Self {
            angle_min: 10,
            angle_max: 80,
            angle_step: 5,
            power_min: 30,
            power_max: 70,
            power_step: 5,
        }
    }
}

/// Result of a solver run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotPlan {
    pub aim: Aim,
    /// Horizontal distance between the predicted landing point and the target
    pub error: f64,
    pub landing: Point,
}

/// Picks the grid aim whose simulated landing is closest to the target
#[derive(Debug, Clone, Default)]
pub struct AimSolver {
    pub grid: SolverGrid,
}

impl AimSolver {
    pub fn new(grid: SolverGrid) -> Self {
        Self { grid }
    }

    /// Exhaustively evaluate the grid. Ties keep the earliest candidate.
    pub fn choose_shot(
        &self,
        terrain: &Terrain,
        ballistics: &Ballistics,
        origin: Point,
        target_x: f64,
    ) -> ShotPlan {
        let timer = Timer::new();
        let mut best: Option<ShotPlan> = None;
        let mut evaluated = 0usize;

        for aim in self.grid.candidates() {
            evaluated += 1;
            let Some(landing) =
                PhysicsSystem::simulate(terrain, ballistics, origin.x, origin.y, aim.angle, aim.power)
                    .last()
            else {
                continue;
            };
            let error = (landing.x - target_x).abs();

            if best.map_or(true, |b| error < b.error) {
                best = Some(ShotPlan {
                    aim,
                    error,
                    landing,
                });
            }
        }

        let plan = best.unwrap_or(ShotPlan {
            aim: Aim::default(),
            error: f64::INFINITY,
            landing: origin,
        });

        debug!(
            evaluated,
            angle = plan.aim.angle,
            power = plan.aim.power,
            error = plan.error,
            elapsed_us = timer.elapsed_micros(),
            "AI shot chosen"
        );

        plan
    }
}
