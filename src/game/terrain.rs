//! Destructible height-field terrain

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Terrain generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Number of height samples (also the playfield width)
    pub resolution: usize,
    /// Number of 3-point smoothing passes
    pub smoothness: u32,
    /// Lower bound of the rough random profile (inclusive)
    pub rough_min: f64,
    /// Upper bound of the rough random profile (exclusive)
    pub rough_max: f64,
    /// Minimum height of a freshly generated sample
    pub floor: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            resolution: 1000,
            smoothness: 5,
            rough_min: 150.0,
            rough_max: 350.0,
            floor: 50.0,
        }
    }
}

/// Ground elevation sampled at integer x positions.
///
/// Heights grow upwards from the bottom of the playfield; the renderer and the
/// collision code convert them into screen space with `playfield_height - h`.
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    heights: Vec<f64>,
    revision: u64,
}

impl Terrain {
    /// Build terrain from explicit samples
    pub fn from_heights(heights: Vec<f64>) -> Self {
        Self {
            heights,
            revision: 0,
        }
    }

    /// Terrain with every sample at the same height
    pub fn flat(resolution: usize, height: f64) -> Self {
        Self::from_heights(vec![height; resolution])
    }

    /// Random rough profile, smoothed and clamped to the floor
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &TerrainConfig) -> Self {
        let mut heights: Vec<f64> = (0..config.resolution)
            .map(|_| rng.gen_range(config.rough_min..config.rough_max))
            .collect();

        for _ in 0..config.smoothness {
            heights = smooth_pass(&heights);
        }

        for h in heights.iter_mut() {
            *h = h.max(config.floor);
        }

        Self::from_heights(heights)
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn resolution(&self) -> usize {
        self.heights.len()
    }

    /// Playfield width in terrain units
    pub fn width(&self) -> f64 {
        self.heights.len() as f64
    }

    /// Bumped on every destructive edit
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Interpolated height at a fractional x.
    ///
    /// Queries left of 0 or right of the last sample clamp to the edge sample.
    /// Empty terrain has height 0 everywhere.
    pub fn height_at(&self, x: f64) -> f64 {
        let Some(last) = self.heights.len().checked_sub(1) else {
            return 0.0;
        };
        let x = x.clamp(0.0, last as f64);
        let x0 = x.floor() as usize;
        let x1 = x.ceil() as usize;
        if x0 == x1 {
            return self.heights[x0];
        }
        let y0 = self.heights[x0];
        let y1 = self.heights[x1];
        y0 + (y1 - y0) * (x - x0 as f64)
    }

    /// Carve a crater centred on sample `x`.
    ///
    /// Every sample within `radius` of `x` loses `radius - |x - i|` height,
    /// never dropping below 0. The crater depends on horizontal distance only:
    /// the impact depth `_y` does not shape it.
    pub fn destroy(&mut self, x: i64, _y: i64, radius: i64) {
        let radius = radius.max(0);
        let last = i64::try_from(self.heights.len()).unwrap_or(i64::MAX) - 1;
        let lo = x.saturating_sub(radius).max(0);
        let hi = x.saturating_add(radius).min(last);
        for i in lo..=hi {
            let depth = radius as u64 - x.abs_diff(i);
            let h = &mut self.heights[i as usize];
            *h = (*h - depth as f64).max(0.0);
        }
        self.revision += 1;
    }
}

/// One 3-point moving-average pass; the two boundary samples are kept as-is.
pub fn smooth_pass(heights: &[f64]) -> Vec<f64> {
    let mut smoothed = heights.to_vec();
    for j in 1..heights.len().saturating_sub(1) {
        smoothed[j] = (heights[j - 1] + heights[j] + heights[j + 1]) / 3.0;
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_terrain_respects_floor_and_resolution() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = TerrainConfig::default();
        let terrain = Terrain::generate(&mut rng, &config);

        assert_eq!(terrain.resolution(), 1000);
        assert!(terrain.heights().iter().all(|&h| h >= config.floor));
        assert!(terrain.heights().iter().all(|&h| h < config.rough_max));
    }

    #[test]
    fn floor_lifts_low_profiles() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = TerrainConfig {
            resolution: 50,
            smoothness: 2,
            rough_min: 0.0,
            rough_max: 10.0,
            floor: 50.0,
        };
        let terrain = Terrain::generate(&mut rng, &config);
        assert!(terrain.heights().iter().all(|&h| h == 50.0));
    }

    #[test]
    fn same_seed_same_terrain() {
        let config = TerrainConfig::default();
        let a = Terrain::generate(&mut ChaCha8Rng::seed_from_u64(9), &config);
        let b = Terrain::generate(&mut ChaCha8Rng::seed_from_u64(9), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn crater_near_integer_limits_is_clipped_not_overflowed() {
        let mut terrain = Terrain::flat(20, 100.0);
        terrain.destroy(i64::MAX, 0, 10);
        terrain.destroy(i64::MIN, 0, 10);
        terrain.destroy(5, 0, i64::MAX);
        assert_eq!(terrain.revision(), 3);
        assert_eq!(terrain.heights()[0], 0.0);
        assert_eq!(terrain.heights()[19], 0.0);

        let mut terrain = Terrain::flat(20, 100.0);
        terrain.destroy(i64::MAX, 0, 10);
        assert_eq!(terrain.heights(), Terrain::flat(20, 100.0).heights());
    }

    #[test]
    fn smoothing_keeps_boundaries_and_averages_interior() {
        let smoothed = smooth_pass(&[0.0, 3.0, 6.0, 0.0]);
        assert_eq!(smoothed, vec![0.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn smoothing_tiny_inputs_is_identity() {
        assert_eq!(smooth_pass(&[]), Vec::<f64>::new());
        assert_eq!(smooth_pass(&[4.0]), vec![4.0]);
        assert_eq!(smooth_pass(&[4.0, 8.0]), vec![4.0, 8.0]);
    }

    #[test]
    fn height_at_integer_is_exact_sample() {
        let terrain = Terrain::from_heights(vec![10.0, 20.0, 40.0]);
        assert_eq!(terrain.height_at(0.0), 10.0);
        assert_eq!(terrain.height_at(1.0), 20.0);
        assert_eq!(terrain.height_at(2.0), 40.0);
    }

    #[test]
    fn height_at_interpolates_linearly() {
        let terrain = Terrain::from_heights(vec![10.0, 20.0, 40.0]);
        assert_eq!(terrain.height_at(0.5), 15.0);
        assert_eq!(terrain.height_at(1.25), 25.0);
    }

    #[test]
    fn height_at_clamps_outside_domain() {
        let terrain = Terrain::from_heights(vec![10.0, 20.0, 40.0]);
        assert_eq!(terrain.height_at(-5.0), 10.0);
        assert_eq!(terrain.height_at(2.5), 40.0);
        assert_eq!(terrain.height_at(1e9), 40.0);
        assert_eq!(Terrain::from_heights(Vec::new()).height_at(3.0), 0.0);
    }

    #[test]
    fn destroy_digs_horizontal_crater() {
        let mut terrain = Terrain::flat(41, 100.0);
        terrain.destroy(20, 0, 10);

        assert_eq!(terrain.heights()[20], 90.0);
        assert_eq!(terrain.heights()[15], 95.0);
        assert_eq!(terrain.heights()[25], 95.0);
        assert_eq!(terrain.heights()[10], 100.0);
        assert_eq!(terrain.heights()[30], 100.0);
        assert_eq!(terrain.heights()[9], 100.0);
        assert_eq!(terrain.revision(), 1);
    }

    #[test]
    fn destroy_ignores_impact_depth() {
        let mut shallow = Terrain::flat(30, 100.0);
        let mut deep = Terrain::flat(30, 100.0);
        shallow.destroy(15, 0, 10);
        deep.destroy(15, 590, 10);
        assert_eq!(shallow.heights(), deep.heights());
    }

    #[test]
    fn destroy_clamps_at_zero_and_edges() {
        let mut terrain = Terrain::flat(5, 3.0);
        terrain.destroy(0, 0, 10);
        assert_eq!(terrain.heights(), &[0.0, 0.0, 0.0, 0.0, 0.0]);

        let mut terrain = Terrain::flat(5, 100.0);
        terrain.destroy(-3, 0, 4);
        assert_eq!(terrain.heights()[0], 99.0);
        assert_eq!(terrain.heights()[1], 100.0);
    }
}
