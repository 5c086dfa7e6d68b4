//! Destructible height-field terrain
//!
//! The surface is a fixed grid of samples, each one an `(x, y)` point where
//! `y` is the screen-space surface height. Explosions only ever push samples
//! downward (larger `y`); the grid itself never changes until the field is
//! regenerated.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Vertex of the terrain outline, laid out for direct GPU upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct OutlineVertex {
    pub position: [f32; 2],
}

/// A noise band: cycles across the field width and its relative weight
const BANDS: [(f32, f32); 4] = [(1.0, 0.55), (2.5, 0.25), (6.0, 0.13), (14.0, 0.07)];

/// Number of samples used for a field of the given width
pub fn sample_count(width: f32) -> usize {
    ((width / TERRAIN_SAMPLE_SPACING).round() as usize)
        .clamp(MIN_TERRAIN_SAMPLES, MAX_TERRAIN_SAMPLES)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    /// Field width (samples span `0..=width`)
    pub width: f32,
    /// Field height (the bottom edge of the play field)
    pub height: f32,
    /// Variance level this terrain was generated with (0-100)
    pub variance: f32,
    samples: Vec<Vec2>,
    outline: Vec<Vec2>,
}

impl Terrain {
    /// Generate terrain for a field. Variance 0 is perfectly flat; higher
    /// levels stack more frequency bands and may carve valleys or raise peaks.
    pub fn generate<R: Rng + ?Sized>(width: f32, height: f32, variance: f32, rng: &mut R) -> Self {
        let width = width.max(MIN_FIELD_WIDTH);
        let height = height.max(MIN_FIELD_HEIGHT);
        let variance = variance.clamp(0.0, 100.0);
        let amount = variance / 100.0;
        let baseline = height * TERRAIN_BASELINE;
        let amplitude = height * 0.3 * amount;

        // Higher variance brings in the finer bands
        let band_count = (1 + (amount * 3.0).round() as usize).min(BANDS.len());
        let bands: Vec<(f32, f32, f32)> = BANDS[..band_count]
            .iter()
            .map(|&(cycles, weight)| {
                let cycles = cycles * rng.random_range(0.75..1.25);
                let phase = rng.random_range(0.0..std::f32::consts::TAU);
                (cycles, weight, phase)
            })
            .collect();
        let total_weight: f32 = bands.iter().map(|b| b.1).sum();

        // Discrete valleys (positive depth) and peaks (negative depth)
        let mut features: Vec<(f32, f32, f32)> = Vec::new();
        if variance > FEATURE_VARIANCE_THRESHOLD {
            let max_features = 1 + (amount * 2.0) as u32;
            for _ in 0..rng.random_range(1..=max_features) {
                let center = rng.random_range(0.0..width);
                let sigma = width * rng.random_range(0.04..0.1);
                let depth = amplitude * rng.random_range(0.5..1.0);
                let depth = if rng.random_bool(0.5) { depth } else { -depth };
                features.push((center, sigma, depth));
            }
        }

        let count = sample_count(width);
        let top = height * TERRAIN_CEILING;
        let bottom = height - TERRAIN_FLOOR_MARGIN;
        let samples = (0..count)
            .map(|i| {
                let x = width * i as f32 / (count - 1) as f32;
                if amount <= 0.0 {
                    return Vec2::new(x, baseline);
                }
                let t = x / width;
                let noise: f32 = bands
                    .iter()
                    .map(|&(cycles, weight, phase)| {
                        weight * (std::f32::consts::TAU * cycles * t + phase).sin()
                    })
                    .sum::<f32>()
                    / total_weight;
                let feature: f32 = features
                    .iter()
                    .map(|&(center, sigma, depth)| {
                        let dx = x - center;
                        depth * (-(dx * dx) / (2.0 * sigma * sigma)).exp()
                    })
                    .sum();
                Vec2::new(x, (baseline + noise * amplitude + feature).clamp(top, bottom))
            })
            .collect();

        log::info!(
            "Generated terrain {}x{} variance={} samples={} features={}",
            width,
            height,
            variance,
            count,
            features.len()
        );

        let mut terrain = Self {
            width,
            height,
            variance,
            samples,
            outline: Vec::new(),
        };
        terrain.rebuild_outline();
        terrain
    }

    /// Build terrain from explicit heights spread evenly across `width`.
    /// An empty height list falls back to a flat baseline.
    pub fn from_heights(width: f32, height: f32, heights: &[f32]) -> Self {
        let width = width.max(MIN_FIELD_WIDTH);
        let height = height.max(MIN_FIELD_HEIGHT);
        let samples = match heights.len() {
            0 => {
                log::warn!("Empty terrain height list, substituting flat baseline");
                let count = sample_count(width);
                (0..count)
                    .map(|i| {
                        let x = width * i as f32 / (count - 1) as f32;
                        Vec2::new(x, height * TERRAIN_BASELINE)
                    })
                    .collect()
            }
            1 => vec![
                Vec2::new(0.0, heights[0].clamp(0.0, height)),
                Vec2::new(width, heights[0].clamp(0.0, height)),
            ],
            n => heights
                .iter()
                .enumerate()
                .map(|(i, &y)| Vec2::new(width * i as f32 / (n - 1) as f32, y.clamp(0.0, height)))
                .collect(),
        };
        let mut terrain = Self {
            width,
            height,
            variance: 0.0,
            samples,
            outline: Vec::new(),
        };
        terrain.rebuild_outline();
        terrain
    }

    /// Flat terrain with the surface at `surface_y`
    pub fn flat(width: f32, height: f32, surface_y: f32) -> Self {
        let count = sample_count(width.max(MIN_FIELD_WIDTH));
        Self::from_heights(width, height, &vec![surface_y; count])
    }

    /// Height samples, ordered by x
    pub fn samples(&self) -> &[Vec2] {
        &self.samples
    }

    /// Closed outline polygon: bottom-left, surface samples, bottom-right
    pub fn outline(&self) -> &[Vec2] {
        &self.outline
    }

    /// Outline as GPU-ready vertices
    pub fn outline_vertices(&self) -> Vec<OutlineVertex> {
        self.outline
            .iter()
            .map(|p| OutlineVertex { position: [p.x, p.y] })
            .collect()
    }

    /// Outline vertex data as raw bytes
    pub fn outline_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.outline_vertices()).to_vec()
    }

    /// Surface height at `x`, linearly interpolated and clamped to the edge samples
    pub fn height_at(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return self.height;
        };
        if x.is_nan() || x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }
        // First sample strictly right of x; always in 1..len here
        let i = self.samples.partition_point(|s| s.x <= x);
        let a = self.samples[i - 1];
        let b = self.samples[i];
        let span = b.x - a.x;
        if span <= f32::EPSILON {
            return a.y;
        }
        a.y + (b.y - a.y) * (x - a.x) / span
    }

    /// Local rise over run (screen space, positive when the surface drops to the right)
    pub fn slope_at(&self, x: f32) -> f32 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let step = (self.samples[n - 1].x - self.samples[0].x) / (n - 1) as f32;
        if step <= f32::EPSILON {
            return 0.0;
        }
        (self.height_at(x + step) - self.height_at(x - step)) / (2.0 * step)
    }

    /// Upward-facing unit normal of the surface at `x`
    pub fn normal_at(&self, x: f32) -> Vec2 {
        Vec2::new(self.slope_at(x), -1.0).normalize_or(Vec2::NEG_Y)
    }

    /// True when the point is at or below the surface
    pub fn is_colliding(&self, pos: Vec2) -> bool {
        pos.y >= self.height_at(pos.x)
    }

    /// Dig a crater. Every sample within `radius` (true 2D distance) is pushed
    /// down by `(1 - (d/r)^2) * CRATER_DEPTH_FACTOR * r`, never below the field
    /// bottom. Returns true if any sample moved.
    pub fn deform(&mut self, center: Vec2, radius: f32) -> bool {
        if !(radius > 0.0) || !center.is_finite() {
            return false;
        }
        let depth = CRATER_DEPTH_FACTOR * radius;
        let floor = self.height;
        let mut changed = false;
        for sample in &mut self.samples {
            let d = sample.distance(center);
            if d >= radius {
                continue;
            }
            let ratio = d / radius;
            let new_y = (sample.y + (1.0 - ratio * ratio) * depth).min(floor);
            if new_y != sample.y {
                sample.y = new_y;
                changed = true;
            }
        }
        if changed {
            self.rebuild_outline();
        }
        changed
    }

    /// Level the samples within `half_width` of `x` to the surface height at `x`
    pub fn flatten(&mut self, x: f32, half_width: f32) {
        let level = self.height_at(x);
        let mut changed = false;
        for sample in &mut self.samples {
            if (sample.x - x).abs() <= half_width {
                sample.y = level;
                changed = true;
            }
        }
        if changed {
            self.rebuild_outline();
        }
    }

    fn rebuild_outline(&mut self) {
        self.outline.clear();
        let (Some(first), Some(last)) =
            (self.samples.first().copied(), self.samples.last().copied())
        else {
            return;
        };
        self.outline.reserve(self.samples.len() + 2);
        self.outline.push(Vec2::new(first.x, self.height));
        self.outline.extend_from_slice(&self.samples);
        self.outline.push(Vec2::new(last.x, self.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_zero_variance_is_flat() {
        let mut rng = Pcg32::seed_from_u64(1);
        let terrain = Terrain::generate(800.0, 600.0, 0.0, &mut rng);
        let expected = 600.0 * TERRAIN_BASELINE;
        assert!(terrain.samples().iter().all(|s| (s.y - expected).abs() < 0.001));
    }

    #[test]
    fn test_samples_span_field() {
        let mut rng = Pcg32::seed_from_u64(2);
        let terrain = Terrain::generate(800.0, 600.0, 80.0, &mut rng);
        let samples = terrain.samples();
        assert_eq!(samples.len(), sample_count(800.0));
        assert_eq!(samples[0].x, 0.0);
        assert!((samples[samples.len() - 1].x - 800.0).abs() < 0.001);
        assert!(samples.windows(2).all(|w| w[0].x < w[1].x));
        assert!(samples.iter().all(|s| s.y >= 600.0 * TERRAIN_CEILING && s.y <= 600.0));
    }

    #[test]
    fn test_sample_count_bounds() {
        assert_eq!(sample_count(100.0), MIN_TERRAIN_SAMPLES);
        assert_eq!(sample_count(800.0), 200);
        assert_eq!(sample_count(5000.0), MAX_TERRAIN_SAMPLES);
    }

    #[test]
    fn test_height_interpolation_and_clamp() {
        let terrain = Terrain::from_heights(400.0, 300.0, &[100.0, 200.0, 100.0]);
        assert!((terrain.height_at(0.0) - 100.0).abs() < 0.001);
        assert!((terrain.height_at(100.0) - 150.0).abs() < 0.001);
        assert!((terrain.height_at(200.0) - 200.0).abs() < 0.001);
        assert!((terrain.height_at(-50.0) - 100.0).abs() < 0.001);
        assert!((terrain.height_at(1000.0) - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_slope_sign() {
        let terrain = Terrain::from_heights(400.0, 300.0, &[100.0, 200.0, 100.0]);
        assert!(terrain.slope_at(100.0) > 0.0);
        assert!(terrain.slope_at(300.0) < 0.0);
        let flat = Terrain::flat(400.0, 300.0, 150.0);
        assert!(flat.slope_at(200.0).abs() < 0.001);
        assert!((flat.normal_at(200.0) - Vec2::NEG_Y).length() < 0.001);
    }

    #[test]
    fn test_collision_at_or_below_surface() {
        let terrain = Terrain::flat(400.0, 300.0, 200.0);
        assert!(!terrain.is_colliding(Vec2::new(100.0, 199.0)));
        assert!(terrain.is_colliding(Vec2::new(100.0, 200.0)));
        assert!(terrain.is_colliding(Vec2::new(100.0, 250.0)));
    }

    #[test]
    fn test_empty_heights_fall_back_to_baseline() {
        let terrain = Terrain::from_heights(400.0, 300.0, &[]);
        assert!(!terrain.samples().is_empty());
        assert!((terrain.height_at(200.0) - 300.0 * TERRAIN_BASELINE).abs() < 0.001);
    }

    #[test]
    fn test_deform_digs_crater() {
        let mut terrain = Terrain::flat(400.0, 300.0, 200.0);
        assert!(terrain.deform(Vec2::new(200.0, 200.0), 20.0));
        // Centre sample sinks by the full crater depth
        assert!((terrain.height_at(200.0) - (200.0 + 0.8 * 20.0)).abs() < 0.5);
        assert!((terrain.height_at(100.0) - 200.0).abs() < 0.001);
    }

    #[test]
    fn test_deform_above_ground_out_of_reach() {
        let mut terrain = Terrain::flat(400.0, 300.0, 200.0);
        assert!(!terrain.deform(Vec2::new(200.0, 100.0), 20.0));
    }

    #[test]
    fn test_deform_never_below_floor() {
        let mut terrain = Terrain::flat(400.0, 300.0, 290.0);
        terrain.deform(Vec2::new(200.0, 290.0), 80.0);
        assert!(terrain.samples().iter().all(|s| s.y <= 300.0));
    }

    #[test]
    fn test_outline_is_closed() {
        let terrain = Terrain::flat(400.0, 300.0, 200.0);
        let outline = terrain.outline();
        assert_eq!(outline.len(), terrain.samples().len() + 2);
        assert_eq!(outline[0], Vec2::new(0.0, 300.0));
        assert_eq!(outline[outline.len() - 1], Vec2::new(400.0, 300.0));
        assert_eq!(terrain.outline_bytes().len(), outline.len() * 8);
    }

    #[test]
    fn test_flatten_levels_pad() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut terrain = Terrain::generate(800.0, 600.0, 90.0, &mut rng);
        terrain.flatten(400.0, 20.0);
        let level = terrain.height_at(400.0);
        assert!(
            terrain
                .samples()
                .iter()
                .filter(|s| (s.x - 400.0).abs() <= 20.0)
                .all(|s| (s.y - level).abs() < 0.001)
        );
    }

    proptest! {
        #[test]
        fn prop_deform_keeps_grid(
            seed in 0u64..1000,
            blasts in prop::collection::vec((0.0f32..800.0, 100.0f32..600.0, 1.0f32..100.0), 1..8),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut terrain = Terrain::generate(800.0, 600.0, 60.0, &mut rng);
            let xs: Vec<f32> = terrain.samples().iter().map(|s| s.x).collect();
            for (x, y, r) in blasts {
                let before = terrain.samples().to_vec();
                let center = Vec2::new(x, y);
                terrain.deform(center, r);
                for (old, new) in before.iter().zip(terrain.samples()) {
                    if old.distance(center) >= r {
                        prop_assert_eq!(old.y, new.y);
                    } else {
                        prop_assert!(new.y >= old.y);
                    }
                }
            }
            let after: Vec<f32> = terrain.samples().iter().map(|s| s.x).collect();
            prop_assert_eq!(xs, after);
        }
    }
}
