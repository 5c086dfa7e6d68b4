//! Wind

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    /// Wind acceleration applied to shells (positive blows right)
    pub wind: f32,
    /// Value `wind` eases toward between shots
    pub target: f32,
    pub max_wind: f32,
    /// Whether wind drifts between turns
    pub drifting: bool,
}

impl Weather {
    pub fn new(max_wind: f32, drifting: bool) -> Self {
        Self {
            wind: 0.0,
            target: 0.0,
            max_wind: max_wind.max(0.0),
            drifting,
        }
    }

    /// New wind for a new round
    pub fn reroll<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.wind = if self.max_wind > 0.0 {
            rng.random_range(-self.max_wind..=self.max_wind)
        } else {
            0.0
        };
        self.target = self.wind;
    }

    /// Nudge the target wind at a turn change
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.drifting || self.max_wind <= 0.0 {
            return;
        }
        let step = rng.random_range(-WIND_DRIFT..=WIND_DRIFT);
        self.target = (self.target + step).clamp(-self.max_wind, self.max_wind);
    }

    /// Ease the wind toward its target
    pub fn update(&mut self, dt: f32) {
        let blend = (WIND_EASE_RATE * dt).clamp(0.0, 1.0);
        self.wind += (self.target - self.wind) * blend;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_reroll_within_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut weather = Weather::new(25.0, true);
        for _ in 0..100 {
            weather.reroll(&mut rng);
            assert!(weather.wind.abs() <= 25.0);
        }
    }

    #[test]
    fn test_calm_stays_calm() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut weather = Weather::new(0.0, true);
        weather.reroll(&mut rng);
        weather.drift(&mut rng);
        weather.update(1.0);
        assert_eq!(weather.wind, 0.0);
    }

    #[test]
    fn test_wind_eases_to_target() {
        let mut weather = Weather::new(40.0, true);
        weather.target = 20.0;
        for _ in 0..600 {
            weather.update(SIM_DT);
        }
        assert!((weather.wind - 20.0).abs() < 0.01);
    }
}
