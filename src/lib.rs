//! Artillery Duel - turn-based artillery on destructible terrain
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, projectiles, blasts, players, rounds)
//! - `settings`: Match configuration
//! - `standings`: Round-end ranking and payouts

pub mod settings;
pub mod sim;
pub mod standings;

pub use settings::{Preset, Settings};
pub use standings::{RoundStandings, StandingEntry};

use glam::Vec2;

/// Game configuration constants
///
/// Screen coordinates: x grows to the right, y grows downward. A terrain
/// "height" is the y of the surface, so a larger value is a deeper pit.
pub mod consts {
    /// Nominal frame step (60 Hz host cadence)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest step a single update will integrate; longer frames are split
    pub const MAX_STEP: f32 = 1.0 / 30.0;

    /// Field defaults
    pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
    pub const DEFAULT_FIELD_HEIGHT: f32 = 600.0;
    pub const MIN_FIELD_WIDTH: f32 = 200.0;
    pub const MIN_FIELD_HEIGHT: f32 = 150.0;

    /// Terrain sampling
    pub const MIN_TERRAIN_SAMPLES: usize = 100;
    pub const MAX_TERRAIN_SAMPLES: usize = 250;
    pub const TERRAIN_SAMPLE_SPACING: f32 = 4.0;
    /// Flat terrain sits at this fraction of the field height
    pub const TERRAIN_BASELINE: f32 = 0.65;
    /// Highest the surface may rise (fraction of field height from the top)
    pub const TERRAIN_CEILING: f32 = 0.2;
    /// Lowest the surface may sink above the field bottom
    pub const TERRAIN_FLOOR_MARGIN: f32 = 2.0;
    /// Crater depth as a fraction of blast radius
    pub const CRATER_DEPTH_FACTOR: f32 = 0.8;
    /// Variance level above which discrete valley/peak features are placed
    pub const FEATURE_VARIANCE_THRESHOLD: f32 = 30.0;

    /// Physics
    pub const GRAVITY: f32 = 200.0;
    /// Launch speed per point of power (power 100 = 500 px/s)
    pub const POWER_TO_SPEED: f32 = 5.0;
    pub const MAX_WIND: f32 = 40.0;
    /// Largest change of the wind target per turn
    pub const WIND_DRIFT: f32 = 8.0;
    /// How quickly displayed wind eases toward its target (per second)
    pub const WIND_EASE_RATE: f32 = 2.0;

    /// Tanks
    pub const MAX_HEALTH: i32 = 100;
    pub const TANK_CLEARANCE: f32 = 10.0;
    pub const TANK_PAD_HALF_WIDTH: f32 = 12.0;
    pub const PLAYER_HIT_RADIUS: f32 = 15.0;
    /// Fraction of the field width kept clear of spawns at each edge
    pub const SPAWN_MARGIN: f32 = 0.08;
    /// Spawn jitter as a fraction of the slot width
    pub const SPAWN_JITTER: f32 = 0.2;
    /// Shells spawn this far from the tank centre, clear of its own hit radius
    pub const BARREL_LENGTH: f32 = 20.0;
    pub const MIN_ANGLE: f32 = 0.0;
    pub const MAX_ANGLE: f32 = 180.0;
    pub const MIN_POWER: f32 = 0.0;
    pub const MAX_POWER: f32 = 100.0;
    pub const DEFAULT_ANGLE: f32 = 45.0;
    pub const DEFAULT_POWER: f32 = 50.0;

    /// Falling tanks
    pub const FALL_SPEED: f32 = 150.0;
    pub const MAX_FALL_DAMAGE: i32 = 30;
    /// Fall damage when dropping the full field height (before the cap)
    pub const FALL_DAMAGE_SCALE: f32 = 100.0;
    /// Drops shorter than this settle instantly without damage
    pub const MIN_FALL_DISTANCE: f32 = 2.0;

    /// Projectiles
    pub const TRAIL_LENGTH: usize = 60;
    pub const SPLIT_SPREAD_DEG: f32 = 40.0;
    pub const SPLIT_ANGLE_JITTER_DEG: f32 = 3.0;
    pub const SPLIT_SPEED_JITTER: f32 = 0.08;
    pub const SPLIT_MIN_SPEED: f32 = 60.0;
    pub const CLUSTER_MIN_SPEED: f32 = 120.0;
    pub const CLUSTER_MAX_SPEED: f32 = 260.0;
    /// Cluster bomblets leave the impact between these headings (degrees)
    pub const CLUSTER_MIN_HEADING: f32 = 30.0;
    pub const CLUSTER_MAX_HEADING: f32 = 150.0;
    /// Fraction of speed kept after a bounce
    pub const BOUNCE_ENERGY_RETAINED: f32 = 0.7;
    pub const BOUNCE_SPREAD_DEG: f32 = 20.0;

    /// Explosions
    pub const EXPLOSION_DURATION: f32 = 0.5;
    pub const EXPLOSION_START_RADIUS: f32 = 2.0;
    pub const DEFAULT_BLAST_RADIUS: f32 = 30.0;

    /// Economy
    pub const STARTING_MONEY: u32 = 5000;
    pub const STARTING_BABY_MISSILES: u32 = 20;
    pub const DAMAGE_REWARD_PER_POINT: u32 = 10;
    pub const ELIMINATION_BONUS: u32 = 1000;
    pub const ROUND_PAYOUT_UNIT: u32 = 1000;

    /// Match defaults
    pub const DEFAULT_ROUNDS: u32 = 10;
    pub const MAX_PLAYERS: usize = 10;
}

/// Convert an aim angle (degrees, 0 = right, 90 = straight up) and power to a velocity
#[inline]
pub fn launch_velocity(angle_deg: f32, power: f32) -> Vec2 {
    heading_to_velocity(angle_deg, power * consts::POWER_TO_SPEED)
}

/// Velocity for a heading in degrees (counter-clockwise on screen, y down)
#[inline]
pub fn heading_to_velocity(heading_deg: f32, speed: f32) -> Vec2 {
    let rad = heading_deg.to_radians();
    Vec2::new(rad.cos() * speed, -rad.sin() * speed)
}

/// Heading of a velocity in degrees, the inverse of [`heading_to_velocity`]
#[inline]
pub fn velocity_heading(vel: Vec2) -> f32 {
    (-vel.y).atan2(vel.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_roundtrip_up() {
        let v = heading_to_velocity(90.0, 100.0);
        assert!(v.x.abs() < 0.001);
        assert!((v.y + 100.0).abs() < 0.001);
        assert!((velocity_heading(v) - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_launch_velocity_scales_with_power() {
        let v = launch_velocity(0.0, 10.0);
        assert!((v.x - 10.0 * consts::POWER_TO_SPEED).abs() < 0.001);
        assert!(v.y.abs() < 0.001);
    }
}
