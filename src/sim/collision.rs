//! Collision detection for shells in flight
//!
//! Checks run in a fixed order: field boundary, terrain, then tanks.

use glam::Vec2;

use super::terrain::Terrain;
use crate::consts::PLAYER_HIT_RADIUS;

/// Field edge a shell crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Bottom,
}

/// What a shell ran into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Left the field (the top is open sky)
    Boundary { side: Side, point: Vec2 },
    /// Hit the ground; `point` is on the surface
    Terrain { point: Vec2 },
    /// Came within hit radius of a living tank
    Player { index: usize, point: Vec2 },
}

impl Contact {
    pub fn point(&self) -> Vec2 {
        match *self {
            Contact::Boundary { point, .. }
            | Contact::Terrain { point }
            | Contact::Player { point, .. } => point,
        }
    }

    /// Whether a blast here would carve the ground
    pub fn touches_ground(&self) -> bool {
        matches!(
            self,
            Contact::Terrain { .. }
                | Contact::Boundary {
                    side: Side::Bottom,
                    ..
                }
        )
    }
}

/// Which edge, if any, the point has crossed
pub fn boundary_crossed(pos: Vec2, width: f32, height: f32) -> Option<Side> {
    if pos.x < 0.0 {
        Some(Side::Left)
    } else if pos.x > width {
        Some(Side::Right)
    } else if pos.y > height {
        Some(Side::Bottom)
    } else {
        None
    }
}

/// First tank (by roster order) within hit radius of `pos`
pub fn tank_hit(pos: Vec2, targets: &[(usize, Vec2)]) -> Option<usize> {
    targets
        .iter()
        .find(|(_, tank)| tank.distance(pos) <= PLAYER_HIT_RADIUS)
        .map(|&(index, _)| index)
}

/// Run the ordered collision checks for a shell at `pos`
pub fn detect_contact(pos: Vec2, terrain: &Terrain, targets: &[(usize, Vec2)]) -> Option<Contact> {
    if let Some(side) = boundary_crossed(pos, terrain.width, terrain.height) {
        let point = Vec2::new(pos.x.clamp(0.0, terrain.width), pos.y.min(terrain.height));
        return Some(Contact::Boundary { side, point });
    }
    if terrain.is_colliding(pos) {
        let point = Vec2::new(pos.x, terrain.height_at(pos.x));
        return Some(Contact::Terrain { point });
    }
    tank_hit(pos, targets).map(|index| Contact::Player { index, point: pos })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Mirror the velocity component across the struck field edge
pub fn reflect_off_boundary(velocity: Vec2, side: Side) -> Vec2 {
    match side {
        Side::Left => Vec2::new(velocity.x.abs(), velocity.y),
        Side::Right => Vec2::new(-velocity.x.abs(), velocity.y),
        Side::Bottom => Vec2::new(velocity.x, -velocity.y.abs()),
    }
}
