//! Explosions and blast damage
//!
//! Damage is applied once, when the explosion is created. The growing
//! fireball afterwards is for drawing only.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::BlastRequest;
use super::roster::{DamageReport, Roster};
use super::state::GameEvent;
use super::terrain::Terrain;
use super::weapons::BlastSpec;
use crate::consts::*;

/// Damage at `distance` from the centre, falling linearly from max at the
/// centre to min at the edge. Zero outside the radius.
pub fn blast_damage(distance: f32, blast: &BlastSpec) -> i32 {
    if !(blast.radius > 0.0) || !(distance >= 0.0) || distance > blast.radius {
        return 0;
    }
    let closeness = 1.0 - distance / blast.radius;
    let span = (blast.max_damage - blast.min_damage) as f32;
    (blast.min_damage as f32 + span * closeness) as i32
}

/// An expanding fireball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub initial_radius: f32,
    pub radius: f32,
    pub max_radius: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl Explosion {
    /// Fireball sized by its source blast, or the default radius without one
    pub fn new(pos: Vec2, source: Option<&BlastSpec>) -> Self {
        let max_radius = source.map(|b| b.radius).unwrap_or(DEFAULT_BLAST_RADIUS).max(0.0);
        let initial_radius = EXPLOSION_START_RADIUS.min(max_radius);
        Self {
            pos,
            initial_radius,
            radius: initial_radius,
            max_radius,
            elapsed: 0.0,
            duration: EXPLOSION_DURATION,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.radius = self.initial_radius + (self.max_radius - self.initial_radius) * t;
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Apply a detonation: damage every living tank in reach, then crater the
/// ground if it was struck. Returns the fireball to animate.
pub fn detonate(
    terrain: &mut Terrain,
    roster: &mut Roster,
    request: &BlastRequest,
    events: &mut Vec<GameEvent>,
) -> Explosion {
    let explosion = Explosion::new(request.point, Some(&request.blast));
    events.push(GameEvent::Exploded {
        pos: request.point,
        radius: request.blast.radius,
    });

    let hits: Vec<(usize, i32)> = roster
        .players()
        .iter()
        .enumerate()
        .filter(|(_, tank)| tank.is_alive())
        .map(|(i, tank)| (i, blast_damage(tank.pos.distance(request.point), &request.blast)))
        .filter(|&(_, damage)| damage > 0)
        .collect();

    for (index, damage) in hits {
        if let Some(report) = roster.apply_damage(index, damage, Some(request.owner)) {
            log::debug!(
                "Blast at ({:.0}, {:.0}) hit player {} for {} ({} absorbed)",
                request.point.x,
                request.point.y,
                index,
                damage,
                report.hit.absorbed
            );
            push_damage_events(events, &report);
        }
    }

    if request.struck_terrain {
        terrain.deform(request.point, request.blast.radius);
    }

    explosion
}

/// Translate a damage report into events
pub(crate) fn push_damage_events(events: &mut Vec<GameEvent>, report: &DamageReport) {
    events.push(GameEvent::Damaged {
        player: report.player,
        amount: report.hit.dealt,
        absorbed: report.hit.absorbed,
    });
    if report.hit.depleted.is_some() {
        events.push(GameEvent::ShieldChanged {
            player: report.player,
            shield: None,
        });
    }
    if let Some(order) = report.eliminated {
        log::debug!("Player {} eliminated (order {})", report.player, order);
        events.push(GameEvent::Eliminated {
            player: report.player,
            order,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::{PlayerKind, Shield, Tank};
    use crate::sim::weapons::{ProjectileKind, ShieldKind};
    use proptest::prelude::*;

    fn setup() -> (Terrain, Roster) {
        let terrain = Terrain::flat(800.0, 600.0, 500.0);
        let roster = Roster::new(vec![
            Tank::new("A", PlayerKind::Human, 0).with_position(100.0, &terrain),
            Tank::new("B", PlayerKind::Cpu, 0).with_position(600.0, &terrain),
        ]);
        (terrain, roster)
    }

    #[test]
    fn test_damage_endpoints() {
        let blast = BlastSpec::new(10, 30, 20.0);
        assert_eq!(blast_damage(0.0, &blast), 30);
        assert_eq!(blast_damage(20.0, &blast), 10);
        assert_eq!(blast_damage(10.0, &blast), 20);
        assert_eq!(blast_damage(20.5, &blast), 0);
    }

    #[test]
    fn test_zero_radius_never_damages() {
        let blast = BlastSpec::new(0, 0, 0.0);
        assert_eq!(blast_damage(0.0, &blast), 0);
    }

    #[test]
    fn test_baby_missile_direct_hit() {
        let (mut terrain, mut roster) = setup();
        let target = roster.players()[1].pos;
        let request = BlastRequest {
            point: target,
            blast: ProjectileKind::BabyMissile.spec().blast,
            struck_terrain: false,
            owner: 0,
        };
        let mut events = Vec::new();
        detonate(&mut terrain, &mut roster, &request, &mut events);
        assert_eq!(roster.players()[1].health, 70);
        assert_eq!(roster.players()[0].health, 100);
        assert!(events.contains(&GameEvent::Damaged { player: 1, amount: 30, absorbed: 0 }));
        assert_eq!(roster.players()[0].money, 30 * DAMAGE_REWARD_PER_POINT);
    }

    #[test]
    fn test_shield_takes_blast_first() {
        let (mut terrain, mut roster) = setup();
        roster.players_mut()[1].shield = Some(Shield::new(ShieldKind::Light));
        let request = BlastRequest {
            point: roster.players()[1].pos,
            blast: BlastSpec::new(20, 40, 30.0),
            struck_terrain: false,
            owner: 0,
        };
        detonate(&mut terrain, &mut roster, &request, &mut Vec::new());
        let b = &roster.players()[1];
        assert_eq!(b.health, 100);
        assert_eq!(b.shield.map(|s| s.capacity), Some(10));
    }

    #[test]
    fn test_crater_only_when_ground_struck() {
        let (mut terrain, mut roster) = setup();
        let point = Vec2::new(400.0, 500.0);
        let mut request = BlastRequest {
            point,
            blast: BlastSpec::new(10, 30, 20.0),
            struck_terrain: false,
            owner: 0,
        };
        detonate(&mut terrain, &mut roster, &request, &mut Vec::new());
        assert_eq!(terrain.height_at(400.0), 500.0);
        request.struck_terrain = true;
        detonate(&mut terrain, &mut roster, &request, &mut Vec::new());
        assert!(terrain.height_at(400.0) > 500.0);
    }

    #[test]
    fn test_elimination_event() {
        let (mut terrain, mut roster) = setup();
        roster.players_mut()[1].health = 5;
        let request = BlastRequest {
            point: roster.players()[1].pos,
            blast: BlastSpec::new(10, 30, 20.0),
            struck_terrain: true,
            owner: 0,
        };
        let mut events = Vec::new();
        detonate(&mut terrain, &mut roster, &request, &mut events);
        assert!(events.contains(&GameEvent::Eliminated { player: 1, order: 0 }));
        assert_eq!(roster.living_count(), 1);
    }

    #[test]
    fn test_explosion_animation() {
        let blast = BlastSpec::new(10, 30, 42.0);
        let mut e = Explosion::new(Vec2::ZERO, Some(&blast));
        assert_eq!(e.radius, EXPLOSION_START_RADIUS);
        e.update(EXPLOSION_DURATION / 2.0);
        assert!((e.radius - (EXPLOSION_START_RADIUS + 20.0)).abs() < 0.001);
        assert!(!e.is_finished());
        e.update(EXPLOSION_DURATION);
        assert_eq!(e.radius, 42.0);
        assert!(e.is_finished());

        let default = Explosion::new(Vec2::ZERO, None);
        assert_eq!(default.max_radius, DEFAULT_BLAST_RADIUS);
    }

    proptest! {
        #[test]
        fn prop_damage_monotonic(
            radius in 1.0f32..200.0,
            min in 0i32..50,
            extra in 0i32..100,
            a in 0.0f32..1.0,
            b in 0.0f32..1.0,
        ) {
            let blast = BlastSpec::new(min, min + extra, radius);
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(blast_damage(near * radius, &blast) >= blast_damage(far * radius, &blast));
            prop_assert_eq!(blast_damage(0.0, &blast), min + extra);
            prop_assert_eq!(blast_damage(radius, &blast), min);
        }
    }
}
