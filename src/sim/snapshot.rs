//! Read model for renderers and UIs
//!
//! A snapshot is a self-contained copy of everything drawable. Consumers
//! re-read it after draining events instead of observing live state.

use serde::{Deserialize, Serialize};

use super::blast::Explosion;
use super::projectile::Projectile;
use super::state::{GamePhase, GameState};
use super::weapons::{ItemKind, ProjectileKind, ShieldKind};
use super::PlayerKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldSnapshot {
    pub kind: ShieldKind,
    pub capacity: i32,
    pub max_capacity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub index: usize,
    pub name: String,
    pub kind: PlayerKind,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub angle: f32,
    pub power: f32,
    pub money: u32,
    pub inventory: Vec<(ItemKind, u32)>,
    pub selected_projectile: ProjectileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield: Option<ShieldSnapshot>,
    pub elimination_order: i32,
    pub falling: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub trail: Vec<[f32; 2]>,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            kind: p.kind,
            x: p.pos.x,
            y: p.pos.y,
            vx: p.vel.x,
            vy: p.vel.y,
            trail: p.trail.iter().map(|v| v.to_array()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionSnapshot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub max_radius: f32,
}

impl From<&Explosion> for ExplosionSnapshot {
    fn from(e: &Explosion) -> Self {
        Self {
            x: e.pos.x,
            y: e.pos.y,
            radius: e.radius,
            max_radius: e.max_radius,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub round: u32,
    pub total_rounds: u32,
    pub width: f32,
    pub height: f32,
    /// Surface samples as `[x, y]`
    pub terrain: Vec<[f32; 2]>,
    /// Closed fill polygon
    pub outline: Vec<[f32; 2]>,
    pub players: Vec<PlayerSnapshot>,
    /// Player whose turn it is, outside turn phases `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projectile: Option<ProjectileSnapshot>,
    pub batch: Vec<ProjectileSnapshot>,
    pub explosions: Vec<ExplosionSnapshot>,
    pub wind: f32,
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        let terrain = self.terrain();
        let players = self
            .players()
            .iter()
            .enumerate()
            .map(|(index, tank)| PlayerSnapshot {
                index,
                name: tank.name.clone(),
                kind: tank.kind,
                x: tank.pos.x,
                y: tank.pos.y,
                health: tank.health,
                angle: tank.angle,
                power: tank.power,
                money: tank.money,
                inventory: tank.inventory.iter().collect(),
                selected_projectile: tank.selected_projectile,
                shield: tank.shield.map(|s| ShieldSnapshot {
                    kind: s.kind,
                    capacity: s.capacity,
                    max_capacity: s.max_capacity,
                }),
                elimination_order: tank.elimination_order,
                falling: tank.is_falling(),
            })
            .collect();

        GameSnapshot {
            tick: self.time_ticks(),
            phase: self.phase(),
            round: self.round(),
            total_rounds: self.total_rounds(),
            width: terrain.width,
            height: terrain.height,
            terrain: terrain.samples().iter().map(|v| v.to_array()).collect(),
            outline: terrain.outline().iter().map(|v| v.to_array()).collect(),
            players,
            current_player: self
                .phase()
                .is_turn()
                .then(|| self.current_player_index()),
            projectile: self.projectile().map(ProjectileSnapshot::from),
            batch: self.batch().iter().map(ProjectileSnapshot::from).collect(),
            explosions: self.explosions().iter().map(ExplosionSnapshot::from).collect(),
            wind: self.wind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::Settings;
    use crate::sim::state::{GamePhase, GameState};

    #[test]
    fn test_snapshot_mirrors_state() {
        let state = GameState::new(Settings::default());
        let snap = state.snapshot();
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.round, 1);
        assert_eq!(snap.terrain.len(), state.terrain().samples().len());
        assert_eq!(snap.outline.len(), snap.terrain.len() + 2);
        assert_eq!(snap.current_player, Some(0));
        assert!(snap.projectile.is_none());
        assert_eq!(snap.players[0].health, 100);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(Settings::default());
        state.fire_projectile(50.0, 60.0).unwrap();
        state.update(1.0 / 60.0);
        let snap = state.snapshot();
        assert_eq!(snap.phase, GamePhase::ProjectileActive);
        assert!(snap.current_player.is_none());
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"projectile\""));
        assert!(json.contains("\"ProjectileActive\""));
    }
}
