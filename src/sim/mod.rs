//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by roster index, then shell id)
//! - No rendering or platform dependencies

mod actions;
pub mod blast;
pub mod collision;
pub mod player;
pub mod projectile;
pub mod roster;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod weapons;
pub mod weather;

pub use blast::{Explosion, blast_damage};
pub use collision::{Contact, Side};
pub use player::{Inventory, PlayerKind, Shield, Tank};
pub use projectile::{Flight, Projectile};
pub use roster::Roster;
pub use snapshot::{ExplosionSnapshot, GameSnapshot, PlayerSnapshot, ProjectileSnapshot};
pub use state::{GameEvent, GamePhase, GameState, Rejection};
pub use terrain::{OutlineVertex, Terrain};
pub use tick::update;
pub use weapons::{Behavior, BlastSpec, ItemKind, ProjectileKind, ShieldKind, WeaponSpec};
pub use weather::Weather;
