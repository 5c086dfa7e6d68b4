//! Tanks, their inventories and shields

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use super::weapons::{ItemKind, ProjectileKind, ShieldKind};
use crate::consts::*;
use crate::heading_to_velocity;

/// Who is behind the controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerKind {
    #[default]
    Human,
    Cpu,
}

/// Owned quantities per item kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(ItemKind, u32)>", into = "Vec<(ItemKind, u32)>")]
pub struct Inventory {
    items: BTreeMap<ItemKind, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity owned (0 when absent)
    pub fn count(&self, item: impl Into<ItemKind>) -> u32 {
        self.items.get(&item.into()).copied().unwrap_or(0)
    }

    pub fn has(&self, item: impl Into<ItemKind>) -> bool {
        self.count(item) > 0
    }

    pub fn add(&mut self, item: impl Into<ItemKind>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.items.entry(item.into()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Remove `quantity` units. Fails without change if fewer are owned.
    pub fn remove(&mut self, item: impl Into<ItemKind>, quantity: u32) -> bool {
        let item = item.into();
        let owned = self.items.get(&item).copied().unwrap_or(0);
        if owned < quantity {
            return false;
        }
        if owned == quantity {
            self.items.remove(&item);
        } else {
            self.items.insert(item, owned - quantity);
        }
        true
    }

    /// Owned items in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.items.iter().map(|(&k, &v)| (k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Any projectile at all left to fire
    pub fn has_ammunition(&self) -> bool {
        self.items
            .keys()
            .any(|item| matches!(item, ItemKind::Projectile(_)))
    }
}

impl From<Vec<(ItemKind, u32)>> for Inventory {
    fn from(entries: Vec<(ItemKind, u32)>) -> Self {
        let mut inventory = Inventory::new();
        for (item, quantity) in entries {
            inventory.add(item, quantity);
        }
        inventory
    }
}

impl From<Inventory> for Vec<(ItemKind, u32)> {
    fn from(inventory: Inventory) -> Self {
        inventory.items.into_iter().collect()
    }
}

/// An active shield absorbing incoming damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub kind: ShieldKind,
    pub capacity: i32,
    pub max_capacity: i32,
}

impl Shield {
    pub fn new(kind: ShieldKind) -> Self {
        Self {
            kind,
            capacity: kind.capacity(),
            max_capacity: kind.capacity(),
        }
    }

    /// Fraction of capacity left (0-1)
    pub fn strength(&self) -> f32 {
        if self.max_capacity <= 0 {
            0.0
        } else {
            self.capacity as f32 / self.max_capacity as f32
        }
    }
}

/// Result of running damage through a tank's shield and hull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Absorption {
    /// Taken by the shield
    pub absorbed: i32,
    /// Taken off health
    pub dealt: i32,
    /// Shield kind that ran out during this hit
    pub depleted: Option<ShieldKind>,
    /// Health crossed from positive to zero
    pub destroyed: bool,
}

/// Tank dropping after the ground under it was blown away
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fall {
    pub start_y: f32,
}

/// Outcome of a completed fall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub distance: f32,
    pub damage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub name: String,
    pub kind: PlayerKind,
    /// Tank centre, `TANK_CLEARANCE` above the surface when resting
    pub pos: Vec2,
    pub health: i32,
    /// Aim in degrees (0 = right, 90 = up, 180 = left)
    pub angle: f32,
    pub power: f32,
    pub money: u32,
    pub inventory: Inventory,
    pub selected_projectile: ProjectileKind,
    pub selected_shield: Option<ShieldKind>,
    pub shield: Option<Shield>,
    /// Order in which this tank was destroyed this round (-1 = still alive)
    pub elimination_order: i32,
    pub fall: Option<Fall>,
}

impl Tank {
    pub fn new(name: impl Into<String>, kind: PlayerKind, money: u32) -> Self {
        let mut inventory = Inventory::new();
        inventory.add(ProjectileKind::BabyMissile, STARTING_BABY_MISSILES);
        Self {
            name: name.into(),
            kind,
            pos: Vec2::ZERO,
            health: MAX_HEALTH,
            angle: DEFAULT_ANGLE,
            power: DEFAULT_POWER,
            money,
            inventory,
            selected_projectile: ProjectileKind::BabyMissile,
            selected_shield: None,
            shield: None,
            elimination_order: -1,
            fall: None,
        }
    }

    /// Sit the tank on the surface at `x`
    pub fn with_position(mut self, x: f32, terrain: &Terrain) -> Self {
        self.pos = resting_position(x, terrain);
        self
    }

    /// Fresh tank for a new round: identity, money, inventory and selections
    /// carry over; health, position and elimination reset.
    pub fn respawned(&self, x: f32, terrain: &Terrain) -> Self {
        let mut tank = Self {
            name: self.name.clone(),
            kind: self.kind,
            pos: resting_position(x, terrain),
            health: MAX_HEALTH,
            angle: self.angle,
            power: self.power,
            money: self.money,
            inventory: self.inventory.clone(),
            selected_projectile: self.selected_projectile,
            selected_shield: self.selected_shield,
            shield: None,
            elimination_order: -1,
            fall: None,
        };
        tank.activate_shield();
        tank
    }

    /// Fresh tank on a regenerated field, keeping every round-scoped value too
    pub fn relocated(&self, x: f32, terrain: &Terrain) -> Self {
        Self {
            pos: resting_position(x, terrain),
            fall: None,
            ..self.clone()
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_cpu(&self) -> bool {
        self.kind == PlayerKind::Cpu
    }

    pub fn is_falling(&self) -> bool {
        self.fall.is_some()
    }

    pub fn set_angle(&mut self, angle: f32) {
        if angle.is_finite() {
            self.angle = angle.clamp(MIN_ANGLE, MAX_ANGLE);
        }
    }

    pub fn set_power(&mut self, power: f32) {
        if power.is_finite() {
            self.power = power.clamp(MIN_POWER, MAX_POWER);
        }
    }

    /// Where shells leave the barrel
    pub fn barrel_tip(&self) -> Vec2 {
        self.pos + heading_to_velocity(self.angle, BARREL_LENGTH)
    }

    /// Take one round of the selected projectile out of inventory
    pub fn take_round(&mut self) -> Option<ProjectileKind> {
        let kind = self.selected_projectile;
        self.inventory.remove(kind, 1).then_some(kind)
    }

    /// Buy a bundle of `kind`. Fails without change if money is short.
    pub fn purchase_missile(&mut self, kind: ProjectileKind) -> bool {
        self.purchase(ItemKind::Projectile(kind))
    }

    /// Buy a shield. Fails without change if money is short.
    pub fn purchase_shield(&mut self, kind: ShieldKind) -> bool {
        self.purchase(ItemKind::Shield(kind))
    }

    fn purchase(&mut self, item: ItemKind) -> bool {
        let price = item.price();
        if self.money < price {
            return false;
        }
        self.money -= price;
        self.inventory.add(item, item.bundle());
        true
    }

    /// Toggle the selected shield kind. Selecting an owned kind raises a
    /// fresh shield; selecting the current kind again drops it. Returns
    /// whether `kind` ends up selected.
    pub fn select_shield(&mut self, kind: ShieldKind) -> bool {
        if self.selected_shield == Some(kind) {
            self.selected_shield = None;
            self.shield = None;
            return false;
        }
        if !self.inventory.has(kind) {
            return false;
        }
        self.selected_shield = Some(kind);
        self.shield = Some(Shield::new(kind));
        true
    }

    /// Raise the selected shield if it is owned and not already up
    pub fn activate_shield(&mut self) -> bool {
        let Some(kind) = self.selected_shield else {
            return false;
        };
        if !self.inventory.has(kind) {
            return false;
        }
        if self.shield.is_none() {
            self.shield = Some(Shield::new(kind));
        }
        true
    }

    pub fn deactivate_shield(&mut self) -> bool {
        self.shield.take().is_some()
    }

    /// Run incoming damage through the shield, then the hull
    pub fn absorb(&mut self, amount: i32) -> Absorption {
        let mut result = Absorption::default();
        if amount <= 0 || !self.is_alive() {
            return result;
        }
        let mut remaining = amount;
        if let Some(shield) = self.shield.as_mut() {
            let absorbed = remaining.min(shield.capacity);
            shield.capacity -= absorbed;
            remaining -= absorbed;
            result.absorbed = absorbed;
            if shield.capacity <= 0 {
                // Down for the rest of the round; the owned shield stays selected
                result.depleted = Some(shield.kind);
                self.shield = None;
            }
        }
        let before = self.health;
        self.health = (self.health - remaining).max(0);
        result.dealt = before - self.health;
        result.destroyed = before > 0 && self.health == 0;
        result
    }

    /// Advance falling. Starts a fall when the ground has dropped away,
    /// settles small gaps, and reports the landing when a fall completes.
    pub fn update_fall(&mut self, terrain: &Terrain, dt: f32) -> Option<Landing> {
        let rest_y = resting_position(self.pos.x, terrain).y;
        let Some(fall) = self.fall else {
            let gap = rest_y - self.pos.y;
            if gap > MIN_FALL_DISTANCE {
                self.fall = Some(Fall { start_y: self.pos.y });
            } else if gap > 0.0 {
                self.pos.y = rest_y;
            }
            return None;
        };

        self.pos.y += FALL_SPEED * dt;
        if self.pos.y < rest_y {
            return None;
        }
        self.pos.y = rest_y;
        self.fall = None;
        let distance = (rest_y - fall.start_y).max(0.0);
        let damage = ((distance / terrain.height) * FALL_DAMAGE_SCALE) as i32;
        Some(Landing {
            distance,
            damage: damage.clamp(0, MAX_FALL_DAMAGE),
        })
    }
}

/// Tank centre resting on the surface at `x`
pub fn resting_position(x: f32, terrain: &Terrain) -> Vec2 {
    let x = x.clamp(0.0, terrain.width);
    Vec2::new(x, terrain.height_at(x) - TANK_CLEARANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tank() -> Tank {
        let terrain = Terrain::flat(400.0, 300.0, 200.0);
        Tank::new("Test", PlayerKind::Human, 10_000).with_position(100.0, &terrain)
    }

    #[test]
    fn test_inventory_remove_is_size_checked() {
        let mut inv = Inventory::new();
        inv.add(ProjectileKind::Nuke, 2);
        assert!(!inv.remove(ProjectileKind::Nuke, 3));
        assert_eq!(inv.count(ProjectileKind::Nuke), 2);
        assert!(inv.remove(ProjectileKind::Nuke, 2));
        assert_eq!(inv.count(ProjectileKind::Nuke), 0);
        assert!(!inv.remove(ProjectileKind::Nuke, 1));
    }

    #[test]
    fn test_inventory_serializes_as_list() {
        let mut inv = Inventory::new();
        inv.add(ShieldKind::Light, 1);
        inv.add(ProjectileKind::Missile, 5);
        let json = serde_json::to_string(&inv).unwrap();
        let back: Inventory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn test_tank_rests_on_surface() {
        let t = tank();
        assert_eq!(t.pos, Vec2::new(100.0, 200.0 - TANK_CLEARANCE));
    }

    #[test]
    fn test_angle_power_clamped() {
        let mut t = tank();
        t.set_angle(270.0);
        t.set_power(-5.0);
        assert_eq!(t.angle, MAX_ANGLE);
        assert_eq!(t.power, MIN_POWER);
        t.set_angle(f32::NAN);
        assert_eq!(t.angle, MAX_ANGLE);
    }

    #[test]
    fn test_take_round_decrements() {
        let mut t = tank();
        let before = t.inventory.count(ProjectileKind::BabyMissile);
        assert_eq!(t.take_round(), Some(ProjectileKind::BabyMissile));
        assert_eq!(t.inventory.count(ProjectileKind::BabyMissile), before - 1);

        t.selected_projectile = ProjectileKind::Nuke;
        assert_eq!(t.take_round(), None);
    }

    #[test]
    fn test_purchase_requires_funds() {
        let mut t = tank();
        t.money = 5000;
        assert!(!t.purchase_missile(ProjectileKind::Nuke));
        assert_eq!(t.money, 5000);
        assert_eq!(t.inventory.count(ProjectileKind::Nuke), 0);

        assert!(t.purchase_missile(ProjectileKind::Missile));
        assert_eq!(t.money, 3500);
        assert_eq!(t.inventory.count(ProjectileKind::Missile), 5);

        assert!(t.purchase_shield(ShieldKind::Light));
        assert_eq!(t.money, 1500);
        assert!(t.inventory.has(ShieldKind::Light));
    }

    #[test]
    fn test_select_shield_toggles_without_consuming() {
        let mut t = tank();
        assert!(!t.select_shield(ShieldKind::Medium));
        t.inventory.add(ShieldKind::Medium, 1);
        assert!(t.select_shield(ShieldKind::Medium));
        assert_eq!(t.shield.map(|s| s.capacity), Some(100));
        assert_eq!(t.inventory.count(ShieldKind::Medium), 1);
        assert!(!t.select_shield(ShieldKind::Medium));
        assert!(t.shield.is_none());
    }

    #[test]
    fn test_depleted_shield_is_removed() {
        let mut t = tank();
        t.inventory.add(ShieldKind::Light, 1);
        t.select_shield(ShieldKind::Light);
        let hit = t.absorb(80);
        assert_eq!(hit.absorbed, 50);
        assert_eq!(hit.dealt, 30);
        assert_eq!(hit.depleted, Some(ShieldKind::Light));
        assert!(t.shield.is_none());
        assert_eq!(t.health, 70);
        // Still owned and selected
        assert_eq!(t.inventory.count(ShieldKind::Light), 1);
        assert_eq!(t.selected_shield, Some(ShieldKind::Light));
    }

    #[test]
    fn test_depleted_shield_returns_next_round() {
        let terrain = Terrain::flat(400.0, 300.0, 200.0);
        let mut t = tank();
        t.inventory.add(ShieldKind::Light, 1);
        t.select_shield(ShieldKind::Light);
        t.absorb(60);
        assert!(t.shield.is_none());

        let next = t.respawned(100.0, &terrain);
        let shield = next.shield.expect("owned shield should come back up");
        assert_eq!(shield.kind, ShieldKind::Light);
        assert_eq!(shield.capacity, ShieldKind::Light.capacity());
        assert_eq!(next.inventory.count(ShieldKind::Light), 1);
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut t = tank();
        let hit = t.absorb(250);
        assert_eq!(t.health, 0);
        assert_eq!(hit.dealt, 100);
        assert!(hit.destroyed);
        assert!(!t.absorb(10).destroyed);
    }

    #[test]
    fn test_fall_damage_capped() {
        let mut terrain = Terrain::flat(400.0, 300.0, 100.0);
        let mut t = Tank::new("Faller", PlayerKind::Cpu, 0).with_position(200.0, &terrain);
        terrain = Terrain::flat(400.0, 300.0, 300.0);
        assert!(t.update_fall(&terrain, SIM_DT).is_none());
        assert!(t.is_falling());
        let mut landing = None;
        for _ in 0..600 {
            if let Some(l) = t.update_fall(&terrain, SIM_DT) {
                landing = Some(l);
                break;
            }
        }
        let landing = landing.expect("tank should land");
        assert!((landing.distance - 200.0).abs() < 0.001);
        assert_eq!(landing.damage, MAX_FALL_DAMAGE);
        assert!(!t.is_falling());
    }

    #[test]
    fn test_respawn_keeps_loadout() {
        let terrain = Terrain::flat(400.0, 300.0, 200.0);
        let mut t = tank();
        t.health = 0;
        t.elimination_order = 1;
        t.inventory.add(ShieldKind::Heavy, 1);
        t.select_shield(ShieldKind::Heavy);
        t.shield = None;
        let fresh = t.respawned(300.0, &terrain);
        assert_eq!(fresh.health, MAX_HEALTH);
        assert_eq!(fresh.elimination_order, -1);
        assert_eq!(fresh.money, t.money);
        assert_eq!(fresh.shield.map(|s| s.kind), Some(ShieldKind::Heavy));
        assert_eq!(fresh.pos.x, 300.0);
    }

    proptest! {
        #[test]
        fn prop_shield_absorption_exact(capacity in 1i32..200, damage in 1i32..300) {
            let mut t = tank();
            t.shield = Some(Shield { kind: ShieldKind::Heavy, capacity, max_capacity: 200 });
            let before = t.health;
            t.absorb(damage);
            if damage <= capacity {
                prop_assert_eq!(t.health, before);
                prop_assert_eq!(t.shield.map(|s| s.capacity).unwrap_or(0), capacity - damage);
            } else {
                prop_assert!(t.shield.is_none());
                prop_assert_eq!(t.health, (before - (damage - capacity)).max(0));
            }
        }
    }
}
