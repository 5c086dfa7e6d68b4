//! Player commands
//!
//! Every command validates first and mutates only when it succeeds.

use super::player::Tank;
use super::projectile::Projectile;
use super::state::{GameEvent, GamePhase, GameState, Rejection};
use super::weapons::{ItemKind, ProjectileKind, ShieldKind};
use crate::consts::*;
use crate::launch_velocity;

impl GameState {
    fn require_phase(&self, allowed: impl Fn(GamePhase) -> bool) -> Result<(), Rejection> {
        if allowed(self.phase) {
            Ok(())
        } else {
            Err(Rejection::WrongPhase(self.phase))
        }
    }

    /// The living player commands act on, with its index
    fn acting_tank_mut(&mut self) -> Result<(usize, &mut Tank), Rejection> {
        let index = self.acting_index().ok_or(Rejection::WrongPhase(self.phase))?;
        match self.roster.get_mut(index) {
            Some(tank) if tank.is_alive() || self.phase == GamePhase::InventorySelection => {
                Ok((index, tank))
            }
            _ => Err(Rejection::NoActivePlayer),
        }
    }

    /// Write angle and power onto the current player (clamped)
    pub fn aim(&mut self, angle: f32, power: f32) -> Result<(), Rejection> {
        self.require_phase(|p| p.is_turn())?;
        let (_, tank) = self.acting_tank_mut()?;
        tank.set_angle(angle);
        tank.set_power(power);
        Ok(())
    }

    /// Choose what the acting player fires next. Stock is checked on fire.
    pub fn select_projectile(&mut self, kind: ProjectileKind) -> Result<(), Rejection> {
        let (_, tank) = self.acting_tank_mut()?;
        tank.selected_projectile = kind;
        Ok(())
    }

    /// Aim and fire the current player's selected projectile
    pub fn fire_projectile(&mut self, angle: f32, power: f32) -> Result<(), Rejection> {
        self.require_phase(|p| p.is_turn())?;
        let (index, tank) = self.acting_tank_mut()?;
        let kind = tank.selected_projectile;
        if !tank.inventory.has(kind) {
            log::warn!("{} has no {} left", tank.name, kind.as_str());
            return Err(Rejection::NotInInventory(kind));
        }

        tank.set_angle(angle);
        tank.set_power(power);
        tank.take_round();
        let pos = tank.barrel_tip();
        let vel = launch_velocity(tank.angle, tank.power);
        log::debug!(
            "{} fires {} at {:.1} deg, power {:.1}",
            tank.name,
            kind.as_str(),
            tank.angle,
            tank.power
        );

        let id = self.next_entity_id();
        self.flight.clear();
        self.flight.primary = Some(Projectile::launch(id, kind, index, pos, vel));
        self.phase = GamePhase::ProjectileActive;
        self.events.push(GameEvent::Fired {
            player: index,
            kind,
        });
        Ok(())
    }

    /// Pass the turn without firing
    pub fn skip_turn(&mut self) -> Result<(), Rejection> {
        self.require_phase(|p| p.is_turn())?;
        log::debug!("Player {} skips", self.roster.current_index());
        self.finish_shot();
        Ok(())
    }

    /// Buy one bundle of a projectile for the player shopping now
    pub fn purchase_missile(&mut self, kind: ProjectileKind) -> Result<(), Rejection> {
        self.purchase(kind.into())
    }

    /// Buy one shield for the player shopping now
    pub fn purchase_shield(&mut self, kind: ShieldKind) -> Result<(), Rejection> {
        self.purchase(kind.into())
    }

    fn purchase(&mut self, item: ItemKind) -> Result<(), Rejection> {
        self.require_phase(|p| p == GamePhase::InventorySelection)?;
        let (index, tank) = self.acting_tank_mut()?;
        let price = item.price();
        let bought = match item {
            ItemKind::Projectile(kind) => tank.purchase_missile(kind),
            ItemKind::Shield(kind) => tank.purchase_shield(kind),
        };
        if !bought {
            log::warn!(
                "{} cannot afford {} (${} of ${})",
                tank.name,
                item.as_str(),
                tank.money,
                price
            );
            return Err(Rejection::InsufficientFunds {
                price,
                money: tank.money,
            });
        }
        log::debug!("{} bought {}", tank.name, item.as_str());
        self.events.push(GameEvent::Purchased {
            player: index,
            item,
        });
        Ok(())
    }

    /// Toggle the acting player's selected shield. Returns whether `kind`
    /// is now selected.
    pub fn select_shield(&mut self, kind: ShieldKind) -> bool {
        let Ok((index, tank)) = self.acting_tank_mut() else {
            return false;
        };
        let before = tank.shield.map(|s| s.kind);
        let selected = tank.select_shield(kind);
        let shield = tank.shield.map(|s| s.kind);
        if shield != before {
            self.events.push(GameEvent::ShieldChanged {
                player: index,
                shield,
            });
        }
        selected
    }

    /// Raise the selected shield if one is owned
    pub fn activate_shield(&mut self) -> bool {
        let Ok((index, tank)) = self.acting_tank_mut() else {
            return false;
        };
        if !tank.activate_shield() {
            return false;
        }
        let shield = tank.shield.map(|s| s.kind);
        self.events.push(GameEvent::ShieldChanged {
            player: index,
            shield,
        });
        true
    }

    /// Drop the active shield
    pub fn deactivate_shield(&mut self) -> bool {
        let Ok((index, tank)) = self.acting_tank_mut() else {
            return false;
        };
        if !tank.deactivate_shield() {
            return false;
        }
        self.events.push(GameEvent::ShieldChanged {
            player: index,
            shield: None,
        });
        true
    }

    /// Change terrain drama (clamped to 0..=100) and rebuild the field
    pub fn set_terrain_variance(&mut self, level: f32) {
        if !level.is_finite() {
            log::warn!("Ignoring non-finite terrain variance");
            return;
        }
        self.settings.terrain_variance = level.clamp(0.0, 100.0);
        let width = self.settings.field_width;
        self.rebuild_field(width);
    }

    /// Resize the play field (clamped to the minimum) and rebuild it.
    /// Any shot in flight is discarded.
    pub fn update_dimensions(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite()) {
            log::warn!("Ignoring non-finite field size");
            return;
        }
        let width = width.max(MIN_FIELD_WIDTH);
        let height = height.max(MIN_FIELD_HEIGHT);
        let old_width = self.settings.field_width;
        if width == old_width && height == self.settings.field_height {
            return;
        }
        self.settings.field_width = width;
        self.settings.field_height = height;
        self.rebuild_field(old_width);
    }

    /// Leave the statistics screen and open the shop
    pub fn acknowledge_statistics(&mut self) -> Result<(), Rejection> {
        self.require_phase(|p| p == GamePhase::RoundStatistics)?;
        self.shopper = 0;
        self.phase = GamePhase::InventorySelection;
        Ok(())
    }

    /// The current shopper is done. After the last one the next round
    /// starts, or the match ends.
    pub fn finish_shopping(&mut self) -> Result<(), Rejection> {
        self.require_phase(|p| p == GamePhase::InventorySelection)?;
        self.shopper += 1;
        if self.shopper >= self.roster.len() {
            self.complete_inventory_selection();
        }
        Ok(())
    }
}
