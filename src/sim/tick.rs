//! Frame update
//!
//! One `update(dt)` per host frame advances shells, explosions, falling
//! tanks and wind in that order, then resolves the turn once everything
//! has settled.

use glam::Vec2;

use super::blast::{detonate, push_damage_events};
use super::projectile::{FlightContext, Resolution};
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

impl GameState {
    /// Advance the match by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        update(self, dt);
    }
}

/// Advance the match by `dt` seconds. Long frames are split into
/// sub-steps of at most `MAX_STEP` so fast shells cannot tunnel.
pub fn update(state: &mut GameState, dt: f32) {
    if !(dt.is_finite() && dt > 0.0) {
        return;
    }
    state.time_ticks += 1;

    if state.phase == GamePhase::ProjectileActive {
        let substeps = (dt / MAX_STEP).ceil().max(1.0) as u32;
        let step = dt / substeps as f32;
        for _ in 0..substeps {
            if !state.flight.is_active() {
                break;
            }
            step_flight(state, step);
        }
    }

    update_explosions(state, dt);
    if state.phase != GamePhase::MatchOver {
        update_falls(state, dt);
    }

    // Wind holds still while a shell is up
    if state.phase != GamePhase::ProjectileActive {
        state.weather.update(dt);
    }

    match state.phase {
        GamePhase::WaitingForInput => {
            if state.input_phase() == GamePhase::AimingAutomatically {
                state.phase = GamePhase::AimingAutomatically;
            }
        }
        GamePhase::ProjectileActive => {
            if !state.flight.is_active() && !state.roster.any_falling() {
                state.finish_shot();
            }
        }
        _ => {}
    }
}

/// Move every shell one step and apply what they hit
fn step_flight(state: &mut GameState, dt: f32) {
    let targets: Vec<(usize, Vec2)> = state
        .roster
        .players()
        .iter()
        .enumerate()
        .filter(|(_, tank)| tank.is_alive())
        .map(|(i, tank)| (i, tank.pos))
        .collect();
    let ctx = FlightContext {
        terrain: &state.terrain,
        targets: &targets,
        wind: state.weather.wind,
        gravity: state.settings.gravity,
    };

    let mut blasts = Vec::new();
    let mut spawned = Vec::new();
    let mut absorb = |resolution: Resolution, events: &mut Vec<GameEvent>| {
        blasts.extend(resolution.blasts);
        spawned.extend(resolution.spawned);
        events.extend(resolution.events);
        resolution.finished
    };

    if let Some(shell) = state.flight.primary.as_mut() {
        let outcome = shell.step(&ctx, dt);
        let resolution = shell.resolve(outcome, &ctx, &mut state.rng);
        if absorb(resolution, &mut state.events) {
            state.flight.primary = None;
        }
    }

    let rng = &mut state.rng;
    let events = &mut state.events;
    state.flight.batch.retain_mut(|shell| {
        let outcome = shell.step(&ctx, dt);
        let resolution = shell.resolve(outcome, &ctx, &mut *rng);
        !absorb(resolution, &mut *events)
    });

    for mut shell in spawned {
        shell.id = state.next_entity_id();
        state.flight.batch.push(shell);
    }

    for request in &blasts {
        let explosion = detonate(
            &mut state.terrain,
            &mut state.roster,
            request,
            &mut state.events,
        );
        state.explosions.push(explosion);
    }
}

fn update_explosions(state: &mut GameState, dt: f32) {
    for explosion in &mut state.explosions {
        explosion.update(dt);
    }
    state.explosions.retain(|e| !e.is_finished());
}

/// Drop tanks whose ground was blasted away and charge them on landing
fn update_falls(state: &mut GameState, dt: f32) {
    let terrain = &state.terrain;
    let landings: Vec<_> = state
        .roster
        .players_mut()
        .iter_mut()
        .enumerate()
        .filter(|(_, tank)| tank.is_alive())
        .filter_map(|(i, tank)| tank.update_fall(terrain, dt).map(|landing| (i, landing)))
        .collect();

    for (player, landing) in landings {
        log::debug!(
            "Player {} fell {:.0} for {} damage",
            player,
            landing.distance,
            landing.damage
        );
        state.events.push(GameEvent::Fell {
            player,
            distance: landing.distance,
            damage: landing.damage,
        });
        if let Some(report) = state.roster.apply_damage(player, landing.damage, None) {
            push_damage_events(&mut state.events, &report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PlayerSetup, Settings};
    use crate::sim::weapons::ProjectileKind;
    use crate::sim::PlayerKind;

    fn calm_duel() -> GameState {
        GameState::new(Settings {
            players: vec![
                PlayerSetup::new("A", PlayerKind::Human),
                PlayerSetup::new("B", PlayerKind::Human),
            ],
            max_wind: 0.0,
            terrain_variance: 0.0,
            rounds: 1,
            ..Default::default()
        })
    }

    fn settle(state: &mut GameState) {
        for _ in 0..60 * 30 {
            if state.phase() != GamePhase::ProjectileActive {
                break;
            }
            state.update(SIM_DT);
        }
    }

    #[test]
    fn test_shot_resolves_and_passes_turn() {
        let mut state = calm_duel();
        state.fire_projectile(60.0, 60.0).unwrap();
        settle(&mut state);
        assert_eq!(state.phase(), GamePhase::WaitingForInput);
        assert_eq!(state.current_player_index(), 1);
        assert!(!state.is_in_flight());
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Exploded { .. })));
        assert!(events.contains(&GameEvent::TurnChanged { player: 1 }));
    }

    #[test]
    fn test_dropped_shell_craters_beside_tank() {
        let mut state = calm_duel();
        let x = state.players()[0].pos.x;
        let ground = state.terrain().height_at(x + 30.0);
        state.fire_projectile(0.0, 0.0).unwrap();
        settle(&mut state);
        assert!(state.terrain().height_at(x + 20.0) >= ground);
    }

    #[test]
    fn test_split_shell_fills_batch() {
        let mut state = calm_duel();
        let tank = &mut state.roster.players_mut()[0];
        tank.inventory.add(ProjectileKind::Mirv, 1);
        tank.selected_projectile = ProjectileKind::Mirv;
        state.fire_projectile(90.0, 60.0).unwrap();

        let mut saw_batch = false;
        for _ in 0..60 * 30 {
            state.update(SIM_DT);
            if state.batch().len() == 5 {
                saw_batch = true;
                assert!(state.projectile().is_none());
                let mut ids: Vec<u32> = state.batch().iter().map(|p| p.id).collect();
                ids.dedup();
                assert_eq!(ids.len(), 5);
            }
            if state.phase() != GamePhase::ProjectileActive {
                break;
            }
        }
        assert!(saw_batch);
        assert!(!state.is_in_flight());
    }

    #[test]
    fn test_explosions_fade() {
        let mut state = calm_duel();
        state.fire_projectile(45.0, 40.0).unwrap();
        settle(&mut state);
        for _ in 0..60 {
            state.update(SIM_DT);
        }
        assert!(state.explosions().is_empty());
    }

    #[test]
    fn test_fall_damage_on_cratered_ground() {
        let mut state = calm_duel();
        let pos = state.players()[1].pos;
        state.terrain.deform(Vec2::new(pos.x, pos.y + TANK_CLEARANCE), 60.0);
        state.phase = GamePhase::ProjectileActive;
        settle(&mut state);

        let tank = &state.players()[1];
        assert!(tank.health < MAX_HEALTH);
        assert!(!tank.is_falling());
        let events = state.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Fell { player: 1, .. })));
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut state = calm_duel();
        state.update(f32::NAN);
        state.update(-1.0);
        assert_eq!(state.time_ticks(), 0);
    }
}
