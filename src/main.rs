//! Artillery Duel headless demo
//!
//! Runs a whole match at 60 Hz with every player aiming at random, logging
//! as it goes. Pass a JSON settings file as the first argument to override
//! the defaults; `RUST_LOG=debug` shows every shot.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use artillery_duel::consts::*;
use artillery_duel::sim::{GameEvent, GamePhase, GameState, ItemKind, ProjectileKind, ShieldKind};
use artillery_duel::Settings;

/// Give up on a match that has not finished after this many frames
const MAX_FRAMES: u64 = 60 * 60 * 60;

fn load_settings() -> Settings {
    let Some(path) = std::env::args().nth(1) else {
        let mut settings = Settings::default();
        // Nobody at the keyboard
        for player in &mut settings.players {
            player.kind = artillery_duel::sim::PlayerKind::Cpu;
        }
        return settings;
    };
    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| Settings::from_json(&json).map_err(|e| e.to_string()))
    {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Could not load settings from {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Random aim for whoever holds the turn
fn take_turn(state: &mut GameState, rng: &mut Pcg32) {
    let Some(tank) = state.current_player() else {
        return;
    };
    let facing_right = tank.pos.x < state.terrain().width / 2.0;
    // Fire the biggest thing in stock
    let kind = ProjectileKind::ALL
        .iter()
        .rev()
        .copied()
        .filter(|&k| k != ProjectileKind::Tracer)
        .find(|&k| tank.inventory.has(k));
    let Some(kind) = kind else {
        if let Err(e) = state.skip_turn() {
            log::warn!("Skip refused: {e}");
        }
        return;
    };

    let angle = if facing_right {
        rng.random_range(30.0..80.0)
    } else {
        rng.random_range(100.0..150.0)
    };
    let power = rng.random_range(35.0..MAX_POWER);

    if let Err(e) = state.select_projectile(kind) {
        log::warn!("Could not select {}: {e}", kind.as_str());
    }
    if let Err(e) = state.fire_projectile(angle, power) {
        log::warn!("Shot refused: {e}");
        if let Err(e) = state.skip_turn() {
            log::warn!("Skip refused: {e}");
        }
    }
}

/// Spend some of the shopper's money, then move on
fn go_shopping(state: &mut GameState, rng: &mut Pcg32) {
    let Some(index) = state.shopper() else {
        return;
    };
    let money = state.players()[index].money;
    let wishlist = [
        ItemKind::Shield(ShieldKind::Light),
        ItemKind::Projectile(ProjectileKind::Missile),
        ItemKind::Projectile(ProjectileKind::Mirv),
        ItemKind::Projectile(ProjectileKind::BabyNuke),
    ];
    let item = wishlist[rng.random_range(0..wishlist.len())];
    if money >= item.price() {
        let bought = match item {
            ItemKind::Projectile(kind) => state.purchase_missile(kind),
            ItemKind::Shield(kind) => state.purchase_shield(kind),
        };
        if bought.is_ok() {
            if let ItemKind::Shield(kind) = item {
                state.select_shield(kind);
            }
        }
    }
    if let Err(e) = state.finish_shopping() {
        log::warn!("Could not leave the shop: {e}");
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let settings = load_settings();
    let mut rng = Pcg32::seed_from_u64(settings.seed ^ 0xa11);
    let mut state = GameState::new(settings);
    log::info!("Artillery Duel demo starting...");

    let mut frame = 0u64;
    while state.phase() != GamePhase::MatchOver && frame < MAX_FRAMES {
        match state.phase() {
            GamePhase::WaitingForInput | GamePhase::AimingAutomatically => {
                take_turn(&mut state, &mut rng)
            }
            GamePhase::RoundStatistics => {
                if let Some(standings) = state.standings() {
                    for entry in &standings.entries {
                        log::info!(
                            "  #{} {} (+${})",
                            entry.rank + 1,
                            entry.name,
                            entry.payout
                        );
                    }
                }
                if let Err(e) = state.acknowledge_statistics() {
                    log::warn!("Statistics not acknowledged: {e}");
                }
            }
            GamePhase::InventorySelection => go_shopping(&mut state, &mut rng),
            GamePhase::ProjectileActive | GamePhase::MatchOver => {}
        }

        state.update(SIM_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::Eliminated { player, order } => {
                    log::info!("{} destroyed (#{})", state.players()[player].name, order + 1)
                }
                GameEvent::MatchOver { champion } => {
                    let name = champion.map(|c| state.players()[c].name.as_str());
                    log::info!("Champion: {}", name.unwrap_or("nobody"));
                }
                other => log::trace!("{other:?}"),
            }
        }
        frame += 1;
    }

    if state.phase() != GamePhase::MatchOver {
        log::warn!("Match still running after {frame} frames, stopping");
    }
    for (tank, wins) in state.players().iter().zip(state.round_wins()) {
        log::info!("{}: {} round wins, ${}", tank.name, wins, tank.money);
    }
}
