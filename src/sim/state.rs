//! Match state and round lifecycle
//!
//! `GameState` owns everything a match needs. Commands live in `actions`,
//! the per-frame advance in `tick`, and the read model in `snapshot`.

use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::blast::Explosion;
use super::player::Tank;
use super::projectile::{Flight, Projectile};
use super::roster::Roster;
use super::terrain::Terrain;
use super::weapons::{ItemKind, ProjectileKind, ShieldKind};
use super::weather::Weather;
use crate::consts::*;
use crate::settings::Settings;
use crate::standings::RoundStandings;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// A human player may aim and fire
    WaitingForInput,
    /// A CPU player's turn; the controller writes aim then fires
    AimingAutomatically,
    /// Shells in the air or tanks still falling
    ProjectileActive,
    /// Round over, standings on display
    RoundStatistics,
    /// Players shop one after another
    InventorySelection,
    /// Final round finished
    MatchOver,
}

impl GamePhase {
    /// Phases in which the current player may aim and fire
    pub fn is_turn(&self) -> bool {
        matches!(self, GamePhase::WaitingForInput | GamePhase::AimingAutomatically)
    }
}

/// Change notifications, drained by the consumer each frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    TerrainRegenerated { width: f32, height: f32, variance: f32 },
    TurnChanged { player: usize },
    Fired { player: usize, kind: ProjectileKind },
    /// A non-damaging shell came to rest
    Landed { projectile: u32 },
    Split { projectile: u32, warheads: u32 },
    Bounced { projectile: u32, bounce: u32 },
    Scattered { projectile: u32, bomblets: u32 },
    Exploded { pos: Vec2, radius: f32 },
    /// `amount` reached health, `absorbed` went into the shield
    Damaged { player: usize, amount: i32, absorbed: i32 },
    Fell { player: usize, distance: f32, damage: i32 },
    Eliminated { player: usize, order: i32 },
    ShieldChanged { player: usize, shield: Option<ShieldKind> },
    Purchased { player: usize, item: ItemKind },
    RoundOver { round: u32, winner: Option<usize> },
    MatchOver { champion: Option<usize> },
}

/// Why a command was refused. Refused commands change nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    WrongPhase(GamePhase),
    NoActivePlayer,
    NotInInventory(ProjectileKind),
    InsufficientFunds { price: u32, money: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongPhase(phase) => write!(f, "not allowed during {phase:?}"),
            Rejection::NoActivePlayer => write!(f, "no player can act"),
            Rejection::NotInInventory(kind) => write!(f, "no {} left", kind.as_str()),
            Rejection::InsufficientFunds { price, money } => {
                write!(f, "costs ${price}, only ${money} available")
            }
        }
    }
}

impl std::error::Error for Rejection {}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) settings: Settings,
    pub(crate) rng: Pcg32,
    pub(crate) phase: GamePhase,
    /// 1-based
    pub(crate) round: u32,
    pub(crate) terrain: Terrain,
    pub(crate) roster: Roster,
    pub(crate) flight: Flight,
    pub(crate) explosions: Vec<Explosion>,
    pub(crate) weather: Weather,
    pub(crate) standings: Option<RoundStandings>,
    pub(crate) round_wins: Vec<u32>,
    /// Roster index of the player shopping during `InventorySelection`
    pub(crate) shopper: usize,
    pub(crate) time_ticks: u64,
    pub(crate) events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Set up a match and start its first round
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        let rng = Pcg32::seed_from_u64(settings.seed);
        let tanks = settings
            .players
            .iter()
            .map(|setup| Tank::new(setup.name.clone(), setup.kind, settings.starting_money))
            .collect::<Vec<_>>();
        let player_count = tanks.len();

        log::info!(
            "New match: {} players, {} rounds, seed {:#x}",
            player_count,
            settings.rounds,
            settings.seed
        );

        let mut state = Self {
            terrain: Terrain::flat(
                settings.field_width,
                settings.field_height,
                settings.field_height * TERRAIN_BASELINE,
            ),
            weather: Weather::new(settings.max_wind, settings.wind_drift),
            settings,
            rng,
            phase: GamePhase::WaitingForInput,
            round: 1,
            roster: Roster::new(tanks),
            flight: Flight::default(),
            explosions: Vec::new(),
            standings: None,
            round_wins: vec![0; player_count],
            shopper: 0,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
        };
        state.start_round();
        state
    }

    // === Read access ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_rounds(&self) -> u32 {
        self.settings.rounds
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn players(&self) -> &[Tank] {
        self.roster.players()
    }

    /// Index of the player whose turn it is (meaningful in turn phases)
    pub fn current_player_index(&self) -> usize {
        self.roster.current_index()
    }

    pub fn current_player(&self) -> Option<&Tank> {
        self.roster.current()
    }

    /// Player that commands currently act on, if any
    pub fn acting_index(&self) -> Option<usize> {
        match self.phase {
            GamePhase::InventorySelection => Some(self.shopper),
            GamePhase::WaitingForInput | GamePhase::AimingAutomatically => {
                Some(self.roster.current_index())
            }
            _ => None,
        }
    }

    /// Player shopping right now
    pub fn shopper(&self) -> Option<usize> {
        (self.phase == GamePhase::InventorySelection).then_some(self.shopper)
    }

    pub fn projectile(&self) -> Option<&Projectile> {
        self.flight.primary.as_ref()
    }

    pub fn batch(&self) -> &[Projectile] {
        &self.flight.batch
    }

    pub fn is_in_flight(&self) -> bool {
        self.flight.is_active()
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn wind(&self) -> f32 {
        self.weather.wind
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    /// Standings of the round just finished
    pub fn standings(&self) -> Option<&RoundStandings> {
        self.standings.as_ref()
    }

    pub fn round_wins(&self) -> &[u32] {
        &self.round_wins
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Events queued since the last drain, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Match winner: most round wins, ties broken by money
    pub fn champion(&self) -> Option<usize> {
        self.round_wins
            .iter()
            .enumerate()
            .filter(|&(_, &wins)| wins > 0)
            .max_by(|&(a, wa), &(b, wb)| {
                let money = |i: usize| self.roster.get(i).map(|t| t.money).unwrap_or(0);
                wa.cmp(wb)
                    .then(money(a).cmp(&money(b)))
                    .then(b.cmp(&a))
            })
            .map(|(i, _)| i)
    }

    // === Lifecycle ===

    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Phase for the current player's turn
    pub(crate) fn input_phase(&self) -> GamePhase {
        if self.roster.current().map(|t| t.is_cpu()).unwrap_or(false) {
            GamePhase::AimingAutomatically
        } else {
            GamePhase::WaitingForInput
        }
    }

    fn begin_turn(&mut self) {
        self.phase = self.input_phase();
        let player = self.roster.current_index();
        log::debug!("Turn: player {player} ({:?})", self.phase);
        self.events.push(GameEvent::TurnChanged { player });
    }

    /// Regenerate the field, respawn every tank and hand out the opening turn
    pub(crate) fn start_round(&mut self) {
        let (width, height) = (self.settings.field_width, self.settings.field_height);
        let variance = self.settings.terrain_variance;
        self.terrain = Terrain::generate(width, height, variance, &mut self.rng);

        let columns = spawn_columns(width, self.roster.len(), &mut self.rng);
        for &x in &columns {
            self.terrain.flatten(x, TANK_PAD_HALF_WIDTH);
        }
        let terrain = &self.terrain;
        self.roster.rebuild(|i, tank| tank.respawned(columns[i], terrain));

        // Opening turn rotates with the round number
        let first = self.round.saturating_sub(1) as usize;
        self.roster.reset_round(first);

        self.flight.clear();
        self.explosions.clear();
        self.standings = None;
        self.shopper = 0;
        self.weather.reroll(&mut self.rng);

        log::info!(
            "Round {}/{} started, wind {:.1}",
            self.round,
            self.settings.rounds,
            self.weather.wind
        );
        self.events.push(GameEvent::RoundStarted { round: self.round });
        self.events.push(GameEvent::TerrainRegenerated {
            width,
            height,
            variance,
        });
        for (player, tank) in self.roster.players().iter().enumerate() {
            if let Some(shield) = tank.shield {
                self.events.push(GameEvent::ShieldChanged {
                    player,
                    shield: Some(shield.kind),
                });
            }
        }
        self.begin_turn();
    }

    /// Rebuild the field after a size or variance change. Tanks keep their
    /// relative positions and everything else they carry. A shot in flight
    /// is discarded and the turn resolves as if it had landed.
    pub(crate) fn rebuild_field(&mut self, old_width: f32) {
        let (width, height) = (self.settings.field_width, self.settings.field_height);
        let variance = self.settings.terrain_variance;
        self.terrain = Terrain::generate(width, height, variance, &mut self.rng);

        let scale = if old_width > 0.0 { width / old_width } else { 1.0 };
        let columns: Vec<f32> = self
            .roster
            .players()
            .iter()
            .map(|t| (t.pos.x * scale).clamp(0.0, width))
            .collect();
        for (x, tank) in columns.iter().zip(self.roster.players()) {
            if tank.is_alive() {
                self.terrain.flatten(*x, TANK_PAD_HALF_WIDTH);
            }
        }
        let terrain = &self.terrain;
        self.roster.rebuild(|i, tank| tank.relocated(columns[i], terrain));

        let interrupted = self.phase == GamePhase::ProjectileActive;
        self.flight.clear();
        self.explosions.clear();

        log::info!("Field rebuilt at {width:.0}x{height:.0}, variance {variance:.0}");
        self.events.push(GameEvent::TerrainRegenerated {
            width,
            height,
            variance,
        });

        if interrupted {
            self.finish_shot();
        }
    }

    /// Everything from the last shot has settled: end the round or pass the turn
    pub(crate) fn finish_shot(&mut self) {
        self.flight.clear();
        if self.roster.living_count() <= 1 {
            self.end_round();
            return;
        }
        match self.roster.advance_turn() {
            Some(_) => {
                self.weather.drift(&mut self.rng);
                self.begin_turn();
            }
            None => self.end_round(),
        }
    }

    fn end_round(&mut self) {
        let standings = RoundStandings::from_players(self.round, self.roster.players());
        for entry in &standings.entries {
            self.roster.award(entry.player, entry.payout);
        }
        let winner = standings.winner();
        if let Some(wins) = winner.and_then(|w| self.round_wins.get_mut(w)) {
            *wins += 1;
        }

        match winner.and_then(|w| self.roster.get(w)) {
            Some(tank) => log::info!("Round {} won by {}", self.round, tank.name),
            None => log::info!("Round {} ended with no survivors", self.round),
        }

        self.flight.clear();
        self.standings = Some(standings);
        self.phase = GamePhase::RoundStatistics;
        self.events.push(GameEvent::RoundOver {
            round: self.round,
            winner,
        });
    }

    /// Every player has shopped: next round, or the match is over
    pub(crate) fn complete_inventory_selection(&mut self) {
        if self.round >= self.settings.rounds {
            let champion = self.champion();
            self.phase = GamePhase::MatchOver;
            match champion.and_then(|c| self.roster.get(c)) {
                Some(tank) => log::info!("Match over, champion {}", tank.name),
                None => log::info!("Match over without a champion"),
            }
            self.events.push(GameEvent::MatchOver { champion });
        } else {
            self.round += 1;
            self.start_round();
        }
    }
}

/// Spawn columns spread across the field with a little jitter, one per slot
pub(crate) fn spawn_columns<R: Rng + ?Sized>(width: f32, count: usize, rng: &mut R) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    let margin = width * SPAWN_MARGIN;
    let slot = (width - 2.0 * margin) / count as f32;
    (0..count)
        .map(|i| {
            let jitter = rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER) * slot;
            (margin + slot * (i as f32 + 0.5) + jitter).clamp(margin, width - margin)
        })
        .collect()
}
