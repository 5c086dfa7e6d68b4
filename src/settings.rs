//! Match configuration
//!
//! Loaded from JSON (every field optional) or built from a preset.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::PlayerKind;

/// Named starting configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// Human against CPU on rolling hills
    #[default]
    Duel,
    /// Four CPUs on rough ground
    FreeForAll,
    /// Two humans, no hills, no wind
    Flatland,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Duel => "Duel",
            Preset::FreeForAll => "Free For All",
            Preset::Flatland => "Flatland",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "duel" => Some(Preset::Duel),
            "freeforall" | "free-for-all" | "ffa" => Some(Preset::FreeForAll),
            "flatland" | "flat" => Some(Preset::Flatland),
            _ => None,
        }
    }
}

/// One roster slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    pub kind: PlayerKind,
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, kind: PlayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,
    /// 0 = flat, 100 = most dramatic
    pub terrain_variance: f32,

    // === Match ===
    pub rounds: u32,
    pub players: Vec<PlayerSetup>,
    pub starting_money: u32,

    // === Physics ===
    pub gravity: f32,
    pub max_wind: f32,
    /// Wind drifts a little between turns
    pub wind_drift: bool,

    /// Seed for every random decision in the match
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            terrain_variance: 50.0,

            rounds: DEFAULT_ROUNDS,
            players: vec![
                PlayerSetup::new("Player", PlayerKind::Human),
                PlayerSetup::new("CPU", PlayerKind::Cpu),
            ],
            starting_money: STARTING_MONEY,

            gravity: GRAVITY,
            max_wind: MAX_WIND,
            wind_drift: true,

            seed: 0x5eed,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: Preset) -> Self {
        let mut settings = Self::default();
        match preset {
            Preset::Duel => {}
            Preset::FreeForAll => {
                settings.terrain_variance = 75.0;
                settings.players = (1..=4)
                    .map(|i| PlayerSetup::new(format!("CPU {i}"), PlayerKind::Cpu))
                    .collect();
            }
            Preset::Flatland => {
                settings.terrain_variance = 0.0;
                settings.max_wind = 0.0;
                settings.players = vec![
                    PlayerSetup::new("Player 1", PlayerKind::Human),
                    PlayerSetup::new("Player 2", PlayerKind::Human),
                ];
            }
        }
        settings
    }

    /// Parse settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp every value into its playable range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.field_width.is_finite() {
            self.field_width = defaults.field_width;
        }
        if !self.field_height.is_finite() {
            self.field_height = defaults.field_height;
        }
        self.field_width = self.field_width.max(MIN_FIELD_WIDTH);
        self.field_height = self.field_height.max(MIN_FIELD_HEIGHT);
        self.terrain_variance = if self.terrain_variance.is_finite() {
            self.terrain_variance.clamp(0.0, 100.0)
        } else {
            defaults.terrain_variance
        };
        self.rounds = self.rounds.max(1);
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            self.gravity = defaults.gravity;
        }
        if !(self.max_wind.is_finite() && self.max_wind >= 0.0) {
            self.max_wind = 0.0;
        }

        self.players.truncate(MAX_PLAYERS);
        while self.players.len() < 2 {
            let n = self.players.len() + 1;
            self.players.push(PlayerSetup::new(format!("CPU {n}"), PlayerKind::Cpu));
        }
        self
    }
}
