//! Round-end standings
//!
//! Ranks every tank by finishing position and works out the payouts.

use serde::{Deserialize, Serialize};

use crate::consts::ROUND_PAYOUT_UNIT;
use crate::sim::Tank;

/// One tank's result for a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    /// Roster index
    pub player: usize,
    pub name: String,
    /// Finishing position, 0 = best
    pub rank: usize,
    pub survived: bool,
    pub elimination_order: i32,
    pub payout: u32,
}

/// Finishing order for one round, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoundStandings {
    pub round: u32,
    pub entries: Vec<StandingEntry>,
}

impl RoundStandings {
    /// Rank survivors first, then the destroyed in reverse elimination order
    pub fn from_players(round: u32, players: &[Tank]) -> Self {
        let mut order: Vec<usize> = (0..players.len()).collect();
        order.sort_by(|&a, &b| {
            let (pa, pb) = (&players[a], &players[b]);
            pb.is_alive()
                .cmp(&pa.is_alive())
                .then(pb.elimination_order.cmp(&pa.elimination_order))
                .then(pb.health.cmp(&pa.health))
                .then(a.cmp(&b))
        });

        let size = players.len();
        let entries = order
            .into_iter()
            .enumerate()
            .map(|(rank, i)| StandingEntry {
                player: i,
                name: players[i].name.clone(),
                rank,
                survived: players[i].is_alive(),
                elimination_order: players[i].elimination_order,
                payout: Self::payout_for(rank, size),
            })
            .collect();

        Self { round, entries }
    }

    /// `(size - rank) * ROUND_PAYOUT_UNIT`
    pub fn payout_for(rank: usize, size: usize) -> u32 {
        (size.saturating_sub(rank) as u32).saturating_mul(ROUND_PAYOUT_UNIT)
    }

    /// Roster index of the round winner, if anyone survived
    pub fn winner(&self) -> Option<usize> {
        self.entries
            .first()
            .filter(|e| e.survived)
            .map(|e| e.player)
    }

    /// Finishing position of a player (0 = best)
    pub fn rank_of(&self, player: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.player == player)
            .map(|e| e.rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
