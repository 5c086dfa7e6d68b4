//! Tank roster: turn order, eliminations and money flow

use serde::{Deserialize, Serialize};

use super::player::{Absorption, Tank};
use crate::consts::*;

/// What a single damage application did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    pub player: usize,
    pub hit: Absorption,
    /// Elimination index assigned by this hit
    pub eliminated: Option<i32>,
    /// Money credited to the attacker
    pub reward: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Tank>,
    /// Index of the player whose turn it is
    current: usize,
    /// Next elimination index to hand out this round
    next_elimination: i32,
}

impl Roster {
    pub fn new(players: Vec<Tank>) -> Self {
        Self {
            players,
            current: 0,
            next_elimination: 0,
        }
    }

    pub fn players(&self) -> &[Tank] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Tank] {
        &mut self.players
    }

    pub fn get(&self, index: usize) -> Option<&Tank> {
        self.players.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tank> {
        self.players.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Tank> {
        self.players.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Tank> {
        self.players.get_mut(self.current)
    }

    pub fn living_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    pub fn any_falling(&self) -> bool {
        self.players.iter().any(|p| p.is_alive() && p.is_falling())
    }

    /// Replace every tank with a rebuilt value (new round or new field)
    pub fn rebuild(&mut self, mut rebuild: impl FnMut(usize, &Tank) -> Tank) {
        let rebuilt: Vec<Tank> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, tank)| rebuild(i, tank))
            .collect();
        self.players = rebuilt;
    }

    /// Clear elimination tracking and hand the first turn to `first`
    /// (or the next living player after it)
    pub fn reset_round(&mut self, first: usize) {
        self.next_elimination = 0;
        if self.players.is_empty() {
            self.current = 0;
            return;
        }
        self.current = first % self.players.len();
        if !self.players[self.current].is_alive() {
            self.advance_turn();
        }
    }

    /// Move to the next living player, cycling through the roster. Returns
    /// `None` when a full cycle finds nobody alive.
    pub fn advance_turn(&mut self) -> Option<usize> {
        let n = self.players.len();
        for step in 1..=n {
            let candidate = (self.current + step) % n;
            if self.players[candidate].is_alive() {
                self.current = candidate;
                return Some(candidate);
            }
        }
        None
    }

    /// Apply damage to one player. Out-of-range indices and dead players
    /// are ignored. The attacker (if any other player) is paid for the
    /// damage and for a kill.
    pub fn apply_damage(
        &mut self,
        index: usize,
        amount: i32,
        attacker: Option<usize>,
    ) -> Option<DamageReport> {
        if amount <= 0 {
            return None;
        }
        let tank = self.players.get_mut(index)?;
        if !tank.is_alive() {
            return None;
        }
        let hit = tank.absorb(amount);
        let eliminated = if hit.destroyed {
            let order = self.next_elimination;
            self.next_elimination += 1;
            tank.elimination_order = order;
            Some(order)
        } else {
            None
        };

        let mut reward = 0;
        if let Some(attacker) = attacker.filter(|&a| a != index) {
            reward = DAMAGE_REWARD_PER_POINT.saturating_mul(amount as u32);
            if eliminated.is_some() {
                reward = reward.saturating_add(ELIMINATION_BONUS);
            }
            if !self.award(attacker, reward) {
                reward = 0;
            }
        }

        Some(DamageReport {
            player: index,
            hit,
            eliminated,
            reward,
        })
    }

    /// Credit money to a player. False for an unknown index.
    pub fn award(&mut self, index: usize, amount: u32) -> bool {
        match self.players.get_mut(index) {
            Some(tank) => {
                tank.money = tank.money.saturating_add(amount);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::PlayerKind;
    use proptest::prelude::*;

    fn roster(n: usize) -> Roster {
        Roster::new(
            (0..n)
                .map(|i| Tank::new(format!("P{i}"), PlayerKind::Human, 0))
                .collect(),
        )
    }

    #[test]
    fn test_advance_skips_dead() {
        let mut r = roster(4);
        r.players_mut()[1].health = 0;
        r.players_mut()[2].health = 0;
        assert_eq!(r.advance_turn(), Some(3));
        assert_eq!(r.advance_turn(), Some(0));
    }

    #[test]
    fn test_advance_with_nobody_alive() {
        let mut r = roster(3);
        for p in r.players_mut() {
            p.health = 0;
        }
        assert_eq!(r.advance_turn(), None);
    }

    #[test]
    fn test_invalid_index_is_noop() {
        let mut r = roster(2);
        assert!(r.apply_damage(7, 50, Some(0)).is_none());
        assert!(!r.award(9, 100));
    }

    #[test]
    fn test_elimination_order_sequential() {
        let mut r = roster(3);
        let first = r.apply_damage(2, 150, Some(0)).unwrap();
        let second = r.apply_damage(1, 150, Some(0)).unwrap();
        assert_eq!(first.eliminated, Some(0));
        assert_eq!(second.eliminated, Some(1));
        assert_eq!(r.players()[2].elimination_order, 0);
        assert_eq!(r.players()[1].elimination_order, 1);
        assert_eq!(r.players()[0].elimination_order, -1);
        assert_eq!(r.living_count(), 1);
    }

    #[test]
    fn test_rewards_go_to_attacker_not_self() {
        let mut r = roster(2);
        let report = r.apply_damage(1, 40, Some(0)).unwrap();
        assert_eq!(report.reward, 40 * DAMAGE_REWARD_PER_POINT);
        assert_eq!(r.players()[0].money, 40 * DAMAGE_REWARD_PER_POINT);

        let report = r.apply_damage(0, 10, Some(0)).unwrap();
        assert_eq!(report.reward, 0);
        assert_eq!(r.players()[0].money, 40 * DAMAGE_REWARD_PER_POINT);

        let report = r.apply_damage(1, 100, Some(0)).unwrap();
        assert_eq!(report.reward, 100 * DAMAGE_REWARD_PER_POINT + ELIMINATION_BONUS);
    }

    #[test]
    fn test_reset_round_skips_dead_starter() {
        let mut r = roster(3);
        r.players_mut()[1].health = 0;
        r.reset_round(1);
        assert_eq!(r.current_index(), 2);
    }

    proptest! {
        #[test]
        fn prop_turn_never_lands_on_dead(
            alive in prop::collection::vec(any::<bool>(), 2..10),
            start in 0usize..10,
        ) {
            prop_assume!(alive.iter().filter(|&&a| a).count() >= 2);
            let mut r = roster(alive.len());
            for (p, &a) in r.players_mut().iter_mut().zip(&alive) {
                if !a {
                    p.health = 0;
                }
            }
            r.reset_round(start);
            for _ in 0..alive.len() * 2 {
                let next = r.advance_turn();
                prop_assert!(next.is_some());
                prop_assert!(r.current().map(|p| p.is_alive()).unwrap_or(false));
            }
        }
    }
}
