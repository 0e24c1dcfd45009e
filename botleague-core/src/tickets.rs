//! Ticket ledger - the fairness economy governing selection weight
//!
//! Every bot holds a floating-point ticket balance. Balances act as relative
//! weights in the selection lottery: a bot that keeps being passed over
//! compounds its balance until it is eventually drawn, while playing resets
//! the balance to 1.0. A per-session game counter boosts the growth rate of
//! bots lagging behind on games played.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LeagueError, Result};
use crate::BotId;

/// Tunables of the ticket economy. Validated on construction; the ledger
/// itself assumes the values are in range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketConfig {
    /// Balance granted to a bot on first reference. Must be >= 1.0.
    pub new_bot_ticket_count: f64,
    /// Base multiplier applied to every non-chosen bot. Must be >= 1.0.
    /// Lower values prioritize an even number of games played; higher values
    /// add randomness and favor bots that have not played recently.
    pub ticket_increase_rate: f64,
    /// Extra multiplier per game of session deficit. Must be >= 0.0.
    pub game_catchup_boost: f64,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            new_bot_ticket_count: 4.0,
            ticket_increase_rate: 1.2,
            game_catchup_boost: 1.0,
        }
    }
}

impl TicketConfig {
    pub fn new(
        new_bot_ticket_count: f64,
        ticket_increase_rate: f64,
        game_catchup_boost: f64,
    ) -> Result<Self> {
        let config = Self {
            new_bot_ticket_count,
            ticket_increase_rate,
            game_catchup_boost,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.new_bot_ticket_count.is_finite() || self.new_bot_ticket_count < 1.0 {
            return Err(LeagueError::InvalidConfig(format!(
                "new_bot_ticket_count must be >= 1.0, got {}",
                self.new_bot_ticket_count
            )));
        }
        if !self.ticket_increase_rate.is_finite() || self.ticket_increase_rate < 1.0 {
            return Err(LeagueError::InvalidConfig(format!(
                "ticket_increase_rate must be >= 1.0, got {}",
                self.ticket_increase_rate
            )));
        }
        if !self.game_catchup_boost.is_finite() || self.game_catchup_boost < 0.0 {
            return Err(LeagueError::InvalidConfig(format!(
                "game_catchup_boost must be >= 0.0, got {}",
                self.game_catchup_boost
            )));
        }
        Ok(())
    }
}

/// Serializable snapshot state of a [`TicketLedger`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketLedgerState {
    pub tickets: BTreeMap<BotId, f64>,
    pub session_games: BTreeMap<BotId, u32>,
}

/// Ticket balances and session game counts per bot.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketLedger {
    config: TicketConfig,
    tickets: BTreeMap<BotId, f64>,
    session_games: BTreeMap<BotId, u32>,
}

impl TicketLedger {
    pub fn new(config: TicketConfig) -> Self {
        Self {
            config,
            tickets: BTreeMap::new(),
            session_games: BTreeMap::new(),
        }
    }

    /// Rebuild a ledger from a persisted snapshot state.
    pub fn from_state(config: TicketConfig, state: TicketLedgerState) -> Self {
        Self {
            config,
            tickets: state.tickets,
            session_games: state.session_games,
        }
    }

    /// Snapshot state for persistence.
    pub fn state(&self) -> TicketLedgerState {
        TicketLedgerState {
            tickets: self.tickets.clone(),
            session_games: self.session_games.clone(),
        }
    }

    pub fn config(&self) -> &TicketConfig {
        &self.config
    }

    /// Ensures every bot in the set has a balance and a session counter.
    /// New bots start with `new_bot_ticket_count` tickets. Idempotent.
    pub fn ensure<'a>(&mut self, bots: impl IntoIterator<Item = &'a BotId>) {
        for bot in bots {
            self.tickets
                .entry(bot.clone())
                .or_insert(self.config.new_bot_ticket_count);
            self.session_games.entry(bot.clone()).or_insert(0);
        }
    }

    /// Balance of the given bot, or `None` if it has never been referenced.
    pub fn get(&self, bot: &BotId) -> Option<f64> {
        self.tickets.get(bot).copied()
    }

    /// Balance of the given bot, materializing the default first.
    pub fn get_ensured(&mut self, bot: &BotId) -> f64 {
        *self
            .tickets
            .entry(bot.clone())
            .or_insert(self.config.new_bot_ticket_count)
    }

    pub fn set(&mut self, bot: &BotId, tickets: f64) {
        self.tickets.insert(bot.clone(), tickets);
    }

    /// Sum of all balances. Diagnostic only.
    pub fn total(&self) -> f64 {
        self.tickets.values().sum()
    }

    /// Games played by the given bot in the current session.
    pub fn session_games(&self, bot: &BotId) -> u32 {
        self.session_games.get(bot).copied().unwrap_or(0)
    }

    /// Zero all session counters. The session boundary is driven by the
    /// external summary component.
    pub fn reset_session(&mut self) {
        for count in self.session_games.values_mut() {
            *count = 0;
        }
    }

    /// Draws `k` distinct bots from the pool, probability proportional to
    /// each bot's balance normalized over the pool.
    pub fn pick_weighted<R: Rng>(
        &mut self,
        bots: &[BotId],
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<BotId>> {
        if bots.len() < k {
            return Err(LeagueError::PoolTooSmall {
                pool: bots.len(),
                requested: k,
            });
        }
        self.ensure(bots);

        let mut remaining: Vec<&BotId> = bots.iter().collect();
        let mut weights: Vec<f64> = remaining.iter().map(|bot| self.tickets[*bot]).collect();
        let mut picked = Vec::with_capacity(k);
        for _ in 0..k {
            let dist =
                WeightedIndex::new(&weights).map_err(|_| LeagueError::ZeroSelectionWeight)?;
            let index = dist.sample(rng);
            picked.push(remaining.swap_remove(index).clone());
            weights.swap_remove(index);
        }
        Ok(picked)
    }

    /// Post-selection settlement.
    ///
    /// Chosen bots reset to 1.0 tickets and gain a session game. Everyone
    /// else multiplies their balance by `rate + deficit * boost`, where the
    /// deficit is measured against the maximum session count across
    /// `all_bots` taken before any counter is incremented. Bots lagging on
    /// games therefore accrue tickets strictly faster.
    pub fn choose(&mut self, chosen: &[BotId], all_bots: &[BotId]) {
        self.ensure(all_bots);

        // Deficits are relative to the pre-update session counts
        let max_games = all_bots
            .iter()
            .map(|bot| self.session_games(bot))
            .max()
            .unwrap_or(0);

        for bot in all_bots {
            if chosen.contains(bot) {
                self.tickets.insert(bot.clone(), 1.0);
                *self.session_games.entry(bot.clone()).or_insert(0) += 1;
            } else {
                let deficit = (max_games - self.session_games(bot)) as f64;
                let factor = self.config.ticket_increase_rate
                    + deficit * self.config.game_catchup_boost;
                *self.tickets.get_mut(bot).expect("ensured above") *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ids(names: &[&str]) -> Vec<BotId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ledger() -> TicketLedger {
        TicketLedger::new(TicketConfig::default())
    }

    #[test]
    fn test_config_validation() {
        assert!(TicketConfig::new(4.0, 1.2, 1.0).is_ok());
        assert!(TicketConfig::new(0.5, 1.2, 1.0).is_err());
        assert!(TicketConfig::new(4.0, 0.9, 1.0).is_err());
        assert!(TicketConfig::new(4.0, 1.2, -0.1).is_err());
        assert!(TicketConfig::new(4.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut ledger = ledger();
        let bots = ids(&["a", "b"]);
        ledger.ensure(&bots);
        assert_eq!(ledger.get(&bots[0]), Some(4.0));
        ledger.set(&bots[0], 7.0);
        ledger.ensure(&bots);
        assert_eq!(ledger.get(&bots[0]), Some(7.0));
        assert_eq!(ledger.session_games(&bots[0]), 0);
    }

    #[test]
    fn test_get_ensured_materializes_default() {
        let mut ledger = ledger();
        let bot = "fresh".to_string();
        assert_eq!(ledger.get(&bot), None);
        assert_eq!(ledger.get_ensured(&bot), 4.0);
        assert_eq!(ledger.get(&bot), Some(4.0));
    }

    #[test]
    fn test_total() {
        let mut ledger = ledger();
        ledger.ensure(&ids(&["a", "b", "c"]));
        assert!((ledger.total() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_choose_settlement_math() {
        let mut ledger = ledger();
        let all = ids(&["a", "b", "c", "d"]);
        ledger.ensure(&all);
        // give "d" a head start of one session game
        ledger.choose(&ids(&["d"]), &all);

        // d reset to 1.0 and incremented; others multiplied by rate only
        // (everyone was level before the call)
        assert_eq!(ledger.get(&all[3]), Some(1.0));
        assert_eq!(ledger.session_games(&all[3]), 1);
        for bot in &all[..3] {
            assert!((ledger.get(bot).unwrap() - 4.0 * 1.2).abs() < 1e-12);
        }

        // Second round: a and b play. c now has a deficit of 1 against the
        // pre-update max (d's 1 game), d has none.
        let before_c = ledger.get(&all[2]).unwrap();
        let before_d = ledger.get(&all[3]).unwrap();
        ledger.choose(&ids(&["a", "b"]), &all);
        let expected_c = before_c * (1.2 + 1.0 * 1.0);
        let expected_d = before_d * 1.2;
        assert!((ledger.get(&all[2]).unwrap() - expected_c).abs() < 1e-12);
        assert!((ledger.get(&all[3]).unwrap() - expected_d).abs() < 1e-12);
        assert_eq!(ledger.get(&all[0]), Some(1.0));
        assert_eq!(ledger.get(&all[1]), Some(1.0));
    }

    #[test]
    fn test_non_chosen_balance_never_decreases() {
        let mut ledger = ledger();
        let all = ids(&["a", "b", "c"]);
        ledger.ensure(&all);
        let before = ledger.get(&all[2]).unwrap();
        ledger.choose(&ids(&["a"]), &all);
        assert!(ledger.get(&all[2]).unwrap() >= before);
    }

    #[test]
    fn test_absentee_outgrows_regular() {
        let mut ledger = ledger();
        let all = ids(&["idle", "busy", "x1", "x2"]);
        ledger.ensure(&all);
        // "busy" plays three matches in a row, "idle" none
        for _ in 0..3 {
            ledger.choose(&ids(&["busy", "x1", "x2"]), &all);
        }
        assert!(ledger.get(&all[0]).unwrap() > ledger.get(&all[1]).unwrap());
    }

    #[test]
    fn test_reset_session() {
        let mut ledger = ledger();
        let all = ids(&["a", "b"]);
        ledger.choose(&ids(&["a"]), &all);
        assert_eq!(ledger.session_games(&all[0]), 1);
        ledger.reset_session();
        assert_eq!(ledger.session_games(&all[0]), 0);
        // Balances are untouched by a session reset
        assert_eq!(ledger.get(&all[0]), Some(1.0));
    }

    #[test]
    fn test_pick_weighted_distinct() {
        let mut ledger = ledger();
        let bots = ids(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let picked = ledger.pick_weighted(&bots, 6, &mut rng).unwrap();
        assert_eq!(picked.len(), 6);
        let mut unique = picked.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_pick_weighted_pool_too_small() {
        let mut ledger = ledger();
        let bots = ids(&["a", "b"]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let err = ledger.pick_weighted(&bots, 3, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            LeagueError::PoolTooSmall {
                pool: 2,
                requested: 3
            }
        ));
    }

    #[test]
    fn test_pick_weighted_zero_weights() {
        let mut ledger = ledger();
        let bots = ids(&["a", "b", "c"]);
        ledger.ensure(&bots);
        for bot in &bots {
            ledger.set(bot, 0.0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let err = ledger.pick_weighted(&bots, 2, &mut rng).unwrap_err();
        assert!(matches!(err, LeagueError::ZeroSelectionWeight));
    }

    #[test]
    fn test_pick_weighted_favors_high_balance() {
        let mut ledger = ledger();
        let bots = ids(&["heavy", "light"]);
        ledger.ensure(&bots);
        ledger.set(&bots[0], 100.0);
        ledger.set(&bots[1], 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut heavy_first = 0;
        for _ in 0..200 {
            let picked = ledger.pick_weighted(&bots, 1, &mut rng).unwrap();
            if picked[0] == bots[0] {
                heavy_first += 1;
            }
        }
        assert!(heavy_first > 150, "heavy picked {heavy_first}/200");
    }
}
