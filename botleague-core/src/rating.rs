//! Skill beliefs and TrueSkill updates
//!
//! Every bot's ability is modeled as a gaussian belief (mu, sigma). The
//! shared model parameters live in an explicit [`RatingEnvironment`] that is
//! constructed once and handed to the store - never process-global state.

use serde::{Deserialize, Serialize};
use skillratings::trueskill::{
    match_quality_two_teams, trueskill_two_teams, TrueSkillConfig, TrueSkillRating,
};
use skillratings::Outcomes;
use std::collections::BTreeMap;

use crate::matches::MatchResult;
use crate::BotId;

/// Shared parameters of the skill model.
///
/// One value per league; the store keeps a copy and all quality/update
/// arithmetic goes through it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingEnvironment {
    /// Prior belief mean for an unseen bot
    pub mu: f64,
    /// Prior belief standard deviation for an unseen bot
    pub sigma: f64,
    /// Distance in skill points that gives ~76% win probability
    pub beta: f64,
    /// Additive dynamics factor keeping ratings from freezing
    pub tau: f64,
    /// Probability of a draw in a single game
    pub draw_probability: f64,
}

impl Default for RatingEnvironment {
    fn default() -> Self {
        Self {
            mu: 50.0,
            sigma: 50.0 / 3.0,
            beta: 50.0 / 6.0,
            tau: 50.0 / 300.0,
            draw_probability: 0.03,
        }
    }
}

impl RatingEnvironment {
    /// Prior rating assigned to a bot on first reference.
    pub fn prior(&self) -> BotRating {
        BotRating {
            mu: self.mu,
            sigma: self.sigma,
        }
    }

    fn trueskill_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: self.beta,
            default_dynamics: self.tau,
        }
    }
}

/// A bot's skill belief. Invariant: `sigma > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotRating {
    pub mu: f64,
    pub sigma: f64,
}

impl BotRating {
    /// Conservative skill estimate used for display and team ordering.
    /// Derived, never stored.
    pub fn mmr(&self) -> i64 {
        (self.mu - self.sigma).round() as i64
    }
}

impl From<BotRating> for TrueSkillRating {
    fn from(r: BotRating) -> Self {
        TrueSkillRating {
            rating: r.mu,
            uncertainty: r.sigma,
        }
    }
}

impl From<TrueSkillRating> for BotRating {
    fn from(r: TrueSkillRating) -> Self {
        BotRating {
            mu: r.rating,
            sigma: r.uncertainty,
        }
    }
}

/// Serializable snapshot state of a [`RatingStore`].
pub type RatingStoreState = BTreeMap<BotId, BotRating>;

/// Holds all skill beliefs and updates them from match results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatingStore {
    env: RatingEnvironment,
    ratings: RatingStoreState,
}

impl RatingStore {
    pub fn new(env: RatingEnvironment) -> Self {
        Self {
            env,
            ratings: BTreeMap::new(),
        }
    }

    /// Rebuild a store from a persisted snapshot state.
    pub fn from_state(env: RatingEnvironment, state: RatingStoreState) -> Self {
        Self {
            env,
            ratings: state,
        }
    }

    /// Snapshot state for persistence.
    pub fn state(&self) -> &RatingStoreState {
        &self.ratings
    }

    pub fn environment(&self) -> &RatingEnvironment {
        &self.env
    }

    /// Returns the rating of the given bot, materializing the prior on
    /// first reference so repeated reads are stable.
    pub fn get(&mut self, bot: &BotId) -> BotRating {
        let prior = self.env.prior();
        *self.ratings.entry(bot.clone()).or_insert(prior)
    }

    /// Ensures every bot in the set has a rating. Idempotent.
    pub fn ensure_all<'a>(&mut self, bots: impl IntoIterator<Item = &'a BotId>) {
        for bot in bots {
            self.get(bot);
        }
    }

    /// Conservative integer skill estimate: `round(mu - sigma)`.
    pub fn mmr(&mut self, bot: &BotId) -> i64 {
        self.get(bot).mmr()
    }

    /// Predicted closeness of a match between two teams, in [0, 1].
    /// Symmetric in team order.
    pub fn match_quality(&self, team_a: &[BotRating], team_b: &[BotRating]) -> f64 {
        let a: Vec<TrueSkillRating> = team_a.iter().map(|&r| r.into()).collect();
        let b: Vec<TrueSkillRating> = team_b.iter().map(|&r| r.into()).collect();
        match_quality_two_teams(&a, &b, &self.env.trueskill_config())
    }

    /// Updates both teams' beliefs from a match result.
    ///
    /// The two-team transform is applied `1 + diff / 4` times, feeding the
    /// already-updated ratings forward each round, so a lopsided scoreline
    /// shifts beliefs further than a narrow one. The repeat count is integer
    /// so the scoreline cannot dominate arbitrarily. Blue is the winner only
    /// with strictly more goals. Mutates the store in place; does not persist.
    pub fn update(&mut self, blue: &[BotId], orange: &[BotId], result: &MatchResult) {
        let config = self.env.trueskill_config();
        let mut blue_ratings: Vec<TrueSkillRating> =
            blue.iter().map(|bot| self.get(bot).into()).collect();
        let mut orange_ratings: Vec<TrueSkillRating> =
            orange.iter().map(|bot| self.get(bot).into()).collect();

        let outcome = if result.blue_won() {
            Outcomes::WIN
        } else {
            Outcomes::LOSS
        };

        // One extra win credited per 4 goals of differential
        let rounds = 1 + result.goal_diff() / 4;
        for _ in 0..rounds {
            let (new_blue, new_orange) =
                trueskill_two_teams(&blue_ratings, &orange_ratings, &outcome, &config);
            blue_ratings = new_blue;
            orange_ratings = new_orange;
        }

        for (bot, rating) in blue.iter().zip(blue_ratings) {
            self.ratings.insert(bot.clone(), rating.into());
        }
        for (bot, rating) in orange.iter().zip(orange_ratings) {
            self.ratings.insert(bot.clone(), rating.into());
        }
    }

    /// Leaderboard view: `(bot, mmr, sigma)` sorted by descending MMR.
    pub fn sorted_by_mmr(&self) -> Vec<(BotId, i64, f64)> {
        let mut ranks: Vec<(BotId, i64, f64)> = self
            .ratings
            .iter()
            .map(|(bot, rating)| (bot.clone(), rating.mmr(), rating.sigma))
            .collect();
        ranks.sort_by_key(|&(_, mmr, _)| std::cmp::Reverse(mmr));
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RatingStore {
        RatingStore::new(RatingEnvironment::default())
    }

    fn team(ids: &[&str]) -> Vec<BotId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_materializes_prior() {
        let mut store = store();
        let rating = store.get(&"newbie".to_string());
        assert_eq!(rating.mu, 50.0);
        assert_eq!(rating.sigma, 50.0 / 3.0);
        // The prior is persisted, not recomputed
        assert_eq!(store.state().len(), 1);
    }

    #[test]
    fn test_ensure_all_is_idempotent() {
        let mut store = store();
        let bots = team(&["a", "b", "c"]);
        store.ensure_all(&bots);
        let before = store.state().clone();
        store.ensure_all(&bots);
        assert_eq!(*store.state(), before);
    }

    #[test]
    fn test_mmr_is_rounded_mu_minus_sigma() {
        let rating = BotRating {
            mu: 50.0,
            sigma: 50.0 / 3.0,
        };
        assert_eq!(rating.mmr(), 33); // round(50 - 16.66..) = round(33.33..)

        let rating = BotRating {
            mu: 40.0,
            sigma: 2.5,
        };
        assert_eq!(rating.mmr(), 38); // round(37.5) rounds away from zero
    }

    #[test]
    fn test_update_moves_winner_up_and_loser_down() {
        let mut store = store();
        let blue = team(&["b1", "b2", "b3"]);
        let orange = team(&["o1", "o2", "o3"]);

        store.update(&blue, &orange, &MatchResult::new(5, 2));

        for bot in &blue {
            assert!(store.get(bot).mu > 50.0, "winner {bot} should gain mu");
        }
        for bot in &orange {
            assert!(store.get(bot).mu < 50.0, "loser {bot} should lose mu");
        }
    }

    #[test]
    fn test_update_draw_counts_for_orange() {
        let mut store = store();
        let blue = team(&["b1", "b2", "b3"]);
        let orange = team(&["o1", "o2", "o3"]);

        store.update(&blue, &orange, &MatchResult::new(2, 2));

        assert!(store.get(&blue[0]).mu < 50.0);
        assert!(store.get(&orange[0]).mu > 50.0);
    }

    #[test]
    fn test_lopsided_win_moves_ratings_further() {
        let blue = team(&["b1", "b2", "b3"]);
        let orange = team(&["o1", "o2", "o3"]);

        let mut narrow = store();
        narrow.update(&blue, &orange, &MatchResult::new(1, 0));
        let mut lopsided = store();
        lopsided.update(&blue, &orange, &MatchResult::new(8, 0));

        // 8-0 is three update rounds versus one for 1-0
        assert!(lopsided.get(&blue[0]).mu > narrow.get(&blue[0]).mu);
        assert!(lopsided.get(&orange[0]).mu < narrow.get(&orange[0]).mu);
    }

    #[test]
    fn test_match_quality_is_symmetric() {
        let mut store = store();
        let a: Vec<BotRating> = vec![
            store.get(&"a1".to_string()),
            BotRating {
                mu: 60.0,
                sigma: 5.0,
            },
            BotRating {
                mu: 42.0,
                sigma: 8.0,
            },
        ];
        let b: Vec<BotRating> = vec![
            BotRating {
                mu: 55.0,
                sigma: 4.0,
            },
            BotRating {
                mu: 48.0,
                sigma: 10.0,
            },
            store.get(&"b3".to_string()),
        ];
        let q_ab = store.match_quality(&a, &b);
        let q_ba = store.match_quality(&b, &a);
        assert!((q_ab - q_ba).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&q_ab));
    }

    #[test]
    fn test_sorted_by_mmr_descending() {
        let mut store = store();
        store.update(
            &team(&["b1", "b2", "b3"]),
            &team(&["o1", "o2", "o3"]),
            &MatchResult::new(4, 0),
        );
        let ranks = store.sorted_by_mmr();
        assert_eq!(ranks.len(), 6);
        for pair in ranks.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
