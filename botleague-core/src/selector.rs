//! Match selection - the bounded fairness/quality search
//!
//! Directly searching all 3v3 team splits over the whole league is
//! combinatorially hopeless, so selection collapses the problem: pick a
//! leader among the bots holding the most tickets, treat the leader's skill
//! mean as the target level, draw five plausible candidates around that
//! target, then solve the small 6-choose-3 matching exactly. Repeat up to a
//! bounded number of iterations, keeping the best split seen.

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::error::{LeagueError, Result};
use crate::matches::MatchSelection;
use crate::rating::{BotRating, RatingStore};
use crate::tickets::TicketLedger;
use crate::{BotId, MATCH_SIZE, TEAM_SIZE};

/// Tunables of the selection search. The fairness/quality trade-off is
/// empirical, so these are deliberately exposed rather than hard-coded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectorConfig {
    /// Exponent applied to ticket balances when scoring candidates. Higher
    /// values produce a more uniform distribution of games played.
    /// Adjust by increments of 0.1.
    pub ticket_strength: f64,
    /// Extra assumed uncertainty when scoring a candidate's fit to the
    /// target skill level. Higher tolerance lets accurately rated bots play
    /// in more distant matches. Adjust by increments of 1.
    pub mmr_tolerance: f64,
    /// Max attempts to build a match of quality >= `min_quality`.
    pub max_iterations: u32,
    /// Acceptance threshold; the best sub-threshold split is still returned
    /// once the iterations are exhausted.
    pub min_quality: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            ticket_strength: 1.0,
            mmr_tolerance: 4.0,
            max_iterations: 20,
            min_quality: 0.4,
        }
    }
}

/// Ephemeral pairing of a bot with its current rating, used only inside
/// the selection search.
#[derive(Clone, Debug)]
struct Candidate {
    id: BotId,
    rating: BotRating,
}

/// Gaussian probability density. Used as a raw closeness weight, not a
/// normalized probability.
fn pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let sigma = sigma.abs();
    (1.0 / ((2.0 * std::f64::consts::PI).sqrt() * sigma))
        * (-((x - mu) / sigma).powi(2) / 2.0).exp()
}

/// Picks the next match: two balanced teams of three, weighted toward bots
/// that are owed playtime.
///
/// Reads the rating store (materializing priors only) and, on success,
/// commits the ticket settlement for the chosen six. The caller feeds the
/// completed result back via [`RatingStore::update`] and snapshots both
/// ledgers afterwards.
///
/// Fails with [`LeagueError::NotEnoughBots`] when fewer than six bots are
/// eligible, and with [`LeagueError::ZeroSelectionWeight`] when no candidate
/// carries any weight. Failing to reach `min_quality` is not an error: the
/// best split found is returned with its sub-threshold quality.
pub fn select_match<R: Rng>(
    eligible: &[BotId],
    ratings: &mut RatingStore,
    tickets: &mut TicketLedger,
    config: &SelectorConfig,
    rng: &mut R,
) -> Result<MatchSelection> {
    if eligible.len() < MATCH_SIZE {
        return Err(LeagueError::NotEnoughBots {
            available: eligible.len(),
            required: MATCH_SIZE,
        });
    }

    ratings.ensure_all(eligible);
    tickets.ensure(eligible);

    // Balances do not change during the search, so the leader pool is fixed
    let max_tickets = eligible
        .iter()
        .map(|bot| tickets.get_ensured(bot))
        .fold(f64::MIN, f64::max);

    let mut best: Option<(f64, Vec<Candidate>, Vec<Candidate>)> = None;

    // At least one iteration always runs, so `best` ends up populated
    for _ in 0..config.max_iterations.max(1) {
        // Leader: uniform pick among the bots holding the most tickets.
        // Its skill mean becomes this iteration's target level.
        let leaders: Vec<&BotId> = eligible
            .iter()
            .filter(|bot| tickets.get_ensured(bot) == max_tickets)
            .collect();
        let leader = (*leaders.choose(rng).expect("pool is non-empty")).clone();
        let target_mu = ratings.get(&leader).mu;

        // Score everyone else by plausibility of performing at the target
        // level, scaled by how much playtime they are owed
        let candidates: Vec<Candidate> = eligible
            .iter()
            .filter(|bot| **bot != leader)
            .map(|bot| Candidate {
                id: bot.clone(),
                rating: ratings.get(bot),
            })
            .collect();
        let weights: Vec<f64> = candidates
            .iter()
            .map(|c| {
                let spread = (c.rating.sigma.powi(2) + config.mmr_tolerance.powi(2)).sqrt();
                let performance = pdf(target_mu, c.rating.mu, spread);
                let ticket_weight = tickets.get_ensured(&c.id).powf(config.ticket_strength);
                performance * ticket_weight
            })
            .collect();

        let mut participants = draw_distinct(candidates, weights, MATCH_SIZE - 1, rng)?;
        participants.push(Candidate {
            rating: ratings.get(&leader),
            id: leader,
        });

        let (quality, blue, orange) = best_split(&participants, ratings);
        if best.as_ref().map_or(true, |(q, _, _)| quality > *q) {
            best = Some((quality, blue, orange));
        }
        if best.as_ref().map_or(false, |(q, _, _)| *q >= config.min_quality) {
            break;
        }
    }

    let (quality, mut blue, mut orange) = best.expect("at least one iteration ran");

    // Present each team strongest-first; MMR accounts for sigma
    blue.sort_by_key(|c| std::cmp::Reverse(c.rating.mmr()));
    orange.sort_by_key(|c| std::cmp::Reverse(c.rating.mmr()));
    let blue: Vec<BotId> = blue.into_iter().map(|c| c.id).collect();
    let orange: Vec<BotId> = orange.into_iter().map(|c| c.id).collect();

    let chosen: Vec<BotId> = blue.iter().chain(orange.iter()).cloned().collect();
    let tickets_consumed: f64 = chosen.iter().map(|bot| tickets.get_ensured(bot)).sum();
    tickets.choose(&chosen, eligible);

    tracing::info!(
        "Match: {:?} vs {:?} (quality {:.3}, tickets consumed {:.2})",
        blue,
        orange,
        quality,
        tickets_consumed
    );

    Ok(MatchSelection {
        blue,
        orange,
        quality,
    })
}

/// Draws `k` distinct candidates, probability proportional to weight.
fn draw_distinct<R: Rng>(
    mut pool: Vec<Candidate>,
    mut weights: Vec<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Candidate>> {
    let mut picked = Vec::with_capacity(k);
    for _ in 0..k {
        let dist = WeightedIndex::new(&weights).map_err(|_| LeagueError::ZeroSelectionWeight)?;
        let index = dist.sample(rng);
        picked.push(pool.swap_remove(index));
        weights.swap_remove(index);
    }
    Ok(picked)
}

/// Exact search over the 3v3 splits of six participants.
///
/// Fixing the first participant on blue enumerates each complementary pair
/// of teams exactly once (10 splits), halving the full 6-choose-3 walk.
fn best_split(
    participants: &[Candidate],
    ratings: &RatingStore,
) -> (f64, Vec<Candidate>, Vec<Candidate>) {
    debug_assert_eq!(participants.len(), MATCH_SIZE);

    let mut best_quality = f64::MIN;
    let mut best_blue: [usize; TEAM_SIZE] = [0, 1, 2];

    for j in 1..MATCH_SIZE - 1 {
        for k in (j + 1)..MATCH_SIZE {
            let blue_idx = [0, j, k];
            let blue_ratings: Vec<BotRating> =
                blue_idx.iter().map(|&i| participants[i].rating).collect();
            let orange_ratings: Vec<BotRating> = (0..MATCH_SIZE)
                .filter(|i| !blue_idx.contains(i))
                .map(|i| participants[i].rating)
                .collect();
            let quality = ratings.match_quality(&blue_ratings, &orange_ratings);
            if quality > best_quality {
                best_quality = quality;
                best_blue = blue_idx;
            }
        }
    }

    let blue: Vec<Candidate> = best_blue
        .iter()
        .map(|&i| participants[i].clone())
        .collect();
    let orange: Vec<Candidate> = (0..MATCH_SIZE)
        .filter(|i| !best_blue.contains(i))
        .map(|i| participants[i].clone())
        .collect();
    (best_quality, blue, orange)
}
