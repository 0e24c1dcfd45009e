//! Match value objects - selections, results, and history entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::snapshot::Timestamp;
use crate::BotId;

/// Output of the match selector: two teams of three plus the predicted
/// closeness of the match under the rating model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSelection {
    /// Blue team, sorted by descending MMR
    pub blue: Vec<BotId>,
    /// Orange team, sorted by descending MMR
    pub orange: Vec<BotId>,
    /// Predicted draw/closeness probability in [0, 1]
    pub quality: f64,
}

impl MatchSelection {
    /// All six participants, blue team first.
    pub fn participants(&self) -> impl Iterator<Item = &BotId> {
        self.blue.iter().chain(self.orange.iter())
    }
}

/// Per-bot counters reported by the match execution engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerScore {
    pub points: u32,
    pub goals: u32,
    pub shots: u32,
    pub saves: u32,
    pub assists: u32,
    pub demolitions: u32,
    pub own_goals: u32,
}

/// Outcome of a completed match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchResult {
    pub blue_goals: u32,
    pub orange_goals: u32,
    #[serde(default)]
    pub player_scores: BTreeMap<BotId, PlayerScore>,
}

impl MatchResult {
    pub fn new(blue_goals: u32, orange_goals: u32) -> Self {
        Self {
            blue_goals,
            orange_goals,
            player_scores: BTreeMap::new(),
        }
    }

    /// Absolute goal differential.
    pub fn goal_diff(&self) -> u32 {
        self.blue_goals.abs_diff(self.orange_goals)
    }

    /// True when blue scored strictly more goals than orange.
    pub fn blue_won(&self) -> bool {
        self.blue_goals > self.orange_goals
    }
}

/// One entry in the match-history log. Appended when the match is created;
/// `result` stays `None` until the execution engine reports back. An absent
/// result means the rating update was skipped while the ticket settlement
/// was already committed - the caller decides whether to roll back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRecord {
    pub timestamp: Timestamp,
    pub name: String,
    pub blue: Vec<BotId>,
    pub orange: Vec<BotId>,
    /// Opaque arena identifier supplied by the caller
    pub arena: String,
    pub result: Option<MatchResult>,
}

impl MatchRecord {
    /// Build a record for a fresh selection. The name doubles as a stable,
    /// human-readable identifier: `{timestamp}_{blue..}_vs_{orange..}`.
    pub fn new(timestamp: Timestamp, selection: &MatchSelection, arena: impl Into<String>) -> Self {
        let mut parts: Vec<&str> = vec![timestamp.as_str()];
        parts.extend(selection.blue.iter().map(|b| b.as_str()));
        parts.push("vs");
        parts.extend(selection.orange.iter().map(|b| b.as_str()));
        Self {
            name: parts.join("_"),
            timestamp,
            blue: selection.blue.clone(),
            orange: selection.orange.clone(),
            arena: arena.into(),
            result: None,
        }
    }
}
