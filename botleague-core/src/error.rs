//! Error types for league operations

use std::path::PathBuf;

/// Errors surfaced by the matchmaking core.
///
/// Absent bots are never an error: both the rating store and the ticket
/// ledger materialize defaults on first reference. Everything here is a
/// genuine precondition or persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    /// A match needs six participants; the eligible pool is smaller.
    #[error("not enough eligible bots: {available} available, {required} required")]
    NotEnoughBots { available: usize, required: usize },

    /// A weighted draw asked for more distinct bots than the pool holds.
    #[error("cannot draw {requested} distinct bots from a pool of {pool}")]
    PoolTooSmall { pool: usize, requested: usize },

    /// Every selection weight in the pool came out zero, so there is no
    /// distribution to draw from.
    #[error("selection weights sum to zero; no bot can be drawn")]
    ZeroSelectionWeight,

    /// A configuration value is outside its documented range. Rejected at
    /// the configuration boundary, before reaching any ledger.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A timestamp is not a fixed-width `YYYYMMDDHHMMSS` string. Anything
    /// else would break the lexicographic == chronological ordering the
    /// snapshot log relies on.
    #[error("invalid timestamp {0:?}: expected 14 digits (YYYYMMDDHHMMSS)")]
    InvalidTimestamp(String),

    /// A snapshot file exists but cannot be decoded. Fatal: proceeding
    /// would fabricate ticket or rating history.
    #[error("corrupt snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Underlying filesystem failure while reading or writing snapshots.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LeagueError>;
