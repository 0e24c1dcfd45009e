//! botleague core - Matchmaking and rating engine
//!
//! This crate provides the core logic for a periodic 3v3 bot league:
//! - Skill beliefs per bot with TrueSkill updates (rating)
//! - Ticket-based fairness ledger governing selection weight (tickets)
//! - The bounded match-selection search (selector)
//! - Append-only, timestamp-ordered snapshot persistence (snapshot)
//!
//! Everything here is synchronous and single-operator: a caller loads the
//! ledgers, asks the selector for the next match, feeds the finished result
//! back into the rating store, and commits one new snapshot per ledger.

pub mod error;
pub mod matches;
pub mod rating;
pub mod selector;
pub mod snapshot;
pub mod tickets;

// Re-exports for convenient access
pub use error::{LeagueError, Result};
pub use matches::{MatchRecord, MatchResult, MatchSelection, PlayerScore};
pub use rating::{BotRating, RatingEnvironment, RatingStore, RatingStoreState};
pub use selector::{select_match, SelectorConfig};
pub use snapshot::{SnapshotLog, Timestamp};
pub use tickets::{TicketConfig, TicketLedger, TicketLedgerState};

/// Stable, case-sensitive identifier of a bot. Assigned by the bot registry
/// and treated as opaque everywhere in the core.
pub type BotId = String;

/// Players per team in a league match.
pub const TEAM_SIZE: usize = 3;

/// Participants in a league match (two teams).
pub const MATCH_SIZE: usize = 2 * TEAM_SIZE;
