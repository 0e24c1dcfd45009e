//! League directory layout and settings
//!
//! A league lives in one directory:
//!
//! ```text
//! league/
//!   league_settings.json
//!   matches/    # one record per match, {timestamp}_matches.json
//!   rankings/   # rating snapshots, {timestamp}_rankings.json
//!   tickets/    # ticket snapshots, {timestamp}_tickets.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use botleague_core::{
    MatchRecord, RatingEnvironment, RatingStore, RatingStoreState, SnapshotLog, TicketConfig,
    TicketLedger, TicketLedgerState,
};

/// Persistent league settings, stored as `league_settings.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeagueSettings {
    /// Number of matches included in the last session summary. The session
    /// game counters cover matches played after this point.
    pub last_summary: u64,
    pub new_bot_ticket_count: f64,
    pub ticket_increase_rate: f64,
    pub game_catchup_boost: f64,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        let tickets = TicketConfig::default();
        Self {
            last_summary: 0,
            new_bot_ticket_count: tickets.new_bot_ticket_count,
            ticket_increase_rate: tickets.ticket_increase_rate,
            game_catchup_boost: tickets.game_catchup_boost,
        }
    }
}

impl LeagueSettings {
    /// Ticket configuration, validated against the documented ranges.
    pub fn ticket_config(&self) -> Result<TicketConfig> {
        TicketConfig::new(
            self.new_bot_ticket_count,
            self.ticket_increase_rate,
            self.game_catchup_boost,
        )
        .context("league_settings.json holds out-of-range ticket values")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        settings.ticket_config()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Typed access to the files and snapshot logs of a league directory.
pub struct LeagueDir {
    root: PathBuf,
}

impl LeagueDir {
    /// Opens an existing league directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        anyhow::ensure!(
            root.join("league_settings.json").exists(),
            "{} is not a league directory (run `botleague setup` first)",
            root.display()
        );
        Ok(Self { root })
    }

    /// Creates the directory skeleton and default settings.
    pub fn setup(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let league = Self { root };
        league.matches()?;
        league.rankings()?;
        league.tickets()?;
        let settings_path = league.settings_path();
        if !settings_path.exists() {
            LeagueSettings::default().save(&settings_path)?;
        }
        Ok(league)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("league_settings.json")
    }

    pub fn settings(&self) -> Result<LeagueSettings> {
        LeagueSettings::load(&self.settings_path())
    }

    pub fn matches(&self) -> Result<SnapshotLog<MatchRecord>> {
        Ok(SnapshotLog::open(self.root.join("matches"), "matches")?)
    }

    pub fn rankings(&self) -> Result<SnapshotLog<RatingStoreState>> {
        Ok(SnapshotLog::open(self.root.join("rankings"), "rankings")?)
    }

    pub fn tickets(&self) -> Result<SnapshotLog<TicketLedgerState>> {
        Ok(SnapshotLog::open(self.root.join("tickets"), "tickets")?)
    }

    /// Latest rating store, or a fresh one for a new league.
    pub fn load_ratings(&self) -> Result<RatingStore> {
        let state = self.rankings()?.latest()?.unwrap_or_default();
        Ok(RatingStore::from_state(RatingEnvironment::default(), state))
    }

    /// Latest ticket ledger, or a fresh one for a new league.
    pub fn load_tickets(&self) -> Result<TicketLedger> {
        let config = self.settings()?.ticket_config()?;
        let state = self.tickets()?.latest()?.unwrap_or_default();
        Ok(TicketLedger::from_state(config, state))
    }
}
