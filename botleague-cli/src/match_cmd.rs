//! Match lifecycle commands - new, report, undo

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use botleague_core::{select_match, MatchRecord, MatchResult, SelectorConfig, Timestamp};

use crate::league::LeagueDir;

/// Arenas a new match may be played in. The engine only sees the chosen
/// identifier as an opaque string.
const ARENAS: &[&str] = &[
    "ChampionsField",
    "DFHStadium",
    "NeoTokyo",
    "UrbanCentral",
    "BeckwithPark",
    "Mannfield",
    "NeonFields",
    "UtopiaColiseum",
];

#[derive(Args)]
pub struct NewArgs {
    /// League directory
    #[arg(long, default_value = ".")]
    pub league: PathBuf,

    /// Comma-separated ids of the bots eligible to play
    #[arg(long, value_delimiter = ',', required = true)]
    pub bots: Vec<String>,

    /// Arena identifier (random pick when omitted)
    #[arg(long)]
    pub arena: Option<String>,

    /// Random seed for reproducible selection
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// League directory
    #[arg(long, default_value = ".")]
    pub league: PathBuf,

    #[arg(long)]
    pub blue_goals: u32,

    #[arg(long)]
    pub orange_goals: u32,
}

#[derive(Args)]
pub struct UndoArgs {
    /// League directory
    #[arg(long, default_value = ".")]
    pub league: PathBuf,

    /// Skip the safety check
    #[arg(long)]
    pub yes: bool,
}

/// Select the next match and commit the ticket settlement. The match record
/// is appended without a result; `match report` completes it.
pub fn run_new(args: NewArgs) -> Result<()> {
    let league = LeagueDir::open(&args.league)?;
    let mut ratings = league.load_ratings()?;
    let mut tickets = league.load_tickets()?;

    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    tracing::info!(
        "Selecting next match from {} eligible bots (seed: {:?})",
        args.bots.len(),
        args.seed
    );

    let selection = select_match(
        &args.bots,
        &mut ratings,
        &mut tickets,
        &SelectorConfig::default(),
        &mut rng,
    )
    .context("match selection failed")?;

    let arena = args.arena.unwrap_or_else(|| {
        ARENAS
            .choose(&mut rng)
            .expect("arena list is non-empty")
            .to_string()
    });

    let timestamp = Timestamp::now();
    let record = MatchRecord::new(timestamp.clone(), &selection, arena);
    league.matches()?.append(&record, &timestamp)?;
    league.tickets()?.append(&tickets.state(), &timestamp)?;

    println!("{}", record.name);
    println!(
        "  blue:   {}\n  orange: {}\n  arena:  {}\n  quality: {:.3}",
        record.blue.join(", "),
        record.orange.join(", "),
        record.arena,
        selection.quality
    );
    Ok(())
}

/// Complete the newest match with its result: update ratings and snapshot
/// them under the match's timestamp.
pub fn run_report(args: ReportArgs) -> Result<()> {
    let league = LeagueDir::open(&args.league)?;
    let match_log = league.matches()?;
    let mut record = match match_log.latest()? {
        Some(record) => record,
        None => bail!("no match to report; run `botleague match new` first"),
    };
    if record.result.is_some() {
        bail!("latest match {} already has a result", record.name);
    }

    let result = MatchResult::new(args.blue_goals, args.orange_goals);
    let mut ratings = league.load_ratings()?;
    ratings.update(&record.blue, &record.orange, &result);

    record.result = Some(result);
    match_log.append(&record, &record.timestamp)?;
    league.rankings()?.append(ratings.state(), &record.timestamp)?;

    println!(
        "{}: blue {} - {} orange",
        record.name, args.blue_goals, args.orange_goals
    );
    Ok(())
}

/// Remove the newest match and tickets entries, plus the rankings entry
/// when the match was already reported.
pub fn run_undo(args: UndoArgs) -> Result<()> {
    if !args.yes {
        bail!("undoing deletes the latest match, rankings, and tickets snapshots; pass --yes to confirm");
    }
    let league = LeagueDir::open(&args.league)?;

    // An unreported match has no rankings snapshot yet; the newest rankings
    // entry still belongs to the previous match and stays put.
    let reported = league
        .matches()?
        .latest()?
        .is_some_and(|record| record.result.is_some());

    let mut undone = vec![("match", league.matches()?.undo_last()?)];
    if reported {
        undone.push(("rankings", league.rankings()?.undo_last()?));
    }
    undone.push(("tickets", league.tickets()?.undo_last()?));
    for (kind, removed) in undone {
        if removed {
            println!("removed latest {kind} snapshot");
        } else {
            println!("no {kind} snapshot to undo");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use botleague_core::{
        MatchSelection, RatingEnvironment, RatingStore, TicketConfig, TicketLedger,
    };

    fn selection(round: usize) -> MatchSelection {
        let bot = |i: usize| format!("bot{:02}", round * 6 + i);
        MatchSelection {
            blue: vec![bot(0), bot(1), bot(2)],
            orange: vec![bot(3), bot(4), bot(5)],
            quality: 0.45,
        }
    }

    /// Play one full match cycle in the league directory: commit tickets
    /// with the selection, then report the result and snapshot rankings.
    fn play_reported_match(league: &LeagueDir, round: usize) -> MatchRecord {
        let ts = Timestamp::parse(&format!("2024010112{round:02}00")).unwrap();
        let selection = selection(round);
        let mut record = MatchRecord::new(ts.clone(), &selection, "arena");

        let mut tickets = TicketLedger::new(TicketConfig::default());
        let eligible: Vec<String> = selection.participants().cloned().collect();
        tickets.choose(&eligible, &eligible);
        league.tickets().unwrap().append(&tickets.state(), &ts).unwrap();

        let result = MatchResult::new(2, 1);
        let mut ratings = RatingStore::new(RatingEnvironment::default());
        ratings.update(&selection.blue, &selection.orange, &result);
        record.result = Some(result);
        league.matches().unwrap().append(&record, &ts).unwrap();
        league.rankings().unwrap().append(ratings.state(), &ts).unwrap();
        record
    }

    /// Commit a selection without reporting it: match record and tickets
    /// snapshot only, as `match new` does.
    fn start_unreported_match(league: &LeagueDir, round: usize) -> MatchRecord {
        let ts = Timestamp::parse(&format!("2024010112{round:02}00")).unwrap();
        let record = MatchRecord::new(ts.clone(), &selection(round), "arena");
        let mut tickets = TicketLedger::new(TicketConfig::default());
        let eligible: Vec<String> = record.blue.iter().chain(&record.orange).cloned().collect();
        tickets.choose(&eligible, &eligible);
        league.matches().unwrap().append(&record, &ts).unwrap();
        league.tickets().unwrap().append(&tickets.state(), &ts).unwrap();
        record
    }

    #[test]
    fn test_undo_unreported_match_keeps_previous_rankings() {
        let dir = tempfile::tempdir().unwrap();
        let league = LeagueDir::setup(dir.path().join("league")).unwrap();
        let reported = play_reported_match(&league, 0);
        start_unreported_match(&league, 1);

        run_undo(UndoArgs {
            league: dir.path().join("league"),
            yes: true,
        })
        .unwrap();

        // The unreported match and its ticket snapshot are gone; the
        // reported match's rankings snapshot survives.
        assert_eq!(league.matches().unwrap().count().unwrap(), 1);
        assert_eq!(league.tickets().unwrap().count().unwrap(), 1);
        assert_eq!(league.rankings().unwrap().count().unwrap(), 1);
        assert_eq!(league.matches().unwrap().latest().unwrap(), Some(reported));
    }

    #[test]
    fn test_undo_reported_match_removes_all_three_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let league = LeagueDir::setup(dir.path().join("league")).unwrap();
        play_reported_match(&league, 0);
        play_reported_match(&league, 1);

        run_undo(UndoArgs {
            league: dir.path().join("league"),
            yes: true,
        })
        .unwrap();

        assert_eq!(league.matches().unwrap().count().unwrap(), 1);
        assert_eq!(league.rankings().unwrap().count().unwrap(), 1);
        assert_eq!(league.tickets().unwrap().count().unwrap(), 1);
    }

    #[test]
    fn test_undo_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        LeagueDir::setup(dir.path().join("league")).unwrap();
        let err = run_undo(UndoArgs {
            league: dir.path().join("league"),
            yes: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }
}
