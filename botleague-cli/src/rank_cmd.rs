//! Read-only views and session bookkeeping

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use botleague_core::Timestamp;

use crate::league::LeagueDir;

#[derive(Args)]
pub struct LeagueArg {
    /// League directory
    #[arg(long, default_value = ".")]
    pub league: PathBuf,
}

/// Print the leaderboard, best MMR first.
pub fn run_rank_list(args: LeagueArg) -> Result<()> {
    let league = LeagueDir::open(&args.league)?;
    let ratings = league.load_ratings()?;

    println!("{:>4} {:<24} {:>5} {:>8}", "rank", "bot", "mmr", "sigma");
    for (i, (bot, mmr, sigma)) in ratings.sorted_by_mmr().iter().enumerate() {
        println!("{:>4} {:<24} {:>5} {:>8.2}", i + 1, bot, mmr, sigma);
    }
    Ok(())
}

/// Print ticket balances and session game counts, highest balance first.
pub fn run_ticket_list(args: LeagueArg) -> Result<()> {
    let league = LeagueDir::open(&args.league)?;
    let tickets = league.load_tickets()?;

    let state = tickets.state();
    let mut rows: Vec<(&String, f64)> = state
        .tickets
        .iter()
        .map(|(bot, &balance)| (bot, balance))
        .collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("{:<24} {:>10} {:>14}", "bot", "tickets", "session games");
    for (bot, balance) in rows {
        let games = state.session_games.get(bot).copied().unwrap_or(0);
        println!("{:<24} {:>10.2} {:>14}", bot, balance, games);
    }
    println!("total: {:.2}", tickets.total());
    Ok(())
}

/// Close the current session: zero every session game counter and record
/// how many matches the summary covered.
pub fn run_session_reset(args: LeagueArg) -> Result<()> {
    let league = LeagueDir::open(&args.league)?;
    let mut tickets = league.load_tickets()?;
    tickets.reset_session();

    let timestamp = Timestamp::now();
    league.tickets()?.append(&tickets.state(), &timestamp)?;

    let mut settings = league.settings()?;
    settings.last_summary = league.matches()?.count()? as u64;
    settings.save(&league.settings_path())?;

    println!(
        "session reset; summary now covers {} matches",
        settings.last_summary
    );
    Ok(())
}
