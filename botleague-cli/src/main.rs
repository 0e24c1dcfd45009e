//! botleague CLI - operator commands for a league directory
//!
//! Commands:
//! - setup: create a league directory
//! - match new/report/undo: the match lifecycle
//! - rank list / ticket list: read-only views
//! - session reset: close the current reporting session

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod league;
mod match_cmd;
mod rank_cmd;

use league::LeagueDir;

#[derive(Parser)]
#[command(name = "botleague")]
#[command(about = "Matchmaking and ratings for a 3v3 bot league")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a league directory skeleton with default settings
    Setup {
        /// Directory to initialize
        dir: PathBuf,
    },
    /// Match lifecycle
    #[command(subcommand)]
    Match(MatchCommands),
    /// Rating views
    #[command(subcommand)]
    Rank(RankCommands),
    /// Ticket views
    #[command(subcommand)]
    Ticket(TicketCommands),
    /// Session bookkeeping
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand)]
enum MatchCommands {
    /// Select the next match and commit the ticket settlement
    New(match_cmd::NewArgs),
    /// Record the result of the newest match and update ratings
    Report(match_cmd::ReportArgs),
    /// Remove the newest match, rankings, and tickets entries in lock-step
    Undo(match_cmd::UndoArgs),
}

#[derive(Subcommand)]
enum RankCommands {
    /// Print the leaderboard
    List(rank_cmd::LeagueArg),
}

#[derive(Subcommand)]
enum TicketCommands {
    /// Print ticket balances and session game counts
    List(rank_cmd::LeagueArg),
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Zero all session game counters
    Reset(rank_cmd::LeagueArg),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Setup { dir } => {
            LeagueDir::setup(&dir)?;
            println!("league initialized at {}", dir.display());
            Ok(())
        }
        Commands::Match(MatchCommands::New(args)) => match_cmd::run_new(args),
        Commands::Match(MatchCommands::Report(args)) => match_cmd::run_report(args),
        Commands::Match(MatchCommands::Undo(args)) => match_cmd::run_undo(args),
        Commands::Rank(RankCommands::List(args)) => rank_cmd::run_rank_list(args),
        Commands::Ticket(TicketCommands::List(args)) => rank_cmd::run_ticket_list(args),
        Commands::Session(SessionCommands::Reset(args)) => rank_cmd::run_session_reset(args),
    }
}
