// Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use porra_core::model::{PickCategory, Stage};

use crate::report::Format;

#[derive(Debug, Parser)]
#[command(name = "porra")]
#[command(about = "Scoring and result overrides for a football prediction pool", long_about = None)]
pub struct Cli {
    /// Directory holding config/, defaults/ and data/
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List matches with resolved results and per-match summary
    Matches {
        /// Only this stage (league, playoffs, round_of_16, quarterfinals, semifinals, final)
        #[arg(long)]
        stage: Option<Stage>,
        /// Only matches with a resolved result
        #[arg(long, conflicts_with = "upcoming")]
        played: bool,
        /// Only matches without a resolved result
        #[arg(long)]
        upcoming: bool,
        /// Case-insensitive text over teams, stage and matchday
        #[arg(short, long)]
        query: Option<String>,
    },
    /// League-phase table
    Standings,
    /// Participant ranking
    Leaderboard {
        /// Order alphabetically instead of by points
        #[arg(long)]
        by_name: bool,
    },
    /// Per-match and per-pick detail for one participant
    Participant {
        /// Participant id
        id: String,
    },
    /// Set a match result locally; two empty values mark it unplayed
    SetResult {
        match_id: String,
        home: String,
        away: String,
    },
    /// Drop the local result for a match
    RevertResult { match_id: String },
    /// Set the actual team for a pick row locally; omit the team to mark it unknown
    SetPick {
        category: PickCategory,
        key: String,
        team: Option<String>,
    },
    /// Drop the local actual for a pick row
    RevertPick { category: PickCategory, key: String },
    /// Write the local override layer as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace the local override layer with an exported file
    Import { file: PathBuf },
    /// Discard every local override
    Reset,
    /// Dataset and override status
    Info,
}
