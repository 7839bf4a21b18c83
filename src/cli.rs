//! CLI struct definitions for the builder-ledger command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "builder-ledger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local-first progression ledger: xp, levels, credits, streaks and achievements.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Start store discovery here instead of the working directory.
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create a `.ledger` store (database, audit log, ledger.toml)
    Init {
        /// Directory to initialize (defaults to current working directory).
        #[clap(short, long)]
        dir: Option<PathBuf>,
    },
    /// Show the current profile
    Status {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Run the session-start daily login and streak check
    Session {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Grant experience directly
    Xp(XpCli),
    /// Earn, spend or inspect credits
    Credits(CreditsCli),
    /// Grant the tabled reward for an action type
    Reward {
        action: String,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Check or list achievements
    Achievements(AchievementsCli),
    /// Rank every builder in this store by xp
    Leaderboard {
        #[clap(long, default_value = "10")]
        limit: usize,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Show recent credit and purchase history
    History {
        #[clap(long, default_value = "20")]
        limit: usize,
    },
    /// List unlocked features and their stage
    Features,
    /// Print the static reward tables
    Catalog(CatalogCli),
    /// Show the database audit log
    Audit {
        #[clap(long, default_value = "20")]
        limit: usize,
    },
    /// Print subsystem schemas as JSON
    Schema,
    /// Print the version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct XpCli {
    #[clap(subcommand)]
    pub command: XpCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum XpCommand {
    /// Add experience points
    Add {
        amount: u64,
        #[clap(long, default_value = "manual")]
        reason: String,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct CreditsCli {
    #[clap(subcommand)]
    pub command: CreditsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CreditsCommand {
    /// Add credits to the balance
    Earn {
        amount: u64,
        #[clap(long, default_value = "manual")]
        reason: String,
    },
    /// Spend credits on an item; fails when the balance is too low
    Spend {
        amount: u64,
        #[clap(long)]
        item: String,
    },
    /// Print the current balance
    Balance,
}

#[derive(clap::Args, Debug)]
pub(crate) struct AchievementsCli {
    #[clap(subcommand)]
    pub command: AchievementsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AchievementsCommand {
    /// Unlock every achievement whose condition is met
    Check,
    /// List the catalog with unlock state
    List,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CatalogCli {
    #[clap(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CatalogCommand {
    /// Action rewards
    Actions,
    /// Level thresholds and rewards
    Levels {
        #[clap(long, default_value = "20")]
        max: u32,
    },
    /// Achievement catalog
    Achievements,
}
