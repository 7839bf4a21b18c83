//! builder-ledger: a local-first progression ledger for builders.
//!
//! The ledger owns one builder profile per device (xp, level, credits,
//! achievements, streak, history) and is the only code that mutates it.
//! Presentation layers subscribe to its events and render; they never
//! write state.
//!
//! # Architecture
//!
//! - **Persistence**: the [`core::store::KvStore`] contract (JSON blobs under
//!   string keys). The CLI uses the SQLite backend in `.ledger/ledger.db`;
//!   embedders and tests use [`core::store::MemoryStore`].
//! - **Thin waist**: SQLite access goes through [`core::broker::DbBroker`],
//!   which serializes connections and appends to `ledger.events.jsonl`.
//! - **Write-through**: every successful mutation persists and publishes a
//!   [`core::events::LedgerEvent::ProfileUpdated`] snapshot before returning.
//!
//! # Examples
//!
//! ```bash
//! builder-ledger init
//! builder-ledger session
//! builder-ledger reward module_created
//! builder-ledger achievements check
//! builder-ledger status --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store, broker, config, events, time and error primitives
//! - [`plugins`]: the ledger and its catalogs, features and leaderboard

pub mod core;
pub mod plugins;

mod cli;
mod subsystems;

use crate::cli::{AchievementsCommand, CatalogCommand, Cli, Command, CreditsCommand, XpCommand};
use crate::core::{
    broker::DbBroker,
    config,
    db::{self, SqliteStore},
    error,
    output,
    store::Store,
    time::{self, SystemClock},
};
use crate::plugins::{
    catalog, leaderboard,
    ledger::{Ledger, XpAward},
    profile::EntryKind,
};

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

fn print_json(value: &serde_json::Value) -> Result<(), error::LedgerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_level_ups(award: &XpAward) {
    for level in &award.levels_crossed {
        let reward = catalog::level_reward(*level);
        println!(
            "{} Level {} reached (+{} credits)",
            "▲".bright_green().bold(),
            level.to_string().as_str().bold(),
            reward.credits
        );
        for feature in reward.unlocks {
            println!("  {} unlocked {}", "★".bright_yellow(), feature);
        }
    }
}

fn open_ledger(root: Option<PathBuf>) -> Result<(Store, Ledger<SqliteStore>), error::LedgerError> {
    let start = match root {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let store = Store::discover(&start)?;
    let config = config::load_config(&store.root)?;
    let kv = SqliteStore::open(&store.root, &config.actor)?;
    let ledger = Ledger::open(kv, config, SystemClock)?;
    Ok((store, ledger))
}

fn init_store(dir: Option<PathBuf>) -> Result<(), error::LedgerError> {
    let target = match dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };
    let store = Store::init(&target)?;
    db::initialize_ledger_db(&store.root)?;
    let wrote_config = config::write_default_config(&store.root)?;
    let config = config::load_config(&store.root)?;
    let kv = SqliteStore::open(&store.root, &config.actor)?;
    let ledger = Ledger::open(kv, config, SystemClock)?;

    println!("Ledger store initialized at {}", store.root.display());
    if wrote_config {
        println!("Wrote default config {}", crate::core::schemas::CONFIG_FILE_NAME);
    }
    println!("Builder: {}", ledger.profile().builder_id);
    Ok(())
}

fn print_status(ledger: &Ledger<SqliteStore>, format: &str) -> Result<(), error::LedgerError> {
    let p = ledger.profile();
    let rank = ledger.leaderboard_rank()?;
    if is_json(format) {
        return print_json(&time::command_envelope(
            "status",
            "ok",
            serde_json::json!({
                "device": ledger.config().device,
                "profile": p,
                "title": catalog::title_for_level(p.level),
                "level_progress": ledger.level_progress(),
                "xp_to_next_level": ledger.xp_to_next_level(),
                "rank": rank,
            }),
        ));
    }
    println!(
        "{} {} (device {})",
        "Builder".bold(),
        p.builder_id,
        ledger.config().device
    );
    println!(
        "Level {} · {}  {} {:.0}%",
        p.level.to_string().as_str().bright_cyan().bold(),
        catalog::title_for_level(p.level),
        output::progress_bar(ledger.level_progress(), 20),
        ledger.level_progress() * 100.0
    );
    println!(
        "XP {} ({} to next level)",
        p.xp,
        ledger.xp_to_next_level()
    );
    println!("Credits {}", p.credits.to_string().as_str().bright_yellow());
    println!("Streak {} day(s)", p.streak);
    println!(
        "Achievements {}/{}",
        p.achievements.len(),
        catalog::ACHIEVEMENTS.len()
    );
    if let Some(rank) = rank {
        println!("Rank #{}", rank);
    }
    Ok(())
}

fn run_catalog(command: CatalogCommand) -> Result<(), error::LedgerError> {
    match command {
        CatalogCommand::Actions => {
            for r in catalog::ACTION_REWARDS {
                println!("{:<22} xp {:>5}  credits {:>4}", r.action, r.xp, r.credits);
            }
        }
        CatalogCommand::Levels { max } => {
            for level in 1..=max.max(1) {
                let reward = catalog::level_reward(level);
                let unlocks = if reward.unlocks.is_empty() {
                    String::new()
                } else {
                    format!("  unlocks {}", reward.unlocks.join(", "))
                };
                println!(
                    "L{:<4} xp {:>9}  credits {:>5}{}",
                    level,
                    catalog::xp_for_level(level),
                    reward.credits,
                    unlocks
                );
            }
            let milestones: Vec<String> = catalog::milestone_levels()
                .filter(|l| *l > max)
                .map(|l| l.to_string())
                .collect();
            if !milestones.is_empty() {
                println!("Further unlock milestones at levels {}", milestones.join(", "));
            }
        }
        CatalogCommand::Achievements => {
            for a in catalog::ACHIEVEMENTS {
                println!(
                    "{:<24} {:<24} xp {:>5} credits {:>4}  {}",
                    a.id, a.name, a.xp_reward, a.credit_reward, a.description
                );
            }
        }
    }
    Ok(())
}

pub fn schemas() -> serde_json::Value {
    serde_json::json!({
        "schema_version": "1.0.0",
        "subsystems": subsystems::all_schemas()
    })
}

pub fn run() -> Result<(), error::LedgerError> {
    let cli = Cli::parse();

    let command = match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Schema => return print_json(&schemas()),
        Command::Catalog(catalog_cli) => return run_catalog(catalog_cli.command),
        Command::Init { dir } => return init_store(dir),
        other => other,
    };
    let (store, mut ledger) = open_ledger(cli.root)?;

    match command {
        Command::Status { format } => print_status(&ledger, &format)?,
        Command::Session { format } => {
            let report = ledger.start_session()?;
            if is_json(&format) {
                print_json(&time::command_envelope(
                    "session",
                    "ok",
                    serde_json::json!({ "report": report, "profile": ledger.profile() }),
                ))?;
            } else if report.daily_reward {
                println!(
                    "Welcome back after {} day(s). Streak: {}",
                    report.days_away, report.streak
                );
                if report.streak_bonus {
                    println!("{} Streak bonus awarded", "★".bright_yellow());
                }
                if report.streak_reset {
                    println!("Streak reset; today is day one");
                }
            } else {
                println!("Session recorded. Streak: {}", report.streak);
            }
        }
        Command::Xp(xp_cli) => match xp_cli.command {
            XpCommand::Add { amount, reason } => {
                let award = ledger.add_xp(amount, &reason)?;
                println!("+{} xp ({}), total {}", award.awarded, reason, ledger.profile().xp);
                print_level_ups(&award);
            }
        },
        Command::Credits(credits_cli) => match credits_cli.command {
            CreditsCommand::Earn { amount, reason } => {
                let balance = ledger.earn_credits(amount, &reason)?;
                println!("+{} credits ({}), balance {}", amount, reason, balance);
            }
            CreditsCommand::Spend { amount, item } => {
                let balance = ledger.try_spend_credits(amount, &item)?;
                println!("Spent {} credits on {}, balance {}", amount, item, balance);
            }
            CreditsCommand::Balance => println!("{}", ledger.profile().credits),
        },
        Command::Reward { action, format } => {
            let outcome = ledger.reward_action(&action)?;
            if is_json(&format) {
                print_json(&time::command_envelope(
                    "reward",
                    if outcome.is_some() { "ok" } else { "ignored" },
                    serde_json::json!({ "action": action, "outcome": outcome }),
                ))?;
            } else {
                match outcome {
                    Some(o) => {
                        println!(
                            "{}: +{} xp, +{} credits, balance {}",
                            o.action, o.xp.awarded, o.credits_awarded, o.balance
                        );
                        print_level_ups(&o.xp);
                    }
                    None => println!("Unknown action '{}' ignored", action),
                }
            }
        }
        Command::Achievements(ach_cli) => match ach_cli.command {
            AchievementsCommand::Check => {
                let unlocked = ledger.check_achievements()?;
                if unlocked.is_empty() {
                    println!("No new achievements");
                }
                for a in unlocked {
                    println!(
                        "{} {}: {} (+{} xp, +{} credits)",
                        "🏆".bold(),
                        a.name.bold(),
                        a.description,
                        a.xp_reward,
                        a.credit_reward
                    );
                }
            }
            AchievementsCommand::List => {
                for a in catalog::ACHIEVEMENTS {
                    let mark = if ledger.profile().has_achievement(a.id) {
                        "[x]".green()
                    } else {
                        "[ ]".dimmed()
                    };
                    println!("{} {:<24} {}", mark, a.name, a.description);
                }
            }
        },
        Command::Leaderboard { limit, format } => {
            let mut entries = leaderboard::leaderboard(ledger.store())?;
            entries.truncate(limit);
            if is_json(&format) {
                print_json(&time::command_envelope(
                    "leaderboard",
                    "ok",
                    serde_json::json!({ "entries": entries }),
                ))?;
            } else {
                for e in entries {
                    println!(
                        "#{:<3} {:<16} L{:<4} {:>10} xp  {}",
                        e.rank, e.device, e.level, e.xp, e.title
                    );
                }
            }
        }
        Command::History { limit } => {
            for e in ledger.profile().recent_entries(limit) {
                let amount = match e.kind {
                    EntryKind::Earn => format!("+{}", e.amount).as_str().green(),
                    EntryKind::Spend => format!("-{}", e.amount).as_str().red(),
                };
                println!(
                    "{:<12} {:>8}  {}",
                    output::epoch_ms_z(e.timestamp),
                    amount,
                    output::compact_line(&e.reason, 60)
                );
            }
        }
        Command::Features => {
            let features = ledger.unlocked_features()?;
            if features.is_empty() {
                println!("No features unlocked yet");
            }
            for (feature, stage) in features {
                println!("{:<28} {}", feature, stage);
            }
        }
        Command::Audit { limit } => {
            let broker = DbBroker::new(&store.root);
            for ev in broker.read_events(limit)? {
                println!("{} {:<8} {:<10} {:<8} {}", ev.ts, ev.actor, ev.op, ev.status, ev.db_id);
            }
        }
        Command::Version | Command::Schema | Command::Catalog(_) | Command::Init { .. } => {}
    }
    Ok(())
}
