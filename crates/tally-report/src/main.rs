//! # tally-report
//!
//! Runs the engine over a JSON snapshot and prints reports as JSON.
//!
//! ## Usage
//! ```bash
//! # Reproducible demo data
//! tally-report seed --seed 42 --sales 50
//!
//! # Reports
//! tally-report leaderboard --period week
//! tally-report summary --period month
//! tally-report profile <STAFF_ID>
//! tally-report price recipe <RECIPE_ID>
//!
//! # Append a sale and save the snapshot
//! tally-report record draft.json
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default filter); reports go
//! to stdout.

mod cli;
mod seed;
mod settings;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tally_core::leaderboard;
use tally_core::{Engine, SaleDraft, Snapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Command;
use seed::SeedOptions;
use settings::Settings;

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = cli::parse(&args)?;

    if cli.command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let mut settings = Settings::load(cli.config).context("Failed to load settings")?;
    if let Some(path) = cli.snapshot {
        settings.snapshot_path = path;
    }

    run(cli.command, &settings)
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    let path = settings.snapshot_path.as_path();

    match command {
        Command::Help => println!("{}", cli::USAGE),

        Command::Seed { seed, sales, days } => {
            let options = SeedOptions {
                seed,
                sales,
                days,
                now: Utc::now(),
            };
            let snapshot = seed::demo_snapshot(&options, &settings.engine)
                .context("Failed to generate demo snapshot")?;
            write_snapshot(path, &snapshot)?;

            eprintln!("✓ Wrote {} sales to {}", snapshot.sales.len(), path.display());
            for staff in &snapshot.staff {
                eprintln!("  {}  {}", staff.id, staff.name);
            }
        }

        Command::Leaderboard {
            period,
            metric,
            partitions,
        } => {
            let engine = load_engine(path, settings)?;
            let boards = match partitions {
                Some(n) => leaderboard::leaderboards(
                    &engine.metrics_partitioned(period, n),
                    settings.engine.leaderboard_top_n,
                ),
                None => engine.leaderboards(period),
            };

            match metric {
                Some(metric) => print_json(&boards.board(metric))?,
                None => print_json(&boards)?,
            }
        }

        Command::Summary { period } => {
            let engine = load_engine(path, settings)?;
            print_json(&engine.period_summary(period))?;
        }

        Command::Profile { staff_id } => {
            let engine = load_engine(path, settings)?;
            print_json(&engine.staff_profile(&staff_id)?)?;
        }

        Command::Price { kind, id } => {
            let engine = load_engine(path, settings)?;
            print_json(&engine.price_source(kind, &id)?)?;
        }

        Command::Record { draft } => {
            let contents = std::fs::read_to_string(&draft)
                .with_context(|| format!("Failed to read {}", draft.display()))?;
            let draft: SaleDraft =
                serde_json::from_str(&contents).context("Failed to parse sale draft")?;

            let mut engine = load_engine(path, settings)?;
            let sale = engine.record_sale(draft)?;
            write_snapshot(path, engine.snapshot())?;
            print_json(&sale)?;
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Default filter: `info,tally=debug`. Output goes to stderr so reports on
/// stdout stay valid JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_engine(path: &Path, settings: &Settings) -> Result<Engine> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read snapshot {} (run `tally-report seed` to create one)",
            path.display()
        )
    })?;
    let snapshot: Snapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    info!(
        path = %path.display(),
        staff = snapshot.staff.len(),
        sales = snapshot.sales.len(),
        "Loaded snapshot"
    );

    Engine::with_system_clock(snapshot, settings.engine.clone()).context("Invalid snapshot")
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Snapshot saved");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
