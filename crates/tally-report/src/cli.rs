//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tally_core::{Metric, ReportPeriod, SourceKind};

pub const USAGE: &str = "\
Tally - commission & sales reports

Usage: tally-report [OPTIONS] <COMMAND>

Commands:
  seed                     Write a demo snapshot
      --seed <N>           RNG seed (default: 42)
      --sales <N>          Number of sales (default: 50)
      --days <N>           Spread sales over N days (default: 14)
  leaderboard              Rank staff for a period
      --period <P>         today | week | month (default: week)
      --metric <M>         revenue | profit | orders | margin | commission
      --partitions <N>     Aggregate in N parallel chunks
  summary                  Totals for a period
      --period <P>         today | week | month (default: week)
  profile <STAFF_ID>       Lifetime and this-week figures for one staff member
  price <KIND> <ID>        Current price of an item, recipe or package
  record <DRAFT_JSON>      Record a sale and save the snapshot

Options:
  -c, --config <PATH>      Settings file (default: platform config dir)
  -s, --snapshot <PATH>    Snapshot file (overrides settings)
  -h, --help               Show this help message";

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Seed {
        seed: u64,
        sales: usize,
        days: i64,
    },
    Leaderboard {
        period: ReportPeriod,
        metric: Option<Metric>,
        partitions: Option<usize>,
    },
    Summary {
        period: ReportPeriod,
    },
    Profile {
        staff_id: String,
    },
    Price {
        kind: SourceKind,
        id: String,
    },
    Record {
        draft: PathBuf,
    },
    Help,
}

/// Parses arguments, program name excluded.
pub fn parse(args: &[String]) -> Result<Cli> {
    let mut config = None;
    let mut snapshot = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut seed = 42;
    let mut sales = 50;
    let mut days = 14;
    let mut period = ReportPeriod::Week;
    let mut metric = None;
    let mut partitions = None;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("{} needs a value", flag))
        };

        match flag {
            "--config" | "-c" => config = Some(PathBuf::from(value()?)),
            "--snapshot" | "-s" => snapshot = Some(PathBuf::from(value()?)),
            "--seed" => seed = value()?.parse().context("--seed must be a number")?,
            "--sales" => sales = value()?.parse().context("--sales must be a number")?,
            "--days" => days = value()?.parse().context("--days must be a number")?,
            "--period" | "-p" => period = value()?.parse()?,
            "--metric" | "-m" => metric = Some(value()?.parse()?),
            "--partitions" => {
                partitions = Some(value()?.parse().context("--partitions must be a number")?)
            }
            "--help" | "-h" => positional = vec!["help"],
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [] | ["help", ..] => Command::Help,
        ["seed"] => Command::Seed { seed, sales, days },
        ["leaderboard"] => Command::Leaderboard {
            period,
            metric,
            partitions,
        },
        ["summary"] => Command::Summary { period },
        ["profile", staff_id] => Command::Profile {
            staff_id: staff_id.to_string(),
        },
        ["price", kind, id] => Command::Price {
            kind: parse_kind(kind)?,
            id: id.to_string(),
        },
        ["record", draft] => Command::Record {
            draft: PathBuf::from(draft),
        },
        [name, ..] => bail!("Unknown command or wrong arguments: {}", name),
    };

    Ok(Cli {
        config,
        snapshot,
        command,
    })
}

fn parse_kind(kind: &str) -> Result<SourceKind> {
    match kind.to_ascii_lowercase().as_str() {
        "item" => Ok(SourceKind::Item),
        "recipe" => Ok(SourceKind::Recipe),
        "package" => Ok(SourceKind::Package),
        other => bail!("Unknown kind {} (expected item, recipe or package)", other),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&args("seed")).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(
            cli.command,
            Command::Seed {
                seed: 42,
                sales: 50,
                days: 14
            }
        );
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_options_anywhere() {
        let cli = parse(&args("--snapshot saloon.json leaderboard --period today -m margin")).unwrap();
        assert_eq!(cli.snapshot, Some(PathBuf::from("saloon.json")));
        assert_eq!(
            cli.command,
            Command::Leaderboard {
                period: ReportPeriod::Today,
                metric: Some(Metric::Margin),
                partitions: None,
            }
        );
    }

    #[test]
    fn test_positional_commands() {
        assert_eq!(
            parse(&args("price Recipe old-fashioned")).unwrap().command,
            Command::Price {
                kind: SourceKind::Recipe,
                id: "old-fashioned".to_string()
            }
        );
        assert_eq!(
            parse(&args("profile jake")).unwrap().command,
            Command::Profile {
                staff_id: "jake".to_string()
            }
        );
    }

    #[test]
    fn test_bad_input() {
        assert!(parse(&args("summary --period fortnight")).is_err());
        assert!(parse(&args("seed --seed")).is_err());
        assert!(parse(&args("profile")).is_err());
        assert!(parse(&args("summary --verbose")).is_err());
        assert!(parse(&args("price drink whiskey")).is_err());
    }
}
