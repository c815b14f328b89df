use anyhow::{Context, Result};
use blink_core::{GameSettings, parse_side_count, parse_time_limit};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::Cli;

pub(crate) const DEFAULT_REACTION_MIN_MS: u64 = 250;
pub(crate) const DEFAULT_REACTION_MAX_MS: u64 = 1200;

/// Contents of a `--config` TOML file, every key is optional.
///
/// ```toml
/// side_count = 8
/// time_limit = 900
/// seed = 1234
/// reaction_min_ms = 300
/// reaction_max_ms = 1100
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub side_count: Option<i64>,
    pub time_limit: Option<i64>,
    pub seed: Option<u64>,
    pub reaction_min_ms: Option<u64>,
    pub reaction_max_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything a run needs, after merging the config file with the command line.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunConfig {
    pub settings: GameSettings,
    pub seed: u64,
    pub reaction_ms: RangeInclusive<u64>,
    pub games: u32,
    pub show_board: bool,
    pub json: bool,
}

impl RunConfig {
    /// Command line values win over the file. Unusable game values are dropped so the engine falls back to its
    /// defaults, same as it does for any other config source.
    pub fn new(cli: &Cli, file: FileConfig) -> Self {
        let mut settings = GameSettings {
            side_count: file.side_count,
            time_limit: file.time_limit,
        };

        if let Some(input) = &cli.side_count {
            settings.side_count = match parse_side_count(input) {
                Ok(side_count) => Some(side_count.into()),
                Err(err) => {
                    log::warn!("Ignoring side count {:?}: {}", input, err);
                    None
                }
            };
        }
        if let Some(input) = &cli.time_limit {
            settings.time_limit = match parse_time_limit(input) {
                Ok(time_limit) => Some(time_limit.into()),
                Err(err) => {
                    log::warn!("Ignoring time limit {:?}: {}, using default", input, err);
                    None
                }
            };
        }

        let min = cli
            .reaction_min
            .or(file.reaction_min_ms)
            .unwrap_or(DEFAULT_REACTION_MIN_MS);
        let max = cli
            .reaction_max
            .or(file.reaction_max_ms)
            .unwrap_or(DEFAULT_REACTION_MAX_MS);
        let reaction_ms = if min <= max { min..=max } else { max..=min };

        Self {
            settings,
            seed: cli.seed.or(file.seed).unwrap_or_else(clock_seed),
            reaction_ms,
            games: cli.games.max(1),
            show_board: cli.board,
            json: cli.json,
        }
    }
}

fn clock_seed() -> u64 {
    use web_time::SystemTime;

    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("blink").chain(args.iter().copied()))
    }

    #[test]
    fn file_values_are_used_without_flags() {
        let file = FileConfig::parse("side_count = 6\ntime_limit = 750\nseed = 5\n").unwrap();

        let run = RunConfig::new(&cli(&[]), file);

        assert_eq!(
            run.settings,
            GameSettings::new().with_side_count(6).with_time_limit(750)
        );
        assert_eq!(run.seed, 5);
        assert_eq!(
            run.reaction_ms,
            DEFAULT_REACTION_MIN_MS..=DEFAULT_REACTION_MAX_MS
        );
        assert_eq!(run.games, 1);
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse("time_limit = 750\nseed = 5\n").unwrap();

        let run = RunConfig::new(
            &cli(&["--time-limit", "300", "--seed", "9", "--side-count", "4"]),
            file,
        );

        assert_eq!(
            run.settings,
            GameSettings::new().with_side_count(4).with_time_limit(300)
        );
        assert_eq!(run.seed, 9);
    }

    #[test]
    fn garbage_time_limit_is_dropped() {
        let file = FileConfig::parse("time_limit = 750\n").unwrap();

        let run = RunConfig::new(&cli(&["--time-limit", "x"]), file);

        assert_eq!(run.settings.time_limit, None);
    }

    #[test]
    fn reaction_bounds_are_ordered() {
        let run = RunConfig::new(
            &cli(&["--reaction-min", "900", "--reaction-max", "100"]),
            FileConfig::default(),
        );

        assert_eq!(run.reaction_ms, 100..=900);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("sidecount = 3\n").is_err());
    }
}
