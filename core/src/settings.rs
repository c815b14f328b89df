use serde::{Deserialize, Serialize};

use crate::*;

/// Configuration as handed over by a config source, before validation.
///
/// Any field may be missing or out of range. Resolving settings never fails: bad values are replaced, see
/// [`GameSettings::resolve_start`] and [`GameSettings::resolve_init`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub side_count: Option<i64>,
    pub time_limit: Option<i64>,
}

impl GameSettings {
    pub const fn new() -> Self {
        Self {
            side_count: None,
            time_limit: None,
        }
    }

    pub const fn with_side_count(mut self, side_count: i64) -> Self {
        self.side_count = Some(side_count);
        self
    }

    pub const fn with_time_limit(mut self, time_limit_ms: i64) -> Self {
        self.time_limit = Some(time_limit_ms);
        self
    }

    /// Settings carrying a time limit typed in by a user, dropped if it does not parse.
    pub fn from_time_limit_input(input: &str) -> Self {
        let time_limit = match parse_time_limit(input) {
            Ok(time_limit_ms) => Some(time_limit_ms.into()),
            Err(err) => {
                log::debug!("Ignoring time limit input {:?}: {}", input, err);
                None
            }
        };
        Self {
            side_count: None,
            time_limit,
        }
    }

    /// Side count if present and usable.
    pub fn side_count(&self) -> Option<Coord> {
        self.side_count
            .and_then(|value| Coord::try_from(value).ok())
            .filter(|&value| value >= 1)
    }

    /// Time limit in milliseconds if present and usable.
    pub fn time_limit_ms(&self) -> Option<u32> {
        self.time_limit
            .and_then(|value| u32::try_from(value).ok())
            .filter(|&value| value >= 1)
    }

    /// Configuration for a game started with these settings.
    ///
    /// A missing or invalid time limit falls back to [`DEFAULT_TIME_LIMIT_MS`], not to the previous game's. A
    /// missing or invalid side count keeps the board size of `current`.
    pub fn resolve_start(&self, current: GameConfig) -> GameConfig {
        let side_count = self.side_count().unwrap_or(current.side_count);
        let time_limit_ms = self.time_limit_ms().unwrap_or_else(|| {
            if self.time_limit.is_some() {
                log::debug!("Invalid time limit {:?}, using default", self.time_limit);
            }
            DEFAULT_TIME_LIMIT_MS
        });
        GameConfig::new(side_count, time_limit_ms)
    }

    /// Configuration after re-initializing the board, every missing or invalid field keeps its `current` value.
    pub fn resolve_init(&self, current: GameConfig) -> GameConfig {
        GameConfig::new(
            self.side_count().unwrap_or(current.side_count),
            self.time_limit_ms().unwrap_or(current.time_limit_ms),
        )
    }
}

impl From<GameConfig> for GameSettings {
    fn from(config: GameConfig) -> Self {
        Self {
            side_count: Some(config.side_count.into()),
            time_limit: Some(config.time_limit_ms.into()),
        }
    }
}

/// Parses a time limit in milliseconds as typed by a user: digits only, at least 1.
pub fn parse_time_limit(input: &str) -> Result<u32> {
    parse_positive(input, u32::MAX.into()).map(|value| value as u32)
}

/// Parses a board side count as typed by a user: digits only, between 1 and [`Coord::MAX`].
pub fn parse_side_count(input: &str) -> Result<Coord> {
    parse_positive(input, Coord::MAX.into()).map(|value| value as Coord)
}

fn parse_positive(input: &str, max: u64) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::Empty);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ConfigError::NotANumber);
    }

    let out_of_range = ConfigError::OutOfRange { min: 1, max };
    let value: u64 = input.parse().map_err(|_| out_of_range)?;
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(out_of_range)
    }
}
