#![no_std]

extern crate alloc;

use core::fmt;
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use picker::*;
pub use settings::*;
pub use types::*;

mod board;
mod cell;
mod engine;
mod error;
mod picker;
mod settings;
mod types;

/// Board side used when none, or an invalid one, is configured.
pub const DEFAULT_SIDE_COUNT: Coord = 10;

/// Round time limit in milliseconds used when none, or an invalid one, is configured.
pub const DEFAULT_TIME_LIMIT_MS: u32 = 1000;

/// Score at which either side wins the game.
pub const WIN_THRESHOLD: Score = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub side_count: Coord,
    pub time_limit_ms: u32,
}

impl GameConfig {
    pub const fn new_unchecked(side_count: Coord, time_limit_ms: u32) -> Self {
        Self {
            side_count,
            time_limit_ms,
        }
    }

    pub fn new(side_count: Coord, time_limit_ms: u32) -> Self {
        let side_count = side_count.clamp(1, Coord::MAX);
        let time_limit_ms = time_limit_ms.clamp(1, u32::MAX);
        Self::new_unchecked(side_count, time_limit_ms)
    }

    pub const fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms as u64)
    }

    pub const fn total_cells(&self) -> usize {
        (self.side_count as usize) * (self.side_count as usize)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_SIDE_COUNT, DEFAULT_TIME_LIMIT_MS)
    }
}

/// How a finished game ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    PlayerWon,
    ComputerWon,
    /// Only reachable when the board runs out of cells with tied scores.
    Draw,
}

impl GameResult {
    /// Message shown to the player once the game is over.
    pub const fn message(self) -> &'static str {
        match self {
            Self::PlayerWon => "Player won",
            Self::ComputerWon => "Computer won",
            Self::Draw => "Draw",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of feeding a click or a timer expiry into the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    NoChange,
    PlayerScored,
    ComputerScored,
    GameEnded(GameResult),
}

impl RoundOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        use RoundOutcome::*;
        match self {
            NoChange => false,
            PlayerScored => true,
            ComputerScored => true,
            GameEnded(_) => true,
        }
    }
}
