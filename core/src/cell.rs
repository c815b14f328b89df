use serde::{Deserialize, Serialize};

/// State of a single board cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    /// Never been the target of a round in this game.
    #[default]
    Empty,
    /// The live target of the current round.
    Pending,
    /// Clicked by the player in time.
    Won,
    /// Expired before the player clicked it.
    Lost,
}

impl CellState {
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the cell belonged to an already resolved round.
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}
