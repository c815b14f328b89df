use core::ops::{Index, Range};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Square grid of cell states, indexed by `(x, y)`.
///
/// The size lives only in the array shape, so a deserialized board can never disagree with itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<CellState>,
}

impl Board {
    pub fn new(side: Coord) -> Self {
        Self {
            cells: Array2::default((side, side).to_nd_index()),
        }
    }

    /// Side length, the shorter axis if the cells were not square.
    pub fn side(&self) -> Coord {
        let (width, height) = self.cells.dim();
        Coord::try_from(width.min(height)).unwrap_or(Coord::MAX)
    }

    /// Valid values for either coordinate, in ascending order.
    pub fn range(&self) -> Range<Coord> {
        0..self.side()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// All coordinates of the board, `x` major.
    pub fn coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let side = self.side();
        (0..side).flat_map(move |x| (0..side).map(move |y| (x, y)))
    }

    pub fn validate_coords(&self, coords: Coord2) -> Option<Coord2> {
        let side = self.side();
        (coords.0 < side && coords.1 < side).then_some(coords)
    }

    /// State at `coords`, `None` when the coordinates are off the board.
    pub fn get(&self, coords: Coord2) -> Option<CellState> {
        let coords = self.validate_coords(coords)?;
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub(crate) fn set(&mut self, coords: Coord2, state: CellState) {
        self.cells[coords.to_nd_index()] = state;
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.coords().filter(|&coords| self[coords].is_empty())
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }

    pub fn pending_count(&self) -> usize {
        self.count(CellState::Pending)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_SIDE_COUNT)
    }
}

impl Index<Coord2> for Board {
    type Output = CellState;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
