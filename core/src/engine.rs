use alloc::vec::{Drain, Vec};
use core::num::Saturating;
use core::ops::Range;
use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Idle -> RoundActive
/// - RoundActive -> RoundActive (next round)
/// - RoundActive -> Ended
/// - any -> Idle (board re-initialized)
/// - any -> RoundActive (game restarted)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No round in flight, waiting for a game to start
    #[default]
    Idle,
    /// Exactly one cell is pending and its timer is running
    RoundActive,
    /// Game over, nothing is scheduled anymore
    Ended(GameResult),
}

impl EngineState {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Self::RoundActive)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Ended(_))
    }

    pub const fn result(self) -> Option<GameResult> {
        match self {
            Self::Ended(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub player: Score,
    pub computer: Score,
}

impl Scores {
    pub const fn total(&self) -> u16 {
        self.player as u16 + self.computer as u16
    }

    /// Winner once either side got to `threshold`.
    pub const fn reached(&self, threshold: Score) -> Option<GameResult> {
        if self.player >= threshold {
            Some(GameResult::PlayerWon)
        } else if self.computer >= threshold {
            Some(GameResult::ComputerWon)
        } else {
            None
        }
    }

    /// Result when the game has to end on the current scores.
    pub const fn leader(&self) -> GameResult {
        if self.player > self.computer {
            GameResult::PlayerWon
        } else if self.computer > self.player {
            GameResult::ComputerWon
        } else {
            GameResult::Draw
        }
    }
}

/// Request for the host to call [`GameEngine::expire_round`] with `round` once `duration` has passed.
///
/// There is at most one of these at any time. It disappears as soon as its round is resolved, which is how a
/// click cancels the timeout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    pub round: RoundId,
    pub duration: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Board contents changed and should be redrawn
    BoardUpdated,
    /// A new cell became the target
    RoundStart { round: RoundId, cell: Coord2 },
    /// A side reached the win threshold, or the board ran out of cells
    GameEnded { result: GameResult },
}

/// Read-only copy of everything a presenter needs to draw the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: GameConfig,
    pub board: Board,
    pub scores: Scores,
    pub state: EngineState,
    pub active_cell: Option<Coord2>,
    pub round: RoundId,
}

impl GameSnapshot {
    pub fn cell_state(&self, coords: Coord2) -> Option<CellState> {
        self.board.get(coords)
    }

    pub fn range(&self) -> Range<Coord> {
        self.board.range()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            config,
            board: Board::new(config.side_count),
            scores: Scores::default(),
            state: EngineState::Idle,
            active_cell: None,
            round: RoundId::default(),
        }
    }
}

/// Round scheduling and scoring state machine.
///
/// The engine has no clock. Whenever a round starts it exposes a [`RoundTimer`] and the host is expected to call
/// [`GameEngine::expire_round`] once it runs out. Clicks and expiries must be fed in one at a time; whichever of
/// the two reaches a pending round first resolves it, the other one becomes a no-op.
///
/// Every transition appends to an internal event outbox that is only emptied by [`GameEngine::drain_events`].
/// Hosts that never drain it keep every event of the engine's lifetime in memory.
#[derive(Clone, Debug)]
pub struct GameEngine<P = RandomCellPicker> {
    config: GameConfig,
    board: Board,
    scores: Scores,
    state: EngineState,
    active_cell: Option<Coord2>,
    round: RoundId,
    timer: Option<RoundTimer>,
    picker: P,
    events: Vec<GameEvent>,
}

impl GameEngine<RandomCellPicker> {
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, RandomCellPicker::new(seed))
    }
}

impl<P: CellPicker> GameEngine<P> {
    pub fn new(config: GameConfig, picker: P) -> Self {
        Self {
            config,
            board: Board::new(config.side_count),
            scores: Scores::default(),
            state: Default::default(),
            active_cell: None,
            round: RoundId::default(),
            timer: None,
            picker,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn result(&self) -> Option<GameResult> {
        self.state.result()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn range(&self) -> Range<Coord> {
        self.board.range()
    }

    /// State of the cell at `coords`, `None` when it is not on the board.
    pub fn cell_state(&self, coords: Coord2) -> Option<CellState> {
        self.board.get(coords)
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn player_score(&self) -> Score {
        self.scores.player
    }

    pub fn computer_score(&self) -> Score {
        self.scores.computer
    }

    pub fn active_cell(&self) -> Option<Coord2> {
        self.active_cell
    }

    /// Id of the most recently started round.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// The timeout the host has to keep armed, if any.
    pub fn round_timer(&self) -> Option<RoundTimer> {
        self.timer
    }

    /// Takes the events emitted since the last call, oldest first.
    pub fn drain_events(&mut self) -> Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            config: self.config,
            board: self.board.clone(),
            scores: self.scores,
            state: self.state,
            active_cell: self.active_cell,
            round: self.round,
        }
    }

    /// Rebuilds an all empty board and goes back to idle, abandoning any game in progress.
    pub fn init_board(&mut self, settings: &GameSettings) {
        self.config = settings.resolve_init(self.config);
        self.reset();
        log::debug!(
            "Board initialized with side {}",
            self.config.side_count
        );
        self.emit(GameEvent::BoardUpdated);
    }

    /// Starts a new game from scratch and runs its first round. Also used to restart a running game.
    pub fn start_game(&mut self, settings: &GameSettings) {
        self.config = settings.resolve_start(self.config);
        self.reset();
        log::debug!(
            "Starting game on a {0}x{0} board, time limit {1}ms",
            self.config.side_count,
            self.config.time_limit_ms
        );
        self.emit(GameEvent::BoardUpdated);
        self.next_round();
    }

    /// Handles the player activating the cell at `coords`.
    ///
    /// Only the pending cell of the current round counts, everything else is silently ignored.
    pub fn on_cell_click(&mut self, coords: Coord2) -> RoundOutcome {
        if !self.state.is_active() || self.active_cell != Some(coords) {
            log::trace!("Ignoring click at {:?}", coords);
            return RoundOutcome::NoChange;
        }
        if self.board.get(coords) != Some(CellState::Pending) {
            return RoundOutcome::NoChange;
        }

        // settle the round and drop its timer before anything else can look at it
        self.board.set(coords, CellState::Won);
        self.timer = None;
        self.active_cell = None;
        self.scores.player = (Saturating(self.scores.player) + Saturating(1)).0;
        log::debug!("Round {} won by player at {:?}", self.round, coords);
        self.emit(GameEvent::BoardUpdated);

        self.check_game_status(RoundOutcome::PlayerScored)
    }

    /// Handles the timer of `round` running out.
    ///
    /// Expiries of rounds that are already resolved, or belong to an older game, are ignored.
    pub fn expire_round(&mut self, round: RoundId) -> RoundOutcome {
        if !self.state.is_active() || round != self.round {
            log::trace!("Ignoring stale timer of round {}", round);
            return RoundOutcome::NoChange;
        }
        let Some(coords) = self.active_cell else {
            return RoundOutcome::NoChange;
        };
        if self.board.get(coords) != Some(CellState::Pending) {
            return RoundOutcome::NoChange;
        }

        self.board.set(coords, CellState::Lost);
        self.timer = None;
        self.active_cell = None;
        self.scores.computer = (Saturating(self.scores.computer) + Saturating(1)).0;
        log::debug!("Round {} lost by player at {:?}", self.round, coords);
        self.emit(GameEvent::BoardUpdated);

        self.check_game_status(RoundOutcome::ComputerScored)
    }

    fn check_game_status(&mut self, scored: RoundOutcome) -> RoundOutcome {
        if let Some(result) = self.scores.reached(WIN_THRESHOLD) {
            self.end_game(result);
            return RoundOutcome::GameEnded(result);
        }

        match self.next_round() {
            Some(result) => RoundOutcome::GameEnded(result),
            None => scored,
        }
    }

    /// Activates a random empty cell, ending the game instead when none is left.
    fn next_round(&mut self) -> Option<GameResult> {
        let candidates: Vec<Coord2> = self.board.empty_cells().collect();
        let picked = self
            .picker
            .pick(&candidates)
            .filter(|&coords| self.board.get(coords) == Some(CellState::Empty))
            .or_else(|| candidates.first().copied());

        let Some(cell) = picked else {
            let result = self.scores.leader();
            log::warn!(
                "No empty cells left at {}:{}, ending game",
                self.scores.player,
                self.scores.computer
            );
            self.end_game(result);
            return Some(result);
        };

        self.round = self.round.next();
        self.board.set(cell, CellState::Pending);
        self.active_cell = Some(cell);
        self.timer = Some(RoundTimer {
            round: self.round,
            duration: self.config.time_limit(),
        });
        self.state = EngineState::RoundActive;
        log::trace!("Round {} started at {:?}", self.round, cell);
        self.emit(GameEvent::RoundStart {
            round: self.round,
            cell,
        });
        None
    }

    fn end_game(&mut self, result: GameResult) {
        if self.state.is_finished() {
            return;
        }

        self.state = EngineState::Ended(result);
        self.timer = None;
        self.active_cell = None;
        log::info!(
            "Game end: {} ({}:{})",
            result,
            self.scores.player,
            self.scores.computer
        );
        self.emit(GameEvent::GameEnded { result });
    }

    fn reset(&mut self) {
        self.state = EngineState::Idle;
        self.timer = None;
        self.active_cell = None;
        self.scores = Scores::default();
        self.board = Board::new(self.config.side_count);
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
