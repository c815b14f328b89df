use blink_core::*;
use std::ops::Range;
use tokio::sync::{broadcast, mpsc, watch};

use crate::{GameCommand, GameUpdate, Result, RuntimeError};

/// Cloneable front door to a running [`GameService`](crate::GameService).
///
/// Commands are fire-and-forget; their effect shows up as events and in later snapshots.
#[derive(Clone, Debug)]
pub struct GameHandle {
    tx: mpsc::UnboundedSender<GameCommand>,
    events: broadcast::Sender<GameUpdate>,
    state: watch::Receiver<GameSnapshot>,
}

impl GameHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<GameCommand>,
        events: broadcast::Sender<GameUpdate>,
        state: watch::Receiver<GameSnapshot>,
    ) -> Self {
        Self { tx, events, state }
    }

    pub fn init_board(&self, settings: GameSettings) -> Result<()> {
        self.send(GameCommand::InitBoard(settings))
    }

    pub fn start_game(&self, settings: GameSettings) -> Result<()> {
        self.send(GameCommand::StartGame(settings))
    }

    pub fn click(&self, coords: Coord2) -> Result<()> {
        self.send(GameCommand::Click(coords))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(GameCommand::Shutdown)
    }

    /// New receiver for every update emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GameUpdate> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state.borrow().clone()
    }

    pub fn cell_state(&self, coords: Coord2) -> Option<CellState> {
        self.state.borrow().cell_state(coords)
    }

    pub fn scores(&self) -> Scores {
        self.state.borrow().scores
    }

    pub fn player_score(&self) -> Score {
        self.scores().player
    }

    pub fn computer_score(&self) -> Score {
        self.scores().computer
    }

    pub fn range(&self) -> Range<Coord> {
        self.state.borrow().range()
    }

    /// Waits until a published snapshot satisfies `predicate`, checking the current one first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&GameSnapshot) -> bool,
    ) -> Result<GameSnapshot> {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        Ok(snapshot.clone())
    }

    fn send(&self, command: GameCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| RuntimeError::Closed)
    }
}
