use blink_core::*;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::GameHandle;

/// How many events a slow subscriber may fall behind before it starts skipping.
pub const EVENT_CAPACITY: usize = 64;

/// Commands accepted by the [`GameService`] loop.
#[derive(Clone, Debug, PartialEq)]
pub enum GameCommand {
    InitBoard(GameSettings),
    StartGame(GameSettings),
    Click(Coord2),
    /// Stop the loop, dropping whatever game is in progress.
    Shutdown,
}

/// One event as seen by subscribers, together with the state right after the step that emitted it.
///
/// Events emitted by the same step share one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct GameUpdate {
    pub event: GameEvent,
    pub snapshot: Arc<GameSnapshot>,
}

#[derive(Copy, Clone, Debug)]
struct ArmedTimer {
    round: RoundId,
    deadline: Instant,
}

/// Owns a [`GameEngine`] and serializes every command and timer expiry against it.
///
/// The loop is biased toward the command inbox: when a click and the round deadline are both ready in the same
/// pass the click is handled first, so the player gets the point and the expiry finds nothing left to resolve.
pub struct GameService<P> {
    engine: GameEngine<P>,
    cmd_rx: mpsc::UnboundedReceiver<GameCommand>,
    event_tx: broadcast::Sender<GameUpdate>,
    state_tx: watch::Sender<GameSnapshot>,
    timer: Option<ArmedTimer>,
}

impl<P> GameService<P>
where
    P: CellPicker + Send + 'static,
{
    /// Spawns the service loop on the current tokio runtime.
    pub fn spawn(engine: GameEngine<P>) -> (GameHandle, JoinHandle<()>) {
        let (tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(engine.snapshot());

        let handle = GameHandle::new(tx, event_tx.clone(), state_rx);
        let mut service = Self {
            engine,
            cmd_rx,
            event_tx,
            state_tx,
            timer: None,
        };
        let join = tokio::spawn(async move { service.run().await });
        (handle, join)
    }

    async fn run(&mut self) {
        log::info!("Game service loop started");
        loop {
            let armed = self.timer;
            let deadline = armed.map_or_else(Instant::now, |timer| timer.deadline);

            tokio::select! {
                biased;

                command = self.cmd_rx.recv() => match command {
                    Some(GameCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = sleep_until(deadline), if armed.is_some() => {
                    if let Some(timer) = armed {
                        self.fire_timer(timer.round);
                    }
                }
            }

            self.publish();
        }
        log::info!("Game service loop terminating");
    }

    fn handle_command(&mut self, command: GameCommand) {
        match command {
            GameCommand::InitBoard(settings) => self.engine.init_board(&settings),
            GameCommand::StartGame(settings) => self.engine.start_game(&settings),
            GameCommand::Click(coords) => {
                let outcome = self.engine.on_cell_click(coords);
                log::trace!("Click at {:?}: {:?}", coords, outcome);
            }
            GameCommand::Shutdown => {}
        }
    }

    fn fire_timer(&mut self, round: RoundId) {
        self.timer = None;
        let outcome = self.engine.expire_round(round);
        log::trace!("Timer of round {} fired: {:?}", round, outcome);
    }

    /// Brings the armed timer in line with the engine and pushes out whatever changed.
    fn publish(&mut self) {
        match self.engine.round_timer() {
            Some(requested) if self.timer.map(|timer| timer.round) != Some(requested.round) => {
                self.timer = Some(ArmedTimer {
                    round: requested.round,
                    deadline: Instant::now() + requested.duration,
                });
            }
            Some(_) => {}
            None => self.timer = None,
        }

        let events: Vec<GameEvent> = self.engine.drain_events().collect();
        if events.is_empty() {
            return;
        }

        let snapshot = Arc::new(self.engine.snapshot());
        // snapshot goes out first so anyone reacting to an event reads at least that state
        self.state_tx.send_replace(GameSnapshot::clone(&snapshot));
        for event in events {
            log::debug!("Event {:?}", event);
            // no subscribers is fine, the watch channel still carries the state
            let _ = self.event_tx.send(GameUpdate {
                event,
                snapshot: Arc::clone(&snapshot),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeError;
    use std::time::Duration;
    use tokio::time::advance;

    fn spawn(config: GameConfig) -> (GameHandle, JoinHandle<()>) {
        GameService::spawn(GameEngine::with_seed(config, 9))
    }

    async fn next_round(events: &mut broadcast::Receiver<GameUpdate>) -> (RoundId, Coord2) {
        loop {
            if let GameEvent::RoundStart { round, cell } = events.recv().await.unwrap().event {
                return (round, cell);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expired_round_credits_computer() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut events = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let (_, cell) = next_round(&mut events).await;
        let started = Instant::now();
        let snapshot = handle.wait_for(|s| s.scores.computer >= 1).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(DEFAULT_TIME_LIMIT_MS.into()));
        assert_eq!(snapshot.scores.player, 0);
        assert_eq!(snapshot.cell_state(cell), Some(CellState::Lost));
    }

    #[tokio::test(start_paused = true)]
    async fn click_credits_player() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut events = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let (_, cell) = next_round(&mut events).await;
        handle.click(cell).unwrap();
        let snapshot = handle.wait_for(|s| s.scores.player == 1).await.unwrap();

        assert_eq!(snapshot.scores.computer, 0);
        assert_eq!(snapshot.cell_state(cell), Some(CellState::Won));
        assert!(snapshot.active_cell.is_some());
        assert_ne!(snapshot.active_cell, Some(cell));
        assert_eq!(handle.player_score(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn click_queued_at_deadline_wins() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut events = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let (_, cell) = next_round(&mut events).await;
        handle.click(cell).unwrap();
        advance(Duration::from_millis(DEFAULT_TIME_LIMIT_MS.into())).await;
        let snapshot = handle.wait_for(|s| s.scores.total() >= 1).await.unwrap();

        assert_eq!(snapshot.scores, Scores { player: 1, computer: 0 });
        assert_eq!(snapshot.cell_state(cell), Some(CellState::Won));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_previous_timer() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut events = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let (first, _) = next_round(&mut events).await;
        advance(Duration::from_millis(600)).await;
        handle.start_game(GameSettings::new()).unwrap();
        let (second, _) = next_round(&mut events).await;
        let restarted = Instant::now();
        let snapshot = handle.wait_for(|s| s.scores.computer >= 1).await.unwrap();

        assert!(second > first);
        assert!(restarted.elapsed() >= Duration::from_millis(DEFAULT_TIME_LIMIT_MS.into()));
        assert_eq!(snapshot.scores, Scores { player: 0, computer: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn events_reach_every_subscriber() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut a = handle.subscribe();
        let mut b = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();

        for events in [&mut a, &mut b] {
            assert_eq!(events.recv().await.unwrap().event, GameEvent::BoardUpdated);
            assert!(matches!(
                events.recv().await.unwrap().event,
                GameEvent::RoundStart { .. }
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn late_reader_sees_state_of_each_update() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut updates = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let started = handle.wait_for(|s| s.active_cell.is_some()).await.unwrap();
        let cell = started.active_cell.unwrap();
        handle.click(cell).unwrap();
        handle.wait_for(|s| s.scores.player == 1).await.unwrap();

        let reset = updates.recv().await.unwrap();
        let first_round = updates.recv().await.unwrap();
        let clicked = updates.recv().await.unwrap();

        assert_eq!(reset.event, GameEvent::BoardUpdated);
        assert_eq!(reset.snapshot.scores, Scores::default());
        assert_eq!(reset.snapshot.cell_state(cell), Some(CellState::Pending));
        assert!(Arc::ptr_eq(&reset.snapshot, &first_round.snapshot));
        assert_eq!(clicked.event, GameEvent::BoardUpdated);
        assert_eq!(clicked.snapshot.cell_state(cell), Some(CellState::Won));
        assert_eq!(clicked.snapshot.scores.player, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_game_stays_finished() {
        let (handle, _join) = spawn(GameConfig::default());
        let mut events = handle.subscribe();

        handle.start_game(GameSettings::new()).unwrap();
        let result = loop {
            match events.recv().await.unwrap().event {
                GameEvent::RoundStart { cell, .. } => handle.click(cell).unwrap(),
                GameEvent::GameEnded { result } => break result,
                GameEvent::BoardUpdated => {}
            }
        };
        let ended = handle.wait_for(|s| s.state.is_finished()).await.unwrap();

        handle.click((0, 0)).unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(result, GameResult::PlayerWon);
        assert_eq!(ended.scores, Scores { player: WIN_THRESHOLD, computer: 0 });
        assert_eq!(handle.snapshot(), ended);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn init_board_resizes() {
        let (handle, _join) = spawn(GameConfig::default());

        handle
            .init_board(GameSettings::new().with_side_count(5))
            .unwrap();
        let snapshot = handle.wait_for(|s| s.range() == (0..5)).await.unwrap();

        assert!(snapshot.state.is_idle());
        assert_eq!(handle.cell_state((4, 4)), Some(CellState::Empty));
        assert_eq!(handle.cell_state((5, 0)), None);
    }

    #[tokio::test]
    async fn handle_reports_stopped_service() {
        let (handle, join) = spawn(GameConfig::default());

        handle.shutdown().unwrap();
        join.await.unwrap();

        assert_eq!(handle.click((0, 0)), Err(RuntimeError::Closed));
        assert_eq!(
            handle.start_game(GameSettings::new()),
            Err(RuntimeError::Closed)
        );
    }
}
