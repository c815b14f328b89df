use anyhow::{Result, bail};
use blink_core::*;
use blink_runtime::GameHandle;
use rand::prelude::*;
use std::io::Write;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::presenter::Presenter;

/// Plays the human side: clicks every new target after a random reaction time.
///
/// Reaction times above the round time limit make the autopilot lose that round, so the range decides how evenly
/// matched it is against the clock.
pub(crate) struct Autopilot {
    handle: GameHandle,
    rng: SmallRng,
    reaction_ms: RangeInclusive<u64>,
    pending_click: Option<JoinHandle<()>>,
}

impl Autopilot {
    pub fn new(handle: GameHandle, seed: u64, reaction_ms: RangeInclusive<u64>) -> Self {
        Self {
            handle,
            // keep clear of the engine's own stream for the same seed
            rng: SmallRng::seed_from_u64(seed.rotate_left(32)),
            reaction_ms,
            pending_click: None,
        }
    }

    /// Starts a game and drives it until it ends.
    pub async fn play<W: Write>(
        &mut self,
        settings: GameSettings,
        presenter: &mut Presenter<W>,
    ) -> Result<GameResult> {
        let mut events = self.handle.subscribe();
        self.handle.start_game(settings)?;

        loop {
            let update = match events.recv().await {
                Ok(update) => update,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Presenter fell behind, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => bail!("Game service stopped mid-game"),
            };
            presenter.on_event(&update.event, &update.snapshot)?;

            match update.event {
                GameEvent::RoundStart { round, cell } => self.schedule_click(round, cell),
                GameEvent::GameEnded { result } => {
                    self.cancel_click();
                    return Ok(result);
                }
                GameEvent::BoardUpdated => {}
            }
        }
    }

    fn schedule_click(&mut self, round: RoundId, cell: Coord2) {
        self.cancel_click();

        let delay = self.rng.random_range(self.reaction_ms.clone());
        log::debug!("Reacting to round {} in {}ms", round, delay);
        let handle = self.handle.clone();
        self.pending_click = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if handle.click(cell).is_err() {
                log::trace!("Click for round {} dropped, service gone", round);
            }
        }));
    }

    fn cancel_click(&mut self) {
        if let Some(task) = self.pending_click.take() {
            task.abort();
        }
    }
}

impl Drop for Autopilot {
    fn drop(&mut self) {
        self.cancel_click();
    }
}
