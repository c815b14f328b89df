use anyhow::Result;
use blink_core::*;
use serde_json::json;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Prints game progress to stdout, either as text or as JSON lines.
pub(crate) struct Presenter<W> {
    out: W,
    show_board: bool,
    json: bool,
}

impl Presenter<io::Stdout> {
    pub fn stdout(show_board: bool, json: bool) -> Self {
        Self::new(io::stdout(), show_board, json)
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, show_board: bool, json: bool) -> Self {
        Self {
            out,
            show_board,
            json,
        }
    }

    pub fn on_event(&mut self, event: &GameEvent, snapshot: &GameSnapshot) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string(event)?)?;
            return Ok(());
        }

        match *event {
            GameEvent::BoardUpdated if self.show_board => {
                write!(self.out, "{}", render_board(snapshot))?;
            }
            GameEvent::BoardUpdated => {}
            GameEvent::RoundStart { round, cell } => {
                writeln!(
                    self.out,
                    "Round {}: target ({}, {})",
                    round, cell.0, cell.1
                )?;
            }
            // announced by `notify`
            GameEvent::GameEnded { .. } => {}
        }
        Ok(())
    }

    /// Announces the winner of a finished game.
    pub fn notify(&mut self, game: u32, result: GameResult, scores: Scores) -> Result<()> {
        if self.json {
            let line = json!({
                "game": game,
                "result": result,
                "player": scores.player,
                "computer": scores.computer,
            });
            writeln!(self.out, "{}", line)?;
        } else {
            writeln!(
                self.out,
                "Game {}: {} ({}:{})",
                game, result, scores.player, scores.computer
            )?;
        }
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn cell_glyph(state: CellState) -> char {
    match state {
        CellState::Empty => '.',
        CellState::Pending => '@',
        CellState::Won => '+',
        CellState::Lost => 'x',
    }
}

/// Text picture of the board, one line per `y` with the score on top.
pub(crate) fn render_board(snapshot: &GameSnapshot) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "player {} : {} computer",
        snapshot.scores.player, snapshot.scores.computer
    );
    for y in snapshot.range() {
        let row: String = snapshot
            .range()
            .map(|x| snapshot.cell_state((x, y)).map_or(' ', cell_glyph))
            .collect();
        let _ = writeln!(text, "{}", row);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> GameSnapshot {
        let mut engine = GameEngine::new(GameConfig::new(3, 100), |candidates: &[Coord2]| {
            candidates.first().copied()
        });
        engine.start_game(&GameSettings::new());
        engine.on_cell_click((0, 0));
        engine.expire_round(engine.round());
        engine.snapshot()
    }

    #[test]
    fn board_shows_every_state() {
        let text = render_board(&snapshot());

        assert_eq!(text, "player 1 : 1 computer\n+..\nx..\n@..\n");
    }

    #[test]
    fn json_mode_prints_event_lines() {
        let mut presenter = Presenter::new(Vec::new(), false, true);

        presenter
            .on_event(&GameEvent::BoardUpdated, &snapshot())
            .unwrap();
        presenter
            .notify(1, GameResult::ComputerWon, Scores { player: 3, computer: 10 })
            .unwrap();

        let out = String::from_utf8(presenter.into_inner()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("\"BoardUpdated\""));
        let summary: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(summary["result"], "ComputerWon");
        assert_eq!(summary["computer"], 10);
    }

    #[test]
    fn text_mode_announces_winner() {
        let mut presenter = Presenter::new(Vec::new(), false, false);

        presenter
            .notify(2, GameResult::PlayerWon, Scores { player: 10, computer: 4 })
            .unwrap();

        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(out, "Game 2: Player won (10:4)\n");
    }
}
