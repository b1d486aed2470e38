use std::time::Duration;

use molehunt_core::observer::RoundObserver;
use molehunt_core::round::{HitOutcome, RoundResult};
use molehunt_core::target::{SlotIndex, Target, TargetKind};

/// Plain-text rendering of round events for the terminal client.
///
/// Keeps its own copy of the board so it can redraw on every change and only
/// prints the countdown when the whole second changes.
#[derive(Debug, Clone)]
pub struct TerminalView {
    board: Vec<Option<TargetKind>>,
    last_second: Option<u64>,
}

impl TerminalView {
    pub fn new(slot_count: usize) -> Self {
        Self {
            board: vec![None; slot_count],
            last_second: None,
        }
    }

    /// One character per slot: `.` empty, `o` ordinary, `*` bonus.
    pub fn board_line(&self) -> String {
        self.board
            .iter()
            .map(|slot| match slot {
                None => ".",
                Some(TargetKind::Ordinary) => "o",
                Some(TargetKind::Bonus) => "*",
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn set(&mut self, slot: SlotIndex, kind: Option<TargetKind>) {
        if let Some(cell) = self.board.get_mut(slot) {
            *cell = kind;
        }
    }

    fn draw(&self) {
        println!("[{}]", self.board_line());
    }
}

fn secs(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64())
}

impl RoundObserver for TerminalView {
    fn on_start(&mut self, remaining: Duration) {
        self.board.iter_mut().for_each(|s| *s = None);
        self.last_second = None;
        println!("Round started: {}s on the clock", secs(remaining));
    }

    fn on_spawn(&mut self, slot: SlotIndex, target: &Target) {
        self.set(slot, Some(target.kind));
        self.draw();
    }

    fn on_despawn(&mut self, slot: SlotIndex) {
        self.set(slot, None);
    }

    fn on_hit(&mut self, outcome: &HitOutcome) {
        self.set(outcome.slot, None);
        match outcome.kind {
            TargetKind::Ordinary => println!("Hit! +{} (score {})", outcome.points, outcome.score),
            TargetKind::Bonus => println!(
                "Golden hit! +{} (score {}), +{} coin, {}s left",
                outcome.points,
                outcome.score,
                outcome.coins_awarded,
                secs(outcome.remaining)
            ),
        }
    }

    fn on_tick(&mut self, remaining: Duration) {
        let second = remaining.as_secs();
        if self.last_second != Some(second) {
            self.last_second = Some(second);
            println!("{}s", secs(remaining));
        }
    }

    fn on_pause(&mut self, remaining: Duration) {
        println!("Paused with {}s left", secs(remaining));
    }

    fn on_resume(&mut self, remaining: Duration) {
        println!("Resumed with {}s left", secs(remaining));
    }

    fn on_round_end(&mut self, result: &RoundResult) {
        self.board.iter_mut().for_each(|s| *s = None);
        println!(
            "Round over: score {}, golden moles {}",
            result.score, result.bonus_hits
        );
    }
}
