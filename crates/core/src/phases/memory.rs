use crate::prng::Prng;
use crate::schedule::{Ticket, Timer, TimerSlot};
use crate::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_start_level"))]
    pub start_level: u32,
    /// Display time granted per digit.
    #[cfg_attr(feature = "serde", serde(default = "default_per_digit_ms"))]
    pub per_digit_ms: u64,
    /// Fixed display time on top of the per-digit share.
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_offset_ms: u64,
    /// How long the correct answer stays up after a miss.
    #[cfg_attr(feature = "serde", serde(default = "default_reveal_ms"))]
    pub reveal_ms: u64,
}

fn default_start_level() -> u32 {
    3
}

fn default_per_digit_ms() -> u64 {
    600
}

fn default_reveal_ms() -> u64 {
    2000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            start_level: default_start_level(),
            per_digit_ms: default_per_digit_ms(),
            display_offset_ms: 0,
            reveal_ms: default_reveal_ms(),
        }
    }
}

impl MemoryConfig {
    pub fn display_duration(&self, level: u32) -> Duration {
        Duration::from_millis(
            (level as u64)
                .saturating_mul(self.per_digit_ms)
                .saturating_add(self.display_offset_ms),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryState {
    /// Sequence on screen; input not accepted yet.
    Showing,
    Entering,
    /// Missed; the answer is being revealed.
    Failed,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryWake {
    InputOpen,
    RevealOver,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryStep {
    Ignored,
    /// A new sequence is on screen; input opens when the timer fires.
    Showing {
        level: u32,
        sequence: String,
        hide: Timer<MemoryWake>,
    },
    /// Sequence hidden; waiting for the player's answer.
    InputOpen,
    /// Miss. `remembered` is the sub-score; it is emitted once the reveal timer fires.
    Missed {
        expected: String,
        remembered: u32,
        reveal: Timer<MemoryWake>,
    },
    Complete { remembered: u32 },
}

/// Digit-span test. Each correct recall lengthens the sequence by one; the first miss ends it.
#[derive(Debug, Clone)]
pub struct MemoryPhase {
    cfg: MemoryConfig,
    level: u32,
    sequence: String,
    state: MemoryState,
    rng: Prng,
    slot: TimerSlot,
}

impl MemoryPhase {
    pub fn new(cfg: MemoryConfig, rng: Prng, epoch: u32) -> Self {
        let level = cfg.start_level;
        Self {
            cfg,
            level,
            sequence: String::new(),
            state: MemoryState::Showing,
            rng,
            slot: TimerSlot::new(epoch),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn state(&self) -> MemoryState {
        self.state
    }

    /// The current sequence. Front ends should only show it while `Showing` or `Failed`.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Digits correctly remembered so far.
    pub fn remembered(&self) -> u32 {
        self.level.saturating_sub(1)
    }

    pub fn start(&mut self) -> MemoryStep {
        self.present()
    }

    pub fn on_wake(&mut self, ticket: Ticket, wake: MemoryWake) -> MemoryStep {
        if !self.slot.fire(ticket) {
            return MemoryStep::Ignored;
        }
        match (wake, self.state) {
            (MemoryWake::InputOpen, MemoryState::Showing) => {
                self.state = MemoryState::Entering;
                MemoryStep::InputOpen
            }
            (MemoryWake::RevealOver, MemoryState::Failed) => {
                self.state = MemoryState::Done;
                let remembered = self.remembered();
                tracing::debug!(remembered, "memory phase complete");
                MemoryStep::Complete { remembered }
            }
            _ => MemoryStep::Ignored,
        }
    }

    /// Exact string comparison against the shown sequence.
    pub fn submit(&mut self, input: &str) -> MemoryStep {
        if self.state != MemoryState::Entering {
            return MemoryStep::Ignored;
        }
        if input == self.sequence {
            self.level = self.level.saturating_add(1);
            return self.present();
        }

        self.state = MemoryState::Failed;
        let reveal = self.slot.arm(
            Duration::from_millis(self.cfg.reveal_ms),
            MemoryWake::RevealOver,
        );
        MemoryStep::Missed {
            expected: self.sequence.clone(),
            remembered: self.remembered(),
            reveal,
        }
    }

    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    fn present(&mut self) -> MemoryStep {
        self.sequence = (0..self.level).map(|_| self.rng.digit()).collect();
        self.state = MemoryState::Showing;
        let hide = self
            .slot
            .arm(self.cfg.display_duration(self.level), MemoryWake::InputOpen);
        MemoryStep::Showing {
            level: self.level,
            sequence: self.sequence.clone(),
            hide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(start_level: u32) -> MemoryPhase {
        let cfg = MemoryConfig {
            start_level,
            ..MemoryConfig::default()
        };
        MemoryPhase::new(cfg, Prng::new(2024), 0)
    }

    fn open_input(p: &mut MemoryPhase, step: MemoryStep) -> String {
        match step {
            MemoryStep::Showing { sequence, hide, .. } => {
                assert_eq!(p.on_wake(hide.ticket, hide.wake), MemoryStep::InputOpen);
                sequence
            }
            other => panic!("expected Showing, got {other:?}"),
        }
    }

    fn miss_and_reveal(p: &mut MemoryPhase, wrong: &str) -> u32 {
        match p.submit(wrong) {
            MemoryStep::Missed { reveal, remembered, .. } => {
                match p.on_wake(reveal.ticket, reveal.wake) {
                    MemoryStep::Complete { remembered: done } => {
                        assert_eq!(done, remembered);
                        done
                    }
                    other => panic!("expected Complete, got {other:?}"),
                }
            }
            other => panic!("expected Missed, got {other:?}"),
        }
    }

    #[test]
    fn display_time_grows_with_level() {
        let cfg = MemoryConfig::default();
        assert_eq!(cfg.display_duration(3), Duration::from_millis(1800));
        assert_eq!(cfg.display_duration(7), Duration::from_millis(4200));

        let padded = MemoryConfig {
            display_offset_ms: 500,
            ..MemoryConfig::default()
        };
        assert_eq!(padded.display_duration(3), Duration::from_millis(2300));
    }

    #[test]
    fn sequence_length_matches_level() {
        let mut p = phase(3);
        match p.start() {
            MemoryStep::Showing { level, sequence, .. } => {
                assert_eq!(level, 3);
                assert_eq!(sequence.len(), 3);
                assert!(sequence.chars().all(|c| c.is_ascii_digit()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn two_successes_then_miss_scores_four() {
        let mut p = phase(3);
        let step = p.start();
        let seq = open_input(&mut p, step);
        let step = p.submit(&seq);
        let seq = open_input(&mut p, step);
        assert_eq!(p.level(), 4);
        let step = p.submit(&seq);
        let _ = open_input(&mut p, step);
        assert_eq!(p.level(), 5);

        assert_eq!(miss_and_reveal(&mut p, "x"), 4);
        assert_eq!(p.state(), MemoryState::Done);
    }

    #[test]
    fn immediate_miss_scores_start_level_minus_one() {
        let mut p = phase(3);
        let step = p.start();
        let _ = open_input(&mut p, step);
        assert_eq!(miss_and_reveal(&mut p, ""), 2);
    }

    #[test]
    fn miss_at_level_one_scores_zero() {
        let mut p = phase(1);
        let step = p.start();
        let seq = open_input(&mut p, step);
        let wrong = if seq == "0" { "1" } else { "0" };
        assert_eq!(miss_and_reveal(&mut p, wrong), 0);
    }

    #[test]
    fn comparison_is_exact() {
        let mut p = phase(3);
        let step = p.start();
        let seq = open_input(&mut p, step);
        match p.submit(&format!(" {seq}")) {
            MemoryStep::Missed { expected, .. } => assert_eq!(expected, seq),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn input_is_ignored_while_sequence_is_shown() {
        let mut p = phase(3);
        let seq = match p.start() {
            MemoryStep::Showing { sequence, .. } => sequence,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(p.submit(&seq), MemoryStep::Ignored);
        assert_eq!(p.level(), 3);
    }

    #[test]
    fn input_is_ignored_after_failure() {
        let mut p = phase(3);
        let step = p.start();
        let seq = open_input(&mut p, step);
        let _ = p.submit("nope");
        assert_eq!(p.submit(&seq), MemoryStep::Ignored);
        assert_eq!(p.state(), MemoryState::Failed);
    }

    #[test]
    fn previous_level_timer_is_stale() {
        let mut p = phase(3);
        let first_hide = match p.start() {
            MemoryStep::Showing { hide, .. } => hide,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(p.on_wake(first_hide.ticket, first_hide.wake), MemoryStep::InputOpen);
        let seq = p.sequence().to_string();
        let _ = p.submit(&seq);
        // Level 4 is showing; replaying the level-3 wake must not open input.
        assert_eq!(p.on_wake(first_hide.ticket, first_hide.wake), MemoryStep::Ignored);
        assert_eq!(p.state(), MemoryState::Showing);
    }
}
