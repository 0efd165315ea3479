use crate::prng::Prng;
use crate::schedule::{Ticket, Timer, TimerSlot};
use crate::time::{as_millis_f64, Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What happens to a round when the player signals before the stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PrematurePolicy {
    /// Record a disqualification; it uses up the round.
    #[default]
    ConsumeSlot,
    /// Throw the attempt away and replay the same round.
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReactionConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_rounds"))]
    pub rounds: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_min_delay_ms"))]
    pub min_delay_ms: u64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_delay_ms"))]
    pub max_delay_ms: u64,
    /// Idle "get ready" gap before each round arms.
    #[cfg_attr(feature = "serde", serde(default = "default_between_rounds_ms"))]
    pub between_rounds_ms: u64,
    #[cfg_attr(feature = "serde", serde(default = "default_too_soon_cooldown_ms"))]
    pub too_soon_cooldown_ms: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub premature: PrematurePolicy,
}

fn default_rounds() -> u32 {
    5
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

fn default_between_rounds_ms() -> u64 {
    1000
}

fn default_too_soon_cooldown_ms() -> u64 {
    1500
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            between_rounds_ms: default_between_rounds_ms(),
            too_soon_cooldown_ms: default_too_soon_cooldown_ms(),
            premature: PrematurePolicy::default(),
        }
    }
}

/// Outcome of one reaction round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundResult {
    Valid(Duration),
    Disqualified,
}

impl RoundResult {
    /// Sentinel used by the signed-millisecond form.
    pub const DISQUALIFIED_MS: i64 = -1;

    pub fn as_signed_ms(&self) -> i64 {
        match self {
            RoundResult::Valid(d) => d.as_millis().min(i64::MAX as u128) as i64,
            RoundResult::Disqualified => Self::DISQUALIFIED_MS,
        }
    }

    pub fn from_signed_ms(ms: i64) -> Self {
        if ms < 0 {
            RoundResult::Disqualified
        } else {
            RoundResult::Valid(Duration::from_millis(ms as u64))
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, RoundResult::Valid(_))
    }
}

/// Mean of the valid rounds in milliseconds; 0 when there are none.
pub fn average_valid_ms(results: &[RoundResult]) -> f64 {
    let (sum, n) = results.iter().fold((0.0, 0u32), |(sum, n), r| match r {
        RoundResult::Valid(d) => (sum + as_millis_f64(*d), n + 1),
        RoundResult::Disqualified => (sum, n),
    });
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    /// Between rounds; nothing to react to yet.
    Waiting,
    /// Stimulus pending; signalling now is premature.
    Armed,
    /// Stimulus shown at `since`.
    Go { since: Instant },
    /// Premature signal penalty window.
    TooSoon,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionWake {
    Arm,
    Go,
    CooldownOver,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReactionStep {
    /// Input or wake-up had no effect (wrong state or stale ticket).
    Ignored,
    /// Round armed; the stimulus fires when the timer does.
    Armed(Timer<ReactionWake>),
    /// Stimulus is live; the player should signal now.
    Go,
    /// Valid round recorded; the next round arms when the timer fires.
    Recorded {
        elapsed: Duration,
        next: Timer<ReactionWake>,
    },
    /// Premature signal; cooldown runs until the timer fires.
    TooSoon { cooldown: Timer<ReactionWake> },
    /// Cooldown finished; waiting to arm again.
    Resumed(Timer<ReactionWake>),
    /// All rounds done; the reaction sub-score.
    Complete { average_ms: f64 },
}

/// Reaction-time test: `rounds` delayed stimuli, each answered by a signal.
#[derive(Debug, Clone)]
pub struct ReactionPhase {
    cfg: ReactionConfig,
    state: ReactionState,
    results: Vec<RoundResult>,
    rng: Prng,
    slot: TimerSlot,
}

impl ReactionPhase {
    pub fn new(cfg: ReactionConfig, rng: Prng, epoch: u32) -> Self {
        let results = Vec::with_capacity(cfg.rounds as usize);
        Self {
            cfg,
            state: ReactionState::Waiting,
            results,
            rng,
            slot: TimerSlot::new(epoch),
        }
    }

    pub fn state(&self) -> ReactionState {
        self.state
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    /// 1-based round currently being played.
    pub fn round(&self) -> u32 {
        (self.results.len() as u32 + 1).min(self.cfg.rounds)
    }

    pub fn rounds(&self) -> u32 {
        self.cfg.rounds
    }

    pub fn average_ms(&self) -> f64 {
        average_valid_ms(&self.results)
    }

    pub fn is_done(&self) -> bool {
        self.state == ReactionState::Done
    }

    /// Enter the first "get ready" gap. Returns `Complete` right away for zero rounds.
    pub fn start(&mut self) -> ReactionStep {
        if self.rounds_filled() {
            return self.complete();
        }
        self.state = ReactionState::Waiting;
        ReactionStep::Armed(self.slot.arm(self.gap(), ReactionWake::Arm))
    }

    pub fn on_wake(&mut self, ticket: Ticket, wake: ReactionWake, now: Instant) -> ReactionStep {
        if !self.slot.fire(ticket) {
            return ReactionStep::Ignored;
        }
        match (wake, self.state) {
            (ReactionWake::Arm, ReactionState::Waiting) => {
                self.state = ReactionState::Armed;
                let delay = self
                    .rng
                    .gen_millis(self.cfg.min_delay_ms, self.cfg.max_delay_ms);
                ReactionStep::Armed(
                    self.slot
                        .arm(Duration::from_millis(delay), ReactionWake::Go),
                )
            }
            (ReactionWake::Go, ReactionState::Armed) => {
                self.state = ReactionState::Go { since: now };
                ReactionStep::Go
            }
            (ReactionWake::CooldownOver, ReactionState::TooSoon) => {
                if self.rounds_filled() {
                    return self.complete();
                }
                self.state = ReactionState::Waiting;
                ReactionStep::Resumed(self.slot.arm(self.gap(), ReactionWake::Arm))
            }
            _ => ReactionStep::Ignored,
        }
    }

    /// The player's tap/click/keypress.
    pub fn signal(&mut self, now: Instant) -> ReactionStep {
        match self.state {
            ReactionState::Go { since } => {
                let elapsed = now.saturating_duration_since(since);
                self.results.push(RoundResult::Valid(elapsed));
                if self.rounds_filled() {
                    return self.complete();
                }
                self.state = ReactionState::Waiting;
                let next = self.slot.arm(self.gap(), ReactionWake::Arm);
                ReactionStep::Recorded { elapsed, next }
            }
            ReactionState::Armed => {
                // Drops the pending Go.
                self.slot.cancel();
                if self.cfg.premature == PrematurePolicy::ConsumeSlot {
                    self.results.push(RoundResult::Disqualified);
                }
                self.state = ReactionState::TooSoon;
                let cooldown = self.slot.arm(
                    Duration::from_millis(self.cfg.too_soon_cooldown_ms),
                    ReactionWake::CooldownOver,
                );
                ReactionStep::TooSoon { cooldown }
            }
            ReactionState::Waiting | ReactionState::TooSoon | ReactionState::Done => {
                ReactionStep::Ignored
            }
        }
    }

    /// Drop any pending continuation (phase torn down).
    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    fn gap(&self) -> Duration {
        Duration::from_millis(self.cfg.between_rounds_ms)
    }

    fn rounds_filled(&self) -> bool {
        self.results.len() as u32 >= self.cfg.rounds
    }

    fn complete(&mut self) -> ReactionStep {
        self.slot.cancel();
        self.state = ReactionState::Done;
        let average_ms = self.average_ms();
        tracing::debug!(
            rounds = self.results.len(),
            average_ms,
            "reaction phase complete"
        );
        ReactionStep::Complete { average_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn phase(rounds: u32, premature: PrematurePolicy) -> ReactionPhase {
        let cfg = ReactionConfig {
            rounds,
            premature,
            ..ReactionConfig::default()
        };
        ReactionPhase::new(cfg, Prng::new(11), 0)
    }

    fn expect_timer(step: ReactionStep) -> Timer<ReactionWake> {
        match step {
            ReactionStep::Armed(t) | ReactionStep::Resumed(t) => t,
            ReactionStep::Recorded { next, .. } => next,
            ReactionStep::TooSoon { cooldown } => cooldown,
            other => panic!("expected a timer, got {other:?}"),
        }
    }

    /// Drive one round to the stimulus, starting from a pending `Arm` timer.
    fn reach_go(p: &mut ReactionPhase, arm: Timer<ReactionWake>, t: Instant) -> Instant {
        let go = expect_timer(p.on_wake(arm.ticket, arm.wake, t));
        assert_eq!(go.wake, ReactionWake::Go);
        assert!(go.after >= ms(1000) && go.after <= ms(3000));
        let at = t + go.after;
        assert_eq!(p.on_wake(go.ticket, go.wake, at), ReactionStep::Go);
        at
    }

    #[test]
    fn average_ignores_disqualified_rounds() {
        let results = [
            RoundResult::Valid(ms(200)),
            RoundResult::Disqualified,
            RoundResult::Valid(ms(300)),
            RoundResult::Valid(ms(250)),
        ];
        assert_eq!(average_valid_ms(&results), 250.0);
    }

    #[test]
    fn average_of_no_valid_rounds_is_zero() {
        assert_eq!(average_valid_ms(&[]), 0.0);
        assert_eq!(
            average_valid_ms(&[RoundResult::Disqualified, RoundResult::Disqualified]),
            0.0
        );
    }

    #[test]
    fn signed_ms_uses_minus_one_sentinel() {
        assert_eq!(RoundResult::Disqualified.as_signed_ms(), -1);
        assert_eq!(RoundResult::Valid(ms(312)).as_signed_ms(), 312);
        assert_eq!(RoundResult::from_signed_ms(-1), RoundResult::Disqualified);
        assert_eq!(RoundResult::from_signed_ms(0), RoundResult::Valid(ms(0)));
    }

    #[test]
    fn records_latency_from_stimulus_onset() {
        let mut p = phase(2, PrematurePolicy::ConsumeSlot);
        let t0 = Instant::now();
        let arm = expect_timer(p.start());
        assert_eq!(arm.after, ms(1000));

        let go_at = reach_go(&mut p, arm, t0 + ms(1000));
        let next = match p.signal(go_at + ms(240)) {
            ReactionStep::Recorded { elapsed, next } => {
                assert_eq!(elapsed, ms(240));
                next
            }
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(p.state(), ReactionState::Waiting);
        assert_eq!(p.round(), 2);

        let go_at = reach_go(&mut p, next, go_at + ms(2000));
        assert_eq!(
            p.signal(go_at + ms(260)),
            ReactionStep::Complete { average_ms: 250.0 }
        );
        assert!(p.is_done());
    }

    #[test]
    fn premature_signal_consumes_slot_and_cancels_pending_stimulus() {
        let mut p = phase(1, PrematurePolicy::ConsumeSlot);
        let t0 = Instant::now();
        let arm = expect_timer(p.start());
        let go = expect_timer(p.on_wake(arm.ticket, arm.wake, t0));
        assert_eq!(p.state(), ReactionState::Armed);

        let cooldown = expect_timer(p.signal(t0 + ms(100)));
        assert_eq!(cooldown.after, ms(1500));
        assert_eq!(p.state(), ReactionState::TooSoon);
        assert_eq!(p.results(), &[RoundResult::Disqualified]);

        // The stimulus timer armed before the early click is stale now.
        assert_eq!(
            p.on_wake(go.ticket, go.wake, t0 + go.after),
            ReactionStep::Ignored
        );
        assert_eq!(p.state(), ReactionState::TooSoon);

        // Only round was disqualified: sub-score is exactly zero.
        assert_eq!(
            p.on_wake(cooldown.ticket, cooldown.wake, t0 + ms(1600)),
            ReactionStep::Complete { average_ms: 0.0 }
        );
    }

    #[test]
    fn retry_policy_replays_the_round() {
        let mut p = phase(1, PrematurePolicy::Retry);
        let t0 = Instant::now();
        let arm = expect_timer(p.start());
        let _go = expect_timer(p.on_wake(arm.ticket, arm.wake, t0));
        let cooldown = expect_timer(p.signal(t0 + ms(50)));
        assert!(p.results().is_empty());

        let rearm = expect_timer(p.on_wake(cooldown.ticket, cooldown.wake, t0 + ms(1550)));
        assert_eq!(rearm.wake, ReactionWake::Arm);
        assert_eq!(p.round(), 1);

        let go_at = reach_go(&mut p, rearm, t0 + ms(2550));
        assert_eq!(
            p.signal(go_at + ms(180)),
            ReactionStep::Complete { average_ms: 180.0 }
        );
        assert_eq!(p.results(), &[RoundResult::Valid(ms(180))]);
    }

    #[test]
    fn mixed_rounds_average_only_valid_ones() {
        let mut p = phase(3, PrematurePolicy::ConsumeSlot);
        let mut t = Instant::now();

        let arm = expect_timer(p.start());
        let go_at = reach_go(&mut p, arm, t);
        let next = expect_timer(p.signal(go_at + ms(300)));

        t = go_at + ms(1000);
        let _go = expect_timer(p.on_wake(next.ticket, next.wake, t));
        let cooldown = expect_timer(p.signal(t + ms(10)));
        let next = expect_timer(p.on_wake(cooldown.ticket, cooldown.wake, t + ms(1510)));

        let go_at = reach_go(&mut p, next, t + ms(2510));
        assert_eq!(
            p.signal(go_at + ms(200)),
            ReactionStep::Complete { average_ms: 250.0 }
        );
        assert_eq!(p.results().len(), 3);
    }

    #[test]
    fn signals_outside_armed_or_go_are_ignored() {
        let mut p = phase(1, PrematurePolicy::ConsumeSlot);
        let t0 = Instant::now();
        let _arm = expect_timer(p.start());
        assert_eq!(p.signal(t0), ReactionStep::Ignored);
        assert!(p.results().is_empty());
    }

    #[test]
    fn cancelled_phase_ignores_its_timers() {
        let mut p = phase(1, PrematurePolicy::ConsumeSlot);
        let arm = expect_timer(p.start());
        p.cancel();
        assert_eq!(
            p.on_wake(arm.ticket, arm.wake, Instant::now()),
            ReactionStep::Ignored
        );
        assert_eq!(p.state(), ReactionState::Waiting);
    }

    #[test]
    fn zero_rounds_completes_immediately() {
        let mut p = phase(0, PrematurePolicy::ConsumeSlot);
        assert_eq!(p.start(), ReactionStep::Complete { average_ms: 0.0 });
    }
}
