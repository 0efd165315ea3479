//! Session controller.
//!
//! A [`Session`] owns the current phase as an explicit [`Stage`] value and
//! threads each phase's sub-score into the next one. Front ends feed it
//! player input and timer wake-ups and act on the [`Effect`]s it returns:
//! schedule a timer, cancel whatever is pending, or render a [`Notice`].
//!
//! Every phase gets a fresh epoch. Timers carry the epoch they were issued
//! under, so a wake-up that outlives its phase is dropped here before it can
//! reach the phase that replaced it.

use crate::config::GameConfig;
use crate::history::HistoryEntry;
use crate::phases::{
    MathPhase, MathProblem, MathStep, MemoryPhase, MemoryStep, MemoryWake, PhaseKind,
    PrematurePolicy, ReactionPhase, ReactionStep, ReactionWake, RoundResult,
};
use crate::prng::Prng;
use crate::schedule::{Ticket, Timer};
use crate::scoring::{AgeBreakdown, ScoreBundle};
use crate::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Reaction(ReactionWake),
    Memory(MemoryWake),
}

pub type SessionTimer = Timer<Wake>;

/// Something the player should see.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    PhaseStarted(PhaseKind),
    GetReady { round: u32, rounds: u32 },
    /// Armed; the stimulus is coming.
    Wait,
    Stimulus,
    ReactionRecorded { round: u32, elapsed: Duration },
    TooSoon { disqualified: bool, cooldown: Duration },
    SequenceShown {
        level: u32,
        sequence: String,
        visible_for: Duration,
    },
    InputOpen { level: u32 },
    SequenceMissed { expected: String, remembered: u32 },
    ProblemPresented {
        index: usize,
        total: usize,
        problem: MathProblem,
    },
    WrongAnswer { attempts: u32 },
    ProblemSolved { index: usize, elapsed: Duration },
    PhaseComplete { phase: PhaseKind, score: f64 },
    Finished(Report),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Schedule(SessionTimer),
    /// Drop every pending timer (the phase that issued them is gone).
    CancelPending,
    Notice(Notice),
}

/// Everything a finished session produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Report {
    pub scores: ScoreBundle,
    pub breakdown: AgeBreakdown,
    pub reaction_rounds: Vec<RoundResult>,
    pub problems: Vec<MathProblem>,
}

impl Report {
    pub fn brain_age(&self) -> u32 {
        self.breakdown.brain_age
    }

    pub fn history_entry(&self, recorded_at_ms: u64) -> HistoryEntry {
        HistoryEntry {
            recorded_at_ms,
            scores: self.scores,
            brain_age: self.brain_age(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stage {
    Welcome,
    Reaction(ReactionPhase),
    Memory(MemoryPhase),
    Math(MathPhase),
    Results(Report),
}

impl Stage {
    pub fn phase(&self) -> Option<PhaseKind> {
        match self {
            Stage::Reaction(_) => Some(PhaseKind::Reaction),
            Stage::Memory(_) => Some(PhaseKind::Memory),
            Stage::Math(_) => Some(PhaseKind::Math),
            Stage::Welcome | Stage::Results(_) => None,
        }
    }
}

// Sub-scores of phases already finished in this run.
#[derive(Debug, Clone, Default)]
struct Partial {
    reaction_ms: f64,
    reaction_rounds: Vec<RoundResult>,
    memory_digits: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    cfg: GameConfig,
    stage: Stage,
    epoch: u32,
    rng: Prng,
    partial: Partial,
}

impl Session {
    pub fn new(cfg: GameConfig, rng: Prng) -> Self {
        Self {
            cfg,
            stage: Stage::Welcome,
            epoch: 0,
            rng,
            partial: Partial::default(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn report(&self) -> Option<&Report> {
        match &self.stage {
            Stage::Results(r) => Some(r),
            _ => None,
        }
    }

    /// Begin a run from the welcome or results screen. Mid-run this restarts.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = if self.stage.phase().is_some() {
            self.abandon()
        } else {
            Vec::new()
        };
        self.partial = Partial::default();
        self.epoch = self.epoch.wrapping_add(1);

        let mut phase = ReactionPhase::new(self.cfg.reaction.clone(), self.rng.fork(), self.epoch);
        let step = phase.start();
        self.stage = Stage::Reaction(phase);
        tracing::debug!(epoch = self.epoch, "session started");

        effects.push(Effect::Notice(Notice::PhaseStarted(PhaseKind::Reaction)));
        effects.extend(self.on_reaction(step));
        effects
    }

    /// Tear down the running phase and go back to the welcome screen.
    pub fn abandon(&mut self) -> Vec<Effect> {
        match &mut self.stage {
            Stage::Reaction(p) => p.cancel(),
            Stage::Memory(p) => p.cancel(),
            Stage::Math(_) | Stage::Welcome | Stage::Results(_) => {}
        }
        if let Some(kind) = self.stage.phase() {
            tracing::debug!(phase = kind.label(), "phase abandoned");
        }
        self.stage = Stage::Welcome;
        self.epoch = self.epoch.wrapping_add(1);
        vec![Effect::CancelPending]
    }

    /// Tap/click/keypress. Only the reaction phase listens.
    pub fn signal(&mut self, now: Instant) -> Vec<Effect> {
        let step = match &mut self.stage {
            Stage::Reaction(p) => p.signal(now),
            _ => return Vec::new(),
        };
        self.on_reaction(step)
    }

    /// Typed answer for the memory or math phase.
    pub fn submit(&mut self, input: &str, now: Instant) -> Vec<Effect> {
        if let Stage::Memory(p) = &mut self.stage {
            let step = p.submit(input);
            return self.on_memory(step, now);
        }
        let step = match &mut self.stage {
            Stage::Math(p) => p.submit(input, now),
            _ => return Vec::new(),
        };
        self.on_math(step)
    }

    pub fn wake(&mut self, ticket: Ticket, wake: Wake, now: Instant) -> Vec<Effect> {
        if ticket.epoch() != self.epoch {
            tracing::debug!(
                ticket_epoch = ticket.epoch(),
                epoch = self.epoch,
                "dropping stale wake"
            );
            return Vec::new();
        }
        match wake {
            Wake::Reaction(w) => {
                let step = match &mut self.stage {
                    Stage::Reaction(p) => p.on_wake(ticket, w, now),
                    _ => return Vec::new(),
                };
                self.on_reaction(step)
            }
            Wake::Memory(w) => {
                let step = match &mut self.stage {
                    Stage::Memory(p) => p.on_wake(ticket, w),
                    _ => return Vec::new(),
                };
                self.on_memory(step, now)
            }
        }
    }

    fn on_reaction(&mut self, step: ReactionStep) -> Vec<Effect> {
        let Stage::Reaction(phase) = &self.stage else {
            return Vec::new();
        };
        let get_ready = Notice::GetReady {
            round: phase.round(),
            rounds: phase.rounds(),
        };

        match step {
            ReactionStep::Ignored => Vec::new(),
            ReactionStep::Armed(t) => {
                let notice = match t.wake {
                    ReactionWake::Arm => get_ready,
                    _ => Notice::Wait,
                };
                vec![Effect::Notice(notice), schedule(t.map(Wake::Reaction))]
            }
            ReactionStep::Go => vec![Effect::Notice(Notice::Stimulus)],
            ReactionStep::Recorded { elapsed, next } => vec![
                Effect::Notice(Notice::ReactionRecorded {
                    round: phase.results().len() as u32,
                    elapsed,
                }),
                Effect::Notice(get_ready),
                schedule(next.map(Wake::Reaction)),
            ],
            ReactionStep::TooSoon { cooldown } => vec![
                Effect::Notice(Notice::TooSoon {
                    disqualified: self.cfg.reaction.premature == PrematurePolicy::ConsumeSlot,
                    cooldown: cooldown.after,
                }),
                schedule(cooldown.map(Wake::Reaction)),
            ],
            ReactionStep::Resumed(t) => {
                vec![Effect::Notice(get_ready), schedule(t.map(Wake::Reaction))]
            }
            ReactionStep::Complete { average_ms } => {
                self.partial.reaction_ms = average_ms;
                self.partial.reaction_rounds = phase.results().to_vec();
                let mut effects = vec![
                    Effect::CancelPending,
                    Effect::Notice(Notice::PhaseComplete {
                        phase: PhaseKind::Reaction,
                        score: average_ms,
                    }),
                ];
                effects.extend(self.enter_memory());
                effects
            }
        }
    }

    fn enter_memory(&mut self) -> Vec<Effect> {
        self.epoch = self.epoch.wrapping_add(1);
        let mut phase = MemoryPhase::new(self.cfg.memory.clone(), self.rng.fork(), self.epoch);
        let step = phase.start();
        self.stage = Stage::Memory(phase);

        let mut effects = vec![Effect::Notice(Notice::PhaseStarted(PhaseKind::Memory))];
        // The first step never completes, so `now` is irrelevant here.
        effects.extend(self.on_memory_step(step));
        effects
    }

    fn on_memory(&mut self, step: MemoryStep, now: Instant) -> Vec<Effect> {
        if let MemoryStep::Complete { remembered } = step {
            self.partial.memory_digits = remembered;
            let mut effects = vec![
                Effect::CancelPending,
                Effect::Notice(Notice::PhaseComplete {
                    phase: PhaseKind::Memory,
                    score: remembered as f64,
                }),
            ];
            effects.extend(self.enter_math(now));
            return effects;
        }
        self.on_memory_step(step)
    }

    fn on_memory_step(&mut self, step: MemoryStep) -> Vec<Effect> {
        match step {
            MemoryStep::Ignored | MemoryStep::Complete { .. } => Vec::new(),
            MemoryStep::Showing {
                level,
                sequence,
                hide,
            } => vec![
                Effect::Notice(Notice::SequenceShown {
                    level,
                    sequence,
                    visible_for: hide.after,
                }),
                schedule(hide.map(Wake::Memory)),
            ],
            MemoryStep::InputOpen => {
                let level = match &self.stage {
                    Stage::Memory(p) => p.level(),
                    _ => 0,
                };
                vec![Effect::Notice(Notice::InputOpen { level })]
            }
            MemoryStep::Missed {
                expected,
                remembered,
                reveal,
            } => vec![
                Effect::Notice(Notice::SequenceMissed {
                    expected,
                    remembered,
                }),
                schedule(reveal.map(Wake::Memory)),
            ],
        }
    }

    fn enter_math(&mut self, now: Instant) -> Vec<Effect> {
        self.epoch = self.epoch.wrapping_add(1);
        let mut phase = MathPhase::new(&self.cfg.math, &mut self.rng);
        let step = phase.start(now);
        self.stage = Stage::Math(phase);

        let mut effects = vec![Effect::Notice(Notice::PhaseStarted(PhaseKind::Math))];
        effects.extend(self.on_math(step));
        effects
    }

    fn on_math(&mut self, step: MathStep) -> Vec<Effect> {
        let Stage::Math(phase) = &self.stage else {
            return Vec::new();
        };
        let presented = |index: usize| -> Option<Effect> {
            phase.problems().get(index).map(|problem| {
                Effect::Notice(Notice::ProblemPresented {
                    index,
                    total: phase.problems().len(),
                    problem: problem.clone(),
                })
            })
        };

        match step {
            MathStep::Ignored => Vec::new(),
            MathStep::Presented { index } => presented(index).into_iter().collect(),
            MathStep::Wrong { attempts } => {
                vec![Effect::Notice(Notice::WrongAnswer { attempts })]
            }
            MathStep::Solved { index, elapsed } => {
                let mut effects = vec![Effect::Notice(Notice::ProblemSolved { index, elapsed })];
                effects.extend(presented(index + 1));
                effects
            }
            MathStep::Complete { average_ms } => {
                let problems = phase.problems().to_vec();
                self.finish(average_ms, problems)
            }
        }
    }

    fn finish(&mut self, math_ms: f64, problems: Vec<MathProblem>) -> Vec<Effect> {
        let scores = ScoreBundle::new(
            self.partial.reaction_ms,
            self.partial.memory_digits,
            math_ms,
        );
        let breakdown = self.cfg.scoring.breakdown(&scores);
        let report = Report {
            scores,
            breakdown,
            reaction_rounds: std::mem::take(&mut self.partial.reaction_rounds),
            problems,
        };
        tracing::info!(
            reaction_ms = scores.reaction_ms,
            memory_digits = scores.memory_digits,
            math_ms = scores.math_ms,
            brain_age = breakdown.brain_age,
            "session finished"
        );
        self.stage = Stage::Results(report.clone());
        self.epoch = self.epoch.wrapping_add(1);

        vec![
            Effect::CancelPending,
            Effect::Notice(Notice::PhaseComplete {
                phase: PhaseKind::Math,
                score: math_ms,
            }),
            Effect::Notice(Notice::Finished(report)),
        ]
    }
}

fn schedule(timer: SessionTimer) -> Effect {
    Effect::Schedule(timer)
}
