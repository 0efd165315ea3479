use crate::prng::Prng;
use crate::time::{as_millis_f64, Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the second operand is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OperandPolicy {
    /// Second operand in `[min, first]`.
    #[default]
    Bounded,
    /// Both operands drawn from `[min, max]` independently.
    Independent,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MathConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_problems"))]
    pub problems: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_min_operand"))]
    pub min_operand: i64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_operand"))]
    pub max_operand: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operands: OperandPolicy,
}

fn default_problems() -> u32 {
    7
}

fn default_min_operand() -> i64 {
    5
}

fn default_max_operand() -> i64 {
    20
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            problems: default_problems(),
            min_operand: default_min_operand(),
            max_operand: default_max_operand(),
            operands: OperandPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MathProblem {
    pub left: i64,
    pub right: i64,
    pub answer: i64,
    /// Presentation to correct answer, wrong attempts included.
    pub solved_in: Option<Duration>,
    pub wrong_attempts: u32,
}

impl MathProblem {
    pub fn new(left: i64, right: i64) -> Self {
        Self {
            left,
            right,
            answer: left.saturating_add(right),
            solved_in: None,
            wrong_attempts: 0,
        }
    }

    fn draw(rng: &mut Prng, cfg: &MathConfig) -> Self {
        let left = rng.gen_range_inclusive(cfg.min_operand, cfg.max_operand);
        let right_max = match cfg.operands {
            OperandPolicy::Bounded => left,
            OperandPolicy::Independent => cfg.max_operand,
        };
        let right = rng.gen_range_inclusive(cfg.min_operand, right_max);
        Self::new(left, right)
    }
}

impl std::fmt::Display for MathProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}", self.left, self.right)
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then the longest
/// run of ASCII digits. Anything after the digits is ignored; no digits → `None`.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[derive(Debug, Clone, PartialEq)]
pub enum MathStep {
    Ignored,
    /// Problem `index` is on screen and its clock is running.
    Presented { index: usize },
    /// Not the sum (or not a number). Same problem, clock still running.
    Wrong { attempts: u32 },
    /// Solved; the next problem is now presented.
    Solved { index: usize, elapsed: Duration },
    Complete { average_ms: f64 },
}

/// Timed addition drill over a fixed, pre-generated problem list.
#[derive(Debug, Clone)]
pub struct MathPhase {
    problems: Vec<MathProblem>,
    current: usize,
    presented_at: Option<Instant>,
}

impl MathPhase {
    pub fn new(cfg: &MathConfig, rng: &mut Prng) -> Self {
        let problems = (0..cfg.problems)
            .map(|_| MathProblem::draw(rng, cfg))
            .collect();
        Self::with_problems(problems)
    }

    pub fn with_problems(problems: Vec<MathProblem>) -> Self {
        Self {
            problems,
            current: 0,
            presented_at: None,
        }
    }

    pub fn problems(&self) -> &[MathProblem] {
        &self.problems
    }

    pub fn current(&self) -> Option<&MathProblem> {
        if self.presented_at.is_some() {
            self.problems.get(self.current)
        } else {
            None
        }
    }

    /// 0-based index of the active problem.
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.problems.len()
    }

    /// Present the first problem. An empty drill completes right away.
    pub fn start(&mut self, now: Instant) -> MathStep {
        if self.problems.is_empty() {
            return MathStep::Complete { average_ms: 0.0 };
        }
        self.presented_at = Some(now);
        MathStep::Presented { index: 0 }
    }

    pub fn submit(&mut self, input: &str, now: Instant) -> MathStep {
        let Some(presented_at) = self.presented_at else {
            return MathStep::Ignored;
        };
        let Some(problem) = self.problems.get_mut(self.current) else {
            return MathStep::Ignored;
        };

        if parse_leading_int(input) != Some(problem.answer) {
            problem.wrong_attempts += 1;
            return MathStep::Wrong {
                attempts: problem.wrong_attempts,
            };
        }

        let elapsed = now.saturating_duration_since(presented_at);
        problem.solved_in = Some(elapsed);
        let index = self.current;
        self.current += 1;

        if self.is_done() {
            self.presented_at = None;
            let average_ms = self.average_ms();
            tracing::debug!(problems = self.problems.len(), average_ms, "math phase complete");
            return MathStep::Complete { average_ms };
        }
        self.presented_at = Some(now);
        MathStep::Solved { index, elapsed }
    }

    /// Mean solve time over solved problems, ms.
    pub fn average_ms(&self) -> f64 {
        let solved: Vec<f64> = self
            .problems
            .iter()
            .filter_map(|p| p.solved_in.map(as_millis_f64))
            .collect();
        if solved.is_empty() {
            0.0
        } else {
            solved.iter().sum::<f64>() / solved.len() as f64
        }
    }
}
