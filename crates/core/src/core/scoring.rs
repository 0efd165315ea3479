//! Brain age scoring.
//!
//! Each sub-score contributes extra "years" only when it is worse than its
//! baseline; better-than-baseline performance clamps to zero and can never
//! pull the age below the base. The composite is floored at `floor_age`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The three sub-scores a session produces.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreBundle {
    /// Mean latency over valid reaction rounds, ms.
    pub reaction_ms: f64,
    /// Highest sequence length recalled correctly.
    pub memory_digits: u32,
    /// Mean solve time per math problem, ms.
    pub math_ms: f64,
}

impl ScoreBundle {
    pub fn new(reaction_ms: f64, memory_digits: u32, math_ms: f64) -> Self {
        Self {
            reaction_ms,
            memory_digits,
            math_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoringConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_base_age"))]
    pub base_age: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_floor_age"))]
    pub floor_age: u32,

    #[cfg_attr(feature = "serde", serde(default = "default_reaction_baseline_ms"))]
    pub reaction_baseline_ms: f64,
    /// Reaction milliseconds above baseline per added year.
    #[cfg_attr(feature = "serde", serde(default = "default_reaction_ms_per_year"))]
    pub reaction_ms_per_year: f64,

    #[cfg_attr(feature = "serde", serde(default = "default_memory_baseline_digits"))]
    pub memory_baseline_digits: u32,
    /// Years added per digit short of baseline.
    #[cfg_attr(feature = "serde", serde(default = "default_memory_years_per_digit"))]
    pub memory_years_per_digit: f64,

    #[cfg_attr(feature = "serde", serde(default = "default_math_baseline_ms"))]
    pub math_baseline_ms: f64,
    /// Math milliseconds above baseline per added year.
    #[cfg_attr(feature = "serde", serde(default = "default_math_ms_per_year"))]
    pub math_ms_per_year: f64,
}

fn default_base_age() -> f64 {
    20.0
}

fn default_floor_age() -> u32 {
    18
}

fn default_reaction_baseline_ms() -> f64 {
    250.0
}

fn default_reaction_ms_per_year() -> f64 {
    10.0
}

fn default_memory_baseline_digits() -> u32 {
    6
}

fn default_memory_years_per_digit() -> f64 {
    3.0
}

fn default_math_baseline_ms() -> f64 {
    2000.0
}

fn default_math_ms_per_year() -> f64 {
    200.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_age: default_base_age(),
            floor_age: default_floor_age(),
            reaction_baseline_ms: default_reaction_baseline_ms(),
            reaction_ms_per_year: default_reaction_ms_per_year(),
            memory_baseline_digits: default_memory_baseline_digits(),
            memory_years_per_digit: default_memory_years_per_digit(),
            math_baseline_ms: default_math_baseline_ms(),
            math_ms_per_year: default_math_ms_per_year(),
        }
    }
}

/// Per-component contributions behind a composite age.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgeBreakdown {
    pub reaction_years: f64,
    pub memory_years: f64,
    pub math_years: f64,
    pub raw_age: f64,
    pub brain_age: u32,
}

impl ScoringConfig {
    pub fn breakdown(&self, scores: &ScoreBundle) -> AgeBreakdown {
        let reaction_years =
            ((scores.reaction_ms - self.reaction_baseline_ms) / self.reaction_ms_per_year).max(0.0);
        let memory_short = self.memory_baseline_digits as f64 - scores.memory_digits as f64;
        let memory_years = (memory_short * self.memory_years_per_digit).max(0.0);
        let math_years =
            ((scores.math_ms - self.math_baseline_ms) / self.math_ms_per_year).max(0.0);

        let raw_age = self.base_age + reaction_years + memory_years + math_years;
        let rounded = round_half_up(raw_age);
        let brain_age = if rounded.is_finite() && rounded > self.floor_age as f64 {
            rounded.min(u32::MAX as f64) as u32
        } else {
            self.floor_age
        };

        AgeBreakdown {
            reaction_years,
            memory_years,
            math_years,
            raw_age,
            brain_age,
        }
    }

    pub fn brain_age(&self, scores: &ScoreBundle) -> u32 {
        self.breakdown(scores).brain_age
    }
}

/// Brain age under the default constants.
pub fn brain_age(scores: &ScoreBundle) -> u32 {
    ScoringConfig::default().brain_age(scores)
}

// Halves round toward +inf, so 20.5 -> 21 and -0.5 -> 0.
#[inline]
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_performance_is_base_age() {
        assert_eq!(brain_age(&ScoreBundle::new(250.0, 6, 2000.0)), 20);
    }

    #[test]
    fn better_than_baseline_clamps_each_contribution() {
        let b = ScoringConfig::default().breakdown(&ScoreBundle::new(150.0, 8, 1500.0));
        assert_eq!(b.reaction_years, 0.0);
        assert_eq!(b.memory_years, 0.0);
        assert_eq!(b.math_years, 0.0);
        assert_eq!(b.brain_age, 20);
    }

    #[test]
    fn worse_than_baseline_adds_years() {
        let b = ScoringConfig::default().breakdown(&ScoreBundle::new(450.0, 3, 2800.0));
        assert_eq!(b.reaction_years, 20.0);
        assert_eq!(b.memory_years, 9.0);
        assert_eq!(b.math_years, 4.0);
        assert_eq!(b.raw_age, 53.0);
        assert_eq!(b.brain_age, 53);
    }

    #[test]
    fn floor_applies_after_rounding() {
        let cfg = ScoringConfig {
            base_age: 10.0,
            ..ScoringConfig::default()
        };
        // raw = 10 + 4.4 = 14.4 -> 14 -> floored to 18
        assert_eq!(cfg.brain_age(&ScoreBundle::new(294.0, 6, 0.0)), 18);
        // raw = 10 + 7.6 = 17.6 -> 18
        assert_eq!(cfg.brain_age(&ScoreBundle::new(326.0, 6, 0.0)), 18);
        // raw = 10 + 8.5 = 18.5 -> 19
        assert_eq!(cfg.brain_age(&ScoreBundle::new(335.0, 6, 0.0)), 19);
    }

    #[test]
    fn halves_round_up() {
        // raw = 20 + 0.5
        assert_eq!(brain_age(&ScoreBundle::new(255.0, 6, 2000.0)), 21);
        // raw = 20 + 0.4
        assert_eq!(brain_age(&ScoreBundle::new(254.0, 6, 2000.0)), 20);
    }

    #[test]
    fn zero_everything_still_scores() {
        // A session with no valid reaction rounds reports 0 ms; memory 0 digits is 18 extra years.
        let b = ScoringConfig::default().breakdown(&ScoreBundle::new(0.0, 0, 0.0));
        assert_eq!(b.memory_years, 18.0);
        assert_eq!(b.brain_age, 38);
    }

    #[test]
    fn scoring_is_pure() {
        let cfg = ScoringConfig::default();
        let s = ScoreBundle::new(377.0, 4, 2650.0);
        let first = cfg.breakdown(&s);
        for _ in 0..10 {
            let _ = cfg.brain_age(&ScoreBundle::new(999.0, 1, 9999.0));
            assert_eq!(cfg.breakdown(&s), first);
        }
    }
}
