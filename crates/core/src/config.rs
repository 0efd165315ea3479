//! Session configuration: one section per phase plus the scoring constants.

use crate::phases::{MathConfig, MemoryConfig, ReactionConfig};
use crate::scoring::ScoringConfig;

/// Largest operand magnitude accepted; any two operands then sum without overflow.
pub const MAX_OPERAND_MAGNITUDE: i64 = i64::MAX / 2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("reaction.rounds must be at least 1")]
    NoReactionRounds,
    #[error("reaction delay range is inverted: min {min_ms} ms > max {max_ms} ms")]
    InvertedDelay { min_ms: u64, max_ms: u64 },
    #[error("memory.start_level must be at least 1")]
    ZeroStartLevel,
    #[error("math.problems must be at least 1")]
    NoMathProblems,
    #[error("math operand range is inverted: min {min} > max {max}")]
    InvertedOperands { min: i64, max: i64 },
    #[error("math operands must lie within ±{limit}: got {min}..={max}")]
    OperandRange { min: i64, max: i64, limit: i64 },
    #[error("scoring.{0} must be a positive number")]
    NonPositiveScale(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub reaction: ReactionConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub memory: MemoryConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub math: MathConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scoring: ScoringConfig,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reaction;
        if r.rounds == 0 {
            return Err(ConfigError::NoReactionRounds);
        }
        if r.min_delay_ms > r.max_delay_ms {
            return Err(ConfigError::InvertedDelay {
                min_ms: r.min_delay_ms,
                max_ms: r.max_delay_ms,
            });
        }
        if self.memory.start_level == 0 {
            return Err(ConfigError::ZeroStartLevel);
        }
        let m = &self.math;
        if m.problems == 0 {
            return Err(ConfigError::NoMathProblems);
        }
        if m.min_operand > m.max_operand {
            return Err(ConfigError::InvertedOperands {
                min: m.min_operand,
                max: m.max_operand,
            });
        }
        let limit = MAX_OPERAND_MAGNITUDE as u64;
        if m.min_operand.unsigned_abs() > limit || m.max_operand.unsigned_abs() > limit {
            return Err(ConfigError::OperandRange {
                min: m.min_operand,
                max: m.max_operand,
                limit: MAX_OPERAND_MAGNITUDE,
            });
        }
        let s = &self.scoring;
        for (name, v) in [
            ("reaction_ms_per_year", s.reaction_ms_per_year),
            ("math_ms_per_year", s.math_ms_per_year),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::NonPositiveScale(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_settings() {
        let mut cfg = GameConfig::default();
        cfg.reaction.rounds = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoReactionRounds));

        let mut cfg = GameConfig::default();
        cfg.reaction.min_delay_ms = 4000;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvertedDelay { .. })));

        let mut cfg = GameConfig::default();
        cfg.memory.start_level = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroStartLevel));

        let mut cfg = GameConfig::default();
        cfg.math.min_operand = 30;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvertedOperands { .. })));

        let mut cfg = GameConfig::default();
        cfg.scoring.math_ms_per_year = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositiveScale("math_ms_per_year"))
        );
    }

    #[test]
    fn huge_operands_are_rejected_before_they_can_overflow() {
        let mut cfg = GameConfig::default();
        cfg.math.min_operand = i64::MAX / 2 + 1;
        cfg.math.max_operand = i64::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigError::OperandRange { .. })));

        cfg.math.min_operand = i64::MIN;
        assert!(matches!(cfg.validate(), Err(ConfigError::OperandRange { .. })));

        cfg.math.min_operand = -MAX_OPERAND_MAGNITUDE;
        cfg.math.max_operand = MAX_OPERAND_MAGNITUDE;
        assert_eq!(cfg.validate(), Ok(()));
        let phase = crate::phases::MathPhase::new(&cfg.math, &mut crate::prng::Prng::new(1));
        assert!(phase.problems().iter().all(|p| p.answer == p.left + p.right));
    }

    #[test]
    fn unvalidated_extremes_still_build_a_phase() {
        let mut cfg = GameConfig::default();
        cfg.math.min_operand = i64::MIN;
        cfg.math.max_operand = i64::MAX;
        let phase = crate::phases::MathPhase::new(&cfg.math, &mut crate::prng::Prng::new(1));
        assert_eq!(phase.problems().len(), cfg.math.problems as usize);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{ "reaction": { "rounds": 3, "premature": "retry" } }"#)
                .unwrap();
        assert_eq!(cfg.reaction.rounds, 3);
        assert_eq!(cfg.reaction.premature, crate::phases::PrematurePolicy::Retry);
        assert_eq!(cfg.reaction.max_delay_ms, 3000);
        assert_eq!(cfg.memory, MemoryConfig::default());
        assert_eq!(cfg.scoring.base_age, 20.0);
    }
}
