//! The three timed tests that make up a session.
//!
//! Each phase is a self-contained state machine. It receives inputs and timer
//! wake-ups with the caller's `Instant`, and reports what happened as a step
//! value. Nothing here sleeps or reads the clock.

pub mod arithmetic;
pub mod memory;
pub mod reaction;

pub use arithmetic::{MathConfig, MathPhase, MathProblem, MathStep, OperandPolicy};
pub use memory::{MemoryConfig, MemoryPhase, MemoryState, MemoryStep, MemoryWake};
pub use reaction::{
    PrematurePolicy, ReactionConfig, ReactionPhase, ReactionState, ReactionStep, ReactionWake,
    RoundResult,
};

/// Which phase a session is in, for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Reaction,
    Memory,
    Math,
}

impl PhaseKind {
    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Reaction => "reaction",
            PhaseKind::Memory => "memory",
            PhaseKind::Math => "math",
        }
    }
}
