//! # brainage
//!
//! The assessment kernel of a "brain age" mini-game: three short timed tests
//! whose sub-scores fold into one composite age.
//!
//! ```
//! use brainage::scoring::{brain_age, ScoreBundle};
//!
//! // 450 ms reactions, 3 digits recalled, 2.8 s per sum.
//! assert_eq!(brain_age(&ScoreBundle::new(450.0, 3, 2800.0)), 53);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization for config, reports, and history
//!
//! ## Modules
//!
//! - [`phases`]: reaction, memory, and math state machines
//! - [`session`]: controller that runs the phases in order and scores them
//! - [`scoring`]: the brain age formula
//! - [`schedule`]: timer tickets for deferred phase continuations
//! - [`history`]: session log, dashboard summary, and journal

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/schedule.rs"]
pub mod schedule;

#[path = "core/scoring.rs"]
pub mod scoring;

#[path = "core/time.rs"]
pub mod time;

pub mod config;
pub mod history;
pub mod phases;
pub mod session;

/// Prelude module for convenient imports.
///
/// ```
/// use brainage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigError, GameConfig};
    pub use crate::history::{History, HistoryEntry, HistorySummary, Journal, JournalEntry};
    pub use crate::phases::{PhaseKind, PrematurePolicy, RoundResult};
    pub use crate::prng::Prng;
    pub use crate::scoring::{AgeBreakdown, ScoreBundle, ScoringConfig};
    pub use crate::session::{Effect, Notice, Report, Session, SessionTimer, Stage, Wake};
}
