use super::HistoryEntry;

/// Sessions compared on each side of a trend.
const TREND_WINDOW: usize = 3;

/// Mean-age change (years) needed before a trend counts as movement.
const TREND_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Fewer than two sessions.
    NotEnoughData,
    /// Recent ages are lower.
    Improving,
    Steady,
    Declining,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::NotEnoughData => "not enough data",
            Trend::Improving => "improving",
            Trend::Steady => "steady",
            Trend::Declining => "declining",
        }
    }
}

/// Dashboard numbers derived from the history log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub latest_age: Option<u32>,
    pub best_age: Option<u32>,
    /// 1-based session index at which `best_age` was first reached.
    pub best_at_session: Option<usize>,
    pub mean_age: Option<f64>,
    pub recent_mean_age: Option<f64>,
    pub trend: Trend,
    /// Fastest average reaction among sessions with at least one valid round.
    pub best_reaction_ms: Option<f64>,
    pub best_memory_digits: Option<u32>,
    pub best_math_ms: Option<f64>,
}

impl HistorySummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let ages: Vec<f64> = entries.iter().map(|e| e.brain_age as f64).collect();

        let (best_age, best_at_session) = entries
            .iter()
            .enumerate()
            .fold((None, None), |(best, at), (i, e)| match best {
                Some(b) if e.brain_age >= b => (best, at),
                _ => (Some(e.brain_age), Some(i + 1)),
            });

        let recent_start = ages.len().saturating_sub(TREND_WINDOW);

        Self {
            sessions: entries.len(),
            latest_age: entries.last().map(|e| e.brain_age),
            best_age,
            best_at_session,
            mean_age: mean(&ages),
            recent_mean_age: mean(&ages[recent_start..]),
            trend: trend(&ages),
            best_reaction_ms: min_f64(
                entries
                    .iter()
                    .map(|e| e.scores.reaction_ms)
                    .filter(|&ms| ms > 0.0),
            ),
            best_memory_digits: entries.iter().map(|e| e.scores.memory_digits).max(),
            best_math_ms: min_f64(
                entries
                    .iter()
                    .map(|e| e.scores.math_ms)
                    .filter(|&ms| ms > 0.0),
            ),
        }
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

fn min_f64(xs: impl Iterator<Item = f64>) -> Option<f64> {
    xs.fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))))
}

fn trend(ages: &[f64]) -> Trend {
    if ages.len() < 2 {
        return Trend::NotEnoughData;
    }
    // Split the most recent 2*W sessions into an older and a newer half.
    let window = TREND_WINDOW.min(ages.len() / 2);
    let newer = &ages[ages.len() - window..];
    let older = &ages[ages.len() - 2 * window..ages.len() - window];

    let (Some(newer), Some(older)) = (mean(newer), mean(older)) else {
        return Trend::NotEnoughData;
    };
    let delta = newer - older;
    if delta <= -TREND_THRESHOLD {
        Trend::Improving
    } else if delta >= TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Steady
    }
}
