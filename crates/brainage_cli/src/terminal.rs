//! Text rendering for notices, results, the history dashboard, and the journal.

use std::io::{self, Write};

use brainage::config::GameConfig;
use brainage::history::{History, Journal};
use brainage::phases::{PhaseKind, RoundResult};
use brainage::session::{Notice, Report};
use brainage::time::as_millis_f64;
use chrono::{DateTime, Local};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use crossterm::style::{Color, Stylize};
use crossterm::{cursor, queue, terminal};

use crate::coach::CoachReply;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn accent(self) -> Color {
        match self {
            Theme::Dark => Color::Cyan,
            Theme::Light => Color::DarkBlue,
        }
    }

    fn good(self) -> Color {
        match self {
            Theme::Dark => Color::Green,
            Theme::Light => Color::DarkGreen,
        }
    }

    fn bad(self) -> Color {
        match self {
            Theme::Dark => Color::Red,
            Theme::Light => Color::DarkRed,
        }
    }

    fn muted(self) -> Color {
        match self {
            Theme::Dark => Color::Grey,
            Theme::Light => Color::DarkGrey,
        }
    }

    fn table_color(self) -> comfy_table::Color {
        match self {
            Theme::Dark => comfy_table::Color::Cyan,
            Theme::Light => comfy_table::Color::DarkBlue,
        }
    }
}

/// Unicode bar per value, scaled between the minimum and maximum.
pub fn sparkline(values: &[u32]) -> String {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = (max - min) as f64;
    values
        .iter()
        .map(|&v| {
            if span == 0.0 {
                SPARK_BARS[SPARK_BARS.len() / 2]
            } else {
                let i = ((v - min) as f64 / span * (SPARK_BARS.len() - 1) as f64).round();
                SPARK_BARS[i as usize]
            }
        })
        .collect()
}

pub fn format_timestamp(unix_ms: u64) -> String {
    i64::try_from(unix_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn round_label(r: &RoundResult) -> String {
    match r {
        RoundResult::Valid(d) => format!("{:.0} ms", as_millis_f64(*d)),
        RoundResult::Disqualified => "too soon".to_string(),
    }
}

pub struct Terminal<W: Write> {
    out: W,
    theme: Theme,
    /// A memory sequence is on the last printed line.
    sequence_on_screen: bool,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            sequence_on_screen: false,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn welcome(&mut self, cfg: &GameConfig) -> io::Result<()> {
        let t = self.theme;
        writeln!(self.out, "{}", "Brain Age Challenge".with(t.accent()).bold())?;
        writeln!(
            self.out,
            "{} reaction rounds, a digit-memory test from {} digits, then {} quick sums.",
            cfg.reaction.rounds, cfg.memory.start_level, cfg.math.problems
        )?;
        writeln!(
            self.out,
            "{}",
            "Press Enter to start. Type q at any prompt to quit.".with(t.muted())
        )?;
        self.out.flush()
    }

    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        let t = self.theme;
        match notice {
            Notice::PhaseStarted(kind) => {
                let (title, hint) = match kind {
                    PhaseKind::Reaction => (
                        "Reaction",
                        "Press Enter the moment you see GO. Pressing early counts as too soon.",
                    ),
                    PhaseKind::Memory => (
                        "Memory",
                        "Memorise the digits. When they disappear, type them and press Enter.",
                    ),
                    PhaseKind::Math => ("Math", "Type each sum's answer and press Enter."),
                };
                writeln!(self.out)?;
                writeln!(self.out, "{}", format!("== {title} ==").with(t.accent()).bold())?;
                writeln!(self.out, "{}", hint.with(t.muted()))?;
            }
            Notice::GetReady { round, rounds } => {
                writeln!(self.out, "Round {round}/{rounds}: get ready...")?;
            }
            Notice::Wait => writeln!(self.out, "{}", "...wait for it...".with(t.muted()))?,
            Notice::Stimulus => writeln!(self.out, "{}", ">>> GO! <<<".with(t.good()).bold())?,
            Notice::ReactionRecorded { elapsed, .. } => {
                writeln!(self.out, "{:.0} ms", as_millis_f64(*elapsed))?;
            }
            Notice::TooSoon { disqualified, cooldown } => {
                let tail = if *disqualified {
                    "round disqualified"
                } else {
                    "this round restarts"
                };
                writeln!(
                    self.out,
                    "{} ({tail}; next in {:.1} s)",
                    "Too soon!".with(t.bad()).bold(),
                    cooldown.as_secs_f64()
                )?;
            }
            Notice::SequenceShown {
                level,
                sequence,
                visible_for,
            } => {
                writeln!(
                    self.out,
                    "Level {level}: {}  {}",
                    sequence.as_str().with(t.accent()).bold(),
                    format!("({:.1} s)", visible_for.as_secs_f64()).with(t.muted())
                )?;
                self.sequence_on_screen = true;
            }
            Notice::InputOpen { level } => {
                if self.sequence_on_screen {
                    queue!(
                        self.out,
                        cursor::MoveToPreviousLine(1),
                        terminal::Clear(terminal::ClearType::CurrentLine)
                    )?;
                    self.sequence_on_screen = false;
                }
                write!(self.out, "Type the {level} digits: ")?;
            }
            Notice::SequenceMissed {
                expected,
                remembered,
            } => {
                writeln!(
                    self.out,
                    "{} It was {}. You remembered {remembered} digits.",
                    "Not quite.".with(t.bad()),
                    expected.as_str().bold()
                )?;
            }
            Notice::ProblemPresented {
                index,
                total,
                problem,
            } => {
                write!(self.out, "[{}/{total}] {problem} = ", index + 1)?;
            }
            Notice::WrongAnswer { .. } => {
                write!(self.out, "{} = ", "Try again".with(t.bad()))?;
            }
            Notice::ProblemSolved { elapsed, .. } => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Correct ({:.1} s)", elapsed.as_secs_f64()).with(t.good())
                )?;
            }
            Notice::PhaseComplete { phase, score } => {
                let text = match phase {
                    PhaseKind::Reaction => format!("Average reaction: {score:.0} ms"),
                    PhaseKind::Memory => format!("Digits remembered: {score:.0}"),
                    PhaseKind::Math => format!("Average solve time: {score:.0} ms"),
                };
                writeln!(self.out, "{}", text.bold())?;
            }
            Notice::Finished(report) => self.results(report)?,
        }
        self.out.flush()
    }

    pub fn results(&mut self, report: &Report) -> io::Result<()> {
        let t = self.theme;
        let s = &report.scores;
        let b = &report.breakdown;
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Your Results".with(t.accent()).bold())?;
        writeln!(
            self.out,
            "Brain Age: {}",
            b.brain_age.to_string().with(t.accent()).bold()
        )?;
        writeln!(
            self.out,
            "  Reaction  {:>7.0} ms      +{:.1} years",
            s.reaction_ms, b.reaction_years
        )?;
        writeln!(
            self.out,
            "  Memory    {:>7} digits  +{:.1} years",
            s.memory_digits, b.memory_years
        )?;
        writeln!(
            self.out,
            "  Math      {:>7.0} ms      +{:.1} years",
            s.math_ms, b.math_years
        )?;
        if !report.reaction_rounds.is_empty() {
            let rounds: Vec<String> = report.reaction_rounds.iter().map(round_label).collect();
            writeln!(
                self.out,
                "{}",
                format!("  Rounds: {}", rounds.join(", ")).with(t.muted())
            )?;
        }
        writeln!(
            self.out,
            "{}",
            "This is a game for entertainment, not a scientific or medical measurement."
                .with(t.muted())
                .italic()
        )?;
        self.out.flush()
    }

    pub fn coach(&mut self, reply: &CoachReply) -> io::Result<()> {
        let t = self.theme;
        let label = match reply {
            CoachReply::Text(_) => "Coach:".with(t.accent()).bold(),
            CoachReply::Unavailable(_) => "Coach (unavailable):".with(t.muted()).bold(),
            CoachReply::Failed(_) => "Coach (error):".with(t.bad()).bold(),
        };
        writeln!(self.out, "{label} {}", reply.text())?;
        self.out.flush()
    }

    pub fn history(&mut self, history: &History) -> io::Result<()> {
        let t = self.theme;
        if history.is_empty() {
            writeln!(self.out, "No sessions yet. Run `brainage` to play.")?;
            return self.out.flush();
        }

        let header = ["#", "When", "Age", "Reaction", "Memory", "Math"]
            .into_iter()
            .map(|h| Cell::new(h).fg(t.table_color()));
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(header.collect::<Vec<_>>());
        for (i, e) in history.entries().iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(format_timestamp(e.recorded_at_ms)),
                Cell::new(e.brain_age),
                Cell::new(format!("{:.0} ms", e.scores.reaction_ms)),
                Cell::new(e.scores.memory_digits),
                Cell::new(format!("{:.0} ms", e.scores.math_ms)),
            ]);
        }
        writeln!(self.out, "{table}")?;

        let ages: Vec<u32> = history.entries().iter().map(|e| e.brain_age).collect();
        let summary = history.summary();
        writeln!(self.out, "Ages: {}", sparkline(&ages).with(t.accent()))?;
        if let (Some(best), Some(at), Some(mean)) =
            (summary.best_age, summary.best_at_session, summary.mean_age)
        {
            writeln!(
                self.out,
                "Best {best} (session {at}), mean {mean:.1}, trend: {}",
                summary.trend.label()
            )?;
        }
        let mut bests = Vec::new();
        if let Some(ms) = summary.best_reaction_ms {
            bests.push(format!("reaction {ms:.0} ms"));
        }
        if let Some(d) = summary.best_memory_digits {
            bests.push(format!("memory {d} digits"));
        }
        if let Some(ms) = summary.best_math_ms {
            bests.push(format!("math {ms:.0} ms"));
        }
        if !bests.is_empty() {
            writeln!(self.out, "{}", format!("Personal bests: {}", bests.join(", ")).with(t.muted()))?;
        }
        self.out.flush()
    }

    pub fn journal(&mut self, journal: &Journal, limit: usize) -> io::Result<()> {
        let t = self.theme;
        if journal.entries().is_empty() {
            writeln!(self.out, "Journal is empty. Add a note with `brainage journal add <text>`.")?;
            return self.out.flush();
        }
        for e in journal.recent(limit) {
            let age = e
                .brain_age
                .map(|a| format!(" [age {a}]"))
                .unwrap_or_default();
            writeln!(
                self.out,
                "{}{} {}",
                format_timestamp(e.recorded_at_ms).with(t.muted()),
                age.with(t.accent()),
                e.text
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainage::history::HistoryEntry;
    use brainage::phases::MathProblem;
    use brainage::scoring::{ScoreBundle, ScoringConfig};
    use brainage::time::Duration;

    fn render(f: impl FnOnce(&mut Terminal<Vec<u8>>) -> io::Result<()>) -> String {
        let mut term = Terminal::new(Vec::new(), Theme::Dark);
        f(&mut term).unwrap();
        String::from_utf8(term.into_inner()).unwrap()
    }

    fn report() -> Report {
        let scores = ScoreBundle::new(450.0, 3, 2800.0);
        Report {
            scores,
            breakdown: ScoringConfig::default().breakdown(&scores),
            reaction_rounds: vec![
                RoundResult::Valid(Duration::from_millis(450)),
                RoundResult::Disqualified,
            ],
            problems: Vec::new(),
        }
    }

    #[test]
    fn sparkline_scales_between_extremes() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[20, 40, 30]), "▁█▅");
        assert_eq!(sparkline(&[30, 30]), "▅▅");
    }

    #[test]
    fn results_show_age_components_and_disclaimer() {
        let out = render(|t| t.results(&report()));
        assert!(out.contains("53"));
        assert!(out.contains("+20.0 years"));
        assert!(out.contains("too soon"));
        assert!(out.contains("not a scientific or medical measurement"));
    }

    #[test]
    fn notices_render_readable_lines() {
        let out = render(|t| {
            t.notice(&Notice::GetReady { round: 2, rounds: 5 })?;
            t.notice(&Notice::ProblemPresented {
                index: 0,
                total: 7,
                problem: MathProblem::new(12, 9),
            })?;
            t.notice(&Notice::PhaseComplete {
                phase: PhaseKind::Memory,
                score: 4.0,
            })
        });
        assert!(out.contains("Round 2/5: get ready..."));
        assert!(out.contains("[1/7] 12 + 9 = "));
        assert!(out.contains("Digits remembered: 4"));
    }

    #[test]
    fn input_prompt_erases_the_shown_sequence() {
        let out = render(|t| {
            t.notice(&Notice::SequenceShown {
                level: 3,
                sequence: "482".to_string(),
                visible_for: Duration::from_millis(1800),
            })?;
            t.notice(&Notice::InputOpen { level: 3 })
        });
        let erase = out.find("\x1b[1F").expect("cursor moved up");
        assert!(out.find("482").unwrap() < erase);
        assert!(out.ends_with("Type the 3 digits: "));
    }

    #[test]
    fn history_dashboard_lists_sessions_and_summary() {
        let mut history = History::new(None);
        for (i, age) in [34u32, 29, 31].into_iter().enumerate() {
            history.append(HistoryEntry {
                recorded_at_ms: 1_700_000_000_000 + i as u64 * 86_400_000,
                scores: ScoreBundle::new(300.0 + i as f64, 5, 2200.0),
                brain_age: age,
            });
        }
        let out = render(|t| t.history(&history));
        assert!(out.contains("Reaction"));
        assert!(out.contains("301 ms"));
        assert!(out.contains("Best 29 (session 2)"));
        assert!(out.contains("█▁▄"));

        let empty = render(|t| t.history(&History::new(None)));
        assert!(empty.contains("No sessions yet"));
    }

    #[test]
    fn journal_lists_newest_first() {
        let mut journal = Journal::default();
        journal.write("first", 1_700_000_000_000, None).unwrap();
        journal.write("second", 1_700_000_100_000, None).unwrap();
        let out = render(|t| t.journal(&journal, 10));
        assert!(out.find("second").unwrap() < out.find("first").unwrap());
    }

    #[test]
    fn coach_replies_are_labelled() {
        let out = render(|t| t.coach(&CoachReply::Unavailable("set GEMINI_API_KEY".into())));
        assert!(out.contains("Coach (unavailable):"));
        assert!(out.contains("set GEMINI_API_KEY"));
    }
}
