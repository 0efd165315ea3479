//! Interactive play: stdin lines and fired timers in, notices out.

use std::io::Write;
use std::sync::Arc;

use brainage::prng::Prng;
use brainage::session::{Effect, Notice, Report, Session, Stage};
use brainage::time::unix_millis_now;
use tokio::io::{AsyncBufRead, Lines};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::coach::{Coach, CoachReply};
use crate::config::AppConfig;
use crate::driver::{self, TimerRuntime};
use crate::error::AppError;
use crate::store::{load_history, save_history, KeyValueStore};
use crate::terminal::Terminal;

fn is_quit(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "q" | "quit")
}

/// Carry out `effects`; returns the report if the session finished.
fn apply<W: Write>(
    effects: Vec<Effect>,
    timers: &mut TimerRuntime,
    term: &mut Terminal<W>,
) -> Result<Option<Report>, AppError> {
    let mut finished = None;
    for effect in effects {
        match effect {
            Effect::Schedule(t) => timers.schedule(t),
            Effect::CancelPending => timers.cancel_pending(),
            Effect::Notice(notice) => {
                term.notice(&notice)?;
                if let Notice::Finished(report) = notice {
                    finished = Some(report);
                }
            }
        }
    }
    Ok(finished)
}

/// Run one session to completion. `None` means the player quit or input closed.
pub async fn play_session<R, W>(
    session: &mut Session,
    timers: &mut TimerRuntime,
    input: &mut Lines<R>,
    term: &mut Terminal<W>,
) -> Result<Option<Report>, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(report) = apply(session.start(), timers, term)? {
        return Ok(Some(report));
    }

    loop {
        let effects = tokio::select! {
            fired = timers.next_fired() => match fired {
                Some(f) => session.wake(f.timer.ticket, f.timer.wake, f.at),
                None => Vec::new(),
            },
            line = input.next_line() => {
                let now = driver::now();
                match line? {
                    Some(l) if !is_quit(&l) => match session.stage() {
                        Stage::Reaction(_) => session.signal(now),
                        _ => session.submit(&l, now),
                    },
                    _ => {
                        apply(session.abandon(), timers, term)?;
                        info!("session abandoned by player");
                        return Ok(None);
                    }
                }
            }
        };
        if let Some(report) = apply(effects, timers, term)? {
            return Ok(Some(report));
        }
    }
}

async fn coach_reply(pending: &mut Option<JoinHandle<CoachReply>>) -> CoachReply {
    let Some(handle) = pending else {
        return std::future::pending().await;
    };
    let reply = handle.await.unwrap_or_else(|e| {
        warn!(error = %e, "coach task stopped");
        CoachReply::Failed("The coach stopped before answering.".to_string())
    });
    *pending = None;
    reply
}

/// Welcome screen, then sessions until the player quits. Each finished
/// session is appended to history before the coach is asked about it; the
/// coach's reply prints whenever it lands.
pub async fn run<R, W>(
    cfg: &AppConfig,
    store: &mut impl KeyValueStore,
    coach: Arc<Coach>,
    input: &mut Lines<R>,
    term: &mut Terminal<W>,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let rng = cfg.seed.map(Prng::new).unwrap_or_else(Prng::from_clock);
    let mut session = Session::new(cfg.game.clone(), rng);
    let mut timers = TimerRuntime::new();
    let mut history = load_history(store, cfg.history_cap);
    let mut pending: Option<JoinHandle<CoachReply>> = None;

    term.welcome(&cfg.game)?;
    loop {
        // Between sessions: Enter starts, q quits, coach replies print as they arrive.
        let start = loop {
            tokio::select! {
                reply = coach_reply(&mut pending) => term.coach(&reply)?,
                line = input.next_line() => break matches!(line?, Some(l) if !is_quit(&l)),
            }
        };
        if !start {
            break;
        }

        let Some(report) = play_session(&mut session, &mut timers, input, term).await? else {
            term.line("Session abandoned.")?;
            break;
        };
        history.append(report.history_entry(unix_millis_now()));
        save_history(store, &history)?;

        if let Some(old) = pending.take() {
            old.abort();
        }
        let coach = Arc::clone(&coach);
        pending = Some(tokio::spawn(async move { coach.feedback(&report).await }));
        term.line("Press Enter to play again, or q to quit.")?;
    }

    if let Some(handle) = pending {
        handle.abort();
    }
    Ok(())
}
