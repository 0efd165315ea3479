//! Criterion benchmarks for the assessment kernel.
//!
//! Run with:
//!   cargo bench -p brainage
//!
//! Results are saved to target/criterion/

use std::collections::VecDeque;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use brainage::history::{History, HistoryEntry};
use brainage::prelude::*;
use brainage::time::{Duration, Instant};

/// Drive a whole session with a perfect, instant player. Memory stops after
/// `memory_levels` correct answers.
fn play_headless(seed: u64, memory_levels: u32) -> Report {
    let mut session = Session::new(GameConfig::default(), Prng::new(seed));
    let mut now = Instant::now();
    let mut timers: VecDeque<SessionTimer> = VecDeque::new();
    let mut answered = 0;

    let mut effects: VecDeque<Effect> = session.start().into();
    loop {
        while let Some(effect) = effects.pop_front() {
            match effect {
                Effect::Schedule(t) => timers.push_back(t),
                Effect::CancelPending => timers.clear(),
                Effect::Notice(Notice::Stimulus) => {
                    now += Duration::from_millis(240);
                    effects.extend(session.signal(now));
                }
                Effect::Notice(Notice::InputOpen { .. }) => {
                    let attempt = if answered < memory_levels {
                        answered += 1;
                        match session.stage() {
                            Stage::Memory(p) => p.sequence().to_string(),
                            _ => String::new(),
                        }
                    } else {
                        "x".to_string()
                    };
                    effects.extend(session.submit(&attempt, now));
                }
                Effect::Notice(Notice::ProblemPresented { problem, .. }) => {
                    now += Duration::from_millis(1500);
                    effects.extend(session.submit(&problem.answer.to_string(), now));
                }
                Effect::Notice(Notice::Finished(report)) => return report,
                Effect::Notice(_) => {}
            }
        }
        let Some(t) = timers.pop_front() else {
            unreachable!("session stalled without a pending timer");
        };
        now += t.after;
        effects.extend(session.wake(t.ticket, t.wake, now));
    }
}

fn bench_full_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    for levels in [1u32, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("headless", levels), levels, |b, &levels| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                black_box(play_headless(seed, levels).brain_age())
            });
        });
    }

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let cfg = ScoringConfig::default();
    let bundle = ScoreBundle::new(312.4, 5, 2450.0);

    c.bench_function("breakdown", |b| {
        b.iter(|| black_box(cfg.breakdown(black_box(&bundle))))
    });
}

fn bench_history_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_summary");

    for len in [10usize, 100, 1000].iter() {
        let mut history = History::new(None);
        for i in 0..*len {
            history.append(HistoryEntry {
                recorded_at_ms: i as u64,
                scores: ScoreBundle::new(250.0 + (i % 40) as f64, 3 + (i % 5) as u32, 2100.0),
                brain_age: 20 + (i % 30) as u32,
            });
        }
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &history, |b, h| {
            b.iter(|| black_box(h.summary()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_full_session,
    bench_scoring,
    bench_history_summary,
);

criterion_main!(benches);
