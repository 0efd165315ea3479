//! Timer runtime: turns the kernel's `Schedule` effects into tokio sleeps.
//!
//! All timers issued for the current phase share one cancellation token.
//! `cancel_pending` cancels it and drains anything already fired, so nothing
//! from a torn-down phase is delivered afterwards.

use brainage::session::SessionTimer;
use brainage::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Monotonic now, on tokio's clock so paused-time tests see the same time.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[derive(Debug, Clone)]
pub struct Fired {
    pub timer: SessionTimer,
    pub at: Instant,
}

#[derive(Debug)]
pub struct TimerRuntime {
    token: CancellationToken,
    tx: mpsc::UnboundedSender<Fired>,
    rx: mpsc::UnboundedReceiver<Fired>,
}

impl Default for TimerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerRuntime {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            token: CancellationToken::new(),
            tx,
            rx,
        }
    }

    pub fn schedule(&self, timer: SessionTimer) {
        let token = self.token.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timer.after) => {
                    let _ = tx.send(Fired { timer, at: now() });
                }
            }
        });
    }

    pub fn cancel_pending(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded fired timers from a cancelled phase");
        }
    }

    /// Next fired timer. Pends forever when nothing is scheduled.
    pub async fn next_fired(&mut self) -> Option<Fired> {
        self.rx.recv().await
    }
}

impl Drop for TimerRuntime {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
