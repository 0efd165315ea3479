//! Deferred continuations for phases.
//!
//! Phases never sleep. When a phase needs to resume later (stimulus onset,
//! end of a display window, end of a cooldown) it hands back a [`Timer`] and
//! the host runtime calls the phase again when the delay has passed.
//!
//! Each phase owns one [`TimerSlot`]. A slot holds at most one live
//! [`Ticket`]: arming a new timer revokes the previous one, and the slot is
//! stamped with the session's phase epoch. A wake-up whose ticket is not the
//! live one is stale and must be dropped, which keeps callbacks from an old
//! attempt, an old phase, or an abandoned session from mutating state.

use crate::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ticket {
    epoch: u32,
    serial: u32,
}

impl Ticket {
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// A request to call back into a phase after `after` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer<W> {
    pub after: Duration,
    pub wake: W,
    pub ticket: Ticket,
}

impl<W> Timer<W> {
    /// Re-tag the wake payload (phase-level wake → session-level wake).
    pub fn map<V>(self, f: impl FnOnce(W) -> V) -> Timer<V> {
        Timer {
            after: self.after,
            wake: f(self.wake),
            ticket: self.ticket,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerSlot {
    epoch: u32,
    serial: u32,
    live: Option<Ticket>,
}

impl TimerSlot {
    pub fn new(epoch: u32) -> Self {
        Self {
            epoch,
            serial: 0,
            live: None,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Issue a timer, revoking whatever was pending.
    pub fn arm<W>(&mut self, after: Duration, wake: W) -> Timer<W> {
        self.serial = self.serial.wrapping_add(1);
        let ticket = Ticket {
            epoch: self.epoch,
            serial: self.serial,
        };
        self.live = Some(ticket);
        Timer {
            after,
            wake,
            ticket,
        }
    }

    /// Consume the live ticket. Returns `false` for stale or already-fired tickets.
    pub fn fire(&mut self, ticket: Ticket) -> bool {
        if self.live == Some(ticket) {
            self.live = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.live = None;
    }

    pub fn is_pending(&self) -> bool {
        self.live.is_some()
    }
}
