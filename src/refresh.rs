//! Periodic refresh with explicit cancellation.
//!
//! A [`RefreshSchedule`] runs a closure on the caller's thread once per
//! interval until the closure asks to stop, a tick budget runs out, or a
//! [`CancellationToken`] is cancelled. Cancellation is observed between
//! ticks; a tick already running is allowed to finish.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::{Error, Result};

/// Shared cancellation flag.
///
/// Cancelling drops the only sender, which disconnects every receiver and
/// wakes any schedule blocked in `select!`.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, receiver) = channel::bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

/// Why a schedule stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    /// The configured number of ticks ran
    Exhausted,
    /// The tick closure returned `ControlFlow::Break`
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub ticks: usize,
    pub stopped: StopReason,
}

#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    interval: Duration,
    max_ticks: Option<usize>,
    immediate: bool,
}

impl RefreshSchedule {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::configuration("refresh interval must be greater than zero"));
        }
        Ok(Self {
            interval,
            max_ticks: None,
            immediate: true,
        })
    }

    /// Stop after `max_ticks` runs of the closure.
    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Wait one interval before the first tick instead of running at once.
    pub fn delayed_start(mut self) -> Self {
        self.immediate = false;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block the current thread, calling `on_tick` with the 1-based tick number.
    pub fn run<F>(&self, token: &CancellationToken, mut on_tick: F) -> RefreshOutcome
    where
        F: FnMut(usize) -> ControlFlow<()>,
    {
        let mut ticks = 0;
        let outcome = |ticks, stopped| RefreshOutcome { ticks, stopped };
        let exhausted = |ticks: usize| self.max_ticks.is_some_and(|max| ticks >= max);

        if token.is_cancelled() {
            return outcome(0, StopReason::Cancelled);
        }
        if exhausted(0) {
            return outcome(0, StopReason::Exhausted);
        }

        if self.immediate {
            ticks += 1;
            if on_tick(ticks).is_break() {
                return outcome(ticks, StopReason::Finished);
            }
        }

        let ticker = channel::tick(self.interval);
        loop {
            if exhausted(ticks) {
                debug!(ticks, "refresh budget exhausted");
                return outcome(ticks, StopReason::Exhausted);
            }
            channel::select! {
                recv(token.receiver()) -> _ => {
                    debug!(ticks, "refresh cancelled");
                    return outcome(ticks, StopReason::Cancelled);
                }
                recv(ticker) -> _ => {
                    ticks += 1;
                    if on_tick(ticks).is_break() {
                        return outcome(ticks, StopReason::Finished);
                    }
                }
            }
        }
    }
}
