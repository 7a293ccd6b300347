//! Pause-aware periodic timer behind the bonus-ship respawn cycle.
//!
//! Every (re)arm overwrites the cycle-start register.  Pausing reads it to
//! work out how much of the cycle already ran; resuming installs a one-off
//! period of `original − elapsed` so the time to the next respawn survives
//! the pause.  After it fires the timer re-arms with the full period.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::slot::{guard, Slot};

#[derive(Debug)]
struct TimerState {
    deadline: Option<Instant>,
    period: Duration,
    paused_elapsed: Duration,
    shutdown: bool,
}

#[derive(Debug)]
pub struct RespawnTimer {
    state: Mutex<TimerState>,
    wake: Condvar,
    cycle_start: Slot<Option<Instant>>,
    original: Duration,
}

impl RespawnTimer {
    pub fn new(original: Duration) -> Self {
        RespawnTimer {
            state: Mutex::new(TimerState {
                deadline: None,
                period: original,
                paused_elapsed: Duration::ZERO,
                shutdown: false,
            }),
            wake: Condvar::new(),
            cycle_start: Slot::new(None),
            original,
        }
    }

    /// Arm with the full period, starting a new cycle at `now`.
    pub fn start_at(&self, now: Instant) {
        {
            let mut state = guard(&self.state);
            state.period = self.original;
            state.deadline = Some(now + self.original);
            state.paused_elapsed = Duration::ZERO;
            self.cycle_start.overwrite(Some(now));
        }
        self.wake.notify_all();
    }

    pub fn stop(&self) {
        guard(&self.state).deadline = None;
        self.wake.notify_all();
    }

    /// Stop and remember how far into the cycle we were.
    pub fn pause_at(&self, now: Instant) -> Duration {
        let elapsed = {
            let mut state = guard(&self.state);
            let elapsed = self.elapsed_at(now);
            state.deadline = None;
            state.paused_elapsed = elapsed;
            elapsed
        };
        self.wake.notify_all();
        elapsed
    }

    /// Re-arm with whatever was left of the cycle when it was paused.
    /// Returns the installed period.
    pub fn resume_at(&self, now: Instant) -> Duration {
        let remaining = {
            let mut state = guard(&self.state);
            let remaining = self.original.saturating_sub(state.paused_elapsed);
            state.period = remaining;
            state.deadline = Some(now + remaining);
            let start = now.checked_sub(state.paused_elapsed).unwrap_or(now);
            self.cycle_start.overwrite(Some(start));
            remaining
        };
        self.wake.notify_all();
        remaining
    }

    /// Time since the current cycle started, capped at the full period.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.cycle_start
            .peek()
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
            .min(self.original)
    }

    /// The period installed by the last arm.
    pub fn period(&self) -> Duration {
        guard(&self.state).period
    }

    pub fn is_armed(&self) -> bool {
        guard(&self.state).deadline.is_some()
    }

    pub fn cycle_start(&self) -> Option<Instant> {
        self.cycle_start.peek()
    }

    /// Fire if the deadline has passed: re-arm for a full cycle and run
    /// `on_fire` with the timer still held, so `stop` and `pause_at` either
    /// land before the check or after `on_fire` has finished.
    pub fn poll_at(&self, now: Instant, on_fire: impl FnOnce()) -> bool {
        let mut state = guard(&self.state);
        match state.deadline {
            Some(deadline) if deadline <= now => {
                self.rearm(&mut state, now);
                on_fire();
                true
            }
            _ => false,
        }
    }

    /// Block until the deadline has passed (`true`) or the timer shuts down
    /// (`false`).  Does not fire; follow up with [`RespawnTimer::poll_at`].
    pub fn wait_due(&self) -> bool {
        let mut state = guard(&self.state);
        loop {
            if state.shutdown {
                return false;
            }
            let now = Instant::now();
            state = match state.deadline {
                Some(deadline) if deadline <= now => return true,
                Some(deadline) => {
                    self.wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.wake.wait(state).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    pub fn shutdown(&self) {
        guard(&self.state).shutdown = true;
        self.wake.notify_all();
    }

    fn rearm(&self, state: &mut TimerState, now: Instant) {
        state.period = self.original;
        state.deadline = Some(now + self.original);
        state.paused_elapsed = Duration::ZERO;
        self.cycle_start.overwrite(Some(now));
    }
}
