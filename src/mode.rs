//! The mode state machine.
//!
//! A single controller thread consumes [`ModeRequest`]s, debounces the ones
//! that come from the keyboard, and on every accepted transition
//!
//! 1. publishes the new mode to the current-mode cell,
//! 2. closes the [`ModeGate`] so no mode-owned worker starts another step,
//! 3. runs the entry actions of the new mode,
//! 4. opens the gate for the workers of the new mode.
//!
//! Workers are never terminated; they block on the gate at their loop head.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::MODE_DEBOUNCE;
use crate::slot::{guard, Slot};
use crate::world::World;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Menu,
    Playing,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeRequest {
    /// Keyboard: forwards (start, pause, resume).
    Advance,
    /// Keyboard: back to the menu.
    Retreat,
    /// Every monster is dead; restart the round in place.
    RoundCleared,
    /// Lives exhausted or the grid reached the player line.
    GameOver,
}

/// Where a keyboard signal leads from `mode`, if anywhere.
pub fn next_mode(mode: Mode, request: ModeRequest) -> Option<Mode> {
    match (mode, request) {
        (Mode::Menu, ModeRequest::Advance) => Some(Mode::Playing),
        (Mode::Playing, ModeRequest::Advance) => Some(Mode::Paused),
        (Mode::Paused, ModeRequest::Advance) => Some(Mode::Playing),
        (Mode::Playing | Mode::Paused, ModeRequest::Retreat) => Some(Mode::Menu),
        _ => None,
    }
}

// ── Debounce ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    last: Option<Instant>,
}

impl Default for Debounce {
    fn default() -> Self {
        Debounce::new(MODE_DEBOUNCE)
    }
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Debounce { window, last: None }
    }

    /// Accept if at least `window` passed since the last accepted call.
    pub fn accept(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

// ── Gate ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct GateState {
    open_for: Option<Mode>,
    shutdown: bool,
}

/// Suspend/resume for mode-owned workers.
#[derive(Debug)]
pub struct ModeGate {
    state: Mutex<GateState>,
    changed: Condvar,
    current: Slot<Mode>,
}

impl ModeGate {
    pub fn new(initial: Mode) -> Self {
        ModeGate {
            state: Mutex::new(GateState {
                open_for: Some(initial),
                shutdown: false,
            }),
            changed: Condvar::new(),
            current: Slot::new(initial),
        }
    }

    /// Latest published mode.  For gating decisions only.
    pub fn current(&self) -> Mode {
        self.current.peek()
    }

    pub fn publish(&self, mode: Mode) {
        self.current.overwrite(mode);
    }

    pub fn suspend_all(&self) {
        guard(&self.state).open_for = None;
    }

    pub fn resume(&self, mode: Mode) {
        guard(&self.state).open_for = Some(mode);
        self.changed.notify_all();
    }

    /// Block until the gate opens for `mode`.  `false` once shut down.
    pub fn wait_for(&self, mode: Mode) -> bool {
        let mut state = guard(&self.state);
        loop {
            if state.shutdown {
                return false;
            }
            if state.open_for == Some(mode) {
                return true;
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn shutdown(&self) {
        guard(&self.state).shutdown = true;
        self.changed.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        guard(&self.state).shutdown
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

pub struct ModeMachine {
    world: Arc<World>,
    mode: Mode,
    debounce: Debounce,
    /// A round was cleared while paused; the next resume restarts it.
    round_pending: bool,
}

impl ModeMachine {
    pub fn new(world: Arc<World>) -> Self {
        let mode = world.gate.current();
        ModeMachine {
            world,
            mode,
            debounce: Debounce::default(),
            round_pending: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply one request.  Returns the mode entered, if the request was
    /// accepted.
    pub fn handle(&mut self, request: ModeRequest, now: Instant) -> Option<Mode> {
        let from = self.mode;
        let to = match request {
            ModeRequest::Advance | ModeRequest::Retreat => {
                let to = next_mode(from, request)?;
                if !self.debounce.accept(now) {
                    log::debug!("{request:?} inside debounce window, dropped");
                    return None;
                }
                to
            }
            ModeRequest::RoundCleared if from == Mode::Playing => Mode::Playing,
            ModeRequest::RoundCleared if from == Mode::Paused => {
                log::debug!("round cleared while paused, restart deferred to resume");
                self.round_pending = true;
                return None;
            }
            ModeRequest::GameOver if from != Mode::Menu => Mode::Menu,
            _ => return None,
        };
        let restart_round = to != Mode::Paused && std::mem::take(&mut self.round_pending);

        self.world.gate.publish(to);
        self.world.gate.suspend_all();
        run_entry_actions(&self.world, from, to, restart_round, now);
        self.world.gate.resume(to);
        self.mode = to;

        log::info!("mode {from:?} -> {to:?} ({request:?})");
        Some(to)
    }

    /// Controller loop; returns once the gate is shut down.
    pub fn run(mut self, requests: Receiver<ModeRequest>) {
        while !self.world.gate.is_shut_down() {
            match requests.recv_timeout(SHUTDOWN_POLL) {
                Ok(request) => {
                    self.handle(request, Instant::now());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

// ── Entry actions ─────────────────────────────────────────────────────────────

fn run_entry_actions(world: &World, from: Mode, to: Mode, restart_round: bool, now: Instant) {
    match (from, to) {
        (_, Mode::Menu) => enter_menu(world),
        (Mode::Paused, Mode::Playing) if restart_round => start_round(world, now),
        (Mode::Paused, Mode::Playing) => {
            let remaining = world.respawn.resume_at(now);
            log::debug!("respawn timer resumed with {remaining:?} left");
        }
        (Mode::Menu, Mode::Playing) => {
            start_match(world);
            start_round(world, now);
        }
        (_, Mode::Playing) => start_round(world, now),
        (_, Mode::Paused) => {
            let elapsed = world.respawn.pause_at(now);
            log::debug!("respawn timer paused {elapsed:?} into its cycle");
        }
    }
}

fn enter_menu(world: &World) {
    world.update_saved_values();
    // Timer first: a respawn already in flight finishes before the board resets.
    world.respawn.stop();
    world.reset_board();
}

/// Menu → Playing: bring back the economy saved in the menu.
fn start_match(world: &World) {
    let saved = world.saved_values();
    world.reset_player(&saved);
    world.use_coin();
    world.pacing.restore_offset(saved.offset);
}

fn start_round(world: &World, now: Instant) {
    let level = world.pacing.level();
    world.set_level(level);
    world.arm_bonus();
    world.respawn.start_at(now);
}
