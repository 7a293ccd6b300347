//! The enemy pacing register: how many ticks the mover waits between
//! stepping consecutive grid cells.  Only the latest value matters, so it is
//! a single atomic that every writer overwrites.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::{
    CHEAT_SLOWDOWN, KILL_SPEEDUP, LEVEL_DIVISOR_FASTER, LEVEL_DIVISOR_SLOWER,
    MIN_MONSTER_DELAY, MONSTER_DELAY_CEILING, ORIGINAL_MONSTER_DELAY,
};

#[derive(Debug)]
pub struct PacingRegister {
    delay: AtomicU32,
}

impl Default for PacingRegister {
    fn default() -> Self {
        PacingRegister::new(ORIGINAL_MONSTER_DELAY)
    }
}

impl PacingRegister {
    pub fn new(delay: u32) -> Self {
        PacingRegister {
            delay: AtomicU32::new(delay),
        }
    }

    pub fn get(&self) -> u32 {
        self.delay.load(Ordering::Acquire)
    }

    pub fn set(&self, delay: u32) {
        self.delay.store(delay.max(MIN_MONSTER_DELAY), Ordering::Release);
    }

    /// Distance from the original delay; negative once the board sped up.
    pub fn offset(&self) -> i32 {
        self.get() as i32 - ORIGINAL_MONSTER_DELAY as i32
    }

    /// Reinstall the register from a saved offset.
    pub fn restore_offset(&self, offset: i32) {
        let delay = (ORIGINAL_MONSTER_DELAY as i32 + offset).max(MIN_MONSTER_DELAY as i32);
        self.set(delay as u32);
    }

    /// One kill: the board gets a little faster.
    pub fn speed_up(&self) -> u32 {
        self.update(|d| d.saturating_sub(KILL_SPEEDUP).max(MIN_MONSTER_DELAY))
    }

    /// Cheat: slow the board down, wrapping back to the original delay
    /// instead of exceeding the ceiling.
    pub fn slow_down(&self) -> u32 {
        self.update(|d| {
            let slower = d + CHEAT_SLOWDOWN;
            if slower > ORIGINAL_MONSTER_DELAY + MONSTER_DELAY_CEILING {
                ORIGINAL_MONSTER_DELAY
            } else {
                slower
            }
        })
    }

    pub fn level(&self) -> i32 {
        level_for_delay(self.get())
    }

    /// Install the delay that belongs to `level`.
    pub fn start_level(&self, level: i32) {
        self.set(delay_for_level(level));
    }

    fn update(&self, f: impl Fn(u32) -> u32) -> u32 {
        let previous = self
            .delay
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| Some(f(d)))
            .unwrap_or_else(|d| d);
        f(previous)
    }
}

/// Signed level for a delay.  Speeding up advances a level every
/// `LEVEL_DIVISOR_FASTER` ticks; slowing down rolls back one level every
/// `LEVEL_DIVISOR_SLOWER` ticks.
pub fn level_for_delay(delay: u32) -> i32 {
    let offset = delay as i32 - ORIGINAL_MONSTER_DELAY as i32;
    if offset <= 0 {
        1 + (-offset) / LEVEL_DIVISOR_FASTER
    } else {
        1 - offset / LEVEL_DIVISOR_SLOWER
    }
}

pub fn delay_for_level(level: i32) -> u32 {
    let delay = ORIGINAL_MONSTER_DELAY as i32 - LEVEL_DIVISOR_FASTER * (level - 1).max(0);
    delay.max(MIN_MONSTER_DELAY as i32) as u32
}
