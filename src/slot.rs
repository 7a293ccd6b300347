//! Single-slot cells and the lock helper every guard goes through.

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// Lock `mutex`, recovering the data if a previous holder panicked.  Every
/// critical section in the game leaves its entity consistent, so a poisoned
/// guard carries no torn state.
pub fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Non-blocking variant of [`guard`]; `None` when another worker holds it.
pub fn try_guard<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(g) => Some(g),
        Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// A cell that only ever holds the most recently written value.
#[derive(Debug, Default)]
pub struct Slot<T: Copy> {
    value: Mutex<T>,
}

impl<T: Copy> Slot<T> {
    pub fn new(value: T) -> Self {
        Slot {
            value: Mutex::new(value),
        }
    }

    pub fn overwrite(&self, value: T) {
        *guard(&self.value) = value;
    }

    pub fn peek(&self) -> T {
        *guard(&self.value)
    }
}
