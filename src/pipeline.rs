//! Bounded collections for in-flight bullets and impact effects.
//!
//! A pipeline is scanned with a drain → process → refill [`Pipeline::pass`]:
//! the items are taken out under the lock, processed with the lock released
//! (so the processing step may lock other entities), and the survivors are
//! put back.  Items a pass has checked out still count against capacity, so
//! a producer inserting during the pass can never push the total past
//! `capacity`.  Producers block while the pipeline is full.

use std::mem;
use std::sync::{Condvar, Mutex, PoisonError};

use crate::slot::guard;

#[derive(Debug)]
struct Slots<T> {
    items: Vec<T>,
    checked_out: usize,
    /// Bumped by `reset`, so a pass straddling a reset drops its survivors.
    generation: u64,
    closed: bool,
}

impl<T> Slots<T> {
    fn occupied(&self) -> usize {
        self.items.len() + self.checked_out
    }
}

/// Outcome of one [`Pipeline::pass`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSummary {
    pub drained: usize,
    pub kept: usize,
}

impl PassSummary {
    pub fn consumed(&self) -> usize {
        self.drained - self.kept
    }
}

#[derive(Debug)]
pub struct Pipeline<T> {
    slots: Mutex<Slots<T>>,
    not_full: Condvar,
    capacity: usize,
}

impl<T> Pipeline<T> {
    pub fn new(capacity: usize) -> Self {
        Pipeline {
            slots: Mutex::new(Slots {
                items: Vec::with_capacity(capacity),
                checked_out: 0,
                generation: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items queued plus items checked out by a running pass.
    pub fn len(&self) -> usize {
        guard(&self.slots).occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert, waiting for room.  Hands the item back if the pipeline was
    /// closed while waiting.
    pub fn insert(&self, item: T) -> Result<(), T> {
        let mut slots = guard(&self.slots);
        while !slots.closed && slots.occupied() >= self.capacity {
            slots = self
                .not_full
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if slots.closed {
            return Err(item);
        }
        slots.items.push(item);
        Ok(())
    }

    /// Drain every queued item, run `f` on each, and requeue those for which
    /// it returns `Some`.
    pub fn pass<F>(&self, f: F) -> PassSummary
    where
        F: FnMut(T) -> Option<T>,
    {
        let (batch, generation) = {
            let mut slots = guard(&self.slots);
            let batch = mem::take(&mut slots.items);
            slots.checked_out += batch.len();
            (batch, slots.generation)
        };

        let drained = batch.len();
        let survivors: Vec<T> = batch.into_iter().filter_map(f).collect();

        let kept = {
            let mut slots = guard(&self.slots);
            if slots.generation == generation {
                slots.checked_out -= drained;
                let kept = survivors.len();
                slots.items.extend(survivors);
                kept
            } else {
                0
            }
        };
        self.not_full.notify_all();

        PassSummary { drained, kept }
    }

    /// Empty the pipeline, including anything a running pass holds.
    pub fn reset(&self) {
        {
            let mut slots = guard(&self.slots);
            slots.items.clear();
            slots.checked_out = 0;
            slots.generation += 1;
        }
        self.not_full.notify_all();
    }

    /// Release every blocked producer for good.
    pub fn close(&self) {
        guard(&self.slots).closed = true;
        self.not_full.notify_all();
    }

    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        guard(&self.slots).items.clone()
    }

    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        guard(&self.slots).items.iter().any(predicate)
    }
}
