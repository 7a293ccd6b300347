#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use space_invaders::audio::{Sampler, SoundEffect};
use space_invaders::World;

/// Counts plays so a test can tell a sound was requested.
#[derive(Debug, Default)]
pub struct CountingSampler {
    plays: AtomicUsize,
}

impl CountingSampler {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::Relaxed)
    }
}

impl Sampler for CountingSampler {
    fn play(&self, _effect: SoundEffect) {
        self.plays.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn alive_monsters(world: &World) -> usize {
    world.monster_cells().iter().flatten().filter(|m| m.alive).count()
}
