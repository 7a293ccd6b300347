//! Worker threads.
//!
//! Mode-owned workers block on the [`ModeGate`](crate::mode::ModeGate) at
//! the head of every iteration, so closing the gate suspends them at their
//! next natural block point and nothing is ever torn down mid-step.  The
//! controller, the respawn timer and the peer receiver are not mode-owned.

use std::net::UdpSocket;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{thread_rng, Rng};

use crate::audio::SoundEffect;
use crate::compute;
use crate::config::{BONUS_TICK, BOSS_FIRE_PERIOD, ENEMY_FIRE_PERIOD, GAME_TICK, SHOT_COOLDOWN};
use crate::entities::BulletKind;
use crate::error::GameError;
use crate::mode::{Mode, ModeMachine, ModeRequest};
use crate::peer::{self, PeerLink};
use crate::slot::guard;
use crate::world::World;

pub struct Workers {
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Spawn every worker.  `peer` and `peer_socket` are `None` when the
    /// peer link could not be opened; the match then runs unsynchronized.
    pub fn spawn(
        world: &Arc<World>,
        requests: Receiver<ModeRequest>,
        peer: Option<Arc<PeerLink>>,
        peer_socket: Option<UdpSocket>,
    ) -> Result<Workers, GameError> {
        let mut workers = Workers { handles: Vec::new() };

        let machine = ModeMachine::new(Arc::clone(world));
        workers.spawn_named("mode-controller", move || machine.run(requests))?;

        let w = Arc::clone(world);
        workers.spawn_named("monster-mover", move || monster_mover(&w))?;

        let w = Arc::clone(world);
        workers.spawn_named("shooter", move || shooter(&w))?;

        let w = Arc::clone(world);
        workers.spawn_named("projectiles", move || projectiles(&w, peer.as_deref()))?;

        let w = Arc::clone(world);
        workers.spawn_named("effects", move || {
            every(&w, Mode::Playing, GAME_TICK, || {
                compute::age_effects(&w);
            })
        })?;

        let w = Arc::clone(world);
        workers.spawn_named("bonus-mover", move || {
            every(&w, Mode::Playing, BONUS_TICK, || compute::move_bonus(&w))
        })?;

        let w = Arc::clone(world);
        workers.spawn_named("respawn-timer", move || {
            while w.respawn.wait_due() {
                w.respawn.poll_at(Instant::now(), || w.respawn_bonus());
            }
        })?;

        if let Some(socket) = peer_socket {
            let w = Arc::clone(world);
            workers.spawn_named("peer-receiver", move || peer::receive_loop(&w, socket))?;
        }

        Ok(workers)
    }

    fn spawn_named<F>(&mut self, name: &'static str, f: F) -> Result<(), GameError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(f)
            .map_err(|source| GameError::Spawn { name, source })?;
        self.handles.push(handle);
        Ok(())
    }

    /// Release every blocking point and wait for the threads to finish.
    pub fn shutdown(self, world: &World) {
        world.gate.shutdown();
        world.respawn.shutdown();
        world.shots.close();
        world.effects.close();
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::warn!("{name} panicked");
            }
        }
    }
}

/// Run `step` once per `period` for as long as the gate lets `mode` through.
fn every(world: &World, mode: Mode, period: Duration, mut step: impl FnMut()) {
    while world.gate.wait_for(mode) {
        let started = Instant::now();
        step();
        if let Some(rest) = period.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}

fn jittered(period: Duration, rng: &mut impl Rng) -> Duration {
    let base = period.as_millis() as u64;
    Duration::from_millis(rng.gen_range(base / 2..=base * 3 / 2))
}

// ── Workers ───────────────────────────────────────────────────────────────────

/// Steps one cell at a time, waiting the pacing register's delay after each
/// live cell, then runs the wall check.
fn monster_mover(world: &World) {
    let order: Vec<(usize, usize)> = compute::sweep_order().collect();
    loop {
        let mut stepped_any = false;
        for &(row, col) in &order {
            if !world.gate.wait_for(Mode::Playing) {
                return;
            }
            if compute::move_monster(world, row, col) {
                stepped_any = true;
                thread::sleep(Duration::from_millis(u64::from(world.pacing.get())));
            }
        }
        if !world.gate.wait_for(Mode::Playing) {
            return;
        }
        compute::finish_sweep(world);
        if !stepped_any {
            thread::sleep(GAME_TICK);
        }
    }
}

/// Player shots (on request, with a cooldown), enemy shots, and in
/// two-player mode the opponent's boss shots.  Inserts block while the
/// shots pipeline is full.
fn shooter(world: &World) {
    let mut rng = thread_rng();
    let mut last_shot: Option<Instant> = None;
    let mut next_enemy = Instant::now() + jittered(ENEMY_FIRE_PERIOD, &mut rng);
    let mut next_boss = Instant::now() + BOSS_FIRE_PERIOD;

    every(world, Mode::Playing, GAME_TICK, || {
        let now = Instant::now();

        if world.fire_requested.swap(false, Ordering::AcqRel)
            && last_shot.map_or(true, |t| now.saturating_duration_since(t) >= SHOT_COOLDOWN)
        {
            let bullet = compute::player_shot(&world.spaceship());
            match world.shots.insert(bullet) {
                Ok(()) => world.play(SoundEffect::Shoot),
                Err(_) => log::debug!("player shot dropped, shots pipeline closed"),
            }
            last_shot = Some(now);
        }

        if now >= next_enemy {
            let bullet = compute::pick_shooter(&guard(&world.monsters), &mut rng);
            if let Some(bullet) = bullet {
                if world.shots.insert(bullet).is_err() {
                    log::debug!("enemy shot dropped, shots pipeline closed");
                }
            }
            next_enemy = now + jittered(ENEMY_FIRE_PERIOD, &mut rng);
        }

        if now >= next_boss {
            if world.is_two_player() {
                if let Some(bullet) = compute::boss_shot(&world.bonus()) {
                    if world.shots.insert(bullet).is_err() {
                        log::debug!("boss shot dropped, shots pipeline closed");
                    }
                }
            }
            next_boss = now + BOSS_FIRE_PERIOD;
        }
    });
}

fn projectiles(world: &World, peer: Option<&PeerLink>) {
    let mut rng = thread_rng();
    every(world, Mode::Playing, GAME_TICK, || {
        compute::update_pass(world);
        compute::collision_pass(world, &mut rng);
        if let Some(peer) = peer {
            let attacking = world.shots.any(|b| b.kind == BulletKind::Player);
            peer.sync_bullet_state(world, attacking);
        }
    });
}
