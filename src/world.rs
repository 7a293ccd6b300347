//! The shared world: every entity behind its own guard, plus the registers,
//! pipelines, timer and mode gate the workers coordinate through.
//!
//! Locking rule: an operation holds at most one entity guard at a time.
//! Anything that needs two entities copies what it needs out of the first
//! guard and releases it before taking the second.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

use crate::audio::{LogSampler, Sampler, SoundEffect};
use crate::config::{MAX_OBJECTS, N_COLUMNS, N_ROWS, ORIGINAL_MONSTER_DELAY, ORIGINAL_TIMER};
use crate::entities::{
    BonusShip, Bullet, BunkerGrid, Effect, Monster, MonsterGrid, Player, SavedValues, Spaceship,
    StepSound,
};
use crate::mode::{Mode, ModeGate, ModeRequest};
use crate::pacing::PacingRegister;
use crate::pipeline::Pipeline;
use crate::slot::{guard, try_guard};
use crate::timer::RespawnTimer;

pub struct World {
    pub player: Mutex<Player>,
    pub saved: Mutex<SavedValues>,
    pub spaceship: Mutex<Spaceship>,
    pub monsters: Mutex<MonsterGrid>,
    pub bonus: Mutex<BonusShip>,
    pub bunkers: Mutex<BunkerGrid>,

    pub pacing: PacingRegister,
    pub shots: Pipeline<Bullet>,
    pub effects: Pipeline<Effect>,
    pub respawn: RespawnTimer,
    pub gate: ModeGate,

    /// Set by the frontend, consumed by the shooter worker.
    pub fire_requested: AtomicBool,
    requests: SyncSender<ModeRequest>,
    sampler: Arc<dyn Sampler>,
}

impl World {
    /// A world in menu mode, and the receiving end of its single-slot
    /// mode-request channel.
    pub fn new(highscore: u32, n_players: u8) -> (World, Receiver<ModeRequest>) {
        Self::with_sampler(highscore, n_players, Arc::new(LogSampler))
    }

    pub fn with_sampler(
        highscore: u32,
        n_players: u8,
        sampler: Arc<dyn Sampler>,
    ) -> (World, Receiver<ModeRequest>) {
        let (requests, receiver) = mpsc::sync_channel(1);

        let step_sampler = Arc::clone(&sampler);
        let monsters = MonsterGrid {
            on_step: Some(StepSound(Arc::new(move || {
                step_sampler.play(SoundEffect::MonsterStep)
            }))),
            ..MonsterGrid::default()
        };

        let world = World {
            player: Mutex::new(Player::new(highscore, n_players)),
            saved: Mutex::new(SavedValues::default()),
            spaceship: Mutex::new(Spaceship::default()),
            monsters: Mutex::new(monsters),
            bonus: Mutex::new(BonusShip::default()),
            bunkers: Mutex::new(BunkerGrid::default()),
            pacing: PacingRegister::default(),
            shots: Pipeline::new(MAX_OBJECTS),
            effects: Pipeline::new(MAX_OBJECTS),
            respawn: RespawnTimer::new(ORIGINAL_TIMER),
            gate: ModeGate::new(Mode::Menu),
            fire_requested: AtomicBool::new(false),
            requests,
            sampler,
        };
        (world, receiver)
    }

    pub fn play(&self, effect: SoundEffect) {
        self.sampler.play(effect);
    }

    // ── Mode requests ────────────────────────────────────────────────────────

    /// Keyboard request: dropped if one is already waiting.
    pub fn request(&self, request: ModeRequest) {
        match self.requests.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(r)) => log::debug!("{r:?} dropped, request slot busy"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Internal request: waits for the slot.
    pub fn signal(&self, request: ModeRequest) {
        if self.requests.send(request).is_err() {
            log::debug!("{request:?} lost, mode controller gone");
        }
    }

    pub fn mode(&self) -> Mode {
        self.gate.current()
    }

    /// Peer sync is only live mid-match in two-player mode.
    pub fn is_sync_active(&self) -> bool {
        self.mode() == Mode::Playing && self.is_two_player()
    }

    // ── Player economy ───────────────────────────────────────────────────────

    pub fn player(&self) -> Player {
        guard(&self.player).clone()
    }

    pub fn is_two_player(&self) -> bool {
        guard(&self.player).is_two_player()
    }

    pub fn set_players(&self, n_players: u8) {
        guard(&self.player).n_players = n_players.clamp(1, 2);
    }

    pub fn insert_coin(&self) {
        guard(&self.player).credits += 1;
    }

    pub fn use_coin(&self) {
        let mut player = guard(&self.player);
        player.credits = player.credits.saturating_sub(1);
    }

    pub fn set_level(&self, level: i32) {
        guard(&self.player).level = level;
    }

    pub fn add_score(&self, points: u32) {
        let mut player = guard(&self.player);
        player.score1 += points;
        player.fold_highscore();
    }

    pub fn add_opponent_score(&self, points: u32) {
        guard(&self.player).score2 += points;
    }

    /// Take one life.  Returns the lives left.
    pub fn lose_life(&self) -> u32 {
        let mut player = guard(&self.player);
        player.n_lives = player.n_lives.saturating_sub(1);
        player.n_lives
    }

    pub fn reset_player(&self, saved: &SavedValues) {
        guard(&self.player).restore(saved);
    }

    pub fn saved_values(&self) -> SavedValues {
        *guard(&self.saved)
    }

    /// Snapshot the economy so the next match can resume it.
    pub fn update_saved_values(&self) {
        let (n_lives, score, credits) = {
            let player = guard(&self.player);
            (player.n_lives, player.score1, player.credits)
        };
        let offset = self.pacing.offset();
        *guard(&self.saved) = SavedValues {
            n_lives,
            score,
            offset,
            credits,
        };
    }

    /// Last life gone: fold the score into the highscore, start the economy
    /// over and send the controller back to the menu.
    pub fn game_over(&self) {
        let highscore = {
            let mut player = guard(&self.player);
            player.reset_economy();
            player.highscore
        };
        self.pacing.set(ORIGINAL_MONSTER_DELAY);
        log::info!("game over, highscore {highscore}");
        self.signal(ModeRequest::GameOver);
    }

    // ── Spaceship ────────────────────────────────────────────────────────────

    pub fn spaceship(&self) -> Spaceship {
        *guard(&self.spaceship)
    }

    /// Input path: skip the frame rather than wait for the guard.
    pub fn try_move_spaceship(&self, dx: i32) -> bool {
        match try_guard(&self.spaceship) {
            Some(mut ship) => {
                ship.move_by(dx);
                true
            }
            None => false,
        }
    }

    pub fn reset_spaceship(&self) {
        guard(&self.spaceship).reset();
    }

    // ── Bonus ship ───────────────────────────────────────────────────────────

    pub fn bonus(&self) -> BonusShip {
        *guard(&self.bonus)
    }

    /// Round start: in two-player mode the opponent ship is placed on the
    /// field, otherwise it waits offscreen for the respawn timer.
    pub fn arm_bonus(&self) {
        let two_player = self.is_two_player();
        let mut bonus = guard(&self.bonus);
        if two_player {
            bonus.set_up_two_player();
        } else {
            bonus.reset();
        }
    }

    /// Respawn-timer callback.
    pub fn respawn_bonus(&self) {
        let two_player = self.is_two_player();
        guard(&self.bonus).respawn(two_player);
        self.play(SoundEffect::BonusShip);
    }

    // ── Board ────────────────────────────────────────────────────────────────

    /// Everything back to round-start state for the menu.
    pub fn reset_board(&self) {
        self.shots.reset();
        self.effects.reset();
        guard(&self.monsters).reset();
        guard(&self.spaceship).reset();
        guard(&self.bunkers).reset();
        guard(&self.bonus).reset();
        self.fire_requested.store(false, Ordering::Relaxed);
    }

    /// The last monster died: clear the board and move up one level.
    /// Returns the new level.
    pub fn clear_board(&self) -> i32 {
        self.shots.reset();
        self.effects.reset();
        guard(&self.monsters).reset();

        let level = guard(&self.player).level + 1;
        self.pacing.start_level(level);

        guard(&self.spaceship).reset();
        guard(&self.bonus).reset();

        self.set_level(level);
        log::info!("board cleared, level {level}");
        level
    }

    pub fn monster_cells(&self) -> [[Monster; N_COLUMNS]; N_ROWS] {
        guard(&self.monsters).cells
    }

    pub fn bunkers(&self) -> BunkerGrid {
        guard(&self.bunkers).clone()
    }
}
