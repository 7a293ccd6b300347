//! Compiled-in game constants and the start-up configuration.
//!
//! Everything that shapes the board (grid size, capacities, timer periods)
//! is a `const`.  The handful of values that differ between two peer
//! processes are read once from the environment into [`GameConfig`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ── Playfield ─────────────────────────────────────────────────────────────────

pub const SCREEN_WIDTH: i32 = 448;
pub const SCREEN_HEIGHT: i32 = 512;

/// Bullets at or above this line have hit the ceiling.
pub const CEILING_Y: i32 = 40;
/// Bullets reaching this line have hit the floor.
pub const FLOOR_Y: i32 = SCREEN_HEIGHT - 45;

/// Horizontal margin the monster grid may not cross.
pub const PLAYFIELD_MARGIN: i32 = 10;

// ── Player ────────────────────────────────────────────────────────────────────

pub const INITIAL_LIVES: u32 = 3;

pub const SPACESHIP_Y: i32 = SCREEN_HEIGHT - 75;
pub const SPACESHIP_WIDTH: i32 = 26;
pub const SPACESHIP_HEIGHT: i32 = 16;
/// Pixels per input frame while a direction key is held.
pub const SPACESHIP_STEP: i32 = 4;

pub const SHOT_COOLDOWN: Duration = Duration::from_millis(500);

// ── Projectiles & effects ─────────────────────────────────────────────────────

/// Capacity of both the shots and the effects pipeline.
pub const MAX_OBJECTS: usize = 10;

pub const BULLET_WIDTH: i32 = 2;
pub const BULLET_HEIGHT: i32 = 8;
pub const BULLET_STEP: i32 = 4;

pub const EFFECT_FRAMES: u32 = 20;

// ── Monsters ──────────────────────────────────────────────────────────────────

pub const N_ROWS: usize = 5;
pub const N_COLUMNS: usize = 11;

pub const MONSTER_SPACING_H: i32 = 39;
pub const MONSTER_SPACING_V: i32 = 34;
pub const MONSTER_ORIGIN_X: i32 = 15;
pub const MONSTER_ORIGIN_Y: i32 = SCREEN_HEIGHT / 4;
pub const MONSTER_HEIGHT: i32 = 16;
pub const MONSTER_STEP: i32 = 4;
pub const MONSTER_DROP: i32 = 10;

/// Enemy step delay (ticks of 1 ms) at the start of a fresh game.
pub const ORIGINAL_MONSTER_DELAY: u32 = 65;
pub const MIN_MONSTER_DELAY: u32 = 1;
/// How far the slow-down cheat may raise the delay above the original.
pub const MONSTER_DELAY_CEILING: u32 = 20;
pub const KILL_SPEEDUP: u32 = 1;
pub const CHEAT_SLOWDOWN: u32 = 4;

/// Delay ticks per level when the board speeds up.
pub const LEVEL_DIVISOR_FASTER: i32 = 2;
/// Delay ticks per level rolled back when the board is slowed down.
pub const LEVEL_DIVISOR_SLOWER: i32 = 4;

pub const ENEMY_FIRE_PERIOD: Duration = Duration::from_millis(800);
pub const BOSS_FIRE_PERIOD: Duration = Duration::from_millis(1200);

// ── Bonus ship ────────────────────────────────────────────────────────────────

pub const BONUS_Y: i32 = 83;
pub const BONUS_WIDTH: i32 = 32;
pub const BONUS_HEIGHT: i32 = 14;
pub const BONUS_SCORES: [u32; 4] = [50, 100, 150, 300];
/// Awarded to the opponent tally when a boss bullet hits the spaceship.
pub const BOSS_HIT_POINTS: u32 = 100;

/// Full respawn-timer period.
pub const ORIGINAL_TIMER: Duration = Duration::from_millis(10_000);

// ── Bunkers ───────────────────────────────────────────────────────────────────

pub const N_BUNKERS: usize = 4;
pub const BUNKER_Y: i32 = 375;
pub const BUNKER_PIECE_WIDTH: i32 = 12;
pub const BUNKER_PIECE_HEIGHT: i32 = 12;
pub const BUNKER_MAX_DAMAGE: u8 = 3;

// ── Scheduling ────────────────────────────────────────────────────────────────

pub const GAME_TICK: Duration = Duration::from_millis(20);
pub const BONUS_TICK: Duration = Duration::from_millis(10);
pub const MODE_DEBOUNCE: Duration = Duration::from_millis(300);

// ── Peer sync ─────────────────────────────────────────────────────────────────

pub const UDP_RECEIVE_PORT: u16 = 1234;
pub const UDP_TRANSMIT_PORT: u16 = 1235;
pub const POSITION_SYNC_INTERVAL: Duration = Duration::from_millis(500);
pub const PEER_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Values fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub players: u8,
    pub peer_addr: IpAddr,
    pub receive_port: u16,
    pub transmit_port: u16,
    pub highscore_path: PathBuf,
    pub log_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            players: 1,
            peer_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            receive_port: UDP_RECEIVE_PORT,
            transmit_port: UDP_TRANSMIT_PORT,
            highscore_path: default_highscore_path(),
            log_path: PathBuf::from("space_invaders.log"),
        }
    }
}

impl GameConfig {
    /// Build the configuration from `INVADERS_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GameConfig::default();

        GameConfig {
            players: parsed::<u8>(&lookup, "INVADERS_PLAYERS")
                .filter(|n| (1..=2).contains(n))
                .unwrap_or(defaults.players),
            peer_addr: parsed(&lookup, "INVADERS_PEER_ADDR").unwrap_or(defaults.peer_addr),
            receive_port: parsed(&lookup, "INVADERS_RECV_PORT").unwrap_or(defaults.receive_port),
            transmit_port: parsed(&lookup, "INVADERS_SEND_PORT").unwrap_or(defaults.transmit_port),
            highscore_path: lookup("INVADERS_HIGHSCORE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.highscore_path),
            log_path: lookup("INVADERS_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
        }
    }

    pub fn receive_addr(&self) -> SocketAddr {
        SocketAddr::new(self.peer_addr, self.receive_port)
    }

    pub fn transmit_addr(&self) -> SocketAddr {
        SocketAddr::new(self.peer_addr, self.transmit_port)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn default_highscore_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".space_invaders_highscore")
}
