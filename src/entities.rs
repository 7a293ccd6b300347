//! All game entity types, with the per-entity `reset` and mutators.
//!
//! Nothing in here knows about locking: [`crate::world::World`] owns one
//! guard per entity and calls these while holding it.

use std::fmt;
use std::sync::Arc;

use crate::config::{
    BONUS_HEIGHT, BONUS_WIDTH, BONUS_Y, BULLET_HEIGHT, BULLET_STEP, BULLET_WIDTH,
    BUNKER_MAX_DAMAGE, BUNKER_PIECE_HEIGHT, BUNKER_PIECE_WIDTH, BUNKER_Y, INITIAL_LIVES,
    MONSTER_HEIGHT, MONSTER_ORIGIN_X, MONSTER_ORIGIN_Y, MONSTER_SPACING_H, MONSTER_SPACING_V,
    N_BUNKERS, N_COLUMNS, N_ROWS, SCREEN_WIDTH, SPACESHIP_HEIGHT, SPACESHIP_WIDTH, SPACESHIP_Y,
};

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Opaque name of an image resolved by the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHandle(pub &'static str);

// ── Player economy ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub score1: u32,
    /// Opponent tally in two-player mode.
    pub score2: u32,
    pub highscore: u32,
    pub n_lives: u32,
    pub credits: u32,
    pub n_players: u8,
    pub level: i32,
}

impl Player {
    pub fn new(highscore: u32, n_players: u8) -> Self {
        Player {
            score1: 0,
            score2: 0,
            highscore,
            n_lives: INITIAL_LIVES,
            credits: 0,
            n_players,
            level: 1,
        }
    }

    pub fn fold_highscore(&mut self) {
        self.highscore = self.highscore.max(self.score1);
    }

    /// Restore the economy of a match from the menu snapshot.
    pub fn restore(&mut self, saved: &SavedValues) {
        self.fold_highscore();
        self.score1 = saved.score;
        self.score2 = 0;
        self.n_lives = saved.n_lives;
        self.credits = saved.credits;
    }

    /// Back to a fresh game after the last life is gone.  Credits survive.
    pub fn reset_economy(&mut self) {
        self.fold_highscore();
        self.score1 = 0;
        self.score2 = 0;
        self.n_lives = INITIAL_LIVES;
        self.level = 1;
    }

    pub fn is_two_player(&self) -> bool {
        self.n_players == 2
    }
}

/// Snapshot taken in the menu so a match can resume its economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedValues {
    pub n_lives: u32,
    pub score: u32,
    /// Pacing register minus its original value.
    pub offset: i32,
    pub credits: u32,
}

impl Default for SavedValues {
    fn default() -> Self {
        SavedValues {
            n_lives: INITIAL_LIVES,
            score: 0,
            offset: 0,
            credits: 0,
        }
    }
}

// ── Spaceship ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spaceship {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for Spaceship {
    fn default() -> Self {
        Spaceship {
            x: Self::home_x(),
            y: SPACESHIP_Y,
            width: SPACESHIP_WIDTH,
            height: SPACESHIP_HEIGHT,
        }
    }
}

impl Spaceship {
    pub fn home_x() -> i32 {
        SCREEN_WIDTH / 2 - SPACESHIP_WIDTH / 2
    }

    pub fn reset(&mut self) {
        self.x = Self::home_x();
    }

    /// Move horizontally, clamped to the playfield.
    pub fn move_by(&mut self, dx: i32) {
        self.set_position(self.x + dx);
    }

    pub fn set_position(&mut self, x: i32) {
        self.x = x.clamp(0, SCREEN_WIDTH - self.width);
    }

    pub fn rect(&self) -> Rect {
        Rect { x: self.x, y: self.y, width: self.width, height: self.height }
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletKind {
    Player,
    Enemy,
    /// Fired by the bonus ship in two-player mode.
    Boss,
}

impl BulletKind {
    /// Signed vertical step per game tick.
    pub fn step(&self) -> i32 {
        match self {
            BulletKind::Player => -BULLET_STEP,
            BulletKind::Enemy | BulletKind::Boss => BULLET_STEP,
        }
    }

    pub fn is_hostile(&self) -> bool {
        !matches!(self, BulletKind::Player)
    }

    pub fn colour(&self) -> u32 {
        match self {
            BulletKind::Player => 0xFF_FF_FF,
            BulletKind::Enemy => 0xFF_40_40,
            BulletKind::Boss => 0xFF_00_FF,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bullet {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: BulletKind,
    pub colour: u32,
}

impl Bullet {
    /// A bullet centred on `center_x`, its leading edge at `y`.
    pub fn fired(kind: BulletKind, center_x: i32, y: i32) -> Self {
        let top = match kind {
            BulletKind::Player => y - BULLET_HEIGHT,
            BulletKind::Enemy | BulletKind::Boss => y,
        };
        Bullet {
            x: center_x - BULLET_WIDTH / 2,
            y: top,
            width: BULLET_WIDTH,
            height: BULLET_HEIGHT,
            kind,
            colour: kind.colour(),
        }
    }

    pub fn advance(&mut self) {
        self.y += self.kind.step();
    }

    pub fn rect(&self) -> Rect {
        Rect { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Effect {
    pub x: i32,
    pub y: i32,
    pub image: Option<ImageHandle>,
    pub frames: u32,
}

impl Effect {
    pub fn at(x: i32, y: i32, image: Option<ImageHandle>) -> Self {
        Effect { x, y, image, frames: 0 }
    }
}

// ── Monsters ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonsterKind {
    Small,
    Medium,
    Large,
}

impl MonsterKind {
    pub fn for_row(row: usize) -> Self {
        match row {
            0 => MonsterKind::Small,
            1 | 2 => MonsterKind::Medium,
            _ => MonsterKind::Large,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            MonsterKind::Small => 30,
            MonsterKind::Medium => 20,
            MonsterKind::Large => 10,
        }
    }

    pub fn width(&self) -> i32 {
        match self {
            MonsterKind::Small => 16,
            MonsterKind::Medium => 22,
            MonsterKind::Large => 24,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Monster {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: MonsterKind,
    pub alive: bool,
    /// Animation frame toggle, flipped on every step.
    pub frame: bool,
}

impl Monster {
    fn at_home(row: usize, col: usize) -> Self {
        let kind = MonsterKind::for_row(row);
        Monster {
            x: MONSTER_ORIGIN_X + MONSTER_SPACING_H * col as i32,
            y: MONSTER_ORIGIN_Y + MONSTER_SPACING_V * row as i32,
            width: kind.width(),
            height: MONSTER_HEIGHT,
            kind,
            alive: true,
            frame: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

/// Horizontal travel direction shared by the monster grid and the bonus ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    Stop,
}

impl Direction {
    pub fn sign(&self) -> i32 {
        match self {
            Direction::LeftToRight => 1,
            Direction::RightToLeft => -1,
            Direction::Stop => 0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Direction::LeftToRight => Direction::RightToLeft,
            Direction::RightToLeft | Direction::Stop => Direction::LeftToRight,
        }
    }
}

/// Callback run every time the mover steps a cell.
#[derive(Clone)]
pub struct StepSound(pub Arc<dyn Fn() + Send + Sync>);

impl fmt::Debug for StepSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepSound")
    }
}

#[derive(Clone, Debug)]
pub struct MonsterGrid {
    pub cells: [[Monster; N_COLUMNS]; N_ROWS],
    pub direction: Direction,
    pub on_step: Option<StepSound>,
}

impl Default for MonsterGrid {
    fn default() -> Self {
        MonsterGrid {
            cells: std::array::from_fn(|row| std::array::from_fn(|col| Monster::at_home(row, col))),
            direction: Direction::LeftToRight,
            on_step: None,
        }
    }
}

impl MonsterGrid {
    /// Every cell back home and alive.  The step callback is kept.
    pub fn reset(&mut self) {
        for (row, cells) in self.cells.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = Monster::at_home(row, col);
            }
        }
        self.direction = Direction::LeftToRight;
    }

    /// Kill one cell.  Returns its points, or `None` if it was already dead.
    pub fn kill(&mut self, row: usize, col: usize) -> Option<u32> {
        let cell = &mut self.cells[row][col];
        if !cell.alive {
            return None;
        }
        cell.alive = false;
        Some(cell.kind.points())
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().flatten().filter(|m| m.alive).count()
    }

    /// Leftmost and rightmost edge of the alive cells in `row`.
    pub fn row_bounds(&self, row: usize) -> Option<(i32, i32)> {
        let mut alive = self.cells[row].iter().filter(|m| m.alive);
        let first = alive.next()?;
        let last = alive.last().unwrap_or(first);
        Some((first.x, last.x + last.width))
    }

    /// Lowest alive cell in `col`, if any.
    pub fn lowest_alive(&self, col: usize) -> Option<&Monster> {
        self.cells.iter().rev().map(|row| &row[col]).find(|m| m.alive)
    }
}

// ── Bonus ship ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BonusShip {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub alive: bool,
    pub direction: Direction,
}

impl Default for BonusShip {
    fn default() -> Self {
        BonusShip {
            x: 0,
            y: BONUS_Y,
            width: BONUS_WIDTH,
            height: BONUS_HEIGHT,
            alive: false,
            direction: Direction::RightToLeft,
        }
    }
}

impl BonusShip {
    /// Disarm; the next respawn starts it from the left.
    pub fn reset(&mut self) {
        *self = BonusShip::default();
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Place the ship where a two-player match expects the opponent.
    pub fn set_up_two_player(&mut self) {
        self.x = SCREEN_WIDTH * 2 / 3 - self.width / 2;
        self.alive = true;
    }

    /// Flip direction, park just offscreen on the side it starts from and
    /// arm it.  In two-player mode it reappears on the field instead.
    pub fn respawn(&mut self, two_player: bool) {
        self.direction = self.direction.flipped();
        if two_player {
            self.set_up_two_player();
            return;
        }
        self.x = match self.direction {
            Direction::RightToLeft => SCREEN_WIDTH,
            _ => -self.width,
        };
        self.alive = true;
    }

    /// Single-player step.  Returns `true` when the ship escaped the field
    /// and disarmed itself.
    pub fn advance_free(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.x += self.direction.sign();
        let escaped = match self.direction {
            Direction::LeftToRight => self.x > SCREEN_WIDTH,
            Direction::RightToLeft => self.x + self.width < 0,
            Direction::Stop => false,
        };
        if escaped {
            self.alive = false;
        }
        escaped
    }

    /// Two-player step: the peer steers, the field edges stop it.
    pub fn advance_bounded(&mut self) {
        if !self.alive {
            return;
        }
        match self.direction {
            Direction::LeftToRight if self.x + self.width < SCREEN_WIDTH => self.x += 1,
            Direction::RightToLeft if self.x > 0 => self.x -= 1,
            _ => {}
        }
    }

    pub fn rect(&self) -> Rect {
        Rect { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

// ── Bunkers ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BunkerComponent {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub damage: u8,
}

impl BunkerComponent {
    pub fn is_intact(&self) -> bool {
        self.damage < BUNKER_MAX_DAMAGE
    }

    /// Absorb one hit.  A destroyed piece absorbs nothing.
    pub fn apply_damage(&mut self) -> bool {
        if !self.is_intact() {
            return false;
        }
        self.damage += 1;
        true
    }

    pub fn rect(&self) -> Rect {
        Rect { x: self.x, y: self.y, width: self.width, height: self.height }
    }
}

/// `bunkers[k][i][j]`: bunker `k`, piece row `i` (0..2), piece column `j` (0..3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BunkerGrid {
    pub bunkers: [[[BunkerComponent; 3]; 2]; N_BUNKERS],
}

impl Default for BunkerGrid {
    fn default() -> Self {
        BunkerGrid {
            bunkers: std::array::from_fn(|k| {
                std::array::from_fn(|i| {
                    std::array::from_fn(|j| BunkerComponent {
                        x: SCREEN_WIDTH * k as i32 / N_BUNKERS as i32
                            + j as i32 * BUNKER_PIECE_WIDTH
                            + 30,
                        y: BUNKER_Y + BUNKER_PIECE_HEIGHT * i as i32,
                        width: BUNKER_PIECE_WIDTH,
                        height: BUNKER_PIECE_HEIGHT,
                        damage: 0,
                    })
                })
            }),
        }
    }
}

impl BunkerGrid {
    pub fn reset(&mut self) {
        for piece in self.pieces_mut() {
            piece.damage = 0;
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = &BunkerComponent> {
        self.bunkers.iter().flatten().flatten()
    }

    pub fn pieces_mut(&mut self) -> impl Iterator<Item = &mut BunkerComponent> {
        self.bunkers.iter_mut().flatten().flatten()
    }
}
