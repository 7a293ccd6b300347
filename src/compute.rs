//! Game logic: monster marching, firing, and the projectile/effect passes.
//!
//! The grid-level helpers (`step_monster`, `end_sweep`, `pick_shooter`) are
//! pure functions over an entity.  The `*_pass` functions and the world-level
//! steps take the shared [`World`] and lock one entity at a time.  All
//! randomness comes through an injected `Rng` so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::audio::SoundEffect;
use crate::config::{
    BOSS_HIT_POINTS, BONUS_SCORES, CEILING_Y, EFFECT_FRAMES, FLOOR_Y, MONSTER_DROP, MONSTER_STEP,
    N_COLUMNS, N_ROWS, PLAYFIELD_MARGIN, SCREEN_WIDTH, SPACESHIP_Y,
};
use crate::entities::{
    BonusShip, Bullet, BulletKind, Effect, ImageHandle, MonsterGrid, MonsterKind, Spaceship,
};
use crate::mode::ModeRequest;
use crate::pipeline::PassSummary;
use crate::slot::guard;
use crate::world::World;

// ── Monster grid ──────────────────────────────────────────────────────────────

/// Mover traversal order: bottom row to top row, left to right in a row.
pub fn sweep_order() -> impl Iterator<Item = (usize, usize)> {
    (0..N_ROWS)
        .rev()
        .flat_map(|row| (0..N_COLUMNS).map(move |col| (row, col)))
}

/// Step one cell in the grid's direction.  Dead cells do not move.
pub fn step_monster(grid: &mut MonsterGrid, row: usize, col: usize) -> bool {
    let dx = grid.direction.sign() * MONSTER_STEP;
    let cell = &mut grid.cells[row][col];
    if !cell.alive {
        return false;
    }
    cell.x += dx;
    cell.frame = !cell.frame;
    true
}

/// Wall check after a full sweep.  If any row's alive span would cross the
/// margin on the next step, flip direction and drop every alive cell.
pub fn end_sweep(grid: &mut MonsterGrid) -> bool {
    let dx = grid.direction.sign() * MONSTER_STEP;
    let at_wall = (0..N_ROWS)
        .filter_map(|row| grid.row_bounds(row))
        .any(|(left, right)| {
            left + dx < PLAYFIELD_MARGIN || right + dx > SCREEN_WIDTH - PLAYFIELD_MARGIN
        });

    if at_wall {
        grid.direction = grid.direction.flipped();
        for cell in grid.cells.iter_mut().flatten().filter(|m| m.alive) {
            cell.y += MONSTER_DROP;
        }
    }
    at_wall
}

/// An alive monster reached the spaceship line.
pub fn has_invaded(grid: &MonsterGrid) -> bool {
    grid.cells
        .iter()
        .flatten()
        .any(|m| m.alive && m.y + m.height >= SPACESHIP_Y)
}

/// Mover step for one cell.  Plays the step sound outside the guard.
pub fn move_monster(world: &World, row: usize, col: usize) -> bool {
    let (stepped, sound) = {
        let mut grid = guard(&world.monsters);
        (step_monster(&mut grid, row, col), grid.on_step.clone())
    };
    if let (true, Some(sound)) = (stepped, sound) {
        (sound.0)();
    }
    stepped
}

/// End of a sweep.  Returns `true` if the grid reached the player, in which
/// case the match is over.
pub fn finish_sweep(world: &World) -> bool {
    let invaded = {
        let mut grid = guard(&world.monsters);
        end_sweep(&mut grid);
        has_invaded(&grid)
    };
    if invaded {
        log::info!("monsters reached the player line");
        world.game_over();
    }
    invaded
}

// ── Firing ────────────────────────────────────────────────────────────────────

/// The lowest alive monster of a random non-empty column fires.
pub fn pick_shooter(grid: &MonsterGrid, rng: &mut impl Rng) -> Option<Bullet> {
    let columns: Vec<usize> = (0..N_COLUMNS)
        .filter(|&col| grid.lowest_alive(col).is_some())
        .collect();
    let col = *columns.choose(rng)?;
    let m = grid.lowest_alive(col)?;
    Some(Bullet::fired(BulletKind::Enemy, m.x + m.width / 2, m.y + m.height))
}

pub fn boss_shot(bonus: &BonusShip) -> Option<Bullet> {
    bonus.alive.then(|| {
        Bullet::fired(BulletKind::Boss, bonus.x + bonus.width / 2, bonus.y + bonus.height)
    })
}

pub fn player_shot(ship: &Spaceship) -> Bullet {
    Bullet::fired(BulletKind::Player, ship.center_x(), ship.y)
}

// ── Bonus ship ────────────────────────────────────────────────────────────────

pub fn move_bonus(world: &World) {
    let two_player = world.is_two_player();
    let mut bonus = guard(&world.bonus);
    if two_player {
        bonus.advance_bounded();
    } else if bonus.advance_free() {
        log::debug!("bonus ship escaped");
    }
}

// ── Collision ─────────────────────────────────────────────────────────────────

/// What a bullet ran into.  The entity-side change (kill, damage, reset) is
/// already applied when a test reports a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Ceiling,
    Monster {
        row: usize,
        col: usize,
        kind: MonsterKind,
        remaining: usize,
    },
    Floor,
    Spaceship,
    BonusShip,
    Bunker {
        bunker: usize,
    },
}

type HitTest = fn(&World, &Bullet) -> Option<Target>;

/// Tried in order; the first hit wins.
const HIT_ORDER: [HitTest; 6] = [
    strike_ceiling,
    strike_monster,
    strike_floor,
    strike_spaceship,
    strike_bonus,
    strike_bunker,
];

pub fn first_hit(world: &World, bullet: &Bullet) -> Option<Target> {
    HIT_ORDER.iter().find_map(|test| test(world, bullet))
}

fn strike_ceiling(_world: &World, bullet: &Bullet) -> Option<Target> {
    (bullet.y <= CEILING_Y).then_some(Target::Ceiling)
}

fn strike_floor(_world: &World, bullet: &Bullet) -> Option<Target> {
    (bullet.y + bullet.height >= FLOOR_Y).then_some(Target::Floor)
}

fn strike_monster(world: &World, bullet: &Bullet) -> Option<Target> {
    if bullet.kind != BulletKind::Player {
        return None;
    }
    let rect = bullet.rect();
    let mut grid = guard(&world.monsters);
    let (row, col) = (0..N_ROWS)
        .flat_map(|row| (0..N_COLUMNS).map(move |col| (row, col)))
        .find(|&(row, col)| {
            let m = &grid.cells[row][col];
            m.alive && m.rect().overlaps(&rect)
        })?;
    let kind = grid.cells[row][col].kind;
    grid.kill(row, col)?;
    Some(Target::Monster {
        row,
        col,
        kind,
        remaining: grid.alive_count(),
    })
}

fn strike_spaceship(world: &World, bullet: &Bullet) -> Option<Target> {
    if !bullet.kind.is_hostile() {
        return None;
    }
    let mut ship = guard(&world.spaceship);
    if !ship.rect().overlaps(&bullet.rect()) {
        return None;
    }
    ship.reset();
    Some(Target::Spaceship)
}

fn strike_bonus(world: &World, bullet: &Bullet) -> Option<Target> {
    if bullet.kind != BulletKind::Player {
        return None;
    }
    let mut bonus = guard(&world.bonus);
    if !bonus.alive || !bonus.rect().overlaps(&bullet.rect()) {
        return None;
    }
    bonus.kill();
    Some(Target::BonusShip)
}

fn strike_bunker(world: &World, bullet: &Bullet) -> Option<Target> {
    let rect = bullet.rect();
    let mut bunkers = guard(&world.bunkers);
    bunkers
        .bunkers
        .iter_mut()
        .enumerate()
        .find_map(|(bunker, pieces)| {
            pieces
                .iter_mut()
                .flatten()
                .find(|p| p.is_intact() && p.rect().overlaps(&rect))
                .map(|piece| {
                    piece.apply_damage();
                    Target::Bunker { bunker }
                })
        })
}

/// Cross-entity consequences of a hit.  Returns the impact effect and
/// whether the board was reset underneath the running pass.
fn resolve(world: &World, bullet: &Bullet, target: Target, rng: &mut impl Rng) -> (Effect, bool) {
    let mut board_reset = false;
    let image = match target {
        Target::Monster { kind, remaining, .. } => {
            world.add_score(kind.points());
            world.pacing.speed_up();
            world.play(SoundEffect::MonsterKilled);
            if remaining == 0 {
                world.clear_board();
                world.signal(ModeRequest::RoundCleared);
                board_reset = true;
            }
            "monster_hit"
        }
        Target::Spaceship => {
            world.play(SoundEffect::ShipHit);
            if bullet.kind == BulletKind::Boss && world.is_two_player() {
                world.add_opponent_score(BOSS_HIT_POINTS);
            }
            if world.lose_life() == 0 {
                world.game_over();
                board_reset = true;
            }
            "ship_hit"
        }
        Target::BonusShip => {
            let points = *BONUS_SCORES.choose(rng).unwrap_or(&BONUS_SCORES[0]);
            world.add_score(points);
            "bonus_hit"
        }
        Target::Ceiling | Target::Floor | Target::Bunker { .. } => "explosion",
    };
    (
        Effect::at(bullet.x, bullet.y, Some(ImageHandle(image))),
        board_reset,
    )
}

// ── Passes ────────────────────────────────────────────────────────────────────

/// Advance every bullet one step.
pub fn update_pass(world: &World) -> PassSummary {
    world.shots.pass(|mut bullet| {
        bullet.advance();
        Some(bullet)
    })
}

/// Test every bullet against the world.  A hit consumes the bullet and
/// spawns one effect.  Once a hit resets the board, the rest of the drained
/// bullets are dropped unprocessed.
pub fn collision_pass(world: &World, rng: &mut impl Rng) -> PassSummary {
    let mut spawned = Vec::new();
    let mut board_reset = false;

    let summary = world.shots.pass(|bullet| {
        if board_reset {
            return None;
        }
        let Some(target) = first_hit(world, &bullet) else {
            return Some(bullet);
        };
        let (effect, reset) = resolve(world, &bullet, target, rng);
        board_reset = reset;
        spawned.push(effect);
        None
    });

    for effect in spawned {
        if world.effects.insert(effect).is_err() {
            break;
        }
    }
    summary
}

/// Age every effect by one frame, dropping those past their budget.
pub fn age_effects(world: &World) -> PassSummary {
    world.effects.pass(|mut effect| {
        effect.frames += 1;
        (effect.frames <= EFFECT_FRAMES).then_some(effect)
    })
}
