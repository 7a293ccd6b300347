use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use space_invaders::compute::{collision_pass, finish_sweep, move_monster, sweep_order};
use space_invaders::config::{BUNKER_MAX_DAMAGE, MAX_OBJECTS, N_BUNKERS, N_COLUMNS, N_ROWS};
use space_invaders::entities::{Bullet, BulletKind, BunkerGrid, Monster};
use space_invaders::pipeline::Pipeline;
use space_invaders::World;

fn player_shot_at(m: &Monster) -> Bullet {
    Bullet::fired(BulletKind::Player, m.x + m.width / 2, m.y + m.height)
}

/// Nothing that was dead came back, and no bunker piece healed.
fn assert_never_healed(
    before: &[[Monster; N_COLUMNS]; N_ROWS],
    after: &[[Monster; N_COLUMNS]; N_ROWS],
    bunkers_before: &BunkerGrid,
    bunkers_after: &BunkerGrid,
) -> Result<(), TestCaseError> {
    for (b, a) in before.iter().flatten().zip(after.iter().flatten()) {
        prop_assert!(b.alive || !a.alive, "monster revived");
    }
    for (b, a) in bunkers_before.pieces().zip(bunkers_after.pieces()) {
        prop_assert!(a.damage >= b.damage, "bunker healed");
        prop_assert!(a.damage <= BUNKER_MAX_DAMAGE);
        prop_assert!(b.is_intact() || !a.is_intact());
    }
    Ok(())
}

// ── Pipeline sequences ────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum PipelineOp {
    Insert(u32),
    /// Pass keeping items not divisible by the modulus.
    Pass(u32),
    Reset,
}

fn pipeline_op() -> impl Strategy<Value = PipelineOp> {
    prop_oneof![
        4 => any::<u32>().prop_map(PipelineOp::Insert),
        2 => (1u32..5).prop_map(PipelineOp::Pass),
        1 => Just(PipelineOp::Reset),
    ]
}

proptest! {
    #[test]
    fn prop_pipeline_matches_a_plain_vec(ops in prop::collection::vec(pipeline_op(), 0..80)) {
        let pipeline = Pipeline::new(MAX_OBJECTS);
        let mut model: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                // A full pipeline would block; the model only inserts when there is room.
                PipelineOp::Insert(item) if model.len() < MAX_OBJECTS => {
                    prop_assert!(pipeline.insert(item).is_ok());
                    model.push(item);
                }
                PipelineOp::Insert(_) => {}
                PipelineOp::Pass(modulus) => {
                    let summary = pipeline.pass(|item| (item % modulus != 0).then_some(item));
                    prop_assert_eq!(summary.drained, model.len());
                    model.retain(|item| item % modulus != 0);
                    prop_assert_eq!(summary.kept, model.len());
                }
                PipelineOp::Reset => {
                    pipeline.reset();
                    model.clear();
                }
            }

            prop_assert!(pipeline.len() <= MAX_OBJECTS);
            let mut items = pipeline.snapshot();
            items.sort();
            let mut expected = model.clone();
            expected.sort();
            prop_assert_eq!(items, expected);
        }
    }
}

// ── Kills and bunker damage ───────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Play {
    ShootMonster(usize, usize),
    ShootBunker(usize, usize, usize),
    Step(usize, usize),
    FinishSweep,
}

fn play() -> impl Strategy<Value = Play> {
    prop_oneof![
        3 => (0..N_ROWS, 0..N_COLUMNS).prop_map(|(row, col)| Play::ShootMonster(row, col)),
        3 => (0..N_BUNKERS, 0..2usize, 0..3usize).prop_map(|(k, i, j)| Play::ShootBunker(k, i, j)),
        3 => (0..N_ROWS, 0..N_COLUMNS).prop_map(|(row, col)| Play::Step(row, col)),
        1 => Just(Play::FinishSweep),
    ]
}

proptest! {
    // Fewer plays than monsters, so the board is never cleared and reset.
    #[test]
    fn prop_kills_and_bunker_damage_are_permanent(plays in prop::collection::vec(play(), 0..50)) {
        let (world, requests) = World::new(0, 1);
        let mut rng = StdRng::seed_from_u64(42);
        let mut cells = world.monster_cells();
        let mut bunkers = world.bunkers();

        for play in plays {
            match play {
                Play::ShootMonster(row, col) => {
                    let bullet = player_shot_at(&world.monster_cells()[row][col]);
                    prop_assert!(world.shots.insert(bullet).is_ok());
                    collision_pass(&world, &mut rng);
                }
                Play::ShootBunker(k, i, j) => {
                    let piece = world.bunkers().bunkers[k][i][j];
                    let bullet = Bullet::fired(BulletKind::Enemy, piece.x + piece.width / 2, piece.y + 1);
                    prop_assert!(world.shots.insert(bullet).is_ok());
                    collision_pass(&world, &mut rng);
                }
                Play::Step(row, col) => {
                    move_monster(&world, row, col);
                }
                Play::FinishSweep => {
                    finish_sweep(&world);
                }
            }
            // Misses would pile up; keep both pipelines and the request slot clear.
            world.shots.reset();
            world.effects.reset();
            while requests.try_recv().is_ok() {}

            let now_cells = world.monster_cells();
            let now_bunkers = world.bunkers();
            assert_never_healed(&cells, &now_cells, &bunkers, &now_bunkers)?;
            cells = now_cells;
            bunkers = now_bunkers;
        }
    }
}

// ── Threaded ──────────────────────────────────────────────────────────────────

#[test]
fn mover_and_collision_threads_never_revive_a_monster() {
    const SHOTS: usize = 40;

    let (world, requests) = World::new(0, 1);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                for (row, col) in sweep_order() {
                    move_monster(&world, row, col);
                }
            }
        });

        s.spawn(|| {
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..SHOTS {
                let cells = world.monster_cells();
                let (row, col) = (rng.gen_range(0..N_ROWS), rng.gen_range(0..N_COLUMNS));
                world.shots.insert(player_shot_at(&cells[row][col])).unwrap();
                collision_pass(&world, &mut rng);
                world.shots.reset();
                world.effects.reset();
            }
            done.store(true, Ordering::Release);
        });

        let mut cells = world.monster_cells();
        let mut bunkers = world.bunkers();
        while !done.load(Ordering::Acquire) {
            let now_cells = world.monster_cells();
            let now_bunkers = world.bunkers();
            assert_never_healed(&cells, &now_cells, &bunkers, &now_bunkers).unwrap();
            cells = now_cells;
            bunkers = now_bunkers;
        }
    });

    assert!(world.monster_cells().iter().flatten().any(|m| m.alive));
    assert!(requests.try_recv().is_err());
}
