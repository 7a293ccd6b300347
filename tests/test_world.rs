use std::sync::Arc;

use space_invaders::config::{INITIAL_LIVES, ORIGINAL_MONSTER_DELAY, SPACESHIP_STEP};
use space_invaders::entities::{Bullet, BulletKind, Effect, SavedValues, Spaceship};
use space_invaders::pacing::delay_for_level;
use space_invaders::slot::guard;
use space_invaders::World;

mod common;
use common::{CountingSampler, alive_monsters};

fn make_world() -> World {
    World::new(250, 1).0
}

#[test]
fn new_world_starts_in_menu_with_loaded_highscore() {
    let world = make_world();
    assert_eq!(world.mode(), space_invaders::Mode::Menu);
    assert_eq!(world.player().highscore, 250);
    assert_eq!(world.saved_values(), SavedValues::default());
    assert_eq!(alive_monsters(&world), 55);
}

#[test]
fn coins_never_go_negative() {
    let world = make_world();
    world.use_coin();
    assert_eq!(world.player().credits, 0);
    world.insert_coin();
    world.insert_coin();
    world.use_coin();
    assert_eq!(world.player().credits, 1);
}

#[test]
fn player_count_is_clamped() {
    let world = make_world();
    world.set_players(2);
    assert!(world.is_two_player());
    world.set_players(9);
    assert_eq!(world.player().n_players, 2);
    world.set_players(0);
    assert_eq!(world.player().n_players, 1);
}

#[test]
fn score_folds_into_highscore() {
    let world = make_world();
    world.add_score(200);
    assert_eq!(world.player().highscore, 250);
    world.add_score(100);
    assert_eq!(world.player().highscore, 300);
    world.add_opponent_score(100);
    assert_eq!(world.player().score2, 100);
}

#[test]
fn lose_life_saturates() {
    let world = make_world();
    for expected in (0..INITIAL_LIVES).rev() {
        assert_eq!(world.lose_life(), expected);
    }
    assert_eq!(world.lose_life(), 0);
}

#[test]
fn saved_values_capture_economy_and_offset() {
    let world = make_world();
    world.insert_coin();
    world.add_score(40);
    world.lose_life();
    world.pacing.speed_up();
    world.pacing.speed_up();
    world.update_saved_values();
    assert_eq!(
        world.saved_values(),
        SavedValues { n_lives: INITIAL_LIVES - 1, score: 40, offset: -2, credits: 1 }
    );
}

#[test]
fn spaceship_move_skips_when_guard_is_busy() {
    let world = make_world();
    assert!(world.try_move_spaceship(SPACESHIP_STEP));
    assert_eq!(world.spaceship().x, Spaceship::home_x() + SPACESHIP_STEP);

    let held = guard(&world.spaceship);
    assert!(!world.try_move_spaceship(SPACESHIP_STEP));
    drop(held);
    assert_eq!(world.spaceship().x, Spaceship::home_x() + SPACESHIP_STEP);
}

#[test]
fn clear_board_advances_level() {
    let world = make_world();
    guard(&world.monsters).kill(3, 3);
    world.shots.insert(Bullet::fired(BulletKind::Player, 100, 300)).unwrap();
    world.effects.insert(Effect::at(1, 1, None)).unwrap();

    assert_eq!(world.clear_board(), 2);
    assert_eq!(world.player().level, 2);
    assert_eq!(world.pacing.get(), delay_for_level(2));
    assert!(world.shots.is_empty());
    assert!(world.effects.is_empty());
    assert_eq!(alive_monsters(&world), 55);
}

#[test]
fn game_over_resets_economy_and_signals() {
    let (world, requests) = World::new(0, 1);
    world.insert_coin();
    world.add_score(60);
    world.pacing.speed_up();
    world.game_over();

    assert_eq!(requests.try_recv(), Ok(space_invaders::ModeRequest::GameOver));
    let player = world.player();
    assert_eq!(player.score1, 0);
    assert_eq!(player.highscore, 60);
    assert_eq!(player.credits, 1);
    assert_eq!(world.pacing.get(), ORIGINAL_MONSTER_DELAY);
}

#[test]
fn keyboard_requests_drop_when_slot_is_busy() {
    let (world, requests) = World::new(0, 1);
    world.request(space_invaders::ModeRequest::Advance);
    world.request(space_invaders::ModeRequest::Retreat);
    assert_eq!(requests.try_recv(), Ok(space_invaders::ModeRequest::Advance));
    assert!(requests.try_recv().is_err());
}

#[test]
fn respawn_plays_bonus_sound() {
    let sampler = Arc::new(CountingSampler::default());
    let (world, _requests) = World::with_sampler(0, 1, sampler.clone());
    world.respawn_bonus();
    assert!(world.bonus().alive);
    assert_eq!(sampler.plays(), 1);
}
