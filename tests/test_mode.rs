use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use space_invaders::config::{ORIGINAL_TIMER, SCREEN_WIDTH};
use space_invaders::mode::*;
use space_invaders::pacing::delay_for_level;
use space_invaders::slot::guard;
use space_invaders::World;

mod common;
use common::alive_monsters;

fn machine(n_players: u8) -> (Arc<World>, ModeMachine) {
    let (world, _requests) = World::new(0, n_players);
    let world = Arc::new(world);
    let machine = ModeMachine::new(Arc::clone(&world));
    (world, machine)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ── Transition table ──────────────────────────────────────────────────────────

#[test]
fn transition_table() {
    use Mode::*;
    use ModeRequest::*;
    assert_eq!(next_mode(Menu, Advance), Some(Playing));
    assert_eq!(next_mode(Playing, Advance), Some(Paused));
    assert_eq!(next_mode(Paused, Advance), Some(Playing));
    assert_eq!(next_mode(Playing, Retreat), Some(Menu));
    assert_eq!(next_mode(Paused, Retreat), Some(Menu));
    assert_eq!(next_mode(Menu, Retreat), None);
}

// ── Debounce ──────────────────────────────────────────────────────────────────

#[test]
fn debounce_window() {
    let mut debounce = Debounce::new(ms(300));
    let t0 = Instant::now();
    assert!(debounce.accept(t0));
    assert!(!debounce.accept(t0 + ms(299)));
    assert!(debounce.accept(t0 + ms(300)));
    assert!(!debounce.accept(t0 + ms(301)));
}

#[test]
fn request_inside_window_is_dropped() {
    let (world, mut machine) = machine(1);
    let t0 = Instant::now();
    assert_eq!(machine.handle(ModeRequest::Advance, t0), Some(Mode::Playing));
    assert_eq!(machine.handle(ModeRequest::Advance, t0 + ms(100)), None);
    assert_eq!(world.mode(), Mode::Playing);
    assert_eq!(machine.handle(ModeRequest::Advance, t0 + ms(300)), Some(Mode::Paused));
    assert_eq!(world.mode(), Mode::Paused);
}

#[test]
fn ignored_signal_does_not_start_window() {
    let (_world, mut machine) = machine(1);
    let t0 = Instant::now();
    assert_eq!(machine.handle(ModeRequest::Retreat, t0), None);
    assert_eq!(machine.handle(ModeRequest::Advance, t0 + ms(10)), Some(Mode::Playing));
}

#[test]
fn internal_requests_skip_debounce() {
    let (world, mut machine) = machine(1);
    let t0 = Instant::now();
    machine.handle(ModeRequest::Advance, t0);
    assert_eq!(machine.handle(ModeRequest::RoundCleared, t0 + ms(1)), Some(Mode::Playing));
    assert_eq!(machine.handle(ModeRequest::GameOver, t0 + ms(2)), Some(Mode::Menu));
    assert_eq!(world.mode(), Mode::Menu);
}

#[test]
fn round_cleared_while_paused_restarts_on_resume() {
    let (world, mut machine) = machine(2);
    let t0 = Instant::now();
    machine.handle(ModeRequest::Advance, t0);
    world.clear_board();
    assert!(!world.bonus().alive);

    assert_eq!(machine.handle(ModeRequest::Advance, t0 + ms(400)), Some(Mode::Paused));
    assert_eq!(machine.handle(ModeRequest::RoundCleared, t0 + ms(401)), None);
    assert_eq!(machine.mode(), Mode::Paused);

    let resumed = t0 + ms(800);
    assert_eq!(machine.handle(ModeRequest::Advance, resumed), Some(Mode::Playing));
    assert!(world.bonus().alive);
    assert_eq!(world.respawn.period(), ORIGINAL_TIMER);
    assert_eq!(world.respawn.cycle_start(), Some(resumed));

    // The restart happens once; the next pause/resume keeps its remainder.
    machine.handle(ModeRequest::Advance, resumed + Duration::from_secs(4));
    machine.handle(ModeRequest::Advance, resumed + Duration::from_secs(30));
    assert_eq!(world.respawn.period(), ORIGINAL_TIMER - Duration::from_secs(4));
}

#[test]
fn menu_entry_disarms_a_due_respawn() {
    let (world, mut machine) = machine(1);
    let t0 = Instant::now();
    machine.handle(ModeRequest::Advance, t0);
    machine.handle(ModeRequest::Retreat, t0 + ms(400));

    let fired = world.respawn.poll_at(t0 + ORIGINAL_TIMER, || world.respawn_bonus());
    assert!(!fired);
    assert!(!world.bonus().alive);
}

#[test]
fn game_over_in_menu_is_ignored() {
    let (_world, mut machine) = machine(1);
    assert_eq!(machine.handle(ModeRequest::GameOver, Instant::now()), None);
    assert_eq!(machine.handle(ModeRequest::RoundCleared, Instant::now()), None);
    assert_eq!(machine.mode(), Mode::Menu);
}

// ── Entry actions ─────────────────────────────────────────────────────────────

#[test]
fn starting_a_match_restores_saved_economy() {
    let (world, mut machine) = machine(1);
    world.insert_coin();
    world.insert_coin();
    world.pacing.speed_up();
    world.update_saved_values();

    machine.handle(ModeRequest::Advance, Instant::now());
    let player = world.player();
    assert_eq!(player.credits, 1);
    assert_eq!(player.n_lives, 3);
    assert_eq!(world.pacing.get(), 64);
    assert_eq!(player.level, 1);
    assert!(world.respawn.is_armed());
    assert!(world.gate.wait_for(Mode::Playing));
}

#[test]
fn start_round_takes_level_from_pacing() {
    let (world, mut machine) = machine(1);
    world.pacing.start_level(4);
    world.update_saved_values();
    machine.handle(ModeRequest::Advance, Instant::now());
    assert_eq!(world.player().level, 4);
    assert_eq!(world.pacing.get(), delay_for_level(4));
}

#[test]
fn pause_and_resume_keep_respawn_remainder() {
    let (world, mut machine) = machine(1);
    let t0 = Instant::now();
    machine.handle(ModeRequest::Advance, t0);
    machine.handle(ModeRequest::Advance, t0 + Duration::from_secs(4));
    assert!(!world.respawn.is_armed());
    assert!(world.gate.wait_for(Mode::Paused));

    machine.handle(ModeRequest::Advance, t0 + Duration::from_secs(30));
    assert!(world.respawn.is_armed());
    assert_eq!(world.respawn.period(), ORIGINAL_TIMER - Duration::from_secs(4));
}

#[test]
fn retreat_to_menu_resets_board() {
    let (world, mut machine) = machine(1);
    let t0 = Instant::now();
    machine.handle(ModeRequest::Advance, t0);
    guard(&world.monsters).kill(0, 0);
    world.add_score(30);
    world.try_move_spaceship(-40);

    assert_eq!(machine.handle(ModeRequest::Retreat, t0 + ms(400)), Some(Mode::Menu));
    assert_eq!(alive_monsters(&world), 55);
    assert_eq!(world.spaceship().x, space_invaders::entities::Spaceship::home_x());
    assert!(!world.respawn.is_armed());
    assert_eq!(world.saved_values().score, 30);
}

#[test]
fn two_player_round_places_opponent_ship() {
    let (world, mut machine) = machine(2);
    machine.handle(ModeRequest::Advance, Instant::now());
    let bonus = world.bonus();
    assert!(bonus.alive);
    assert_eq!(bonus.x, SCREEN_WIDTH * 2 / 3 - bonus.width / 2);
}

// ── Gate ──────────────────────────────────────────────────────────────────────

#[test]
fn gate_releases_worker_on_transition() {
    let (world, mut machine) = machine(1);
    let worker = {
        let world = Arc::clone(&world);
        thread::spawn(move || world.gate.wait_for(Mode::Playing))
    };
    thread::sleep(ms(30));
    assert!(!worker.is_finished());
    machine.handle(ModeRequest::Advance, Instant::now());
    assert!(worker.join().unwrap());
}

#[test]
fn gate_shutdown_releases_worker() {
    let gate = Arc::new(ModeGate::new(Mode::Menu));
    let worker = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || gate.wait_for(Mode::Paused))
    };
    thread::sleep(ms(30));
    gate.shutdown();
    assert!(!worker.join().unwrap());
    assert!(gate.is_shut_down());
}

#[test]
fn controller_loop_applies_queued_requests() {
    let (world, requests) = World::new(0, 1);
    let world = Arc::new(world);
    let controller = {
        let machine = ModeMachine::new(Arc::clone(&world));
        thread::spawn(move || machine.run(requests))
    };

    world.request(ModeRequest::Advance);
    assert!(world.gate.wait_for(Mode::Playing));
    assert_eq!(world.mode(), Mode::Playing);

    world.gate.shutdown();
    controller.join().unwrap();
}
