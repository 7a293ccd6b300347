use space_invaders::config::{ORIGINAL_MONSTER_DELAY, MIN_MONSTER_DELAY};
use space_invaders::pacing::*;

#[test]
fn starts_at_original_delay() {
    let pacing = PacingRegister::default();
    assert_eq!(pacing.get(), ORIGINAL_MONSTER_DELAY);
    assert_eq!(pacing.offset(), 0);
    assert_eq!(pacing.level(), 1);
}

#[test]
fn kill_speeds_up_by_one() {
    let pacing = PacingRegister::default();
    assert_eq!(pacing.speed_up(), 64);
    assert_eq!(pacing.get(), 64);
    assert_eq!(pacing.offset(), -1);
}

#[test]
fn speed_up_floors_at_minimum() {
    let pacing = PacingRegister::new(MIN_MONSTER_DELAY);
    assert_eq!(pacing.speed_up(), MIN_MONSTER_DELAY);
}

#[test]
fn cheat_slows_down_by_four() {
    let pacing = PacingRegister::default();
    assert_eq!(pacing.slow_down(), 69);
}

#[test]
fn cheat_wraps_past_ceiling() {
    let pacing = PacingRegister::new(81);
    assert_eq!(pacing.slow_down(), 85);
    assert_eq!(pacing.slow_down(), ORIGINAL_MONSTER_DELAY);
}

#[test]
fn set_never_goes_below_minimum() {
    let pacing = PacingRegister::default();
    pacing.set(0);
    assert_eq!(pacing.get(), MIN_MONSTER_DELAY);
}

#[test]
fn offset_round_trips_through_restore() {
    let pacing = PacingRegister::default();
    for _ in 0..7 {
        pacing.speed_up();
    }
    let saved = pacing.offset();

    let fresh = PacingRegister::default();
    fresh.restore_offset(saved);
    assert_eq!(fresh.get(), 58);
}

#[test]
fn level_formula() {
    assert_eq!(level_for_delay(65), 1);
    assert_eq!(level_for_delay(64), 1);
    assert_eq!(level_for_delay(63), 2);
    assert_eq!(level_for_delay(10), 28);
    assert_eq!(level_for_delay(68), 1);
    assert_eq!(level_for_delay(69), 0);
    assert_eq!(level_for_delay(73), -1);
}

#[test]
fn delay_for_level_is_consistent_with_level_formula() {
    for level in 1..=30 {
        assert_eq!(level_for_delay(delay_for_level(level)), level);
    }
    assert_eq!(delay_for_level(2), 63);
    assert_eq!(delay_for_level(-3), ORIGINAL_MONSTER_DELAY);
}

#[test]
fn start_level_installs_its_delay() {
    let pacing = PacingRegister::new(12);
    pacing.start_level(3);
    assert_eq!(pacing.get(), 61);
    assert_eq!(pacing.level(), 3);
}
