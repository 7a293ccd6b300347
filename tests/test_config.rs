use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use space_invaders::config::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let config = GameConfig::from_lookup(lookup(&[]));
    assert_eq!(config.players, 1);
    assert_eq!(config.peer_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.receive_port, UDP_RECEIVE_PORT);
    assert_eq!(config.transmit_port, UDP_TRANSMIT_PORT);
    assert_eq!(config.log_path, PathBuf::from("space_invaders.log"));
}

#[test]
fn environment_overrides() {
    let config = GameConfig::from_lookup(lookup(&[
        ("INVADERS_PLAYERS", "2"),
        ("INVADERS_PEER_ADDR", "10.0.0.7"),
        ("INVADERS_RECV_PORT", "4000"),
        ("INVADERS_SEND_PORT", " 4001 "),
        ("INVADERS_HIGHSCORE_FILE", "/tmp/hs"),
        ("INVADERS_LOG_FILE", "/tmp/game.log"),
    ]));
    assert_eq!(config.players, 2);
    assert_eq!(config.receive_addr(), "10.0.0.7:4000".parse::<SocketAddr>().unwrap());
    assert_eq!(config.transmit_addr(), "10.0.0.7:4001".parse::<SocketAddr>().unwrap());
    assert_eq!(config.highscore_path, PathBuf::from("/tmp/hs"));
    assert_eq!(config.log_path, PathBuf::from("/tmp/game.log"));
}

#[test]
fn invalid_values_fall_back() {
    let config = GameConfig::from_lookup(lookup(&[
        ("INVADERS_PLAYERS", "5"),
        ("INVADERS_PEER_ADDR", "not-an-ip"),
        ("INVADERS_RECV_PORT", "99999"),
    ]));
    assert_eq!(config.players, 1);
    assert_eq!(config.peer_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.receive_port, UDP_RECEIVE_PORT);
}

#[test]
fn derived_constants_hold() {
    assert_eq!(ORIGINAL_MONSTER_DELAY, 65);
    assert_eq!(MAX_OBJECTS, 10);
    assert!(FLOOR_Y > SPACESHIP_Y + SPACESHIP_HEIGHT);
    assert!(BUNKER_Y + 2 * BUNKER_PIECE_HEIGHT < SPACESHIP_Y);
}
