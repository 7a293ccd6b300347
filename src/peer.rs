//! Two-player peer sync: short ASCII tokens over UDP.
//!
//! Best effort only.  There are no acknowledgements, retries or sequence
//! numbers; a lost datagram just delays the next visible change.  Both ends
//! only act while a two-player match is being played, so stale packets are
//! ignored rather than applied.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::{PEER_READ_TIMEOUT, POSITION_SYNC_INTERVAL};
use crate::entities::Direction;
use crate::error::GameError;
use crate::slot::guard;
use crate::world::World;

/// Largest position delta the fixed-width encoding carries.
pub const MAX_DELTA: i32 = 999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerMessage {
    /// A player bullet is in flight.
    Attacking,
    Passive,
    /// Spaceship x minus bonus-ship x.
    PositionDelta(i32),
    /// Difficulty 1..=3 chosen by the operator.
    Difficulty(u8),
    Increment,
    Decrement,
    Halt,
}

impl fmt::Display for PeerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerMessage::Attacking => f.write_str("ATTACKING"),
            PeerMessage::Passive => f.write_str("PASSIVE"),
            PeerMessage::PositionDelta(delta) => {
                let sign = if *delta < 0 { '-' } else { '+' };
                write!(f, "{sign}{:03}", delta.unsigned_abs().min(MAX_DELTA as u32))
            }
            PeerMessage::Difficulty(level) => write!(f, "D{level}"),
            PeerMessage::Increment => f.write_str("INC"),
            PeerMessage::Decrement => f.write_str("DEC"),
            PeerMessage::Halt => f.write_str("HALT"),
        }
    }
}

impl FromStr for PeerMessage {
    type Err = GameError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let unknown = || GameError::UnknownToken(token.to_string());
        let message = match token {
            "ATTACKING" => PeerMessage::Attacking,
            "PASSIVE" => PeerMessage::Passive,
            "INC" => PeerMessage::Increment,
            "DEC" => PeerMessage::Decrement,
            "HALT" => PeerMessage::Halt,
            "D1" => PeerMessage::Difficulty(1),
            "D2" => PeerMessage::Difficulty(2),
            "D3" => PeerMessage::Difficulty(3),
            _ => {
                let (sign, digits) = if let Some(digits) = token.strip_prefix('+') {
                    (1, digits)
                } else if let Some(digits) = token.strip_prefix('-') {
                    (-1, digits)
                } else {
                    return Err(unknown());
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(unknown());
                }
                let magnitude: i32 = digits.parse().map_err(|_| unknown())?;
                PeerMessage::PositionDelta(sign * magnitude)
            }
        };
        Ok(message)
    }
}

/// Decode one datagram.  Trailing NULs and whitespace are tolerated.
pub fn decode(payload: &[u8]) -> Result<PeerMessage, GameError> {
    let text = String::from_utf8_lossy(payload);
    text.trim_end_matches('\0').trim().parse()
}

// ── Transport ─────────────────────────────────────────────────────────────────

pub trait PacketSender: Send + Sync {
    fn send(&self, payload: &[u8]) -> Result<(), GameError>;
}

pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    pub fn open(target: SocketAddr) -> Result<Self, GameError> {
        let local = match target.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local)
            .map_err(|source| GameError::PeerSocket { addr: local, source })?;
        Ok(UdpSender { socket, target })
    }
}

impl PacketSender for UdpSender {
    fn send(&self, payload: &[u8]) -> Result<(), GameError> {
        self.socket
            .send_to(payload, self.target)
            .map(|_| ())
            .map_err(|source| GameError::PeerSend {
                token: String::from_utf8_lossy(payload).into_owned(),
                addr: self.target,
                source,
            })
    }
}

/// Bind the receiving port.  The read timeout lets the receive loop notice
/// shutdown.
pub fn bind_receiver(addr: SocketAddr) -> Result<UdpSocket, GameError> {
    let socket = UdpSocket::bind(addr).map_err(|source| GameError::PeerSocket { addr, source })?;
    socket
        .set_read_timeout(Some(PEER_READ_TIMEOUT))
        .map_err(|source| GameError::PeerSocket { addr, source })?;
    Ok(socket)
}

// ── Outbound ──────────────────────────────────────────────────────────────────

pub struct PeerLink {
    sender: Box<dyn PacketSender>,
    /// Last bullet state sent; `None` before the first one.
    attacking: Mutex<Option<bool>>,
    last_position: Mutex<Option<Instant>>,
}

impl PeerLink {
    pub fn new(sender: Box<dyn PacketSender>) -> Self {
        PeerLink {
            sender,
            attacking: Mutex::new(None),
            last_position: Mutex::new(None),
        }
    }

    /// Send without retry; failures are logged and otherwise ignored.
    fn send(&self, message: PeerMessage) -> bool {
        match self.sender.send(message.to_string().as_bytes()) {
            Ok(()) => {
                log::debug!("sent {message} to opponent");
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Edge-triggered: only a change of state goes out.
    pub fn sync_bullet_state(&self, world: &World, attacking: bool) -> bool {
        if !world.is_sync_active() {
            return false;
        }
        {
            let mut last = guard(&self.attacking);
            if *last == Some(attacking) {
                return false;
            }
            *last = Some(attacking);
        }
        self.send(if attacking {
            PeerMessage::Attacking
        } else {
            PeerMessage::Passive
        })
    }

    /// Throttled to one message per `POSITION_SYNC_INTERVAL`.
    pub fn sync_position_at(&self, world: &World, now: Instant) -> bool {
        if !world.is_sync_active() {
            return false;
        }
        {
            let mut last = guard(&self.last_position);
            if let Some(sent) = *last {
                if now.saturating_duration_since(sent) < POSITION_SYNC_INTERVAL {
                    return false;
                }
            }
            *last = Some(now);
        }
        self.send(PeerMessage::PositionDelta(position_delta(world)))
    }

    pub fn send_difficulty(&self, world: &World, level: u8) -> bool {
        if !world.is_sync_active() || !(1..=3).contains(&level) {
            return false;
        }
        self.send(PeerMessage::Difficulty(level))
    }
}

pub fn position_delta(world: &World) -> i32 {
    let ship_x = world.spaceship().x;
    let bonus_x = world.bonus().x;
    ship_x - bonus_x
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Apply a received message.  Only the steering commands mean anything on
/// this side, and only during a two-player match.
pub fn apply_remote(world: &World, message: PeerMessage) -> bool {
    if !world.is_sync_active() {
        return false;
    }
    let direction = match message {
        PeerMessage::Increment => Direction::LeftToRight,
        PeerMessage::Decrement => Direction::RightToLeft,
        PeerMessage::Halt => Direction::Stop,
        _ => return false,
    };
    guard(&world.bonus).set_direction(direction);
    log::debug!("opponent steered bonus ship {direction:?}");
    true
}

pub fn handle_datagram(world: &World, payload: &[u8]) -> bool {
    match decode(payload) {
        Ok(message) => apply_remote(world, message),
        Err(e) => {
            log::debug!("ignored datagram: {e}");
            false
        }
    }
}

/// Receive until the world shuts down.
pub fn receive_loop(world: &World, socket: UdpSocket) {
    let mut buffer = [0u8; 64];
    while !world.gate.is_shut_down() {
        match socket.recv_from(&mut buffer) {
            Ok((len, _from)) => {
                handle_datagram(world, &buffer[..len]);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                log::warn!("peer receive failed: {e}");
                return;
            }
        }
    }
}
