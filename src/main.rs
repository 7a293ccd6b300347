mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::atomic::Ordering;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};

use space_invaders::config::{GameConfig, SPACESHIP_STEP};
use space_invaders::peer::{self, PeerLink, UdpSender};
use space_invaders::workers::Workers;
use space_invaders::{highscore, GameError, Mode, ModeRequest, World};

use display::Scene;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

// ── Held-key input ────────────────────────────────────────────────────────────

/// Min frames between spaceship steps while a direction key is held.
const MOVE_COOLDOWN: u32 = 1;

/// A key counts as held if its last press/repeat event arrived within this
/// many frames.  Terminals without key-release events rely on OS repeat
/// (≥ 15 Hz) refreshing it before expiry.
const HOLD_WINDOW: u64 = 4;

fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal is in raw mode on the alternate screen, so log records go to
/// a file.  `RUST_LOG` picks the filter; the default is `info`.
fn init_logging(config: &GameConfig) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(&config.log_path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

// ── Peer link ─────────────────────────────────────────────────────────────────

/// Open both UDP ends.  A failure leaves the game playable without sync.
fn open_peer(config: &GameConfig) -> (Option<Arc<PeerLink>>, Option<std::net::UdpSocket>) {
    let link = match UdpSender::open(config.transmit_addr()) {
        Ok(sender) => Some(Arc::new(PeerLink::new(Box::new(sender)))),
        Err(e) => {
            log::warn!("{e}; peer sync disabled");
            None
        }
    };
    let socket = match peer::bind_receiver(config.receive_addr()) {
        Ok(socket) => Some(socket),
        Err(e) => {
            log::warn!("{e}; opponent commands will be ignored");
            None
        }
    };
    (link, socket)
}

// ── Frontend loop ─────────────────────────────────────────────────────────────

/// Drains input, forwards it to the world, and draws.  Never waits on a
/// worker: movement uses a try-lock, firing sets a flag and mode requests
/// are dropped if one is already pending.
///
/// Returns once the player quits.
fn frontend<W: Write>(
    out: &mut W,
    world: &World,
    peer: Option<&PeerLink>,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<()> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut move_cooldown: u32 = 0;
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mode = world.mode();

        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, modifiers, kind, .. }) = ev else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }
                    if handle_press(world, peer, mode, code) {
                        return Ok(());
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        match mode {
            Mode::Menu => world.update_saved_values(),
            Mode::Playing => {
                let left = any_held(&key_frame, &LEFT_KEYS, frame);
                let right = any_held(&key_frame, &RIGHT_KEYS, frame);
                if move_cooldown == 0 && left != right {
                    let dx = if left { -SPACESHIP_STEP } else { SPACESHIP_STEP };
                    if world.try_move_spaceship(dx) {
                        move_cooldown = MOVE_COOLDOWN;
                    }
                }
                if is_held(&key_frame, &KeyCode::Char(' '), frame) {
                    world.fire_requested.store(true, Ordering::Release);
                }
                if let Some(peer) = peer {
                    peer.sync_position_at(world, Instant::now());
                }
            }
            Mode::Paused => {}
        }
        move_cooldown = move_cooldown.saturating_sub(1);

        display::render(out, &Scene::capture(world), terminal::size()?)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

/// One key press.  Returns `true` to quit.
fn handle_press(world: &World, peer: Option<&PeerLink>, mode: Mode, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Enter => {
            world.request(ModeRequest::Advance)
        }
        KeyCode::Esc | KeyCode::Backspace => world.request(ModeRequest::Retreat),
        KeyCode::Char('c') | KeyCode::Char('C') => world.insert_coin(),
        KeyCode::Char(digit @ '1'..='3') => {
            let n = digit as u8 - b'0';
            match mode {
                Mode::Menu if n <= 2 => world.set_players(n),
                Mode::Playing => {
                    if let Some(peer) = peer {
                        peer.send_difficulty(world, n);
                    }
                }
                _ => {}
            }
        }
        KeyCode::Char('s') | KeyCode::Char('S') if mode == Mode::Playing => {
            let delay = world.pacing.slow_down();
            log::debug!("slow-down cheat, pacing now {delay}ms");
        }
        _ => {}
    }
    false
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<(), GameError> {
    let config = GameConfig::from_env();
    init_logging(&config);

    let highscore = highscore::load(&config.highscore_path);
    log::info!(
        "starting with {} player(s), highscore {highscore}",
        config.players
    );

    let (world, requests) = World::new(highscore, config.players);
    let world = Arc::new(world);
    let (peer, peer_socket) = open_peer(&config);
    let workers = Workers::spawn(&world, requests, peer.clone(), peer_socket)?;

    let mut out = BufWriter::new(stdout());
    let result = run_terminal(&mut out, &world, peer.as_deref());

    workers.shutdown(&world);
    if let Err(e) = highscore::save(&config.highscore_path, world.player().highscore) {
        log::warn!("{e}");
    }

    result.map_err(GameError::from)
}

fn run_terminal<W: Write>(
    out: &mut W,
    world: &World,
    peer: Option<&PeerLink>,
) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Key-release events where the terminal supports them.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking event reads live on their own thread so the frame loop
    // never stalls on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = frontend(out, world, peer, &rx);

    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
