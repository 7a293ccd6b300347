//! Rendering layer: all terminal I/O lives here.
//!
//! A [`Scene`] is copied out of the world one entity guard at a time, then
//! drawn with no guard held.  Entity coordinates are in playfield pixels and
//! get scaled to terminal cells on the way out.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use space_invaders::config::{N_COLUMNS, N_ROWS, SCREEN_HEIGHT, SCREEN_WIDTH};
use space_invaders::entities::{
    BonusShip, Bullet, BunkerGrid, Effect, Monster, MonsterKind, Player, Spaceship,
};
use space_invaders::{Mode, World};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_LEVEL: Color = Color::Green;
const C_SPACESHIP: Color = Color::White;
const C_MONSTER_SMALL: Color = Color::Magenta;
const C_MONSTER_MEDIUM: Color = Color::Cyan;
const C_MONSTER_LARGE: Color = Color::Green;
const C_BONUS: Color = Color::Red;
const C_BUNKER: Color = Color::DarkGreen;
const C_BUNKER_WORN: Color = Color::DarkYellow;
const C_EFFECT: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

// ── Scene ─────────────────────────────────────────────────────────────────────

/// Everything one frame needs.
pub struct Scene {
    pub mode: Mode,
    pub player: Player,
    pub spaceship: Spaceship,
    pub monsters: [[Monster; N_COLUMNS]; N_ROWS],
    pub bonus: BonusShip,
    pub bunkers: BunkerGrid,
    pub shots: Vec<Bullet>,
    pub effects: Vec<Effect>,
    pub delay: u32,
}

impl Scene {
    pub fn capture(world: &World) -> Scene {
        Scene {
            mode: world.mode(),
            player: world.player(),
            spaceship: world.spaceship(),
            monsters: world.monster_cells(),
            bonus: world.bonus(),
            bunkers: world.bunkers(),
            shots: world.shots.snapshot(),
            effects: world.effects.snapshot(),
            delay: world.pacing.get(),
        }
    }
}

/// Playfield pixels to terminal cells.  Row 0 is the HUD and the last row
/// the controls hint, so the field sits between them inside the border.
struct Viewport {
    width: u16,
    height: u16,
}

impl Viewport {
    fn col(&self, x: i32) -> u16 {
        let inner = i32::from(self.width.saturating_sub(2)).max(1);
        (x.clamp(0, SCREEN_WIDTH - 1) * inner / SCREEN_WIDTH + 1) as u16
    }

    fn row(&self, y: i32) -> u16 {
        let inner = i32::from(self.height.saturating_sub(4)).max(1);
        (y.clamp(0, SCREEN_HEIGHT - 1) * inner / SCREEN_HEIGHT + 2) as u16
    }

    fn span(&self, x: i32, width: i32) -> usize {
        usize::from(self.col(x + width).saturating_sub(self.col(x))).max(1)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, scene: &Scene, size: (u16, u16)) -> std::io::Result<()> {
    let view = Viewport { width: size.0, height: size.1 };
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, scene, &view)?;

    match scene.mode {
        Mode::Menu => draw_menu(out, scene, &view)?,
        Mode::Playing | Mode::Paused => {
            draw_field(out, scene, &view)?;
            if scene.mode == Mode::Paused {
                draw_banner(out, &view, &[("║      PAUSED        ║", Color::Yellow)])?;
            }
        }
    }

    draw_controls_hint(out, scene, &view)?;

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.width as usize;
    let h = view.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, scene: &Scene, view: &Viewport) -> std::io::Result<()> {
    let p = &scene.player;

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    if p.is_two_player() {
        out.queue(Print(format!(
            "P1:{:>6}  P2:{:>6}  Hi:{:>6}",
            p.score1, p.score2, p.highscore
        )))?;
    } else {
        out.queue(Print(format!("Score:{:>6}  Hi:{:>6}", p.score1, p.highscore)))?;
    }

    let level_str = format!("[ LEVEL {} ]", p.level);
    let lx = (view.width / 2).saturating_sub(level_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LEVEL))?;
    out.queue(Print(&level_str))?;

    let right_str = format!(
        "Credits:{}  Lives:{}",
        p.credits,
        "♥".repeat(p.n_lives as usize)
    );
    let rx = view
        .width
        .saturating_sub(right_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&right_str))?;

    Ok(())
}

// ── Menu ──────────────────────────────────────────────────────────────────────

fn draw_menu<W: Write>(out: &mut W, scene: &Scene, view: &Viewport) -> std::io::Result<()> {
    let players = if scene.player.is_two_player() {
        "2 PLAYERS"
    } else {
        "1 PLAYER"
    };
    let credits = format!("Credits: {}", scene.player.credits);
    let best = format!("Best Score: {}", scene.player.highscore);

    let lines: Vec<(&str, Color)> = vec![
        ("★  SPACE  INVADERS  ★", Color::Cyan),
        ("", Color::Reset),
        (best.as_str(), Color::Yellow),
        (players, Color::Green),
        (credits.as_str(), Color::White),
        ("", Color::Reset),
        ("M / ENTER : Start     C : Insert coin", Color::DarkGrey),
        ("1 / 2 : Players       Q : Quit", Color::DarkGrey),
    ];

    let cx = view.width / 2;
    let start_row = (view.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (line, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(line.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*line))?;
    }
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_field<W: Write>(out: &mut W, scene: &Scene, view: &Viewport) -> std::io::Result<()> {
    for monster in scene.monsters.iter().flatten().filter(|m| m.alive) {
        draw_monster(out, monster, view)?;
    }
    draw_bunkers(out, &scene.bunkers, view)?;
    if scene.bonus.alive {
        draw_bonus(out, &scene.bonus, view)?;
    }
    for bullet in &scene.shots {
        draw_bullet(out, bullet, view)?;
    }
    for effect in &scene.effects {
        draw_effect(out, effect, view)?;
    }
    draw_spaceship(out, &scene.spaceship, view)
}

fn draw_spaceship<W: Write>(out: &mut W, ship: &Spaceship, view: &Viewport) -> std::io::Result<()> {
    //  ▲
    // /█\
    let col = view.col(ship.center_x());
    let row = view.row(ship.y);
    out.queue(style::SetForegroundColor(C_SPACESHIP))?;
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(Print("▲"))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
    out.queue(Print("/█\\"))?;
    Ok(())
}

fn draw_monster<W: Write>(out: &mut W, monster: &Monster, view: &Viewport) -> std::io::Result<()> {
    let (color, sprite) = match (monster.kind, monster.frame) {
        (MonsterKind::Small, false) => (C_MONSTER_SMALL, "/o\\"),
        (MonsterKind::Small, true) => (C_MONSTER_SMALL, "\\o/"),
        (MonsterKind::Medium, false) => (C_MONSTER_MEDIUM, "«▼»"),
        (MonsterKind::Medium, true) => (C_MONSTER_MEDIUM, "»▼«"),
        (MonsterKind::Large, false) => (C_MONSTER_LARGE, "(◎)"),
        (MonsterKind::Large, true) => (C_MONSTER_LARGE, ")◎("),
    };
    out.queue(cursor::MoveTo(view.col(monster.x), view.row(monster.y)))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(sprite))?;
    Ok(())
}

fn draw_bonus<W: Write>(out: &mut W, bonus: &BonusShip, view: &Viewport) -> std::io::Result<()> {
    // Partly offscreen ships are clamped to the edge cell.
    out.queue(cursor::MoveTo(view.col(bonus.x), view.row(bonus.y)))?;
    out.queue(style::SetForegroundColor(C_BONUS))?;
    out.queue(Print("<=◆=>"))?;
    Ok(())
}

/// Destroyed pieces are not drawn at all.
fn draw_bunkers<W: Write>(out: &mut W, bunkers: &BunkerGrid, view: &Viewport) -> std::io::Result<()> {
    for piece in bunkers.pieces().filter(|p| p.is_intact()) {
        let (color, glyph) = match piece.damage {
            0 => (C_BUNKER, "█"),
            1 => (C_BUNKER_WORN, "▓"),
            _ => (C_BUNKER_WORN, "░"),
        };
        out.queue(cursor::MoveTo(view.col(piece.x), view.row(piece.y)))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph.repeat(view.span(piece.x, piece.width))))?;
    }
    Ok(())
}

fn draw_bullet<W: Write>(out: &mut W, bullet: &Bullet, view: &Viewport) -> std::io::Result<()> {
    let [_, r, g, b] = bullet.colour.to_be_bytes();
    let glyph = if bullet.kind.is_hostile() { "↓" } else { "║" };
    out.queue(cursor::MoveTo(view.col(bullet.x), view.row(bullet.y)))?;
    out.queue(style::SetForegroundColor(Color::Rgb { r, g, b }))?;
    out.queue(Print(glyph))?;
    Ok(())
}

fn draw_effect<W: Write>(out: &mut W, effect: &Effect, view: &Viewport) -> std::io::Result<()> {
    let glyph = match effect.image.map(|i| i.0) {
        Some("monster_hit") => "✶",
        Some("ship_hit") => "✹",
        Some("bonus_hit") => "$",
        _ => "*",
    };
    out.queue(cursor::MoveTo(view.col(effect.x), view.row(effect.y)))?;
    out.queue(style::SetForegroundColor(C_EFFECT))?;
    out.queue(Print(glyph))?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, scene: &Scene, view: &Viewport) -> std::io::Result<()> {
    let hint = match scene.mode {
        Mode::Menu => "M : Start   C : Coin   1/2 : Players   Q : Quit",
        Mode::Playing if scene.player.is_two_player() => {
            "← → / A D : Move   SPACE : Shoot   1-3 : Difficulty   M : Pause   ESC : Menu"
        }
        Mode::Playing => "← → / A D : Move   SPACE : Shoot   S : Slow   M : Pause   ESC : Menu",
        Mode::Paused => "M : Resume   ESC : Menu   Q : Quit",
    };
    out.queue(cursor::MoveTo(1, view.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    if scene.mode != Mode::Menu {
        let pace = format!("pace {}ms", scene.delay);
        out.queue(cursor::MoveTo(
            view.width.saturating_sub(pace.len() as u16 + 1),
            view.height.saturating_sub(1),
        ))?;
        out.queue(Print(pace))?;
    }
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_banner<W: Write>(
    out: &mut W,
    view: &Viewport,
    body: &[(&str, Color)],
) -> std::io::Result<()> {
    let top = ("╔════════════════════╗", Color::Yellow);
    let bottom = ("╚════════════════════╝", Color::Yellow);
    let lines: Vec<(&str, Color)> = std::iter::once(top)
        .chain(body.iter().copied())
        .chain(std::iter::once(bottom))
        .collect();

    let cx = view.width / 2;
    let start_row = (view.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}
