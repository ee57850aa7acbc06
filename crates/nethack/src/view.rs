//! Drawing a restored game onto the renderer's screen
//!
//! Row 0 holds the last message, the map takes the `ROWNO` rows under it,
//! and the status line follows the map.

use nh_core::dungeon::Level;
use nh_core::{GameState, COLNO, ROWNO};
use nh_uncursed::{Attr, Color, Screen, Window};

pub const MESSAGE_ROW: u16 = 0;
pub const MAP_TOP: u16 = 1;
pub const STATUS_ROW: u16 = MAP_TOP + ROWNO as u16;

pub const PAIR_HERO: u16 = 1;
pub const PAIR_MONSTER: u16 = 2;
pub const PAIR_OBJECT: u16 = 3;
pub const PAIR_FEATURE: u16 = 4;
pub const PAIR_STATUS: u16 = 5;

pub const HERO_SYMBOL: char = '@';
pub const MONSTER_SYMBOL: char = 'M';

pub fn init_pairs(screen: &mut Screen) {
    screen.init_pair(PAIR_HERO, Color::White, Color::Default);
    screen.init_pair(PAIR_MONSTER, Color::Red, Color::Default);
    screen.init_pair(PAIR_OBJECT, Color::Cyan, Color::Default);
    screen.init_pair(PAIR_FEATURE, Color::Yellow, Color::Default);
    screen.init_pair(PAIR_STATUS, Color::Black, Color::Gray);
}

/// What a map square shows, top layer first
fn square(game: &GameState, level: &Level, x: i8, y: i8, reveal: bool) -> Option<(char, u16)> {
    if game.you.pos.x == x && game.you.pos.y == y {
        return Some((HERO_SYMBOL, PAIR_HERO));
    }
    if level.monster_at(x, y).is_some() {
        return Some((MONSTER_SYMBOL, PAIR_MONSTER));
    }
    if let Some(top) = level.objects_at(x, y).last() {
        return Some((top.class.symbol(), PAIR_OBJECT));
    }
    let cell = &level.cells[x as usize][y as usize];
    if !(cell.explored || reveal) {
        return None;
    }
    let symbol = cell.typ.symbol();
    let pair = if cell.typ.is_accessible() && symbol != '.' && symbol != '#' {
        PAIR_FEATURE
    } else {
        0
    };
    Some((symbol, pair))
}

fn put_line(win: &mut Window, row: u16, text: &str, pair: u16) {
    if !win.move_cursor(row, 0) {
        return;
    }
    win.set_pair(pair);
    let width = win.width() as usize;
    let line: String = text.chars().take(width).collect();
    win.add_str(&line);
    win.set_pair(0);
}

pub fn status_line(game: &GameState) -> String {
    let you = &game.you;
    format!(
        "{}  Dlvl:{}  HP:{}({}) Pw:{}({})  $:{}  T:{}",
        you.title(),
        game.current,
        you.hp,
        you.hp_max,
        you.energy,
        you.energy_max,
        you.gold,
        game.moves
    )
}

/// Redraw stdscr from `game`. Unexplored squares stay blank unless
/// `reveal` is set. Nothing is committed.
pub fn draw_game(screen: &mut Screen, game: &GameState, reveal: bool) {
    let win = screen.stdscr();
    win.erase();
    win.set_attr(Attr::empty());

    if let Some(message) = game.messages.back() {
        put_line(win, MESSAGE_ROW, message, 0);
    }

    if let Some(level) = game.current_level() {
        for y in 0..ROWNO {
            for x in 0..COLNO {
                let Some((symbol, pair)) = square(game, level, x as i8, y as i8, reveal) else {
                    continue;
                };
                if !win.move_cursor(MAP_TOP + y as u16, x as u16) {
                    break;
                }
                win.set_pair(pair);
                if pair == PAIR_HERO {
                    win.attr_on(Attr::BOLD);
                }
                win.add_char(symbol);
                win.set_attr(Attr::empty());
            }
        }
        win.set_pair(0);
    } else {
        tracing::warn!(dlevel = %game.current, "current level missing from save");
    }

    put_line(win, STATUS_ROW, &status_line(game), PAIR_STATUS);

    let (hx, hy) = (game.you.pos.x, game.you.pos.y);
    if hx >= 0 && hy >= 0 {
        win.move_cursor(MAP_TOP + hy as u16, hx as u16);
    }
}
