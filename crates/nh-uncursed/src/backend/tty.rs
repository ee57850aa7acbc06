//! Terminal backend
//!
//! Draws through a ratatui [`Backend`], so the same code runs against a real
//! terminal (crossterm) and against ratatui's `TestBackend`. Only a backend
//! built with [`TtyBackend::stdout`] owns the terminal: it switches raw mode
//! and the alternate screen, and reads keys and mouse events via crossterm.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Cell as TermCell;
use ratatui::layout::Position;
use ratatui::style::{Color as TermColor, Modifier, Style};

use crate::color::{Color, Resolved, Rgb};
use crate::error::UncursedResult;
use crate::hooks::UncursedHooks;
use crate::input::{InputSources, Readiness, wait_readable};
use crate::key::{Key, Modifiers, MouseButton, RawInput, SpecialKey};
use crate::screen::UpdateContext;

pub struct TtyBackend<B: Backend> {
    backend: B,
    owns_terminal: bool,
    pending: Vec<(u16, u16, TermCell)>,
    palette: [Option<Rgb>; 16],
    mouse_active: bool,
    raw: bool,
}

impl TtyBackend<CrosstermBackend<Stdout>> {
    /// The process's own terminal.
    pub fn stdout() -> Self {
        Self {
            owns_terminal: true,
            ..Self::with_backend(CrosstermBackend::new(io::stdout()))
        }
    }
}

impl<B: Backend> TtyBackend<B> {
    /// Draw into `backend` without touching terminal modes or reading input.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            owns_terminal: false,
            pending: Vec::new(),
            palette: [None; 16],
            mouse_active: false,
            raw: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn term_color(&self, color: Color) -> TermColor {
        if let Some(Some(Rgb(r, g, b))) = self.palette.get(color as usize) {
            return TermColor::Rgb(*r, *g, *b);
        }
        match color {
            Color::Black => TermColor::Black,
            Color::Red => TermColor::Red,
            Color::Green => TermColor::Green,
            Color::Brown => TermColor::Yellow,
            Color::Blue => TermColor::Blue,
            Color::Magenta => TermColor::Magenta,
            Color::Cyan => TermColor::Cyan,
            Color::Gray => TermColor::Gray,
            Color::DarkGray => TermColor::DarkGray,
            Color::BrightRed => TermColor::LightRed,
            Color::BrightGreen => TermColor::LightGreen,
            Color::Yellow => TermColor::LightYellow,
            Color::BrightBlue => TermColor::LightBlue,
            Color::BrightMagenta => TermColor::LightMagenta,
            Color::BrightCyan => TermColor::LightCyan,
            Color::White => TermColor::White,
            Color::Default => TermColor::Reset,
        }
    }

    fn style(&self, colors: Resolved) -> Style {
        let mut modifier = Modifier::empty();
        if colors.bold {
            modifier |= Modifier::BOLD;
        }
        if colors.underline {
            modifier |= Modifier::UNDERLINED;
        }
        Style::default()
            .fg(self.term_color(colors.fg))
            .bg(self.term_color(colors.bg))
            .add_modifier(modifier)
    }

    fn enter(&mut self) -> io::Result<()> {
        if !self.owns_terminal || self.raw {
            return Ok(());
        }
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        if self.mouse_active {
            execute!(io::stdout(), EnableMouseCapture)?;
        }
        self.raw = true;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.owns_terminal || !self.raw {
            return Ok(());
        }
        self.raw = false;
        if self.mouse_active {
            execute!(io::stdout(), DisableMouseCapture)?;
        }
        execute!(io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.backend.show_cursor()
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        let size = self.backend.size()?;
        Ok((size.height, size.width))
    }
}

impl<B: Backend> UncursedHooks for TtyBackend<B> {
    fn init(&mut self) -> UncursedResult<Option<(u16, u16)>> {
        self.enter()?;
        self.backend.clear()?;
        Ok(Some(self.size()?))
    }

    fn exit(&mut self) {
        if let Err(error) = self.leave() {
            tracing::warn!(%error, "failed to restore terminal");
        }
    }

    fn beep(&mut self) {
        if self.owns_terminal {
            let mut out = io::stdout();
            let _ = out.write_all(b"\x07").and_then(|()| out.flush());
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        let result = if visible {
            self.backend.show_cursor()
        } else {
            self.backend.hide_cursor()
        };
        if let Err(error) = result {
            tracing::debug!(%error, "cursor visibility");
        }
    }

    fn position_cursor(&mut self, y: u16, x: u16) {
        if let Err(error) = self.backend.set_cursor_position(Position { x, y }) {
            tracing::debug!(%error, "cursor position");
        }
    }

    fn reset_palette(&mut self) {
        self.palette = [None; 16];
    }

    fn set_palette(&mut self, color: Color, rgb: Rgb) {
        if let Some(slot) = self.palette.get_mut(color as usize) {
            *slot = Some(rgb);
        }
    }

    /// Tiles are not drawn here; bound cells fall back to their glyph.
    fn update(&mut self, ctx: &mut UpdateContext<'_>, y: u16, x: u16) {
        let Some(v) = ctx.requested(y, x) else {
            return;
        };
        let mut cell = TermCell::default();
        cell.set_symbol(&v.glyph.to_string());
        cell.set_style(self.style(v.colors));
        self.pending.push((x, y, cell));
        ctx.mark_updated(y, x);
    }

    fn full_redraw(&mut self) {
        self.pending.clear();
        if let Err(error) = self.backend.clear() {
            tracing::warn!(%error, "terminal clear failed");
        }
    }

    fn flush(&mut self) {
        let cells = std::mem::take(&mut self.pending);
        let drawn = self
            .backend
            .draw(cells.iter().map(|(x, y, c)| (*x, *y, c)))
            .and_then(|()| Backend::flush(&mut self.backend));
        if let Err(error) = drawn {
            tracing::warn!(%error, "terminal write failed");
        }
    }

    fn set_mouse_active(&mut self, active: bool) {
        if active == self.mouse_active {
            return;
        }
        self.mouse_active = active;
        if self.owns_terminal && self.raw {
            let result = if active {
                execute!(io::stdout(), EnableMouseCapture)
            } else {
                execute!(io::stdout(), DisableMouseCapture)
            };
            if let Err(error) = result {
                tracing::warn!(%error, "mouse capture");
            }
        }
    }

    fn get_key(
        &mut self,
        timeout: Option<Duration>,
        sources: &InputSources<'_>,
    ) -> UncursedResult<RawInput> {
        if !self.owns_terminal {
            return Ok(RawInput::Key(Key::Hangup));
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if event::poll(Duration::ZERO)? {
                if let Some(raw) = translate_event(event::read()?) {
                    return Ok(raw);
                }
                continue;
            }

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|r| r.is_zero()) {
                return Ok(RawInput::Key(Key::Timeout));
            }
            match wait_readable(Some(libc::STDIN_FILENO), sources, remaining)? {
                Readiness::Primary => continue,
                Readiness::Timeout if deadline.is_none() => continue,
                other => {
                    if let Some(key) = other.as_key() {
                        return Ok(RawInput::Key(key));
                    }
                }
            }
        }
    }

    fn resized(&mut self, _height: u16, _width: u16) {
        self.pending.clear();
    }

    fn suspend(&mut self) {
        if let Err(error) = self.leave() {
            tracing::warn!(%error, "failed to release terminal");
        }
    }

    fn resume(&mut self) {
        let result = self.enter().and_then(|()| self.backend.clear());
        if let Err(error) = result {
            tracing::warn!(%error, "failed to reclaim terminal");
        }
    }
}

fn modifiers(m: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    if m.contains(KeyModifiers::SHIFT) {
        out |= Modifiers::SHIFT;
    }
    if m.contains(KeyModifiers::ALT) {
        out |= Modifiers::ALT;
    }
    if m.contains(KeyModifiers::CONTROL) {
        out |= Modifiers::CTRL;
    }
    out
}

/// Map a crossterm event to backend input. Events with no meaning here
/// (key releases, focus changes, pastes) yield `None`.
pub fn translate_event(ev: Event) -> Option<RawInput> {
    match ev {
        Event::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }
            let mods = modifiers(key.modifiers);
            let special = |k| Some(RawInput::Key(Key::Special(k, mods)));
            match key.code {
                KeyCode::Char(c) if mods.contains(Modifiers::CTRL) && c.is_ascii_alphabetic() => {
                    Some(RawInput::Key(Key::ctrl(c)))
                }
                KeyCode::Char(c) => Some(RawInput::Key(Key::Char(c))),
                KeyCode::Enter => special(SpecialKey::Enter),
                KeyCode::Tab => special(SpecialKey::Tab),
                KeyCode::BackTab => special(SpecialKey::BackTab),
                KeyCode::Backspace => special(SpecialKey::Backspace),
                KeyCode::Esc => special(SpecialKey::Escape),
                KeyCode::Up => special(SpecialKey::Up),
                KeyCode::Down => special(SpecialKey::Down),
                KeyCode::Left => special(SpecialKey::Left),
                KeyCode::Right => special(SpecialKey::Right),
                KeyCode::Home => special(SpecialKey::Home),
                KeyCode::End => special(SpecialKey::End),
                KeyCode::PageUp => special(SpecialKey::PageUp),
                KeyCode::PageDown => special(SpecialKey::PageDown),
                KeyCode::Insert => special(SpecialKey::Insert),
                KeyCode::Delete => special(SpecialKey::Delete),
                KeyCode::F(n) => special(SpecialKey::F(n)),
                _ => Some(RawInput::Key(Key::Invalid)),
            }
        }
        Event::Mouse(m) => {
            let button = match m.kind {
                MouseEventKind::Down(event::MouseButton::Left) => MouseButton::Left,
                MouseEventKind::Down(event::MouseButton::Middle) => MouseButton::Middle,
                MouseEventKind::Down(event::MouseButton::Right) => MouseButton::Right,
                MouseEventKind::ScrollUp => MouseButton::WheelUp,
                MouseEventKind::ScrollDown => MouseButton::WheelDown,
                MouseEventKind::Moved => MouseButton::Hover,
                _ => return None,
            };
            Some(RawInput::Mouse {
                button,
                y: m.row,
                x: m.column,
            })
        }
        Event::Resize(width, height) => Some(RawInput::Resize { height, width }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attr;
    use crate::screen::{STDSCR, Screen};
    use crossterm::event::{KeyEvent, KeyEventState, MouseEvent};
    use ratatui::backend::TestBackend;

    fn symbol(tty: &TtyBackend<TestBackend>, x: u16, y: u16) -> String {
        tty.backend()
            .buffer()
            .cell((x, y))
            .map(|c| c.symbol().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_draws_cells_with_style() {
        let mut screen = Screen::new(2, 8);
        let mut tty = TtyBackend::with_backend(TestBackend::new(8, 2));
        screen.init_pair(1, Color::Red, Color::Default);
        let win = screen.stdscr();
        win.set_pair(1);
        win.attr_on(Attr::BOLD);
        win.add_str("hi");

        let mut tables: [&mut dyn UncursedHooks; 1] = [&mut tty];
        screen.refresh(STDSCR, &mut tables).unwrap();

        assert_eq!(symbol(&tty, 0, 0), "h");
        assert_eq!(symbol(&tty, 1, 0), "i");
        let cell = tty.backend().buffer().cell((0, 0)).cloned().unwrap_or_default();
        assert_eq!(cell.fg, TermColor::LightRed);
        assert_eq!(cell.bg, TermColor::Reset);
        assert!(cell.modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_combining_glyph_is_one_cell() {
        let mut screen = Screen::new(1, 4);
        let mut tty = TtyBackend::with_backend(TestBackend::new(4, 1));
        screen.add_str(STDSCR, "e\u{0301}!").unwrap();
        let mut tables: [&mut dyn UncursedHooks; 1] = [&mut tty];
        screen.refresh(STDSCR, &mut tables).unwrap();
        assert_eq!(symbol(&tty, 0, 0), "e\u{0301}");
        assert_eq!(symbol(&tty, 1, 0), "!");
    }

    #[test]
    fn test_full_redraw_restores_terminal_contents() {
        let mut screen = Screen::new(2, 5);
        let mut tty = TtyBackend::with_backend(TestBackend::new(5, 2));
        screen.add_str(STDSCR, "ab\ncd").unwrap();
        {
            let mut tables: [&mut dyn UncursedHooks; 1] = [&mut tty];
            screen.refresh(STDSCR, &mut tables).unwrap();
        }
        let before = tty.backend().buffer().clone();

        let mut tables: [&mut dyn UncursedHooks; 1] = [&mut tty];
        screen.full_redraw(&mut tables);
        assert_eq!(screen.doupdate(&mut tables), 10);
        assert_eq!(tty.backend().buffer(), &before);
    }

    #[test]
    fn test_cursor_follows_window() {
        let mut screen = Screen::new(3, 5);
        let mut tty = TtyBackend::with_backend(TestBackend::new(5, 3));
        screen.move_cursor(STDSCR, 2, 3).unwrap();
        let mut tables: [&mut dyn UncursedHooks; 1] = [&mut tty];
        screen.refresh(STDSCR, &mut tables).unwrap();
        let pos = tty.backend_mut().get_cursor_position().unwrap();
        assert_eq!((pos.y, pos.x), (2, 3));
    }

    #[test]
    fn test_palette_override() {
        let mut tty = TtyBackend::with_backend(TestBackend::new(1, 1));
        tty.set_palette(Color::Blue, Rgb(1, 2, 3));
        assert_eq!(tty.term_color(Color::Blue), TermColor::Rgb(1, 2, 3));
        tty.reset_palette();
        assert_eq!(tty.term_color(Color::Blue), TermColor::Blue);
    }

    #[test]
    fn test_not_owning_terminal_reads_as_hangup() {
        let mut tty = TtyBackend::with_backend(TestBackend::new(1, 1));
        let waker = crate::input::SignalWaker::new();
        let sources = InputSources {
            watched: &[],
            waker: &waker,
        };
        assert_eq!(tty.get_key(None, &sources).unwrap(), RawInput::Key(Key::Hangup));
    }

    #[test]
    fn test_translate_keys() {
        let key = |code, mods| {
            Event::Key(KeyEvent {
                code,
                modifiers: mods,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            })
        };
        assert_eq!(
            translate_event(key(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(RawInput::Key(Key::Char('x')))
        );
        assert_eq!(
            translate_event(key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(RawInput::Key(Key::ctrl('r')))
        );
        assert_eq!(
            translate_event(key(KeyCode::Up, KeyModifiers::SHIFT)),
            Some(RawInput::Key(Key::Special(SpecialKey::Up, Modifiers::SHIFT)))
        );

        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(translate_event(release), None);
    }

    #[test]
    fn test_translate_mouse_and_resize() {
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(event::MouseButton::Right),
            column: 7,
            row: 3,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(
            translate_event(click),
            Some(RawInput::Mouse {
                button: MouseButton::Right,
                y: 3,
                x: 7
            })
        );
        assert_eq!(
            translate_event(Event::Resize(100, 30)),
            Some(RawInput::Resize {
                height: 30,
                width: 100
            })
        );
        assert_eq!(translate_event(Event::FocusGained), None);
    }
}
