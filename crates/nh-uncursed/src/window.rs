//! Windows
//!
//! Drawing never touches the screen directly. A window buffers its own cells
//! and `Screen::noutrefresh` copies them into the requested grid.

use crate::cell::{Attr, Cell, Glyph, is_combining};
use crate::key::{Key, MOUSE_BUTTONS, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

const TAB_WIDTH: u16 = 8;

/// A rectangle of cells with its own cursor and drawing state
#[derive(Debug, Clone)]
pub struct Window {
    pub(crate) top: u16,
    pub(crate) left: u16,
    height: u16,
    width: u16,
    cells: Vec<Cell>,
    cursor_y: u16,
    cursor_x: u16,
    attr: Attr,
    pair: u16,
    mouse: [Option<Key>; MOUSE_BUTTONS],
    /// Set by `clear`; the next refresh redraws the whole screen.
    pub(crate) clear_pending: bool,
}

impl Window {
    pub fn new(height: u16, width: u16, top: u16, left: u16) -> Self {
        Self {
            top,
            left,
            height,
            width,
            cells: vec![Cell::default(); height as usize * width as usize],
            cursor_y: 0,
            cursor_x: 0,
            attr: Attr::empty(),
            pair: 0,
            mouse: [None; MOUSE_BUTTONS],
            clear_pending: false,
        }
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn origin(&self) -> (u16, u16) {
        (self.top, self.left)
    }

    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_y, self.cursor_x)
    }

    pub fn cell(&self, y: u16, x: u16) -> Option<&Cell> {
        if y < self.height && x < self.width {
            self.cells.get(self.index(y, x))
        } else {
            None
        }
    }

    fn index(&self, y: u16, x: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Returns false, leaving the cursor alone, if the position is outside.
    pub fn move_cursor(&mut self, y: u16, x: u16) -> bool {
        if y >= self.height || x >= self.width {
            return false;
        }
        self.cursor_y = y;
        self.cursor_x = x;
        true
    }

    pub fn set_attr(&mut self, attr: Attr) {
        self.attr = attr;
    }

    pub fn attr_on(&mut self, attr: Attr) {
        self.attr |= attr;
    }

    pub fn attr_off(&mut self, attr: Attr) {
        self.attr &= !attr;
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    pub fn set_pair(&mut self, pair: u16) {
        self.pair = pair;
    }

    /// Key produced by clicking cells drawn from now on. `None` unbinds.
    pub fn set_mouse_binding(&mut self, button: MouseButton, key: Option<Key>) {
        self.mouse[button.index()] = key;
    }

    /// Draw one codepoint at the cursor and advance.
    ///
    /// Combining marks join the cell before the cursor. `\n` clears to the
    /// end of the line and moves to the next one.
    pub fn add_char(&mut self, c: char) {
        if self.cells.is_empty() {
            return;
        }
        match c {
            '\n' => {
                self.clear_to_eol();
                self.newline();
            }
            '\r' => self.cursor_x = 0,
            '\t' => {
                let next = (self.cursor_x / TAB_WIDTH + 1) * TAB_WIDTH;
                let stop = next.min(self.width);
                while self.cursor_x < stop {
                    let at_end = self.cursor_x + 1 == self.width;
                    self.put(' ');
                    if at_end {
                        break;
                    }
                }
            }
            c if is_combining(c) => self.combine(c),
            c => self.put(c),
        }
    }

    pub fn add_str(&mut self, s: &str) {
        for c in s.chars() {
            self.add_char(c);
        }
    }

    /// Blank every cell and home the cursor.
    pub fn erase(&mut self) {
        self.cells.fill(Cell::default());
        self.cursor_y = 0;
        self.cursor_x = 0;
    }

    /// Like `erase`, and the next refresh repaints the whole screen.
    pub fn clear(&mut self) {
        self.erase();
        self.clear_pending = true;
    }

    pub fn clear_to_eol(&mut self) {
        if self.cells.is_empty() {
            return;
        }
        let start = self.index(self.cursor_y, self.cursor_x);
        let end = self.index(self.cursor_y, 0) + self.width as usize;
        self.cells[start..end].fill(Cell::default());
    }

    pub(crate) fn resize(&mut self, height: u16, width: u16) {
        self.height = height;
        self.width = width;
        self.cells = vec![Cell::default(); height as usize * width as usize];
        self.cursor_y = 0;
        self.cursor_x = 0;
    }

    fn put(&mut self, c: char) {
        let i = self.index(self.cursor_y, self.cursor_x);
        let mut cell = Cell::new(Glyph::new(c), self.attr, self.pair);
        cell.mouse = self.mouse;
        self.cells[i] = cell;
        self.advance();
    }

    fn combine(&mut self, mark: char) {
        let (y, x) = if self.cursor_x > 0 {
            (self.cursor_y, self.cursor_x - 1)
        } else if self.cursor_y > 0 {
            (self.cursor_y - 1, self.width - 1)
        } else {
            return;
        };
        let i = self.index(y, x);
        self.cells[i].glyph.push_mark(mark);
    }

    fn advance(&mut self) {
        if self.cursor_x + 1 < self.width {
            self.cursor_x += 1;
        } else if self.cursor_y + 1 < self.height {
            self.cursor_x = 0;
            self.cursor_y += 1;
        }
        // Bottom-right corner: the cursor stays put.
    }

    fn newline(&mut self) {
        if self.cursor_y + 1 < self.height {
            self.cursor_y += 1;
        }
        self.cursor_x = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(win: &Window, y: u16) -> String {
        (0..win.width())
            .filter_map(|x| win.cell(y, x))
            .map(|c| c.glyph.to_string())
            .collect()
    }

    #[test]
    fn test_add_str_wraps() {
        let mut win = Window::new(2, 4, 0, 0);
        win.add_str("abcdef");
        assert_eq!(row(&win, 0), "abcd");
        assert_eq!(row(&win, 1), "ef  ");
        assert_eq!(win.cursor(), (1, 2));
    }

    #[test]
    fn test_combining_joins_previous_cell() {
        let mut win = Window::new(1, 4, 0, 0);
        win.add_str("e\u{0301}x");
        assert_eq!(win.cell(0, 0).map(|c| c.glyph.codepoints().len()), Some(2));
        assert_eq!(win.cell(0, 1).map(|c| c.glyph.base()), Some('x'));
        assert_eq!(win.cursor(), (0, 2));
    }

    #[test]
    fn test_combining_at_origin_is_dropped() {
        let mut win = Window::new(1, 2, 0, 0);
        win.add_char('\u{0301}');
        assert!(win.cell(0, 0).is_some_and(|c| c.glyph.is_blank()));
        assert_eq!(win.cursor(), (0, 0));
    }

    #[test]
    fn test_newline_clears_rest_of_line() {
        let mut win = Window::new(2, 5, 0, 0);
        win.add_str("hello");
        win.move_cursor(0, 2);
        win.add_str("\nX");
        assert_eq!(row(&win, 0), "he   ");
        assert_eq!(row(&win, 1), "X    ");
    }

    #[test]
    fn test_tab_stops() {
        let mut win = Window::new(1, 12, 0, 0);
        win.add_str("a\tb");
        assert_eq!(win.cell(0, 8).map(|c| c.glyph.base()), Some('b'));
    }

    #[test]
    fn test_attr_and_mouse_stamp_cells() {
        let mut win = Window::new(1, 3, 0, 0);
        win.attr_on(Attr::BOLD | Attr::UNDERLINE);
        win.attr_off(Attr::UNDERLINE);
        win.set_pair(4);
        win.set_mouse_binding(MouseButton::Left, Some(Key::Char('k')));
        win.add_char('@');
        win.set_mouse_binding(MouseButton::Left, None);
        win.add_char('.');

        let first = win.cell(0, 0).copied().unwrap_or_default();
        assert_eq!(first.attr, Attr::BOLD);
        assert_eq!(first.pair, 4);
        assert_eq!(first.mouse_key(MouseButton::Left), Some(Key::Char('k')));
        assert_eq!(win.cell(0, 1).and_then(|c| c.mouse_key(MouseButton::Left)), None);
    }

    #[test]
    fn test_move_cursor_bounds() {
        let mut win = Window::new(2, 2, 0, 0);
        assert!(win.move_cursor(1, 1));
        assert!(!win.move_cursor(2, 0));
        assert_eq!(win.cursor(), (1, 1));
    }

    #[test]
    fn test_clear_sets_pending() {
        let mut win = Window::new(1, 2, 0, 0);
        win.add_str("ab");
        win.clear();
        assert!(win.clear_pending);
        assert!(win.cell(0, 0).is_some_and(|c| c.glyph.is_blank()));
    }
}
