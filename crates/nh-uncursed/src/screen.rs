//! The cell grid and its diff engine
//!
//! The screen keeps two grids. Drawing goes into windows, `noutrefresh`
//! copies windows into the *requested* grid, and `doupdate` pushes every
//! requested cell that differs from the *displayed* grid to the backends.
//! Backends pull cell contents from an [`UpdateContext`] and confirm each
//! cell they redraw; only confirmed cells are copied to the displayed grid.

use crate::cell::Cell;
use crate::color::{Color, PairTable, Palette, Resolved, Rgb};
use crate::error::{UncursedError, UncursedResult};
use crate::hooks::UncursedHooks;
use crate::key::{Key, MouseButton};
use crate::tiles::{TileCell, TileLayer};
use crate::window::{Window, WindowId};

pub const STDSCR: WindowId = WindowId(0);

/// Everything about a cell that affects what is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Visible {
    pub glyph: crate::cell::Glyph,
    pub colors: Resolved,
    pub tile: Option<TileCell>,
}

/// Access to the requested grid during a commit
pub struct UpdateContext<'a> {
    height: u16,
    width: u16,
    requested: &'a mut [Cell],
    displayed: &'a mut [Option<Visible>],
    pairs: &'a PairTable,
    generation: u64,
    tiles: &'a TileLayer,
}

impl UpdateContext<'_> {
    pub fn size(&self) -> (u16, u16) {
        (self.height, self.width)
    }

    fn index(&self, y: u16, x: u16) -> Option<usize> {
        (y < self.height && x < self.width).then(|| y as usize * self.width as usize + x as usize)
    }

    fn visible_at(&mut self, i: usize, y: u16, x: u16) -> Visible {
        let cell = &mut self.requested[i];
        Visible {
            glyph: cell.glyph,
            colors: cell.resolved(self.generation, self.pairs),
            tile: self.tiles.tile_at(y, x),
        }
    }

    /// What cell (y, x) should show.
    pub fn requested(&mut self, y: u16, x: u16) -> Option<Visible> {
        let i = self.index(y, x)?;
        Some(self.visible_at(i, y, x))
    }

    pub fn is_dirty(&mut self, y: u16, x: u16) -> bool {
        match self.index(y, x) {
            Some(i) => {
                let want = self.visible_at(i, y, x);
                self.displayed[i] != Some(want)
            }
            None => false,
        }
    }

    /// The backend has drawn cell (y, x) as requested.
    pub fn mark_updated(&mut self, y: u16, x: u16) {
        if let Some(i) = self.index(y, x) {
            let shown = self.visible_at(i, y, x);
            self.displayed[i] = Some(shown);
        }
    }
}

/// The whole terminal: grids, windows, colors and tile regions
#[derive(Debug)]
pub struct Screen {
    height: u16,
    width: u16,
    requested: Vec<Cell>,
    displayed: Vec<Option<Visible>>,
    stdscr: Window,
    /// Window `n` lives in slot `n - 1`.
    windows: Vec<Option<Window>>,
    pairs: PairTable,
    palette: Palette,
    /// Bumped whenever colors change; invalidates cached resolutions.
    generation: u64,
    tiles: TileLayer,
    cursor: (u16, u16),
    cursor_visible: bool,
    needs_full_redraw: bool,
}

impl Screen {
    pub fn new(height: u16, width: u16) -> Self {
        let cells = height as usize * width as usize;
        Self {
            height,
            width,
            requested: vec![Cell::default(); cells],
            displayed: vec![None; cells],
            stdscr: Window::new(height, width, 0, 0),
            windows: Vec::new(),
            pairs: PairTable::default(),
            palette: Palette::default(),
            generation: 0,
            tiles: TileLayer::new(height, width),
            cursor: (0, 0),
            cursor_visible: true,
            needs_full_redraw: false,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.height, self.width)
    }

    fn index(&self, y: u16, x: u16) -> Option<usize> {
        (y < self.height && x < self.width).then(|| y as usize * self.width as usize + x as usize)
    }

    // ---- windows ----

    pub fn new_window(
        &mut self,
        height: u16,
        width: u16,
        top: u16,
        left: u16,
    ) -> UncursedResult<WindowId> {
        if top as u32 + height as u32 > self.height as u32
            || left as u32 + width as u32 > self.width as u32
        {
            return Err(UncursedError::RegionBounds(format!(
                "window {height}x{width} at ({top}, {left})"
            )));
        }
        let win = Window::new(height, width, top, left);
        let slot = match self.windows.iter().position(Option::is_none) {
            Some(i) => {
                self.windows[i] = Some(win);
                i
            }
            None => {
                self.windows.push(Some(win));
                self.windows.len() - 1
            }
        };
        Ok(WindowId(slot as u32 + 1))
    }

    /// stdscr cannot be deleted.
    pub fn delete_window(&mut self, id: WindowId) -> UncursedResult<()> {
        let slot = (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.windows.get_mut(i));
        match slot {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(UncursedError::NoSuchWindow(id.0)),
        }
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        match id.0 {
            0 => Some(&self.stdscr),
            n => self.windows.get(n as usize - 1).and_then(Option::as_ref),
        }
    }

    pub fn window_mut(&mut self, id: WindowId) -> UncursedResult<&mut Window> {
        match id.0 {
            0 => Ok(&mut self.stdscr),
            n => self
                .windows
                .get_mut(n as usize - 1)
                .and_then(Option::as_mut)
                .ok_or(UncursedError::NoSuchWindow(id.0)),
        }
    }

    pub fn stdscr(&mut self) -> &mut Window {
        &mut self.stdscr
    }

    // ---- drawing shortcuts ----

    pub fn move_cursor(&mut self, win: WindowId, y: u16, x: u16) -> UncursedResult<bool> {
        Ok(self.window_mut(win)?.move_cursor(y, x))
    }

    pub fn add_char(&mut self, win: WindowId, c: char) -> UncursedResult<()> {
        self.window_mut(win)?.add_char(c);
        Ok(())
    }

    pub fn add_str(&mut self, win: WindowId, s: &str) -> UncursedResult<()> {
        self.window_mut(win)?.add_str(s);
        Ok(())
    }

    pub fn erase(&mut self, win: WindowId) -> UncursedResult<()> {
        self.window_mut(win)?.erase();
        Ok(())
    }

    pub fn clear(&mut self, win: WindowId) -> UncursedResult<()> {
        self.window_mut(win)?.clear();
        Ok(())
    }

    // ---- colors ----

    pub fn init_pair(&mut self, pair: u16, fg: Color, bg: Color) -> bool {
        let changed = self.pairs.set(pair, fg, bg);
        if changed {
            self.generation += 1;
        }
        changed
    }

    pub fn pair(&self, pair: u16) -> crate::color::ColorPair {
        self.pairs.get(pair)
    }

    pub fn init_color(
        &mut self,
        color: Color,
        rgb: Rgb,
        tables: &mut [&mut dyn UncursedHooks],
    ) -> bool {
        if !self.palette.set(color, rgb) {
            return false;
        }
        self.generation += 1;
        for t in tables.iter_mut() {
            t.set_palette(color, rgb);
        }
        true
    }

    pub fn reset_palette(&mut self, tables: &mut [&mut dyn UncursedHooks]) {
        self.palette.reset();
        self.generation += 1;
        for t in tables.iter_mut() {
            t.reset_palette();
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    // ---- tiles ----

    pub fn tiles(&self) -> &TileLayer {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileLayer {
        &mut self.tiles
    }

    // ---- cursor ----

    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    pub fn set_cursor_visible(&mut self, visible: bool, tables: &mut [&mut dyn UncursedHooks]) {
        if self.cursor_visible != visible {
            self.cursor_visible = visible;
            for t in tables.iter_mut() {
                t.set_cursor_visible(visible);
            }
        }
    }

    // ---- grids ----

    pub fn requested(&self, y: u16, x: u16) -> Option<&Cell> {
        self.index(y, x).map(|i| &self.requested[i])
    }

    pub fn displayed(&self, y: u16, x: u16) -> Option<Visible> {
        self.index(y, x).and_then(|i| self.displayed[i])
    }

    pub fn displayed_grid(&self) -> &[Option<Visible>] {
        &self.displayed
    }

    /// Key bound to `button` on the requested cell at (y, x).
    pub fn mouse_key(&self, y: u16, x: u16, button: MouseButton) -> Option<Key> {
        self.requested(y, x).and_then(|c| c.mouse_key(button))
    }

    /// Copy a window into the requested grid, clipped to the screen.
    pub fn noutrefresh(&mut self, id: WindowId) -> UncursedResult<()> {
        let width = self.width;
        let height = self.height;
        let win = match id.0 {
            0 => &mut self.stdscr,
            n => self
                .windows
                .get_mut(n as usize - 1)
                .and_then(Option::as_mut)
                .ok_or(UncursedError::NoSuchWindow(id.0))?,
        };

        let (top, left) = win.origin();
        for wy in 0..win.height() {
            let y = top as u32 + wy as u32;
            if y >= height as u32 {
                break;
            }
            for wx in 0..win.width() {
                let x = left as u32 + wx as u32;
                if x >= width as u32 {
                    break;
                }
                if let Some(cell) = win.cell(wy, wx) {
                    self.requested[y as usize * width as usize + x as usize] = *cell;
                }
            }
        }

        let (cy, cx) = win.cursor();
        self.cursor = (
            (top as u32 + cy as u32).min(height.saturating_sub(1) as u32) as u16,
            (left as u32 + cx as u32).min(width.saturating_sub(1) as u32) as u16,
        );
        if std::mem::take(&mut win.clear_pending) {
            self.needs_full_redraw = true;
        }
        Ok(())
    }

    /// Throw away what the backends are believed to show. The next commit
    /// redraws every cell.
    pub fn full_redraw(&mut self, tables: &mut [&mut dyn UncursedHooks]) {
        self.displayed.fill(None);
        self.needs_full_redraw = false;
        for t in tables.iter_mut() {
            t.full_redraw();
        }
    }

    /// Commit the requested grid. Returns how many cells were out of date.
    pub fn doupdate(&mut self, tables: &mut [&mut dyn UncursedHooks]) -> usize {
        if self.needs_full_redraw {
            self.full_redraw(tables);
        }

        let mut ctx = UpdateContext {
            height: self.height,
            width: self.width,
            requested: &mut self.requested,
            displayed: &mut self.displayed,
            pairs: &self.pairs,
            generation: self.generation,
            tiles: &self.tiles,
        };

        let mut dirty = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if ctx.is_dirty(y, x) {
                    dirty.push((y, x));
                }
            }
        }

        for &(y, x) in &dirty {
            for t in tables.iter_mut() {
                t.update(&mut ctx, y, x);
            }
        }

        let (cy, cx) = self.cursor;
        for t in tables.iter_mut() {
            t.position_cursor(cy, cx);
            t.flush();
        }
        tracing::trace!(cells = dirty.len(), "screen committed");
        dirty.len()
    }

    /// `noutrefresh` followed by `doupdate`.
    pub fn refresh(
        &mut self,
        id: WindowId,
        tables: &mut [&mut dyn UncursedHooks],
    ) -> UncursedResult<usize> {
        self.noutrefresh(id)?;
        Ok(self.doupdate(tables))
    }

    /// Reallocate both grids. stdscr follows the new size; other windows
    /// keep theirs and are clipped when copied.
    pub fn resize(&mut self, height: u16, width: u16) {
        if (height, width) == (self.height, self.width) {
            return;
        }
        tracing::debug!(height, width, "screen resized");
        let cells = height as usize * width as usize;
        self.height = height;
        self.width = width;
        self.requested = vec![Cell::default(); cells];
        self.displayed = vec![None; cells];
        self.stdscr.resize(height, width);
        self.tiles.resize(height, width);
        self.cursor = (0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;
    use crate::cell::Attr;

    fn tables(b: &mut HeadlessBackend) -> [&mut dyn UncursedHooks; 1] {
        [b]
    }

    #[test]
    fn test_commit_only_sends_changes() {
        let mut screen = Screen::new(3, 10);
        let (mut backend, probe) = HeadlessBackend::new(3, 10);

        screen.add_str(STDSCR, "hello").unwrap();
        assert_eq!(screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap(), 30);
        assert_eq!(probe.row(0), "hello     ");

        screen.move_cursor(STDSCR, 0, 0).unwrap();
        screen.add_str(STDSCR, "j").unwrap();
        assert_eq!(screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap(), 1);
        assert_eq!(probe.row(0), "jello     ");
        assert_eq!(probe.flushes(), 2);
    }

    #[test]
    fn test_unconfirmed_cells_stay_dirty() {
        let mut screen = Screen::new(1, 4);
        let mut none: [&mut dyn UncursedHooks; 0] = [];
        screen.add_str(STDSCR, "ab").unwrap();
        screen.noutrefresh(STDSCR).unwrap();
        assert_eq!(screen.doupdate(&mut none), 4);
        assert_eq!(screen.doupdate(&mut none), 4);
        assert_eq!(screen.displayed(0, 0), None);
    }

    #[test]
    fn test_pair_change_redraws_cells_using_it() {
        let mut screen = Screen::new(1, 3);
        let (mut backend, probe) = HeadlessBackend::new(1, 3);
        screen.init_pair(2, Color::Red, Color::Black);
        screen.stdscr().set_pair(2);
        screen.add_str(STDSCR, "x").unwrap();
        screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap();
        assert_eq!(probe.colors(0, 0).map(|c| c.fg), Some(Color::Red));

        screen.init_pair(2, Color::Cyan, Color::Black);
        assert_eq!(screen.doupdate(&mut tables(&mut backend)), 1);
        assert_eq!(probe.colors(0, 0).map(|c| c.fg), Some(Color::Cyan));
    }

    #[test]
    fn test_attribute_change_is_a_difference() {
        let mut screen = Screen::new(1, 1);
        let (mut backend, _probe) = HeadlessBackend::new(1, 1);
        screen.add_char(STDSCR, '@').unwrap();
        screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap();

        let win = screen.stdscr();
        win.move_cursor(0, 0);
        win.attr_on(Attr::UNDERLINE);
        win.add_char('@');
        assert_eq!(screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap(), 1);
    }

    #[test]
    fn test_subwindow_clipped_and_cursor_follows() {
        let mut screen = Screen::new(4, 6);
        let win = screen.new_window(2, 3, 2, 3).unwrap();
        screen.add_str(win, "abcd").unwrap();
        screen.noutrefresh(win).unwrap();
        assert_eq!(screen.requested(2, 3).map(|c| c.glyph.base()), Some('a'));
        assert_eq!(screen.requested(3, 3).map(|c| c.glyph.base()), Some('d'));
        assert_eq!(screen.cursor(), (3, 4));

        assert!(screen.new_window(3, 3, 2, 3).is_err());
        screen.delete_window(win).unwrap();
        assert!(screen.delete_window(win).is_err());
        assert!(screen.delete_window(STDSCR).is_err());
        assert_eq!(screen.new_window(1, 1, 0, 0).unwrap(), win);
    }

    #[test]
    fn test_clear_forces_full_redraw() {
        let mut screen = Screen::new(2, 2);
        let (mut backend, probe) = HeadlessBackend::new(2, 2);
        screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap();
        assert_eq!(screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap(), 0);

        screen.clear(STDSCR).unwrap();
        assert_eq!(screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap(), 4);
        assert_eq!(probe.full_redraws(), 1);
    }

    #[test]
    fn test_tile_binding_changes_visible_state() {
        let mut screen = Screen::new(2, 2);
        let (mut backend, _probe) = HeadlessBackend::new(2, 2);
        screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap();

        let region = screen
            .tiles_mut()
            .create_region(crate::tiles::Rect::new(0, 0, 1, 2))
            .unwrap();
        assert_eq!(screen.doupdate(&mut tables(&mut backend)), 2);
        screen.tiles_mut().set_tile(region, 0, 1, Some(9));
        assert_eq!(screen.doupdate(&mut tables(&mut backend)), 1);
        assert_eq!(screen.displayed(0, 1).and_then(|v| v.tile).and_then(|t| t.tile), Some(9));
    }

    #[test]
    fn test_resize_invalidates_everything() {
        let mut screen = Screen::new(2, 2);
        let (mut backend, _probe) = HeadlessBackend::new(2, 2);
        screen.refresh(STDSCR, &mut tables(&mut backend)).unwrap();
        screen.resize(3, 5);
        assert_eq!(screen.size(), (3, 5));
        assert_eq!(screen.stdscr().width(), 5);
        assert_eq!(screen.doupdate(&mut tables(&mut backend)), 15);
    }
}
