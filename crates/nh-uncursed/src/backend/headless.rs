//! In-memory backend
//!
//! Mirrors every committed cell into a grid and plays input from a script.
//! Useful for tests and for dumping a screen as text. The [`HeadlessProbe`]
//! returned alongside the backend stays readable after the backend has been
//! handed to a registry.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::color::Resolved;
use crate::error::UncursedResult;
use crate::hooks::UncursedHooks;
use crate::input::InputSources;
use crate::key::{Key, RawInput};
use crate::screen::{UpdateContext, Visible};
use crate::tiles::{Rect, RegionId, TileHandle};

#[derive(Debug, Default)]
struct Mirror {
    height: u16,
    width: u16,
    grid: Vec<Option<Visible>>,
    script: VecDeque<RawInput>,
    keys: Vec<Key>,
    waits: Vec<Option<Duration>>,
    flushes: usize,
    full_redraws: usize,
    updates: usize,
    beeps: usize,
    active: bool,
    suspended: bool,
    tile_capable: bool,
    tile_handles: u64,
    tile_calls: Vec<(RegionId, u16, u16, Option<u32>)>,
    cursor: (u16, u16),
}

#[derive(Debug)]
pub struct HeadlessBackend {
    state: Rc<RefCell<Mirror>>,
}

/// Read side of a [`HeadlessBackend`]
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<Mirror>>,
}

impl HeadlessBackend {
    pub fn new(height: u16, width: u16) -> (Self, HeadlessProbe) {
        let state = Rc::new(RefCell::new(Mirror {
            height,
            width,
            grid: vec![None; height as usize * width as usize],
            ..Mirror::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            HeadlessProbe { state },
        )
    }

    /// Inputs returned by `get_key`, in order.
    pub fn with_script(self, inputs: impl IntoIterator<Item = RawInput>) -> Self {
        self.state.borrow_mut().script.extend(inputs);
        self
    }

    /// Accept tile sets.
    pub fn with_tiles(self) -> Self {
        self.state.borrow_mut().tile_capable = true;
        self
    }
}

impl HeadlessProbe {
    /// Glyphs of row `y`; cells never drawn read as spaces.
    pub fn row(&self, y: u16) -> String {
        let m = self.state.borrow();
        (0..m.width)
            .map(|x| match m.grid.get(y as usize * m.width as usize + x as usize) {
                Some(Some(v)) => v.glyph.to_string(),
                _ => " ".to_string(),
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        let height = self.state.borrow().height;
        (0..height).map(|y| self.row(y)).collect()
    }

    pub fn cell(&self, y: u16, x: u16) -> Option<Visible> {
        let m = self.state.borrow();
        if y >= m.height || x >= m.width {
            return None;
        }
        m.grid[y as usize * m.width as usize + x as usize]
    }

    pub fn colors(&self, y: u16, x: u16) -> Option<Resolved> {
        self.cell(y, x).map(|v| v.colors)
    }

    pub fn grid(&self) -> Vec<Option<Visible>> {
        self.state.borrow().grid.clone()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.state.borrow().keys.clone()
    }

    /// Timeout passed to each input wait, in order
    pub fn waits(&self) -> Vec<Option<Duration>> {
        self.state.borrow().waits.clone()
    }

    pub fn push_input(&self, input: RawInput) {
        self.state.borrow_mut().script.push_back(input);
    }

    pub fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }

    pub fn full_redraws(&self) -> usize {
        self.state.borrow().full_redraws
    }

    pub fn updates(&self) -> usize {
        self.state.borrow().updates
    }

    pub fn beeps(&self) -> usize {
        self.state.borrow().beeps
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    pub fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.state.borrow().cursor
    }

    pub fn tile_calls(&self) -> Vec<(RegionId, u16, u16, Option<u32>)> {
        self.state.borrow().tile_calls.clone()
    }
}

impl UncursedHooks for HeadlessBackend {
    fn init(&mut self) -> UncursedResult<Option<(u16, u16)>> {
        let mut m = self.state.borrow_mut();
        m.active = true;
        Ok(Some((m.height, m.width)))
    }

    fn exit(&mut self) {
        self.state.borrow_mut().active = false;
    }

    fn beep(&mut self) {
        self.state.borrow_mut().beeps += 1;
    }

    fn position_cursor(&mut self, y: u16, x: u16) {
        self.state.borrow_mut().cursor = (y, x);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>, y: u16, x: u16) {
        let Some(visible) = ctx.requested(y, x) else {
            return;
        };
        {
            let mut m = self.state.borrow_mut();
            let i = y as usize * m.width as usize + x as usize;
            if let Some(slot) = m.grid.get_mut(i) {
                *slot = Some(visible);
            }
            m.updates += 1;
        }
        ctx.mark_updated(y, x);
    }

    fn full_redraw(&mut self) {
        let mut m = self.state.borrow_mut();
        m.full_redraws += 1;
        m.grid.fill(None);
    }

    fn flush(&mut self) {
        self.state.borrow_mut().flushes += 1;
    }

    fn allocate_tiles(&mut self, _path: &Path, _width: u16, _height: u16) -> Option<TileHandle> {
        let mut m = self.state.borrow_mut();
        if !m.tile_capable {
            return None;
        }
        m.tile_handles += 1;
        Some(TileHandle(m.tile_handles))
    }

    fn set_tiles_region(&mut self, _region: RegionId, _rect: Option<Rect>) {}

    fn set_tile(&mut self, region: RegionId, y: u16, x: u16, tile: Option<u32>) {
        self.state.borrow_mut().tile_calls.push((region, y, x, tile));
    }

    fn delay(&mut self, _ms: u32) {}

    /// Scripted input first; an exhausted script reads as a hangup.
    fn get_key(
        &mut self,
        timeout: Option<Duration>,
        sources: &InputSources<'_>,
    ) -> UncursedResult<RawInput> {
        self.state.borrow_mut().waits.push(timeout);
        if sources.waker.take() {
            return Ok(RawInput::Key(Key::Signal));
        }
        let next = self.state.borrow_mut().script.pop_front();
        Ok(next.unwrap_or(RawInput::Key(Key::Hangup)))
    }

    fn record_key(&mut self, key: Key) {
        self.state.borrow_mut().keys.push(key);
    }

    fn resized(&mut self, height: u16, width: u16) {
        let mut m = self.state.borrow_mut();
        m.height = height;
        m.width = width;
        m.grid = vec![None; height as usize * width as usize];
    }

    fn suspend(&mut self) {
        self.state.borrow_mut().suspended = true;
    }

    fn resume(&mut self) {
        self.state.borrow_mut().suspended = false;
    }
}
