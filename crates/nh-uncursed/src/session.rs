//! The renderer as the game sees it
//!
//! [`Uncursed`] ties the screen model, the backend registry and the input
//! state together. Output and lifecycle calls fan out to every active
//! backend; input calls go to the input backend and every key it returns
//! is copied to the broadcast and recording backends.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::color::{Color, Rgb};
use crate::config::UncursedConfig;
use crate::error::{UncursedError, UncursedResult};
use crate::input::{InputState, RawFd, SignalWaker};
use crate::key::{Key, RawInput};
use crate::registry::HookRegistry;
use crate::screen::Screen;
use crate::tiles::{Rect, RegionId, TileOwner, TileSet};
use crate::window::WindowId;

pub const DEFAULT_HEIGHT: u16 = 24;
pub const DEFAULT_WIDTH: u16 = 80;

#[derive(Debug)]
pub struct Uncursed {
    screen: Screen,
    registry: HookRegistry,
    input: InputState,
    config: UncursedConfig,
    initialized: bool,
}

impl Uncursed {
    pub fn new(config: UncursedConfig) -> Self {
        Self {
            screen: Screen::new(DEFAULT_HEIGHT, DEFAULT_WIDTH),
            registry: HookRegistry::new(),
            input: InputState::default(),
            config,
            initialized: false,
        }
    }

    pub fn config(&self) -> &UncursedConfig {
        &self.config
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HookRegistry {
        &mut self.registry
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Choose and start the backends.
    ///
    /// The input backend is chosen by [`HookRegistry::select_input`]; the
    /// configured extra interfaces are switched on alongside it. The first
    /// backend that reports a size sets the screen size.
    pub fn initialize(&mut self) -> UncursedResult<()> {
        let input = self.registry.select_input(&self.config)?;
        self.registry.activate(&input)?;
        for extra in self.config.extra_interfaces.clone() {
            if let Err(error) = self.registry.activate(&extra) {
                tracing::warn!(interface = %extra, %error, "extra interface not started");
            }
        }

        let mut size = None;
        let mut failed = Vec::new();
        let mut input_error = None;
        self.registry.for_each_used(|name, table| match table.init() {
            Ok(reported) => {
                if size.is_none() {
                    size = reported;
                }
            }
            Err(error) if name == input => input_error = Some(error),
            Err(error) => {
                tracing::warn!(interface = name, %error, "backend failed to start");
                failed.push(name.to_string());
            }
        });
        if let Some(error) = input_error {
            self.registry.deactivate(&input);
            return Err(error);
        }
        for name in failed {
            self.registry.deactivate(&name);
        }

        if let Some((height, width)) = size {
            self.apply_resize(height, width);
        }
        self.initialized = true;
        tracing::info!(interface = %input, size = ?self.screen.size(), "renderer initialized");

        if let Some(tiles) = self.config.tiles.clone() {
            self.set_tiles_tile_file(&tiles.path, tiles.tile_width, tiles.tile_height);
        }
        Ok(())
    }

    /// Hand the terminal back. Recording stops.
    pub fn exit(&mut self) {
        if !self.initialized {
            return;
        }
        self.registry.for_each_used(|_, t| {
            t.stop_recording();
            t.exit();
        });
        self.initialized = false;
    }

    // ---- output ----

    pub fn noutrefresh(&mut self, win: WindowId) -> UncursedResult<()> {
        self.screen.noutrefresh(win)
    }

    /// Commit the screen. Nothing is drawn after a hangup.
    pub fn doupdate(&mut self) -> usize {
        if self.input.is_hung_up() {
            return 0;
        }
        self.screen.doupdate(&mut self.registry.used_tables())
    }

    pub fn refresh(&mut self, win: WindowId) -> UncursedResult<usize> {
        self.screen.noutrefresh(win)?;
        Ok(self.doupdate())
    }

    pub fn full_redraw(&mut self) {
        self.screen.full_redraw(&mut self.registry.used_tables());
    }

    pub fn init_pair(&mut self, pair: u16, fg: Color, bg: Color) -> bool {
        self.screen.init_pair(pair, fg, bg)
    }

    pub fn init_color(&mut self, color: Color, rgb: Rgb) -> bool {
        self.screen
            .init_color(color, rgb, &mut self.registry.used_tables())
    }

    pub fn reset_palette(&mut self) {
        self.screen.reset_palette(&mut self.registry.used_tables());
    }

    pub fn beep(&mut self) {
        self.registry.for_each_used(|_, t| t.beep());
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.screen
            .set_cursor_visible(visible, &mut self.registry.used_tables());
    }

    // ---- input ----

    pub fn delay(&mut self, ms: u32) {
        if let Some(t) = self.registry.input_table() {
            t.delay(ms);
        }
    }

    pub fn set_mouse_active(&mut self, active: bool) {
        if let Some(t) = self.registry.input_table() {
            t.set_mouse_active(active);
        }
    }

    pub fn watch_fd(&mut self, fd: RawFd, watch: bool) {
        if self.input.watch(fd, watch) {
            if let Some(t) = self.registry.input_table() {
                t.watch_fd(fd, watch);
            }
        }
    }

    /// A handle that makes a blocked `get_key` return [`Key::Signal`].
    pub fn signal_waker(&self) -> SignalWaker {
        self.input.waker().clone()
    }

    pub fn is_hung_up(&self) -> bool {
        self.input.is_hung_up()
    }

    /// Queue a key ahead of the input backend.
    pub fn unget_key(&mut self, key: Key) {
        self.input.push(key);
    }

    /// Next key from the input backend.
    ///
    /// Mouse events become the key bound to the clicked cell; clicks on
    /// unbound cells are swallowed without extending `timeout`. A backend
    /// error is treated as a hangup, and after a hangup every call returns
    /// [`Key::Hangup`] at once.
    pub fn get_key(&mut self, timeout: Option<Duration>) -> UncursedResult<Key> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut remaining = timeout;
        loop {
            let key = if self.input.is_hung_up() {
                Key::Hangup
            } else if let Some(key) = self.input.pop() {
                key
            } else {
                let table = self
                    .registry
                    .input_table()
                    .ok_or(UncursedError::NoBackend)?;
                let raw = table.get_key(remaining, &self.input.sources());
                match raw {
                    Ok(RawInput::Key(key)) => key,
                    Ok(RawInput::Mouse { button, y, x }) => {
                        match self.screen.mouse_key(y, x, button) {
                            Some(key) => key,
                            None => {
                                remaining =
                                    deadline.map(|d| d.saturating_duration_since(Instant::now()));
                                if remaining == Some(Duration::ZERO) {
                                    Key::Timeout
                                } else {
                                    continue;
                                }
                            }
                        }
                    }
                    Ok(RawInput::Resize { height, width }) => {
                        self.apply_resize(height, width);
                        Key::Resize
                    }
                    Err(error) => {
                        tracing::warn!(%error, "input backend failed");
                        Key::Hangup
                    }
                }
            };

            if key == Key::Hangup {
                self.input.hang_up();
            }
            self.registry.broadcast_key(key);
            return Ok(key);
        }
    }

    // ---- size and job control ----

    fn apply_resize(&mut self, height: u16, width: u16) {
        self.screen.resize(height, width);
        self.registry.for_each_used(|_, t| t.resized(height, width));
    }

    /// Resize the screen; the game sees [`Key::Resize`] next.
    pub fn resize(&mut self, height: u16, width: u16) {
        self.apply_resize(height, width);
        self.input.push(Key::Resize);
    }

    /// Release the terminal for a stop signal. Not a hangup.
    pub fn suspend(&mut self) {
        self.registry.for_each_used(|_, t| t.suspend());
    }

    /// Take the terminal back and repaint everything.
    pub fn resume(&mut self) {
        self.registry.for_each_used(|_, t| t.resume());
        self.full_redraw();
        self.doupdate();
    }

    // ---- recording ----

    /// Start every active recording backend on `path`.
    pub fn start_recording(&mut self, path: &Path) -> UncursedResult<usize> {
        let mut started = 0;
        for (name, t) in self.registry.recording_tables() {
            t.start_recording(path)?;
            tracing::debug!(interface = name, "recording started");
            started += 1;
        }
        Ok(started)
    }

    pub fn stop_recording(&mut self) {
        for (_, t) in self.registry.recording_tables() {
            t.stop_recording();
        }
    }

    // ---- tiles ----

    /// Load a tile set through the first active backend that can draw
    /// tiles, or track regions against a placeholder if none can.
    pub fn set_tiles_tile_file(&mut self, path: &Path, tile_width: u16, tile_height: u16) {
        let mut owner = None;
        self.registry.for_each_used(|name, t| {
            if owner.is_none() {
                if let Some(handle) = t.allocate_tiles(path, tile_width, tile_height) {
                    owner = Some(TileOwner::Backend {
                        table: name.to_string(),
                        handle,
                    });
                }
            }
        });
        let owner = owner.unwrap_or_else(|| {
            tracing::debug!("no tile-capable backend, using placeholder tiles");
            TileOwner::Dummy
        });

        let set = TileSet {
            path: path.to_path_buf(),
            tile_width,
            tile_height,
            owner,
        };
        if let Some(old) = self.screen.tiles_mut().replace_tile_set(set) {
            if let TileOwner::Backend { table, handle } = old.owner {
                if let Some(t) = self.registry.table_mut(&table) {
                    t.free_tiles(handle);
                }
            }
        }
    }

    pub fn create_tiles_region(&mut self, rect: Rect) -> UncursedResult<RegionId> {
        let id = self.screen.tiles_mut().create_region(rect)?;
        self.registry
            .for_each_used(|_, t| t.set_tiles_region(id, Some(rect)));
        Ok(id)
    }

    /// Coordinates are relative to the region.
    pub fn set_tile(&mut self, region: RegionId, y: u16, x: u16, tile: Option<u32>) -> bool {
        if !self.screen.tiles_mut().set_tile(region, y, x, tile) {
            return false;
        }
        self.registry
            .for_each_used(|_, t| t.set_tile(region, y, x, tile));
        true
    }

    pub fn delete_tiles_region(&mut self, region: RegionId) -> bool {
        if self.screen.tiles_mut().delete_region(region).is_none() {
            return false;
        }
        self.registry
            .for_each_used(|_, t| t.set_tiles_region(region, None));
        true
    }
}

impl Drop for Uncursed {
    fn drop(&mut self) {
        self.exit();
    }
}

