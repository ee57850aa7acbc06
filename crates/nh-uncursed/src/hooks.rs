//! The backend interface
//!
//! Every backend implements [`UncursedHooks`]. Which calls a backend gets
//! depends on the role it is registered under: output and lifecycle calls
//! go to every active backend, the input calls only to the one active
//! input backend, and `record_key` only to broadcast and recording ones.
//! Every method has a do-nothing default so a backend implements just what
//! it renders.

use std::path::Path;
use std::time::Duration;

use crate::color::{Color, Rgb};
use crate::error::UncursedResult;
use crate::input::{InputSources, RawFd};
use crate::key::{Key, RawInput};
use crate::screen::UpdateContext;
use crate::tiles::{Rect, RegionId, TileHandle};

pub trait UncursedHooks {
    /// Take over the output device. Returns its size as (height, width) if
    /// the backend knows it.
    fn init(&mut self) -> UncursedResult<Option<(u16, u16)>> {
        Ok(None)
    }

    /// Give the output device back.
    fn exit(&mut self) {}

    fn beep(&mut self) {}

    fn set_cursor_visible(&mut self, _visible: bool) {}

    fn position_cursor(&mut self, _y: u16, _x: u16) {}

    fn reset_palette(&mut self) {}

    fn set_palette(&mut self, _color: Color, _rgb: Rgb) {}

    /// Redraw cell (y, x). Read what to draw from `ctx` and confirm every
    /// cell actually redrawn with `ctx.mark_updated`.
    fn update(&mut self, _ctx: &mut UpdateContext<'_>, _y: u16, _x: u16) {}

    /// Everything on the device is about to be redrawn.
    fn full_redraw(&mut self) {}

    /// End of a commit; called once after all `update` calls.
    fn flush(&mut self) {}

    /// Load a tile raster. Backends that cannot draw tiles return `None`.
    fn allocate_tiles(&mut self, _path: &Path, _width: u16, _height: u16) -> Option<TileHandle> {
        None
    }

    fn free_tiles(&mut self, _handle: TileHandle) {}

    /// `None` means the region was deleted.
    fn set_tiles_region(&mut self, _region: RegionId, _rect: Option<Rect>) {}

    fn set_tile(&mut self, _region: RegionId, _y: u16, _x: u16, _tile: Option<u32>) {}

    // Input role only.

    fn delay(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }

    fn set_mouse_active(&mut self, _active: bool) {}

    /// Wait for input. `timeout` of `None` waits forever.
    fn get_key(
        &mut self,
        _timeout: Option<Duration>,
        _sources: &InputSources<'_>,
    ) -> UncursedResult<RawInput> {
        Ok(RawInput::Key(Key::Hangup))
    }

    fn watch_fd(&mut self, _fd: RawFd, _watch: bool) {}

    // Broadcast and recording roles.

    /// A key the input backend produced, as returned to the game.
    fn record_key(&mut self, _key: Key) {}

    fn start_recording(&mut self, _path: &Path) -> UncursedResult<()> {
        Ok(())
    }

    fn stop_recording(&mut self) {}

    // Everyone.

    fn resized(&mut self, _height: u16, _width: u16) {}

    /// Release the terminal for a job-control stop.
    fn suspend(&mut self) {}

    /// Take the terminal back after `suspend`.
    fn resume(&mut self) {}
}
