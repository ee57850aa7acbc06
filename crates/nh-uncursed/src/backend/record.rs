//! Session recorder
//!
//! A passive backend that writes a line-oriented log of every key the game
//! received and every cell pushed to the screen. It never confirms cells,
//! so it does not hide redraws from the real output backend.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::UncursedResult;
use crate::hooks::UncursedHooks;
use crate::key::Key;
use crate::screen::UpdateContext;

pub struct RecordBackend {
    out: Option<Box<dyn Write>>,
}

impl RecordBackend {
    /// Recorder that stays idle until `start_recording`.
    pub fn new() -> Self {
        Self { out: None }
    }

    /// Recorder that is already writing to `out`.
    pub fn to_writer(out: impl Write + 'static) -> Self {
        Self {
            out: Some(Box::new(out)),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.out.is_some()
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        if let Err(error) = writeln!(out, "{line}") {
            tracing::warn!(%error, "recording stopped");
            self.out = None;
        }
    }
}

impl Default for RecordBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl UncursedHooks for RecordBackend {
    fn exit(&mut self) {
        self.stop_recording();
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>, y: u16, x: u16) {
        let Some(v) = ctx.requested(y, x) else {
            return;
        };
        match v.tile {
            Some(t) => self.emit(format_args!(
                "tile {y} {x} {} {}",
                t.region.0,
                t.tile.map_or_else(|| "-".to_string(), |n| n.to_string())
            )),
            None => self.emit(format_args!(
                "cell {y} {x} {:?} {} {}",
                v.glyph.to_string(),
                v.colors.fg,
                v.colors.bg
            )),
        }
    }

    fn full_redraw(&mut self) {
        self.emit(format_args!("redraw"));
    }

    fn flush(&mut self) {
        self.emit(format_args!("flush"));
        if let Some(out) = self.out.as_mut() {
            if let Err(error) = out.flush() {
                tracing::warn!(%error, "recording stopped");
                self.out = None;
            }
        }
    }

    fn record_key(&mut self, key: Key) {
        self.emit(format_args!("key {key:?}"));
    }

    fn resized(&mut self, height: u16, width: u16) {
        self.emit(format_args!("resize {height} {width}"));
    }

    fn start_recording(&mut self, path: &Path) -> UncursedResult<()> {
        self.stop_recording();
        let file = File::create(path)?;
        tracing::info!(path = %path.display(), "recording session");
        self.out = Some(Box::new(BufWriter::new(file)));
        Ok(())
    }

    fn stop_recording(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(error) = out.flush() {
                tracing::warn!(%error, "failed to flush recording");
            }
        }
    }
}

/// A `Write` that appends to a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_started() {
        let mut rec = RecordBackend::new();
        rec.record_key(Key::Char('a'));
        assert!(!rec.is_recording());
    }

    #[test]
    fn test_keys_logged_in_order() {
        let buf = SharedBuffer::default();
        let mut rec = RecordBackend::to_writer(buf.clone());
        rec.record_key(Key::Char('a'));
        rec.record_key(Key::Resize);
        rec.flush();
        assert_eq!(buf.contents(), "key Char('a')\nkey Resize\nflush\n");
    }

    #[test]
    fn test_stop_recording() {
        let buf = SharedBuffer::default();
        let mut rec = RecordBackend::to_writer(buf.clone());
        rec.stop_recording();
        rec.record_key(Key::Char('z'));
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn test_start_recording_to_file() {
        let path = std::env::temp_dir().join(format!("nh-uncursed-rec-{}.log", std::process::id()));
        let mut rec = RecordBackend::new();
        rec.start_recording(&path).unwrap();
        rec.record_key(Key::Char('q'));
        rec.stop_recording();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(text, "key Char('q')\n");
    }
}
