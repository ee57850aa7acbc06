//! Keys and raw input events
//!
//! Everything the input wait can return is a [`Key`]: printable codepoints,
//! function keys with modifiers, and the out-of-band results (resize,
//! hangup, signal wakeup, watched descriptor ready, timeout).

use bitflags::bitflags;
use strum::{Display, EnumIter};

bitflags! {
    /// Modifier keys held with a special key
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0x01;
        const ALT = 0x02;
        const CTRL = 0x04;
    }
}

/// Non-character keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SpecialKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Backspace,
    Enter,
    Tab,
    BackTab,
    Escape,
    F(u8),
}

/// A key as seen by the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Special(SpecialKey, Modifiers),
    /// The screen changed size; query the screen for the new dimensions.
    Resize,
    /// The terminal went away. Once returned, returned forever.
    Hangup,
    /// Another thread or a signal handler asked the wait to return.
    Signal,
    /// A watched file descriptor became readable.
    OtherFd,
    /// The wait timed out with nothing to report.
    Timeout,
    /// Input arrived that maps to no key.
    Invalid,
}

impl Key {
    /// Keys that are not user keystrokes
    pub fn is_out_of_band(self) -> bool {
        matches!(
            self,
            Key::Resize | Key::Hangup | Key::Signal | Key::OtherFd | Key::Timeout
        )
    }

    pub fn ctrl(c: char) -> Key {
        Key::Char(((c.to_ascii_lowercase() as u8) & 0x1f) as char)
    }
}

/// Mouse buttons a cell can bind a key to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    Hover,
}

pub const MOUSE_BUTTONS: usize = 6;

impl MouseButton {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What an input backend reports before the core maps it to a [`Key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Key(Key),
    /// Resolved through the clicked cell's mouse bindings.
    Mouse { button: MouseButton, y: u16, x: u16 },
    /// The backend noticed a new terminal size.
    Resize { height: u16, width: u16 },
}
