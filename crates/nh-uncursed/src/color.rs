//! Colors, color pairs and the palette
//!
//! Cells refer to colors indirectly through a pair number. Resolution to a
//! concrete foreground/background happens against the current pair table,
//! applying the cell's style bits.

use strum::{Display, EnumIter, EnumString, FromRepr};

use crate::cell::Attr;

/// The 16 terminal colors, plus the terminal's own default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Brown = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    Gray = 7,
    DarkGray = 8,
    BrightRed = 9,
    BrightGreen = 10,
    Yellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    White = 15,
    Default = 16,
}

impl Color {
    /// Bold-as-bright substitution: dark colors become their bright twin.
    pub fn brightened(self) -> Color {
        match self as u8 {
            n @ 0..=7 => Color::from_repr(n + 8).unwrap_or(self),
            _ => self,
        }
    }

    pub fn is_default(self) -> bool {
        self == Color::Default
    }
}

/// A foreground/background pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

impl Default for ColorPair {
    fn default() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

pub const COLOR_PAIRS: usize = 256;

/// Pair table; pair 0 is always default-on-default
#[derive(Debug, Clone)]
pub struct PairTable {
    pairs: Vec<ColorPair>,
}

impl Default for PairTable {
    fn default() -> Self {
        Self {
            pairs: vec![ColorPair::default(); COLOR_PAIRS],
        }
    }
}

impl PairTable {
    /// Returns false for pair 0 or an out-of-range pair.
    pub fn set(&mut self, pair: u16, fg: Color, bg: Color) -> bool {
        match self.pairs.get_mut(pair as usize) {
            Some(slot) if pair != 0 => {
                *slot = ColorPair { fg, bg };
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, pair: u16) -> ColorPair {
        self.pairs.get(pair as usize).copied().unwrap_or_default()
    }
}

/// An RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

const DEFAULT_PALETTE: [Rgb; 16] = [
    Rgb(0x00, 0x00, 0x00),
    Rgb(0xaf, 0x00, 0x00),
    Rgb(0x00, 0xaf, 0x00),
    Rgb(0xaf, 0x5f, 0x00),
    Rgb(0x00, 0x00, 0xaf),
    Rgb(0xaf, 0x00, 0xaf),
    Rgb(0x00, 0xaf, 0xaf),
    Rgb(0xaf, 0xaf, 0xaf),
    Rgb(0x5f, 0x5f, 0x5f),
    Rgb(0xff, 0x5f, 0x5f),
    Rgb(0x5f, 0xff, 0x5f),
    Rgb(0xff, 0xff, 0x5f),
    Rgb(0x5f, 0x5f, 0xff),
    Rgb(0xff, 0x5f, 0xff),
    Rgb(0x5f, 0xff, 0xff),
    Rgb(0xff, 0xff, 0xff),
];

/// RGB values for the 16 base colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 16],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE,
        }
    }
}

impl Palette {
    pub fn set(&mut self, color: Color, rgb: Rgb) -> bool {
        match self.colors.get_mut(color as usize) {
            Some(slot) => {
                *slot = rgb;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, color: Color) -> Option<Rgb> {
        self.colors.get(color as usize).copied()
    }

    pub fn reset(&mut self) {
        self.colors = DEFAULT_PALETTE;
    }

    pub fn is_default(&self) -> bool {
        self.colors == DEFAULT_PALETTE
    }
}

/// Concrete colors and styling a backend should draw a cell with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolved {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub underline: bool,
}

impl Default for Resolved {
    fn default() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            bold: false,
            underline: false,
        }
    }
}

/// Apply reverse video, bold-as-bright and invisibility to a pair.
pub fn resolve(attr: Attr, pair: ColorPair) -> Resolved {
    let mut fg = pair.fg;
    let mut bg = pair.bg;

    if attr.contains(Attr::BOLD) {
        fg = fg.brightened();
    }
    if attr.contains(Attr::REVERSE) {
        std::mem::swap(&mut fg, &mut bg);
        // Reversed default-on-default still needs a visible difference.
        if fg.is_default() && bg.is_default() {
            fg = Color::Black;
            bg = Color::Gray;
        }
    }
    if attr.contains(Attr::INVISIBLE) {
        fg = bg;
    }

    Resolved {
        fg,
        bg,
        bold: attr.contains(Attr::BOLD),
        underline: attr.contains(Attr::UNDERLINE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_zero_is_fixed() {
        let mut pairs = PairTable::default();
        assert!(!pairs.set(0, Color::Red, Color::Blue));
        assert!(pairs.set(3, Color::Red, Color::Blue));
        assert!(!pairs.set(COLOR_PAIRS as u16, Color::Red, Color::Blue));
        assert_eq!(pairs.get(0), ColorPair::default());
        assert_eq!(pairs.get(3).fg, Color::Red);
    }

    #[test]
    fn test_bold_brightens_dark_colors_only() {
        let pair = ColorPair {
            fg: Color::Red,
            bg: Color::Black,
        };
        assert_eq!(resolve(Attr::BOLD, pair).fg, Color::BrightRed);

        let bright = ColorPair {
            fg: Color::White,
            bg: Color::Black,
        };
        assert_eq!(resolve(Attr::BOLD, bright).fg, Color::White);
        assert_eq!(Color::Default.brightened(), Color::Default);
    }

    #[test]
    fn test_reverse_swaps() {
        let pair = ColorPair {
            fg: Color::Green,
            bg: Color::Blue,
        };
        let r = resolve(Attr::REVERSE, pair);
        assert_eq!((r.fg, r.bg), (Color::Blue, Color::Green));

        let r = resolve(Attr::REVERSE, ColorPair::default());
        assert_ne!(r.fg, r.bg);
    }

    #[test]
    fn test_invisible_matches_background() {
        let pair = ColorPair {
            fg: Color::Yellow,
            bg: Color::Magenta,
        };
        let r = resolve(Attr::INVISIBLE | Attr::REVERSE, pair);
        assert_eq!(r.fg, r.bg);
        assert_eq!(r.bg, Color::Yellow);
    }

    #[test]
    fn test_palette_reset() {
        let mut palette = Palette::default();
        assert!(palette.set(Color::Red, Rgb(1, 2, 3)));
        assert!(!palette.set(Color::Default, Rgb(1, 2, 3)));
        assert!(!palette.is_default());
        palette.reset();
        assert!(palette.is_default());
    }
}
